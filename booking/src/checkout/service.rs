//! "Confirm Booking": customer signup followed by booking creation.

use crate::checkout::customer_id::decode_customer_id;
use crate::checkout::form::{CustomerForm, CustomerInfo, ValidationErrors};
use crate::pricing::PriceBreakdown;
use crate::selection::BookingSelection;
use coral_api::{ApiError, BookingAddOn, BookingApi, CreateBookingRequest, Money, SignupRequest};
use std::sync::Arc;
use thiserror::Error;

/// Why a booking could not be confirmed.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The customer form has invalid fields
    #[error("invalid customer details: {0}")]
    Validation(#[from] ValidationErrors),

    /// Date, time slot or adults are missing
    #[error("booking selection is incomplete")]
    IncompleteSelection,

    /// Customer signup failed
    #[error("customer signup failed: {0}")]
    Signup(#[source] ApiError),

    /// Booking creation failed
    #[error("booking creation failed: {0}")]
    Booking(#[source] ApiError),
}

impl CheckoutError {
    /// Metric label.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::IncompleteSelection => "incomplete_selection",
            Self::Signup(_) => "signup",
            Self::Booking(_) => "booking",
        }
    }

    /// Message shown above the form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(_) => "Please correct the highlighted fields.".to_string(),
            Self::IncompleteSelection => {
                "Please select a date, time slot and at least one adult.".to_string()
            },
            Self::Signup(e) | Self::Booking(e) => e.user_message(),
        }
    }
}

/// A created booking awaiting payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutReceipt {
    /// Shareable booking code
    pub booking_code: String,
    /// Customer the booking belongs to
    pub customer_id: u64,
    /// Amount to pay
    pub grand_total: Money,
}

/// Runs checkout against the remote API. No step is retried.
#[derive(Clone)]
pub struct CheckoutService {
    api: Arc<dyn BookingApi>,
}

impl CheckoutService {
    /// Service over `api`.
    #[must_use]
    pub fn new(api: Arc<dyn BookingApi>) -> Self {
        Self { api }
    }

    /// Validate, sign the customer up and create the booking.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError`] at the first step that fails; later steps
    /// are not attempted.
    #[tracing::instrument(skip_all, fields(ticket = %selection.ticket.slug))]
    pub async fn confirm_booking(
        &self,
        selection: &BookingSelection,
        form: &CustomerForm,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        let result = self.run(selection, form).await;
        match &result {
            Ok(receipt) => {
                metrics::counter!("coral_bookings_created_total").increment(1);
                tracing::info!(
                    booking_code = %receipt.booking_code,
                    customer_id = receipt.customer_id,
                    grand_total = %receipt.grand_total,
                    "Booking created"
                );
            },
            Err(e) => {
                metrics::counter!("coral_checkout_failures_total", "reason" => e.reason())
                    .increment(1);
                tracing::warn!(reason = e.reason(), error = %e, "Checkout failed");
            },
        }
        result
    }

    async fn run(
        &self,
        selection: &BookingSelection,
        form: &CustomerForm,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        let customer = form.validate()?;
        if !selection.is_complete() {
            return Err(CheckoutError::IncompleteSelection);
        }

        let signup = self
            .api
            .signup(&signup_request(&customer))
            .await
            .map_err(CheckoutError::Signup)?;
        let customer_id = decode_customer_id(signup.customer_id.as_deref(), signup.id);

        let request = booking_request(selection, customer_id, &customer)
            .ok_or(CheckoutError::IncompleteSelection)?;
        let created = self
            .api
            .create_booking(&request)
            .await
            .map_err(CheckoutError::Booking)?;

        Ok(CheckoutReceipt {
            booking_code: created.booking_code,
            customer_id,
            grand_total: request.grand_total,
        })
    }
}

fn signup_request(customer: &CustomerInfo) -> SignupRequest {
    SignupRequest {
        first_name: customer.first_name.clone(),
        last_name: customer.last_name.clone(),
        email: customer.email.clone(),
        phone: customer.phone.clone(),
        nationality_id: customer.nationality_id,
    }
}

/// Booking request with the totals derived from `selection`.
///
/// `None` if the date or time slot is missing.
#[must_use]
pub fn booking_request(
    selection: &BookingSelection,
    customer_id: u64,
    customer: &CustomerInfo,
) -> Option<CreateBookingRequest> {
    let prices = PriceBreakdown::of(selection);

    Some(CreateBookingRequest {
        event_id: selection.event_id,
        ticket_id: selection.ticket.id,
        customer_id,
        booking_date: selection.booking_date?,
        timeslot_id: selection.timeslot_id?,
        adults: selection.adults,
        children: selection.children,
        adult_price: selection.adult_price,
        child_price: selection.child_price,
        addons: selection
            .selected_addons()
            .map(|addon| BookingAddOn {
                extra_price_id: addon.id,
                quantity: addon.quantity,
                price: addon.price,
            })
            .collect(),
        subtotal: prices.subtotal,
        addon_total: prices.addon_total,
        coupon_discount: prices.coupon_discount,
        grand_total: prices.grand_total,
        special_request: customer.special_request.clone(),
    })
}
