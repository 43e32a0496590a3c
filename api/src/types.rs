//! Wire schemas for the booking API.
//!
//! Every response type implements [`Validate`]; the client rejects payloads
//! that deserialize but break a schema rule with [`ApiError::Malformed`]
//! instead of passing them on.
//!
//! [`ApiError::Malformed`]: crate::ApiError::Malformed

use crate::money::Money;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Schema rules checked after deserialization.
pub trait Validate {
    /// Check the value, describing the first broken rule.
    ///
    /// # Errors
    ///
    /// Returns a description of the invalid field.
    fn validate(&self) -> Result<(), String>;
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> Result<(), String> {
        self.iter().try_for_each(Validate::validate)
    }
}

/// Response envelope wrapping every payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    /// Whether the API handled the request
    pub success: bool,
    /// Human-readable status or error message
    #[serde(default)]
    pub message: Option<String>,
    /// Payload; absent on failure
    pub data: Option<T>,
}

/// Body of non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    /// Error message, if the server sent one
    #[serde(default)]
    pub message: Option<String>,
}

// ─── Catalog ────────────────────────────────────────────────────────────────

/// Event details with its add-ons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDetails {
    /// Event id
    pub id: u64,
    /// Display name
    pub name: String,
    /// Long description
    #[serde(default)]
    pub description: Option<String>,
    /// Optional add-ons sold with the event's tickets
    #[serde(default)]
    pub extra_prices: Vec<ExtraPrice>,
}

impl Validate for EventDetails {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err(format!("event {} has an empty name", self.id));
        }
        self.extra_prices.validate()
    }
}

/// An optional add-on line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraPrice {
    /// Add-on id
    pub id: u64,
    /// Display name
    pub name: String,
    /// Description shown under the name
    #[serde(default)]
    pub description: Option<String>,
    /// Unit price
    pub price: Money,
    /// Tickets this add-on can be attached to
    #[serde(default)]
    pub ticket_ids: Vec<u64>,
}

impl ExtraPrice {
    /// Whether the add-on can be attached to the ticket.
    #[must_use]
    pub fn applies_to(&self, ticket_id: u64) -> bool {
        self.ticket_ids.contains(&ticket_id)
    }
}

impl Validate for ExtraPrice {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err(format!("extra price {} has an empty name", self.id));
        }
        Ok(())
    }
}

/// A bookable ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Ticket id
    pub id: u64,
    /// Display title
    pub title: String,
    /// URL slug
    pub slug: String,
    /// List price
    pub base_price: Money,
    /// Discounted price, when on sale
    #[serde(default)]
    pub sale_price: Option<Money>,
    /// Minimum number of adults per booking
    pub min_guest: u32,
    /// Maximum number of guests per booking
    pub max_guest: u32,
    /// Default time slots (dates may override them)
    #[serde(default)]
    pub time_slots: Vec<TimeSlot>,
    /// Long description
    #[serde(default)]
    pub description: Option<String>,
    /// Hero image
    #[serde(default)]
    pub image_url: Option<String>,
    /// Selling points
    #[serde(default)]
    pub highlights: Vec<String>,
    /// What the price includes
    #[serde(default)]
    pub includes: Vec<String>,
    /// What the price excludes
    #[serde(default)]
    pub excludes: Vec<String>,
}

impl Ticket {
    /// Price shown on cards: the sale price when lower than the list price.
    #[must_use]
    pub fn display_price(&self) -> Money {
        match self.sale_price {
            Some(sale) if sale < self.base_price && !sale.is_zero() => sale,
            _ => self.base_price,
        }
    }

    /// Default time slot by id.
    #[must_use]
    pub fn time_slot(&self, id: u64) -> Option<&TimeSlot> {
        self.time_slots.iter().find(|slot| slot.id == id)
    }
}

impl Validate for Ticket {
    fn validate(&self) -> Result<(), String> {
        if self.slug.trim().is_empty() {
            return Err(format!("ticket {} has an empty slug", self.id));
        }
        if self.max_guest == 0 {
            return Err(format!("ticket {} allows no guests", self.id));
        }
        if self.min_guest > self.max_guest {
            return Err(format!(
                "ticket {} has min_guest {} above max_guest {}",
                self.id, self.min_guest, self.max_guest
            ));
        }
        Ok(())
    }
}

/// A time-of-day offering with its own prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Slot id
    pub id: u64,
    /// Start time, 24-hour `HH:MM`
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    /// Price per adult
    pub adult_price: Money,
    /// Price per child
    pub child_price: Money,
    /// Closed for sale on this date
    #[serde(default)]
    pub disabled: bool,
}

impl TimeSlot {
    /// `HH:MM` label.
    #[must_use]
    pub fn label(&self) -> String {
        self.time.format("%H:%M").to_string()
    }
}

/// Per-date availability and price overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityDay {
    /// Calendar date
    pub date: NaiveDate,
    /// `1` when the date is open for booking
    #[serde(deserialize_with = "flag")]
    pub active: u8,
    /// Ticket-type overrides for this date
    #[serde(default)]
    pub ticket_types: Vec<TicketTypeAvailability>,
}

impl AvailabilityDay {
    /// Whether the date is open for booking.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active == 1
    }
}

impl Validate for AvailabilityDay {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Time slots of one ticket on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketTypeAvailability {
    /// Ticket id
    pub ticket_id: u64,
    /// Slots offered on the date
    #[serde(default)]
    pub time_slots: Vec<TimeSlot>,
}

/// Country of a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nationality {
    /// Nationality id
    pub id: u64,
    /// Display name
    pub name: String,
    /// ISO country code
    #[serde(default)]
    pub code: Option<String>,
}

impl Validate for Nationality {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

// ─── Customers and bookings ─────────────────────────────────────────────────

/// Customer registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignupRequest {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Contact email
    pub email: String,
    /// Contact phone
    pub phone: String,
    /// Nationality id
    pub nationality_id: u64,
}

/// Result of customer registration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignupResponse {
    /// Numeric customer id
    pub id: u64,
    /// Customer identifier, sometimes base64 encoded
    #[serde(default)]
    pub customer_id: Option<String>,
}

impl Validate for SignupResponse {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Add-on line of a booking request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingAddOn {
    /// Add-on id
    pub extra_price_id: u64,
    /// Quantity
    pub quantity: u32,
    /// Unit price
    pub price: Money,
}

/// Booking creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateBookingRequest {
    /// Event id
    pub event_id: u64,
    /// Ticket id
    pub ticket_id: u64,
    /// Customer id from signup
    pub customer_id: u64,
    /// Visit date
    pub booking_date: NaiveDate,
    /// Time slot id
    pub timeslot_id: u64,
    /// Adults
    pub adults: u32,
    /// Children
    pub children: u32,
    /// Price per adult
    pub adult_price: Money,
    /// Price per child
    pub child_price: Money,
    /// Add-on lines
    pub addons: Vec<BookingAddOn>,
    /// Guests times unit prices
    pub subtotal: Money,
    /// Add-on lines total
    pub addon_total: Money,
    /// Coupon discount
    pub coupon_discount: Money,
    /// Amount to charge
    pub grand_total: Money,
    /// Free-text request from the customer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_request: Option<String>,
}

/// Server-side booking status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Awaiting payment
    Unpaid,
    /// Payment captured
    Paid,
    /// Payment failed
    Failed,
    /// Payment in progress
    Pending,
}

impl BookingStatus {
    /// Lower-case wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Pending => "pending",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of booking creation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedBooking {
    /// Booking id
    pub booking_id: u64,
    /// Shareable booking code
    pub booking_code: String,
    /// Initial status
    pub status: BookingStatus,
    /// Amount due
    pub total: Money,
}

impl Validate for CreatedBooking {
    fn validate(&self) -> Result<(), String> {
        validate_code(&self.booking_code)
    }
}

/// Contact details stored on a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSummary {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Contact email
    pub email: String,
    /// Contact phone
    #[serde(default)]
    pub phone: Option<String>,
}

/// Add-on line of a stored booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedAddOn {
    /// Display name
    pub name: String,
    /// Quantity
    pub quantity: u32,
    /// Unit price
    pub price: Money,
}

/// A stored booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    /// Shareable booking code
    pub booking_code: String,
    /// Current status
    pub status: BookingStatus,
    /// Ticket id
    pub ticket_id: u64,
    /// Ticket slug, used to load ticket details
    #[serde(default)]
    pub ticket_slug: Option<String>,
    /// Ticket title at booking time
    #[serde(default)]
    pub ticket_title: Option<String>,
    /// Visit date
    pub booking_date: NaiveDate,
    /// Time slot label
    #[serde(default)]
    pub timeslot: Option<String>,
    /// Adults
    pub adults: u32,
    /// Children
    #[serde(default)]
    pub children: u32,
    /// Add-on lines
    #[serde(default)]
    pub addons: Vec<BookedAddOn>,
    /// Amount charged or due
    pub grand_total: Money,
    /// Customer contact
    #[serde(default)]
    pub customer: Option<CustomerSummary>,
}

impl Validate for BookingRecord {
    fn validate(&self) -> Result<(), String> {
        validate_code(&self.booking_code)
    }
}

/// Downloadable voucher.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Voucher {
    /// Voucher URL
    pub url: String,
}

impl Validate for Voucher {
    fn validate(&self) -> Result<(), String> {
        if self.url.trim().is_empty() {
            return Err("voucher url is empty".to_string());
        }
        Ok(())
    }
}

/// Exchange rate from THB.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CurrencyRate {
    /// ISO currency code
    pub code: String,
    /// Units of `code` per baht
    pub exchange_rate: f64,
}

impl Validate for CurrencyRate {
    fn validate(&self) -> Result<(), String> {
        if !self.exchange_rate.is_finite() || self.exchange_rate <= 0.0 {
            return Err(format!(
                "exchange rate for {} must be positive, got {}",
                self.code, self.exchange_rate
            ));
        }
        Ok(())
    }
}

// ─── Payments ───────────────────────────────────────────────────────────────

/// Payment session prepared by the API for a booking.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentToken {
    /// Payment session token
    pub token: String,
    /// Amount to charge
    pub amount: Money,
    /// Charge currency
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "THB".to_string()
}

impl Validate for PaymentToken {
    fn validate(&self) -> Result<(), String> {
        if self.token.trim().is_empty() {
            return Err("payment token is empty".to_string());
        }
        Ok(())
    }
}

/// Card charge request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChargeRequest {
    /// Booking being paid
    pub booking_code: String,
    /// Payment session token
    pub payment_token: String,
    /// Card token from the gateway widget
    pub card_token: String,
    /// Where the bank sends the browser after 3-D-Secure
    pub return_uri: String,
}

/// 3-D-Secure completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreeDsRequest {
    /// Booking being paid
    pub booking_code: String,
}

/// Result of a charge attempt.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChargeResult {
    /// Gateway charge id
    #[serde(default)]
    pub charge_id: Option<String>,
    /// Gateway status text
    #[serde(default)]
    pub status: Option<String>,
    /// Bank authentication page, when 3-D-Secure is required
    #[serde(default)]
    pub authorize_uri: Option<String>,
}

impl Validate for ChargeResult {
    fn validate(&self) -> Result<(), String> {
        match &self.authorize_uri {
            Some(uri) if !(uri.starts_with("https://") || uri.starts_with("http://")) => {
                Err(format!("authorize_uri is not an absolute URL: {uri}"))
            },
            _ => Ok(()),
        }
    }
}

/// Payment status of a booking.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentConfirmation {
    /// Booking code
    pub booking_code: String,
    /// Current status
    pub status: BookingStatus,
}

impl Validate for PaymentConfirmation {
    fn validate(&self) -> Result<(), String> {
        validate_code(&self.booking_code)
    }
}

fn validate_code(code: &str) -> Result<(), String> {
    if code.trim().is_empty() {
        return Err("booking code is empty".to_string());
    }
    Ok(())
}

/// Accept `0`/`1` integers or booleans.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Int(u8),
        Bool(bool),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Int(v) => v,
        Flag::Bool(b) => u8::from(b),
    })
}

/// `HH:MM` times; seconds are accepted and dropped on output.
mod hhmm {
    use super::{Deserialize, Deserializer, NaiveTime, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format("%H:%M"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(|_| serde::de::Error::custom(format!("invalid time {raw:?}, expected HH:MM")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_data_is_optional_for_any_payload() {
        let envelope: Envelope<Voucher> =
            serde_json::from_value(json!({ "success": false, "message": "Not paid" })).unwrap();
        assert!(envelope.data.is_none());
        assert_eq!(envelope.message.as_deref(), Some("Not paid"));

        let envelope: Envelope<Voucher> = serde_json::from_value(json!({
            "success": true,
            "data": { "url": "https://cdn.example.com/v/CIP-1.pdf" }
        }))
        .unwrap();
        assert_eq!(envelope.data.unwrap().url, "https://cdn.example.com/v/CIP-1.pdf");
    }

    #[test]
    fn ticket_parses_and_validates() {
        let ticket: Ticket = serde_json::from_value(json!({
            "id": 7,
            "title": "Coral Island Day Trip",
            "slug": "coral-island-day-trip",
            "base_price": "1500.00",
            "sale_price": 1200,
            "min_guest": 1,
            "max_guest": 10,
            "time_slots": [
                { "id": 1, "time": "09:00", "adult_price": 1200, "child_price": "600" },
                { "id": 2, "time": "13:30:00", "adult_price": 1300, "child_price": 650 }
            ],
            "highlights": ["Snorkelling"]
        }))
        .unwrap();

        assert!(ticket.validate().is_ok());
        assert_eq!(ticket.display_price(), Money::from_baht(1200));
        assert_eq!(ticket.time_slot(2).unwrap().label(), "13:30");
        assert!(ticket.includes.is_empty());
    }

    #[test]
    fn ticket_with_inverted_guest_bounds_is_invalid() {
        let ticket: Ticket = serde_json::from_value(json!({
            "id": 1, "title": "x", "slug": "x", "base_price": 1,
            "min_guest": 5, "max_guest": 2
        }))
        .unwrap();

        assert!(ticket.validate().unwrap_err().contains("min_guest"));
    }

    #[test]
    fn availability_accepts_integer_and_bool_flags() {
        let days: Vec<AvailabilityDay> = serde_json::from_value(json!([
            { "date": "2025-03-01", "active": 1 },
            { "date": "2025-03-02", "active": false, "ticket_types": [] }
        ]))
        .unwrap();

        assert!(days[0].is_active());
        assert!(!days[1].is_active());
    }

    #[test]
    fn unknown_booking_status_is_rejected() {
        let result = serde_json::from_value::<PaymentConfirmation>(json!({
            "booking_code": "CIP-1", "status": "refunded"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn non_positive_rate_is_invalid() {
        let rate = CurrencyRate { code: "USD".into(), exchange_rate: 0.0 };
        assert!(rate.validate().is_err());
        let rate = CurrencyRate { code: "USD".into(), exchange_rate: 0.028 };
        assert!(rate.validate().is_ok());
    }

    #[test]
    fn relative_authorize_uri_is_invalid() {
        let charge = ChargeResult {
            charge_id: None,
            status: None,
            authorize_uri: Some("/bank".to_string()),
        };
        assert!(charge.validate().is_err());
    }
}
