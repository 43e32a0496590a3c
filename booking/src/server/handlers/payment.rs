//! Payment endpoints.
//!
//! - GET /payment/:code - Card form for an unpaid booking
//! - POST /payment/:code/charge - Charge the tokenized card
//! - GET|POST /payment/3ds-callback - Return from the issuer's 3-D-Secure page
//! - GET /payment/return - Poll the confirmation endpoint
//! - GET /booking/confirmation/:code - Paid booking with voucher
//!
//! # Payment Flow
//!
//! ```text
//! card form ──► charge ──┬──► issuer (3-D-Secure) ──► 3ds-callback ──┐
//!                        └───────────────────────────────────────────┴──► return ──► confirmation
//! ```
//!
//! Only the return page's confirmation poll decides whether a booking is
//! paid.

use super::chrome;
use crate::payment::{ChargeNext, PaymentOutcome};
use crate::server::error::PageResult;
use crate::server::state::AppState;
use crate::server::views::payment::{
    charge_failed, confirmation_page, payment_failed, payment_page, still_processing,
};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use coral_api::BookingStatus;
use coral_web::{BrowserSession, CorrelationId};
use serde::Deserialize;

fn return_url(booking_code: &str) -> String {
    format!(
        "/payment/return?booking_code={}",
        urlencoding::encode(booking_code)
    )
}

fn confirmation_url(booking_code: &str) -> String {
    format!("/booking/confirmation/{}", urlencoding::encode(booking_code))
}

/// `GET /payment/:code`
///
/// # Errors
///
/// Returns a page error when the booking or the payment token cannot be
/// loaded.
pub async fn show_payment(
    State(state): State<AppState>,
    browser: BrowserSession,
    Path(booking_code): Path<String>,
) -> PageResult<Response> {
    let session = state.session(browser).await;
    let (record, token) = state.payments.prepare(&booking_code).await?;
    if record.status == BookingStatus::Paid {
        return Ok(Redirect::to(&confirmation_url(&record.booking_code)).into_response());
    }

    let currency = session.currency().load().await;
    Ok(payment_page(
        &chrome(&state, currency.as_ref()),
        &record,
        &token,
        &state.config.payment,
    )
    .into_response())
}

/// Form posted by the card widget.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChargeForm {
    /// Payment session token from the card form
    pub payment_token: Option<String>,
    /// Card token created by the gateway script
    #[serde(alias = "omiseToken")]
    pub omise_token: String,
}

/// `POST /payment/:code/charge`
pub async fn charge(
    State(state): State<AppState>,
    browser: BrowserSession,
    correlation_id: CorrelationId,
    Path(booking_code): Path<String>,
    Form(form): Form<ChargeForm>,
) -> Response {
    let card_token = form.omise_token.trim();
    if card_token.is_empty() {
        let currency = state.session(browser).await.currency().load().await;
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            charge_failed(
                &chrome(&state, currency.as_ref()),
                &booking_code,
                "Please enter your card details.",
            ),
        )
            .into_response();
    }

    match state
        .payments
        .charge(&booking_code, form.payment_token.as_deref(), card_token)
        .await
    {
        Ok(ChargeNext::Authorize(uri)) => {
            tracing::info!(%booking_code, "Redirecting to 3-D-Secure");
            Redirect::to(&uri).into_response()
        },
        Ok(ChargeNext::Return) => Redirect::to(&return_url(&booking_code)).into_response(),
        Err(e) => {
            tracing::warn!(%booking_code, error = %e, "Charge failed");
            let currency = state.session(browser).await.currency().load().await;
            let message = format!("{} (reference {correlation_id})", e.user_message());
            (
                StatusCode::BAD_GATEWAY,
                charge_failed(&chrome(&state, currency.as_ref()), &booking_code, &message),
            )
                .into_response()
        },
    }
}

/// Query of the 3-D-Secure callback and the return page.
#[derive(Debug, Deserialize)]
pub struct BookingCodeQuery {
    /// Booking being paid
    pub booking_code: String,
}

/// `GET|POST /payment/3ds-callback`
pub async fn three_ds_callback(
    State(state): State<AppState>,
    Query(query): Query<BookingCodeQuery>,
) -> Redirect {
    state.payments.complete_3ds(&query.booking_code).await;
    Redirect::to(&return_url(&query.booking_code))
}

/// `GET /payment/return`
pub async fn payment_return(
    State(state): State<AppState>,
    browser: BrowserSession,
    Query(query): Query<BookingCodeQuery>,
) -> Response {
    let code = query.booking_code;
    let outcome = state.payments.confirm(&code).await;
    if outcome == PaymentOutcome::Paid {
        return Redirect::to(&confirmation_url(&code)).into_response();
    }

    let currency = state.session(browser).await.currency().load().await;
    let chrome = chrome(&state, currency.as_ref());
    match outcome {
        PaymentOutcome::Failed => payment_failed(&chrome, &code).into_response(),
        PaymentOutcome::StillProcessing | PaymentOutcome::Paid => {
            still_processing(&chrome, &code).into_response()
        },
    }
}

/// `GET /booking/confirmation/:code`
///
/// Ticket details and the voucher are optional extras: either failing only
/// leaves its part of the page out.
///
/// # Errors
///
/// Returns a page error when the booking cannot be loaded.
pub async fn confirmation(
    State(state): State<AppState>,
    browser: BrowserSession,
    Path(booking_code): Path<String>,
) -> PageResult<Html<String>> {
    let session = state.session(browser).await;
    let record = state.api.booking(&booking_code).await?;

    let ticket = async {
        match record.ticket_slug.as_deref() {
            Some(slug) => state
                .api
                .ticket_by_slug(slug)
                .await
                .inspect_err(|e| tracing::warn!(%booking_code, error = %e, "Failed to load ticket"))
                .ok(),
            None => None,
        }
    };
    let voucher = async {
        state
            .api
            .voucher(&booking_code)
            .await
            .inspect_err(|e| tracing::warn!(%booking_code, error = %e, "Failed to load voucher"))
            .ok()
    };
    let (ticket, voucher, currency) = tokio::join!(ticket, voucher, session.currency().load());

    Ok(confirmation_page(
        &chrome(&state, currency.as_ref()),
        &record,
        ticket.as_ref(),
        voucher.as_ref(),
    ))
}
