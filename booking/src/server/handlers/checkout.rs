//! Checkout endpoints.
//!
//! - GET /checkout - Customer form next to the order summary
//! - POST /checkout - Sign the customer up and create the booking

use super::{chrome, dispatch};
use crate::checkout::{CheckoutError, CustomerForm, ValidationErrors};
use crate::server::error::PageResult;
use crate::server::state::AppState;
use crate::server::views::checkout::{checkout_page, CheckoutPage};
use crate::wizard::WizardAction;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use coral_api::Nationality;
use coral_web::{BrowserSession, ClientIp};

async fn nationalities(state: &AppState) -> Vec<Nationality> {
    match state.api.nationalities().await {
        Ok(nationalities) => nationalities,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load nationalities");
            Vec::new()
        },
    }
}

/// `GET /checkout`
///
/// Reads the persisted draft, so the page also works after a reload or
/// direct navigation. A missing draft goes back to the catalog and an
/// incomplete one back to the wizard.
pub async fn show_checkout(State(state): State<AppState>, browser: BrowserSession) -> Response {
    let session = state.session(browser).await;
    let Some(selection) = session.selection().current().await else {
        return Redirect::to("/tickets").into_response();
    };
    if !selection.is_complete() {
        return Redirect::to("/booking").into_response();
    }

    let (nationalities, currency) = tokio::join!(nationalities(&state), session.currency().load());
    let page = CheckoutPage {
        nationalities: &nationalities,
        ..CheckoutPage::default()
    };
    checkout_page(&chrome(&state, currency.as_ref()), &selection, &page).into_response()
}

/// `POST /checkout`
///
/// On success the draft is cleared and the browser moves on to payment.
/// Failures re-render the form: 422 with field messages for invalid input,
/// 502 with the API's message when signup or booking creation failed.
///
/// # Errors
///
/// Returns a page error if the wizard store is shutting down.
pub async fn submit_checkout(
    State(state): State<AppState>,
    browser: BrowserSession,
    ClientIp(client_ip): ClientIp,
    Form(form): Form<CustomerForm>,
) -> PageResult<Response> {
    let session = state.session(browser).await;
    let Some(selection) = session.selection().current().await else {
        return Ok(Redirect::to("/tickets").into_response());
    };

    let error = match state.checkout.confirm_booking(&selection, &form).await {
        Ok(receipt) => {
            tracing::info!(
                session_id = %browser,
                %client_ip,
                booking_code = %receipt.booking_code,
                "Checkout completed"
            );
            dispatch(&session, WizardAction::BackToTickets).await?;
            let target = format!("/payment/{}", urlencoding::encode(&receipt.booking_code));
            return Ok(Redirect::to(&target).into_response());
        },
        Err(CheckoutError::IncompleteSelection) => {
            return Ok(Redirect::to("/booking").into_response());
        },
        Err(e) => e,
    };

    tracing::debug!(session_id = %browser, %client_ip, reason = error.reason(), "Re-rendering checkout");
    let (status, errors) = match &error {
        CheckoutError::Validation(errors) => (StatusCode::UNPROCESSABLE_ENTITY, errors.clone()),
        _ => (StatusCode::BAD_GATEWAY, ValidationErrors::default()),
    };
    let (nationalities, currency) = tokio::join!(nationalities(&state), session.currency().load());
    let page = CheckoutPage {
        form,
        errors,
        message: Some(error.user_message()),
        nationalities: &nationalities,
    };

    Ok((
        status,
        checkout_page(&chrome(&state, currency.as_ref()), &selection, &page),
    )
        .into_response())
}
