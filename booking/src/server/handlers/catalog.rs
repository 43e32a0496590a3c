//! Ticket catalog endpoints.
//!
//! - GET /tickets - Ticket cards of the configured event
//! - GET /tickets/:slug - Ticket detail
//! - POST /tickets/:slug/book - Open the booking wizard for a ticket

use super::{chrome, dispatch};
use crate::server::error::PageResult;
use crate::server::state::AppState;
use crate::server::views::catalog::{ticket_detail as detail_page, ticket_list};
use crate::wizard::WizardAction;
use axum::extract::{Path, State};
use axum::response::{Html, Redirect};
use coral_web::BrowserSession;

/// `GET /` sends visitors to the catalog.
#[allow(clippy::unused_async)]
pub async fn index() -> Redirect {
    Redirect::to("/tickets")
}

/// `GET /tickets`
///
/// # Errors
///
/// Returns a page error when the ticket list cannot be loaded.
pub async fn list_tickets(
    State(state): State<AppState>,
    browser: BrowserSession,
) -> PageResult<Html<String>> {
    let session = state.session(browser).await;
    let (tickets, currency) = tokio::join!(
        state.api.tickets(state.config.site.event_id),
        session.currency().load()
    );
    let tickets = tickets?;

    Ok(ticket_list(&chrome(&state, currency.as_ref()), &tickets))
}

/// `GET /tickets/:slug`
///
/// # Errors
///
/// Returns 404 for an unknown slug.
pub async fn ticket_detail(
    State(state): State<AppState>,
    browser: BrowserSession,
    Path(slug): Path<String>,
) -> PageResult<Html<String>> {
    let session = state.session(browser).await;
    let (ticket, currency) = tokio::join!(state.api.ticket_by_slug(&slug), session.currency().load());
    let ticket = ticket?;

    Ok(detail_page(&chrome(&state, currency.as_ref()), &ticket))
}

/// `POST /tickets/:slug/book`
///
/// Starts a fresh draft for the ticket, replacing any previous one.
///
/// # Errors
///
/// Returns a page error when the ticket or the event cannot be loaded.
pub async fn book_ticket(
    State(state): State<AppState>,
    browser: BrowserSession,
    Path(slug): Path<String>,
) -> PageResult<Redirect> {
    let (ticket, event) = tokio::try_join!(
        state.api.ticket_by_slug(&slug),
        state.api.event_details(state.config.site.event_id)
    )?;

    let session = state.session(browser).await;
    tracing::info!(session_id = %browser, ticket = %ticket.slug, "Booking started");
    dispatch(
        &session,
        WizardAction::Start {
            event_id: event.id,
            ticket,
            addons: event.extra_prices,
        },
    )
    .await?;

    Ok(Redirect::to("/booking"))
}
