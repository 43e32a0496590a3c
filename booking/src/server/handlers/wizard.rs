//! Booking wizard endpoints.
//!
//! - GET /booking - Current step; `?month=YYYY-MM` shows that calendar month
//! - POST /booking - One wizard action, then redirect
//! - GET /api/booking/selection - Draft and totals as JSON

use super::{chrome, dispatch};
use crate::availability::Month;
use crate::pricing::PriceBreakdown;
use crate::selection::BookingSelection;
use crate::server::error::PageResult;
use crate::server::state::AppState;
use crate::server::views::wizard::booking_page;
use crate::wizard::{WizardAction, WizardState, WizardStep, WizardWarning};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Form, Json};
use chrono::NaiveDate;
use coral_web::{AppError, BrowserSession};
use serde::{Deserialize, Serialize};

/// Query of `GET /booking`.
#[derive(Debug, Default, Deserialize)]
pub struct BookingQuery {
    /// Calendar month to show, `YYYY-MM`
    #[serde(default)]
    pub month: Option<String>,
}

/// `GET /booking`
///
/// Without a draft the visitor is sent back to the catalog. A warning left
/// by the previous action is rendered once and then dismissed.
///
/// # Errors
///
/// Returns a page error if the session's wizard store is shutting down.
pub async fn show_booking(
    State(state): State<AppState>,
    browser: BrowserSession,
    Query(query): Query<BookingQuery>,
) -> PageResult<Response> {
    let session = state.session(browser).await;
    let Some(draft_date) = session
        .wizard()
        .state(|s| s.selection.as_ref().map(|selection| selection.booking_date))
        .await
    else {
        return Ok(Redirect::to("/tickets").into_response());
    };

    let today = state.clock.today();
    let current = Month::containing(today);
    let month = query
        .month
        .as_deref()
        .and_then(|raw| raw.parse::<Month>().ok())
        .or_else(|| draft_date.map(Month::containing))
        .map_or(current, |month| month.max(current));

    dispatch(&session, WizardAction::LoadMonth { month }).await?;

    let wizard: WizardState = session.wizard().state(Clone::clone).await;
    let Some(selection) = wizard.selection.as_ref() else {
        return Ok(Redirect::to("/tickets").into_response());
    };
    let currency = session.currency().load().await;
    let page = booking_page(&chrome(&state, currency.as_ref()), &wizard, selection, month, today);

    if wizard.warning.is_some() {
        session.wizard().send(WizardAction::DismissWarning).await?;
    }

    Ok(page.into_response())
}

/// Form of `POST /booking`: an action name plus its parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WizardForm {
    /// Action name, as in [`WizardAction::name`]
    pub action: String,
    /// `YYYY-MM-DD` for `select_date`
    pub date: Option<String>,
    /// Slot id for `select_timeslot`
    pub timeslot_id: Option<String>,
    /// Add-on id for `set_addon_quantity` and `toggle_addon`
    pub addon_id: Option<String>,
    /// Units for `set_addon_quantity`
    pub quantity: Option<String>,
    /// Step name for `jump_to`
    pub step: Option<String>,
    /// `YYYY-MM` for `load_month`
    pub month: Option<String>,
}

fn field<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, AppError> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::bad_request(format!("Missing field {name}")))
}

fn number<T: std::str::FromStr>(value: Option<&str>, name: &str) -> Result<T, AppError> {
    field(value, name)?
        .parse()
        .map_err(|_| AppError::bad_request(format!("Invalid {name}")))
}

impl WizardForm {
    /// Action described by the form.
    ///
    /// Only customer actions are accepted; effect feedback such as
    /// `month_loaded` cannot be posted.
    ///
    /// # Errors
    ///
    /// Returns a 400 [`AppError`] for an unknown action or a missing or
    /// malformed parameter.
    pub fn to_action(&self) -> Result<WizardAction, AppError> {
        let action = match self.action.as_str() {
            "select_date" => {
                let raw = field(self.date.as_deref(), "date")?;
                let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| AppError::bad_request("Invalid date"))?;
                WizardAction::SelectDate { date }
            },
            "select_timeslot" => WizardAction::SelectTimeslot {
                timeslot_id: number(self.timeslot_id.as_deref(), "timeslot_id")?,
            },
            "increment_adults" => WizardAction::IncrementAdults,
            "decrement_adults" => WizardAction::DecrementAdults,
            "increment_children" => WizardAction::IncrementChildren,
            "decrement_children" => WizardAction::DecrementChildren,
            "set_addon_quantity" => WizardAction::SetAddonQuantity {
                addon_id: number(self.addon_id.as_deref(), "addon_id")?,
                quantity: number(self.quantity.as_deref(), "quantity")?,
            },
            "toggle_addon" => WizardAction::ToggleAddon {
                addon_id: number(self.addon_id.as_deref(), "addon_id")?,
            },
            "advance" => WizardAction::Advance,
            "retreat" => WizardAction::Retreat,
            "jump_to" => WizardAction::JumpTo {
                step: field(self.step.as_deref(), "step")?
                    .parse::<WizardStep>()
                    .map_err(AppError::bad_request)?,
            },
            "proceed_to_checkout" => WizardAction::ProceedToCheckout,
            "back_to_tickets" => WizardAction::BackToTickets,
            "load_month" => WizardAction::LoadMonth {
                month: number(self.month.as_deref(), "month")?,
            },
            "dismiss_warning" => WizardAction::DismissWarning,
            other => return Err(AppError::bad_request(format!("Unknown action {other:?}"))),
        };
        Ok(action)
    }
}

/// `POST /booking`
///
/// # Errors
///
/// Returns 400 for a malformed form, or a page error if the wizard store is
/// shutting down.
pub async fn submit_booking(
    State(state): State<AppState>,
    browser: BrowserSession,
    Form(form): Form<WizardForm>,
) -> PageResult<Redirect> {
    let action = form.to_action()?;
    let session = state.session(browser).await;

    let proceeding = matches!(action, WizardAction::ProceedToCheckout);
    let leaving = matches!(action, WizardAction::BackToTickets);
    dispatch(&session, action).await?;

    let target = if leaving {
        "/tickets"
    } else if proceeding && session.wizard().state(|s| s.checkout_ready).await {
        "/checkout"
    } else {
        "/booking"
    };
    Ok(Redirect::to(target))
}

/// Body of `GET /api/booking/selection`.
#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    /// Current draft, if any
    pub selection: Option<BookingSelection>,
    /// Totals of the draft
    pub prices: Option<PriceBreakdown>,
    /// Active step
    pub step: WizardStep,
    /// Steps of the flow for this ticket
    pub steps: &'static [WizardStep],
    /// Pending warning
    pub warning: Option<WizardWarning>,
}

/// `GET /api/booking/selection`
pub async fn selection_json(
    State(state): State<AppState>,
    browser: BrowserSession,
) -> Json<SelectionResponse> {
    let session = state.session(browser).await;
    let response = session
        .wizard()
        .state(|s| SelectionResponse {
            selection: s.selection.clone(),
            prices: s.prices(),
            step: s.step,
            steps: s.steps(),
            warning: s.warning,
        })
        .await;
    Json(response)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(action: &str) -> WizardForm {
        WizardForm {
            action: action.to_string(),
            ..WizardForm::default()
        }
    }

    #[test]
    fn maps_actions_with_parameters() {
        let select = WizardForm {
            date: Some("2025-03-05".to_string()),
            ..form("select_date")
        };
        assert_eq!(
            select.to_action().unwrap(),
            WizardAction::SelectDate {
                date: NaiveDate::from_ymd_opt(2025, 3, 5).unwrap()
            }
        );

        let quantity = WizardForm {
            addon_id: Some("100".to_string()),
            quantity: Some(" 2 ".to_string()),
            ..form("set_addon_quantity")
        };
        assert_eq!(
            quantity.to_action().unwrap(),
            WizardAction::SetAddonQuantity {
                addon_id: 100,
                quantity: 2
            }
        );

        let jump = WizardForm {
            step: Some("datetime".to_string()),
            ..form("jump_to")
        };
        assert_eq!(
            jump.to_action().unwrap(),
            WizardAction::JumpTo {
                step: WizardStep::DateTime
            }
        );
    }

    #[test]
    fn rejects_feedback_and_malformed_actions() {
        assert!(form("month_loaded").to_action().is_err());
        assert!(form("select_timeslot").to_action().is_err());

        let bad = WizardForm {
            timeslot_id: Some("eleven".to_string()),
            ..form("select_timeslot")
        };
        assert_eq!(
            bad.to_action().unwrap_err().status(),
            axum::http::StatusCode::BAD_REQUEST
        );
    }
}
