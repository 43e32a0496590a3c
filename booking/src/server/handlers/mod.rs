//! HTTP handlers of the booking site.
//!
//! Page handlers follow post/redirect/get: a `POST` turns the form into an
//! action or a service call and answers with `303 See Other`; the next `GET`
//! renders whatever state resulted.

pub mod catalog;
pub mod checkout;
pub mod currency;
pub mod ops;
pub mod payment;
pub mod wizard;

use crate::currency::CurrencyPreference;
use crate::server::error::PageError;
use crate::server::state::AppState;
use crate::server::views::Chrome;
use crate::session::BookingSession;
use crate::wizard::WizardAction;
use std::time::Duration;

/// Longest a request waits for the effects of a wizard action.
pub const EFFECT_WAIT: Duration = Duration::from_secs(10);

fn chrome<'a>(state: &'a AppState, currency: Option<&'a CurrencyPreference>) -> Chrome<'a> {
    Chrome {
        site_name: &state.config.site.name,
        currency,
    }
}

/// Send `action` to the session's wizard and wait for its effects.
///
/// Effects still running after [`EFFECT_WAIT`] keep running; the page then
/// renders the state reached so far.
async fn dispatch(session: &BookingSession, action: WizardAction) -> Result<(), PageError> {
    let name = action.name();
    let mut handle = session.wizard().send(action).await?;
    if handle.wait_with_timeout(EFFECT_WAIT).await.is_err() {
        tracing::warn!(
            session_id = %session.id(),
            action = name,
            pending = handle.pending(),
            "Wizard effects still running"
        );
    }
    Ok(())
}
