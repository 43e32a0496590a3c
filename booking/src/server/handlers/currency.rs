//! Currency switcher.
//!
//! - POST /currency - Store the display currency of the session

use crate::currency::fetch_preference;
use crate::server::state::AppState;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::Redirect;
use axum::Form;
use coral_web::BrowserSession;
use serde::Deserialize;

/// Form of the header currency select.
#[derive(Debug, Deserialize)]
pub struct CurrencyForm {
    /// ISO currency code
    pub code: String,
}

/// Where to go after switching: the referring page when it belongs to this
/// site, otherwise the catalog.
fn back_to(headers: &HeaderMap, site_url: &str) -> String {
    let referer = headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if let Some(path) = referer.strip_prefix(site_url) {
        if path.starts_with('/') {
            return path.to_string();
        }
    }
    if referer.starts_with('/') && !referer.starts_with("//") {
        return referer.to_string();
    }
    "/tickets".to_string()
}

/// `POST /currency`
///
/// A failed lookup or save keeps the previous preference.
pub async fn set_currency(
    State(state): State<AppState>,
    browser: BrowserSession,
    headers: HeaderMap,
    Form(form): Form<CurrencyForm>,
) -> Redirect {
    let session = state.session(browser).await;
    match fetch_preference(state.api.as_ref(), &form.code).await {
        Ok(preference) => {
            if let Err(e) = session.currency().save(&preference).await {
                tracing::warn!(session_id = %browser, error = %e, "Failed to store currency preference");
            } else {
                tracing::debug!(session_id = %browser, code = preference.code(), "Currency changed");
            }
        },
        Err(e) => {
            tracing::warn!(session_id = %browser, code = %form.code, error = %e, "Failed to switch currency");
        },
    }

    Redirect::to(&back_to(&headers, &state.config.site.url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn referer(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::REFERER, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn same_site_referer_is_followed() {
        let site = "https://coral.example.com";
        assert_eq!(
            back_to(&referer("https://coral.example.com/tickets/sunset-cruise"), site),
            "/tickets/sunset-cruise"
        );
        assert_eq!(back_to(&referer("/booking?month=2025-04"), site), "/booking?month=2025-04");
    }

    #[test]
    fn foreign_or_missing_referer_goes_to_catalog() {
        let site = "https://coral.example.com";
        assert_eq!(back_to(&referer("https://evil.example.net/"), site), "/tickets");
        assert_eq!(back_to(&referer("https://coral.example.com.evil.net/x"), site), "/tickets");
        assert_eq!(back_to(&referer("//evil.example.net/"), site), "/tickets");
        assert_eq!(back_to(&HeaderMap::new(), site), "/tickets");
    }
}
