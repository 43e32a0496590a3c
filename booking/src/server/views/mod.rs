//! Server-rendered HTML.
//!
//! Pages are plain semantic HTML built from strings. Every value that did
//! not originate in this module goes through [`escape`].

pub mod catalog;
pub mod checkout;
pub mod payment;
pub mod wizard;

use crate::currency::{display, CurrencyPreference};
use axum::response::Html;
use coral_api::Money;

/// Currencies offered in the header switcher.
pub const SELECTABLE_CURRENCIES: &[&str] = &[
    "THB", "USD", "EUR", "GBP", "AUD", "SGD", "CNY", "JPY", "KRW", "INR", "MYR", "RUB",
];

/// Escape text for HTML content and attribute values.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Per-request rendering context.
#[derive(Debug, Clone, Copy)]
pub struct Chrome<'a> {
    /// Site name for titles and the header
    pub site_name: &'a str,
    /// Session currency
    pub currency: Option<&'a CurrencyPreference>,
}

impl Chrome<'_> {
    /// Amount in the session currency, escaped.
    #[must_use]
    pub fn money(&self, amount: Money) -> String {
        escape(&display(amount, self.currency))
    }

    /// Wrap `body` in the site layout.
    #[must_use]
    pub fn page(&self, title: &str, body: &str) -> Html<String> {
        let selected = self.currency.map_or("THB", CurrencyPreference::code);
        let options: String = SELECTABLE_CURRENCIES
            .iter()
            .map(|code| {
                let mark = if *code == selected { " selected" } else { "" };
                format!(r#"<option value="{code}"{mark}>{code}</option>"#)
            })
            .collect();

        Html(format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | {site}</title>
</head>
<body>
<header>
<a href="/tickets">{site}</a>
<form method="post" action="/currency">
<label>Currency <select name="code">{options}</select></label>
<button type="submit">Change</button>
</form>
</header>
<main>
<h1>{title}</h1>
{body}
</main>
</body>
</html>"#,
            title = escape(title),
            site = escape(self.site_name),
        ))
    }
}

/// Standalone error page.
#[must_use]
pub fn error_page(title: &str, message: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>{title}</title></head>
<body>
<main>
<h1>{title}</h1>
<p class="error">{message}</p>
<p><a href="/tickets">Back to tickets</a></p>
</main>
</body>
</html>"#,
        title = escape(title),
        message = escape(message),
    ))
}

/// Hidden-input-plus-button form posting to `action`.
#[must_use]
pub fn button_form(action: &str, fields: &[(&str, &str)], label: &str, disabled: bool) -> String {
    let hidden: String = fields
        .iter()
        .map(|(name, value)| {
            format!(
                r#"<input type="hidden" name="{}" value="{}">"#,
                escape(name),
                escape(value)
            )
        })
        .collect();
    let disabled = if disabled { " disabled" } else { "" };
    format!(
        r#"<form method="post" action="{}" class="inline">{hidden}<button type="submit"{disabled}>{}</button></form>"#,
        escape(action),
        escape(label)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn layout_marks_session_currency() {
        let usd = CurrencyPreference::new("usd", 0.028).ok();
        let chrome = Chrome {
            site_name: "Coral <Island>",
            currency: usd.as_ref(),
        };

        let Html(html) = chrome.page("Tickets", "<p>body</p>");

        assert!(html.contains(r#"<option value="USD" selected>"#));
        assert!(html.contains("Coral &lt;Island&gt;"));
        assert!(html.contains("<p>body</p>"));
        assert_eq!(chrome.money(Money::from_baht(1000)), "$28.00");
    }
}
