//! Checkout page: customer details next to the order summary.

use super::wizard::totals;
use super::{escape, Chrome};
use crate::checkout::{CustomerForm, ValidationErrors};
use crate::pricing::PriceBreakdown;
use crate::selection::BookingSelection;
use axum::response::Html;
use coral_api::Nationality;

/// What the checkout page shows besides the draft.
#[derive(Debug, Default)]
pub struct CheckoutPage<'a> {
    /// Values to prefill
    pub form: CustomerForm,
    /// Field problems from the last submit
    pub errors: ValidationErrors,
    /// Error not tied to a field
    pub message: Option<String>,
    /// Options of the nationality select
    pub nationalities: &'a [Nationality],
}

fn text_field(
    name: &str,
    label: &str,
    kind: &str,
    value: &str,
    errors: &ValidationErrors,
) -> String {
    let error = errors
        .get(name)
        .map(|message| format!(r#"<span class="field-error">{}</span>"#, escape(message)))
        .unwrap_or_default();
    let invalid = if error.is_empty() { "" } else { r#" aria-invalid="true""# };
    format!(
        r#"<label>{label} <input type="{kind}" name="{name}" value="{value}"{invalid}></label>{error}"#,
        label = escape(label),
        value = escape(value),
    )
}

fn nationality_field(page: &CheckoutPage<'_>) -> String {
    let options: String = page
        .nationalities
        .iter()
        .map(|nationality| {
            let id = nationality.id.to_string();
            let selected = if id == page.form.nationality_id { " selected" } else { "" };
            format!(
                r#"<option value="{id}"{selected}>{}</option>"#,
                escape(&nationality.name)
            )
        })
        .collect();
    let error = page
        .errors
        .get("nationality_id")
        .map(|message| format!(r#"<span class="field-error">{}</span>"#, escape(message)))
        .unwrap_or_default();
    format!(
        r#"<label>Nationality <select name="nationality_id"><option value="">Select…</option>{options}</select></label>{error}"#
    )
}

/// Render the checkout page.
#[must_use]
pub fn checkout_page(chrome: &Chrome<'_>, selection: &BookingSelection, page: &CheckoutPage<'_>) -> Html<String> {
    let form = &page.form;
    let message = page
        .message
        .as_deref()
        .map(|message| format!(r#"<p class="error" role="alert">{}</p>"#, escape(message)))
        .unwrap_or_default();

    let visit = format!(
        "{} · {} · {}",
        selection
            .booking_date
            .map(|date| date.format("%-d %B %Y").to_string())
            .unwrap_or_default(),
        selection.timeslot_label.as_deref().unwrap_or(""),
        guests_label(selection),
    );

    let body = format!(
        r#"{message}
<section class="order">
<h2>{ticket}</h2>
<p>{visit}</p>
{totals}
</section>
<form method="post" action="/checkout" class="customer">
{first}
{last}
{email}
{phone}
{nationality}
<label>Special request <textarea name="special_request">{special}</textarea></label>
<button type="submit">Confirm booking</button>
</form>
<p><a href="/booking">Back to booking</a></p>"#,
        ticket = escape(&selection.ticket.title),
        visit = escape(&visit),
        totals = totals(chrome, &PriceBreakdown::of(selection)),
        first = text_field("first_name", "First name", "text", &form.first_name, &page.errors),
        last = text_field("last_name", "Last name", "text", &form.last_name, &page.errors),
        email = text_field("email", "Email", "email", &form.email, &page.errors),
        phone = text_field("phone", "Phone", "tel", &form.phone, &page.errors),
        nationality = nationality_field(page),
        special = escape(&form.special_request),
    );

    chrome.page("Checkout", &body)
}

fn guests_label(selection: &BookingSelection) -> String {
    match selection.children {
        0 => format!("{} adult(s)", selection.adults),
        children => format!("{} adult(s), {children} child(ren)", selection.adults),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{sample_extras, sample_ticket};

    #[test]
    fn field_errors_are_shown_and_values_kept() {
        let selection = BookingSelection::new(1, sample_ticket(), &sample_extras());
        let form = CustomerForm {
            first_name: "<Jane>".to_string(),
            email: "not-an-email".to_string(),
            ..CustomerForm::default()
        };
        let errors = form.validate().err().unwrap_or_default();
        let nationalities = [Nationality {
            id: 66,
            name: "Thai".to_string(),
            code: Some("TH".to_string()),
        }];
        let page = CheckoutPage {
            form,
            errors,
            message: None,
            nationalities: &nationalities,
        };
        let chrome = Chrome {
            site_name: "Coral Island",
            currency: None,
        };

        let Html(html) = checkout_page(&chrome, &selection, &page);

        assert!(html.contains(r#"value="&lt;Jane&gt;""#));
        assert!(html.contains("Please enter a valid email address"));
        assert!(html.contains("Last name is required"));
        assert!(html.contains(r#"<option value="66">Thai</option>"#));
    }
}
