//! Payment, payment result and booking confirmation pages.

use super::{escape, Chrome};
use crate::config::PaymentConfig;
use axum::response::Html;
use coral_api::{BookingRecord, PaymentToken, Ticket, Voucher};

fn record_summary(chrome: &Chrome<'_>, record: &BookingRecord) -> String {
    let addons: String = record
        .addons
        .iter()
        .map(|addon| {
            format!(
                "<li>{} × {} = {}</li>",
                escape(&addon.name),
                addon.quantity,
                chrome.money(addon.price.times(addon.quantity))
            )
        })
        .collect();
    let addons = if addons.is_empty() {
        String::new()
    } else {
        format!("<dt>Add-ons</dt><dd><ul>{addons}</ul></dd>")
    };

    format!(
        r#"<dl class="booking">
<dt>Booking code</dt><dd><strong>{code}</strong></dd>
<dt>Ticket</dt><dd>{ticket}</dd>
<dt>Date</dt><dd>{date}</dd>
<dt>Time</dt><dd>{time}</dd>
<dt>Guests</dt><dd>{adults} adult(s), {children} child(ren)</dd>
{addons}
<dt>Total</dt><dd>{total}</dd>
</dl>"#,
        code = escape(&record.booking_code),
        ticket = escape(record.ticket_title.as_deref().unwrap_or("Ticket")),
        date = record.booking_date.format("%-d %B %Y"),
        time = escape(record.timeslot.as_deref().unwrap_or("")),
        adults = record.adults,
        children = record.children,
        total = chrome.money(record.grand_total),
    )
}

/// Card form for an unpaid booking.
///
/// The gateway script tokenizes the card in the browser and submits the
/// form with an `omiseToken` field; card numbers never reach this server.
#[must_use]
pub fn payment_page(
    chrome: &Chrome<'_>,
    record: &BookingRecord,
    token: &PaymentToken,
    payment: &PaymentConfig,
) -> Html<String> {
    let action = format!(
        "/payment/{}/charge",
        urlencoding::encode(&record.booking_code)
    );
    let body = format!(
        r#"{summary}
<p>Amount to pay: <strong>{amount}</strong></p>
<form method="post" action="{action}" id="payment-form">
<input type="hidden" name="payment_token" value="{payment_token}">
<script src="{script}"
  data-key="{key}"
  data-amount="{satang}"
  data-currency="{currency}"
  data-button-label="Pay now"
  data-submit-label="Pay"></script>
</form>"#,
        summary = record_summary(chrome, record),
        amount = chrome.money(token.amount),
        action = escape(&action),
        payment_token = escape(&token.token),
        script = escape(&payment.script_url),
        key = escape(&payment.public_key),
        satang = token.amount.satang(),
        currency = escape(&token.currency),
    );
    chrome.page("Payment", &body)
}

/// The charge could not be submitted.
#[must_use]
pub fn charge_failed(chrome: &Chrome<'_>, booking_code: &str, message: &str) -> Html<String> {
    let retry = format!("/payment/{}", urlencoding::encode(booking_code));
    chrome.page(
        "Payment failed",
        &format!(
            r#"<p class="error" role="alert">{}</p><p><a href="{}">Try again</a></p>"#,
            escape(message),
            escape(&retry)
        ),
    )
}

/// The API reported the payment as failed.
#[must_use]
pub fn payment_failed(chrome: &Chrome<'_>, booking_code: &str) -> Html<String> {
    charge_failed(
        chrome,
        booking_code,
        "Your payment was declined. No money has been taken; please try another card.",
    )
}

/// Confirmation attempts ran out before the payment settled.
#[must_use]
pub fn still_processing(chrome: &Chrome<'_>, booking_code: &str) -> Html<String> {
    let refresh = format!(
        "/payment/return?booking_code={}",
        urlencoding::encode(booking_code)
    );
    chrome.page(
        "Payment processing",
        &format!(
            r#"<p>We are still waiting for your bank to confirm payment of booking <strong>{code}</strong>.</p>
<p><a href="{refresh}">Check again</a></p>"#,
            code = escape(booking_code),
            refresh = escape(&refresh),
        ),
    )
}

/// Paid booking with voucher and ticket details.
#[must_use]
pub fn confirmation_page(
    chrome: &Chrome<'_>,
    record: &BookingRecord,
    ticket: Option<&Ticket>,
    voucher: Option<&Voucher>,
) -> Html<String> {
    let voucher = voucher.map_or_else(
        || "<p>Your voucher will be emailed to you shortly.</p>".to_string(),
        |voucher| {
            format!(
                r#"<p><a href="{}" download>Download voucher</a></p>"#,
                escape(&voucher.url)
            )
        },
    );
    let ticket = ticket
        .map(|ticket| {
            let includes: String = ticket
                .includes
                .iter()
                .map(|item| format!("<li>{}</li>", escape(item)))
                .collect();
            if includes.is_empty() {
                String::new()
            } else {
                format!("<h2>What's included</h2><ul>{includes}</ul>")
            }
        })
        .unwrap_or_default();
    let contact = record
        .customer
        .as_ref()
        .map(|customer| {
            format!(
                "<p>A confirmation has been sent to {}.</p>",
                escape(&customer.email)
            )
        })
        .unwrap_or_default();

    let body = format!(
        r#"<p class="status">Status: {status}</p>
{contact}
{summary}
{voucher}
{ticket}
{again}"#,
        status = escape(record.status.as_str()),
        summary = record_summary(chrome, record),
        again = r#"<p><a href="/tickets">Book another trip</a></p>"#,
    );
    chrome.page("Booking confirmed", &body)
}
