//! Booking wizard page.
//!
//! Every control is a small form posting an action name to `/booking`;
//! month navigation is a plain link to `/booking?month=YYYY-MM`.

use super::{button_form, escape, Chrome};
use crate::availability::Month;
use crate::pricing::PriceBreakdown;
use crate::selection::BookingSelection;
use crate::wizard::{WizardState, WizardStep};
use axum::response::Html;
use chrono::{Datelike, NaiveDate};

const ACTION: &str = "/booking";

/// Render the wizard for a session.
#[must_use]
pub fn booking_page(
    chrome: &Chrome<'_>,
    state: &WizardState,
    selection: &BookingSelection,
    month: Month,
    today: NaiveDate,
) -> Html<String> {
    let warning = state
        .warning
        .map(|warning| {
            format!(
                r#"<p class="warning" role="alert">{}</p>"#,
                escape(&warning.to_string())
            )
        })
        .unwrap_or_default();

    let step_body = match state.step {
        WizardStep::DateTime => date_time_step(chrome, state, selection, month, today),
        WizardStep::AddOns => addons_step(chrome, selection),
        WizardStep::Summary => summary_step(chrome, selection),
    };

    let body = format!(
        r#"<h2>{ticket}</h2>
{progress}
{warning}
<section class="step step-{step}"><h3>{title}</h3>{step_body}</section>
{totals}
{nav}"#,
        ticket = escape(&selection.ticket.title),
        progress = progress(state),
        step = state.step.as_str(),
        title = escape(state.step.title()),
        totals = totals(chrome, &PriceBreakdown::of(selection)),
        nav = navigation(state),
    );

    chrome.page("Book your trip", &body)
}

fn progress(state: &WizardState) -> String {
    let current = state.step_index();
    let items: String = state
        .steps()
        .iter()
        .enumerate()
        .map(|(index, step)| {
            if index < current {
                format!(
                    "<li>{}</li>",
                    button_form(ACTION, &[("action", "jump_to"), ("step", step.as_str())], step.title(), false)
                )
            } else if index == current {
                format!(r#"<li aria-current="step"><strong>{}</strong></li>"#, escape(step.title()))
            } else {
                format!("<li>{}</li>", escape(step.title()))
            }
        })
        .collect();
    format!(r#"<ol class="progress">{items}</ol>"#)
}

fn date_time_step(
    chrome: &Chrome<'_>,
    state: &WizardState,
    selection: &BookingSelection,
    month: Month,
    today: NaiveDate,
) -> String {
    format!(
        "{calendar}{slots}{guests}",
        calendar = calendar(state, selection, month, today),
        slots = time_slots(chrome, state, selection),
        guests = guests(selection),
    )
}

fn calendar(state: &WizardState, selection: &BookingSelection, month: Month, today: NaiveDate) -> String {
    let availability = &state.availability;
    let status = if availability.is_loading(month) {
        r#"<p class="loading">Loading availability…</p>"#
    } else {
        ""
    };

    let previous = if month.previous() < Month::containing(today) {
        String::new()
    } else {
        format!(r#"<a href="/booking?month={}" rel="prev">‹ Previous</a>"#, month.previous())
    };
    let next = format!(r#"<a href="/booking?month={}" rel="next">Next ›</a>"#, month.next());

    let lead = month.first_day().weekday().num_days_from_monday();
    let mut cells: Vec<String> = (0..lead).map(|_| "<td></td>".to_string()).collect();
    for day in month.days() {
        let label = day.day().to_string();
        let iso = day.format("%Y-%m-%d").to_string();
        let closed = day < today || availability.is_blocked(day);
        let cell = if selection.booking_date == Some(day) {
            format!(r#"<td class="selected"><strong>{label}</strong></td>"#)
        } else if closed {
            format!(r#"<td class="closed"><span aria-disabled="true">{label}</span></td>"#)
        } else {
            format!(
                "<td>{}</td>",
                button_form(ACTION, &[("action", "select_date"), ("date", &iso)], &label, false)
            )
        };
        cells.push(cell);
    }

    let rows: String = cells
        .chunks(7)
        .map(|week| format!("<tr>{}</tr>", week.concat()))
        .collect();

    format!(
        r#"<div class="calendar">
<nav>{previous} <span>{title}</span> {next}</nav>
{status}
<table><thead><tr><th>Mo</th><th>Tu</th><th>We</th><th>Th</th><th>Fr</th><th>Sa</th><th>Su</th></tr></thead>
<tbody>{rows}</tbody></table>
</div>"#,
        title = month.first_day().format("%B %Y"),
    )
}

fn time_slots(chrome: &Chrome<'_>, state: &WizardState, selection: &BookingSelection) -> String {
    let Some(date) = selection.booking_date else {
        return "<p>Select a date to see the time slots.</p>".to_string();
    };

    let slots = state
        .availability
        .effective_slots(selection.ticket.id, date, &selection.ticket.time_slots);
    if slots.is_empty() {
        return "<p>No time slots on this date.</p>".to_string();
    }

    let items: String = slots
        .iter()
        .map(|slot| {
            let prices = format!(
                "adult {}, child {}",
                chrome.money(slot.adult_price),
                chrome.money(slot.child_price)
            );
            if selection.timeslot_id == Some(slot.id) {
                format!(
                    r#"<li class="selected"><strong>{}</strong> {prices}</li>"#,
                    escape(&slot.label())
                )
            } else {
                let id = slot.id.to_string();
                format!(
                    "<li>{} {prices}</li>",
                    button_form(
                        ACTION,
                        &[("action", "select_timeslot"), ("timeslot_id", &id)],
                        &slot.label(),
                        slot.disabled
                    )
                )
            }
        })
        .collect();

    format!(r#"<ul class="timeslots">{items}</ul>"#)
}

fn guests(selection: &BookingSelection) -> String {
    let ticket = &selection.ticket;
    let no_slot = selection.timeslot_id.is_none();
    let full = selection.total_guests() >= ticket.max_guest;

    let counter = |label: &str, count: u32, decrement: &str, increment: &str, at_min: bool| {
        format!(
            r#"<div class="counter"><span>{label}</span>{minus}<output>{count}</output>{plus}</div>"#,
            minus = button_form(ACTION, &[("action", decrement)], "−", no_slot || at_min),
            plus = button_form(ACTION, &[("action", increment)], "+", no_slot || full),
        )
    };

    format!(
        r#"<div class="guests">{adults}{children}<p>Up to {max} guests, at least {min} adult(s).</p></div>"#,
        adults = counter(
            "Adults",
            selection.adults,
            "decrement_adults",
            "increment_adults",
            selection.adults <= ticket.min_guest
        ),
        children = counter(
            "Children",
            selection.children,
            "decrement_children",
            "increment_children",
            selection.children == 0
        ),
        max = ticket.max_guest,
        min = ticket.min_guest,
    )
}

fn addons_step(chrome: &Chrome<'_>, selection: &BookingSelection) -> String {
    let guests = selection.total_guests();
    let items: String = selection
        .addons
        .iter()
        .map(|addon| {
            let id = addon.id.to_string();
            let toggle_label = if addon.selected { "Remove" } else { "Add" };
            let quantity = if addon.selected {
                let fewer = addon.quantity.saturating_sub(1).to_string();
                let more = (addon.quantity + 1).to_string();
                format!(
                    "{}<output>{}</output>{}",
                    button_form(
                        ACTION,
                        &[("action", "set_addon_quantity"), ("addon_id", &id), ("quantity", &fewer)],
                        "−",
                        false
                    ),
                    addon.quantity,
                    button_form(
                        ACTION,
                        &[("action", "set_addon_quantity"), ("addon_id", &id), ("quantity", &more)],
                        "+",
                        addon.quantity >= guests
                    ),
                )
            } else {
                String::new()
            };

            format!(
                r#"<li class="addon"><h4>{name}</h4>{description}<p>{price} each</p>{toggle}{quantity}</li>"#,
                name = escape(&addon.name),
                description = addon
                    .description
                    .as_deref()
                    .map(|text| format!("<p>{}</p>", escape(text)))
                    .unwrap_or_default(),
                price = chrome.money(addon.price),
                toggle = button_form(ACTION, &[("action", "toggle_addon"), ("addon_id", &id)], toggle_label, false),
            )
        })
        .collect();

    format!(r#"<ul class="addons">{items}</ul>"#)
}

fn summary_step(chrome: &Chrome<'_>, selection: &BookingSelection) -> String {
    let date = selection
        .booking_date
        .map(|date| date.format("%A, %-d %B %Y").to_string())
        .unwrap_or_default();
    let addons: String = selection
        .selected_addons()
        .map(|addon| {
            format!(
                "<li>{} × {} = {}</li>",
                escape(&addon.name),
                addon.quantity,
                chrome.money(addon.line_total())
            )
        })
        .collect();

    format!(
        r#"<dl class="summary">
<dt>Date</dt><dd>{date}</dd>
<dt>Time</dt><dd>{time}</dd>
<dt>Adults</dt><dd>{adults} × {adult_price}</dd>
<dt>Children</dt><dd>{children} × {child_price}</dd>
</dl>
{addons}"#,
        date = escape(&date),
        time = escape(selection.timeslot_label.as_deref().unwrap_or("")),
        adults = selection.adults,
        adult_price = chrome.money(selection.adult_price),
        children = selection.children,
        child_price = chrome.money(selection.child_price),
        addons = if addons.is_empty() {
            String::new()
        } else {
            format!("<h4>Add-ons</h4><ul>{addons}</ul>")
        },
    )
}

/// Price table shared with the checkout page.
#[must_use]
pub fn totals(chrome: &Chrome<'_>, prices: &PriceBreakdown) -> String {
    let discount = if prices.coupon_discount.is_zero() {
        String::new()
    } else {
        format!("<tr><th>Discount</th><td>−{}</td></tr>", chrome.money(prices.coupon_discount))
    };
    format!(
        r#"<table class="totals">
<tr><th>Guests</th><td>{guests}</td></tr>
<tr><th>Subtotal</th><td>{subtotal}</td></tr>
<tr><th>Add-ons</th><td>{addons}</td></tr>
{discount}
<tr class="grand"><th>Total</th><td>{grand}</td></tr>
</table>"#,
        guests = prices.total_guests,
        subtotal = chrome.money(prices.subtotal),
        addons = chrome.money(prices.addon_total),
        grand = chrome.money(prices.grand_total),
    )
}

fn navigation(state: &WizardState) -> String {
    let back = if state.step_index() == 0 {
        button_form(ACTION, &[("action", "back_to_tickets")], "Back to tickets", false)
    } else {
        button_form(ACTION, &[("action", "retreat")], "Back", false)
    };
    let forward = if state.step == WizardStep::Summary {
        button_form(ACTION, &[("action", "proceed_to_checkout")], "Proceed to checkout", false)
    } else {
        button_form(ACTION, &[("action", "advance")], "Continue", !state.can_proceed(state.step))
    };
    format!(r#"<nav class="wizard-nav">{back}{forward}</nav>"#)
}
