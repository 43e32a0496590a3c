//! Ticket catalog and ticket detail pages.

use super::{escape, Chrome};
use axum::response::Html;
use coral_api::Ticket;

fn price_line(chrome: &Chrome<'_>, ticket: &Ticket) -> String {
    match ticket.sale_price {
        Some(sale) if sale < ticket.base_price => format!(
            r#"<p class="price"><del>{}</del> <strong>{}</strong></p>"#,
            chrome.money(ticket.base_price),
            chrome.money(sale)
        ),
        _ => format!(
            r#"<p class="price"><strong>{}</strong></p>"#,
            chrome.money(ticket.display_price())
        ),
    }
}

/// Ticket cards.
#[must_use]
pub fn ticket_list(chrome: &Chrome<'_>, tickets: &[Ticket]) -> Html<String> {
    if tickets.is_empty() {
        return chrome.page("Tickets", "<p>No tickets are on sale right now.</p>");
    }

    let cards: String = tickets
        .iter()
        .map(|ticket| {
            let image = ticket
                .image_url
                .as_deref()
                .map(|url| format!(r#"<img src="{}" alt="">"#, escape(url)))
                .unwrap_or_default();
            format!(
                r#"<article class="ticket">{image}<h2><a href="/tickets/{slug}">{title}</a></h2>{price}<p>{guests}</p></article>"#,
                slug = urlencoding::encode(&ticket.slug),
                title = escape(&ticket.title),
                price = price_line(chrome, ticket),
                guests = guest_range(ticket),
            )
        })
        .collect();

    chrome.page("Tickets", &format!(r#"<section class="tickets">{cards}</section>"#))
}

fn guest_range(ticket: &Ticket) -> String {
    format!("{}–{} guests", ticket.min_guest, ticket.max_guest)
}

fn bullet_list(heading: &str, items: &[String]) -> String {
    if items.is_empty() {
        return String::new();
    }
    let items: String = items
        .iter()
        .map(|item| format!("<li>{}</li>", escape(item)))
        .collect();
    format!("<h2>{}</h2><ul>{items}</ul>", escape(heading))
}

/// Ticket detail with time slots and the "Book now" button.
#[must_use]
pub fn ticket_detail(chrome: &Chrome<'_>, ticket: &Ticket) -> Html<String> {
    let slots: String = ticket
        .time_slots
        .iter()
        .filter(|slot| !slot.disabled)
        .map(|slot| {
            format!(
                "<li>{} – adult {}, child {}</li>",
                escape(&slot.label()),
                chrome.money(slot.adult_price),
                chrome.money(slot.child_price)
            )
        })
        .collect();

    let body = format!(
        r#"{description}{price}<p>{guests}</p>
<h2>Time slots</h2><ul>{slots}</ul>
{highlights}{includes}{excludes}
<form method="post" action="/tickets/{slug}/book"><button type="submit">Book now</button></form>"#,
        description = ticket
            .description
            .as_deref()
            .map(|text| format!("<p>{}</p>", escape(text)))
            .unwrap_or_default(),
        price = price_line(chrome, ticket),
        guests = guest_range(ticket),
        highlights = bullet_list("Highlights", &ticket.highlights),
        includes = bullet_list("Included", &ticket.includes),
        excludes = bullet_list("Not included", &ticket.excludes),
        slug = urlencoding::encode(&ticket.slug),
    );

    chrome.page(&ticket.title, &body)
}
