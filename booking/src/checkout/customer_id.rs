//! Customer id returned by signup.
//!
//! Signup answers with the numeric record id and sometimes an extra
//! `customer_id` string that may be base64 of the number or the number
//! itself. The booking must reference the decoded value when there is one.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Resolve the id to book under: base64 number, then plain number, then
/// the server's record id.
#[must_use]
pub fn decode_customer_id(customer_id: Option<&str>, server_id: u64) -> u64 {
    let Some(raw) = customer_id.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return server_id;
    };

    if let Some(id) = STANDARD
        .decode(raw)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .and_then(|text| parse_id(&text))
    {
        return id;
    }

    parse_id(raw).unwrap_or_else(|| {
        tracing::debug!(customer_id = raw, server_id, "Unrecognised customer id, using server id");
        server_id
    })
}

/// A positive integer in plain `u64` syntax, surrounding whitespace
/// allowed.
///
/// A leading numeric prefix (`"12abc"`) is not an id, and neither is `0`;
/// both fall through to the next candidate.
fn parse_id(text: &str) -> Option<u64> {
    text.trim().parse::<u64>().ok().filter(|id| *id > 0)
}
