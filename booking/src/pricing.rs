//! Price derivation for a booking selection.
//!
//! Totals are recomputed from the selection whenever they are needed and are
//! never stored.

use crate::selection::{BookingSelection, SelectedAddOn};
use coral_api::Money;
use serde::Serialize;

/// `adults × adult_price + children × child_price`
#[must_use]
pub fn subtotal(adults: u32, adult_price: Money, children: u32, child_price: Money) -> Money {
    adult_price
        .times(adults)
        .saturating_add(child_price.times(children))
}

/// Sum of `price × quantity` over selected add-ons
#[must_use]
pub fn addon_total<'a>(addons: impl IntoIterator<Item = &'a SelectedAddOn>) -> Money {
    addons.into_iter().map(SelectedAddOn::line_total).sum()
}

/// Totals of a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceBreakdown {
    /// Adults plus children
    pub total_guests: u32,
    /// Guests times unit prices
    pub subtotal: Money,
    /// Selected add-ons
    pub addon_total: Money,
    /// Always zero: there is no discount-code service
    pub coupon_discount: Money,
    /// `subtotal + addon_total - coupon_discount`
    pub grand_total: Money,
}

impl PriceBreakdown {
    /// Derive the totals of `selection`.
    #[must_use]
    pub fn of(selection: &BookingSelection) -> Self {
        let subtotal = subtotal(
            selection.adults,
            selection.adult_price,
            selection.children,
            selection.child_price,
        );
        let addon_total = addon_total(&selection.addons);
        let coupon_discount = Money::ZERO;

        Self {
            total_guests: selection.total_guests(),
            subtotal,
            addon_total,
            coupon_discount,
            grand_total: subtotal
                .saturating_add(addon_total)
                .saturating_sub(coupon_discount),
        }
    }
}
