//! The in-progress booking and its per-session persistence.
//!
//! A [`BookingSelection`] is the working draft a customer builds in the
//! wizard. [`SelectionStore`] keeps the current draft in memory and mirrors
//! every change to the session's storage under `booking_selection`, so the
//! draft survives reloads, direct navigation to `/checkout`, and eviction of
//! the in-memory session.

use crate::storage::{SessionStorage, KEY_BOOKING_SELECTION};
use chrono::NaiveDate;
use coral_api::{ExtraPrice, Money, Ticket, TimeSlot};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// An add-on offered with the chosen ticket, with the customer's choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedAddOn {
    /// Add-on id
    pub id: u64,
    /// Display name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Unit price
    pub price: Money,
    /// Kept equal to `quantity > 0`
    pub selected: bool,
    /// Units, at most the number of guests
    pub quantity: u32,
}

impl SelectedAddOn {
    /// An unselected add-on.
    #[must_use]
    pub fn offered(extra: &ExtraPrice) -> Self {
        Self {
            id: extra.id,
            name: extra.name.clone(),
            description: extra.description.clone(),
            price: extra.price,
            selected: false,
            quantity: 0,
        }
    }

    /// Set the quantity and keep `selected` in sync.
    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
        self.selected = quantity > 0;
    }

    /// Price times quantity when selected.
    #[must_use]
    pub fn line_total(&self) -> Money {
        if self.selected {
            self.price.times(self.quantity)
        } else {
            Money::ZERO
        }
    }
}

/// The wizard's working draft of a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingSelection {
    /// Event the ticket belongs to
    pub event_id: u64,
    /// Chosen ticket
    pub ticket: Ticket,
    /// Visit date
    #[serde(default)]
    pub booking_date: Option<NaiveDate>,
    /// Chosen time slot
    #[serde(default)]
    pub timeslot_id: Option<u64>,
    /// `HH:MM` label of the chosen slot
    #[serde(default)]
    pub timeslot_label: Option<String>,
    /// Adults
    pub adults: u32,
    /// Children
    pub children: u32,
    /// Price per adult for the chosen slot and date
    pub adult_price: Money,
    /// Price per child for the chosen slot and date
    pub child_price: Money,
    /// Add-ons eligible for the ticket
    #[serde(default)]
    pub addons: Vec<SelectedAddOn>,
}

impl BookingSelection {
    /// Empty draft for a ticket, offering the add-ons that apply to it.
    #[must_use]
    pub fn new(event_id: u64, ticket: Ticket, extras: &[ExtraPrice]) -> Self {
        let addons = extras
            .iter()
            .filter(|extra| extra.applies_to(ticket.id))
            .map(SelectedAddOn::offered)
            .collect();

        Self {
            event_id,
            ticket,
            booking_date: None,
            timeslot_id: None,
            timeslot_label: None,
            adults: 0,
            children: 0,
            adult_price: Money::ZERO,
            child_price: Money::ZERO,
            addons,
        }
    }

    /// Adults plus children.
    #[must_use]
    pub const fn total_guests(&self) -> u32 {
        self.adults.saturating_add(self.children)
    }

    /// Date, time slot and at least one adult are chosen.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.booking_date.is_some() && self.timeslot_id.is_some() && self.adults > 0
    }

    /// Add-on by id.
    #[must_use]
    pub fn addon(&self, id: u64) -> Option<&SelectedAddOn> {
        self.addons.iter().find(|addon| addon.id == id)
    }

    /// Add-ons the customer picked.
    pub fn selected_addons(&self) -> impl Iterator<Item = &SelectedAddOn> {
        self.addons.iter().filter(|addon| addon.selected)
    }

    /// Take the slot's id, label and prices.
    pub fn apply_timeslot(&mut self, slot: &TimeSlot) {
        self.timeslot_id = Some(slot.id);
        self.timeslot_label = Some(slot.label());
        self.adult_price = slot.adult_price;
        self.child_price = slot.child_price;
    }

    /// Forget the chosen slot and its prices.
    pub fn clear_timeslot(&mut self) {
        self.timeslot_id = None;
        self.timeslot_label = None;
        self.adult_price = Money::ZERO;
        self.child_price = Money::ZERO;
    }

    /// Lower add-on quantities above the guest total.
    pub fn clamp_addons(&mut self) {
        let total = self.total_guests();
        for addon in &mut self.addons {
            if addon.quantity > total {
                addon.set_quantity(total);
            }
        }
    }

    /// Shallow-merge a patch; returns `true` if anything changed.
    pub fn apply(&mut self, patch: &SelectionPatch) -> bool {
        let before = self.clone();

        if let Some(date) = patch.booking_date {
            self.booking_date = Some(date);
        }
        if let Some(id) = patch.timeslot_id {
            self.timeslot_id = Some(id);
        }
        if let Some(label) = &patch.timeslot_label {
            self.timeslot_label = Some(label.clone());
        }
        if let Some(adults) = patch.adults {
            self.adults = adults;
        }
        if let Some(children) = patch.children {
            self.children = children;
        }
        if let Some(price) = patch.adult_price {
            self.adult_price = price;
        }
        if let Some(price) = patch.child_price {
            self.child_price = price;
        }
        if let Some(addons) = &patch.addons {
            self.addons.clone_from(addons);
        }

        *self != before
    }
}

/// Fields to overwrite in a [`BookingSelection`]; `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionPatch {
    /// New visit date
    pub booking_date: Option<NaiveDate>,
    /// New slot id
    pub timeslot_id: Option<u64>,
    /// New slot label
    pub timeslot_label: Option<String>,
    /// New adult count
    pub adults: Option<u32>,
    /// New child count
    pub children: Option<u32>,
    /// New adult price
    pub adult_price: Option<Money>,
    /// New child price
    pub child_price: Option<Money>,
    /// New add-on list
    pub addons: Option<Vec<SelectedAddOn>>,
}

impl SelectionPatch {
    /// Returns `true` if the patch sets nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Current draft of one browser session, mirrored to storage.
///
/// Storage failures are logged and never reach the caller; the draft keeps
/// working in memory for the rest of the session.
#[derive(Debug)]
pub struct SelectionStore {
    storage: SessionStorage,
    current: RwLock<Option<BookingSelection>>,
}

impl SelectionStore {
    /// Load the persisted draft.
    ///
    /// A corrupt entry is deleted and the store starts empty.
    pub async fn mount(storage: SessionStorage) -> Self {
        let current = match storage.get(KEY_BOOKING_SELECTION).await {
            Ok(Some(raw)) => match serde_json::from_str::<BookingSelection>(&raw) {
                Ok(selection) => Some(selection),
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding unreadable booking selection");
                    if let Err(e) = storage.remove(KEY_BOOKING_SELECTION).await {
                        tracing::warn!(error = %e, "Failed to delete unreadable booking selection");
                    }
                    None
                },
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Booking selection storage unavailable");
                None
            },
        };

        Self {
            storage,
            current: RwLock::new(current),
        }
    }

    /// Current draft.
    pub async fn current(&self) -> Option<BookingSelection> {
        self.current.read().await.clone()
    }

    /// Replace the draft and persist it.
    pub async fn set(&self, selection: BookingSelection) {
        let mut current = self.current.write().await;
        self.persist(&selection).await;
        *current = Some(selection);
    }

    /// Merge `patch` into the draft and persist it.
    ///
    /// Does nothing when there is no draft or the patch changes nothing.
    /// Returns `true` if the draft changed.
    pub async fn update(&self, patch: &SelectionPatch) -> bool {
        let mut current = self.current.write().await;
        let Some(selection) = current.as_mut() else {
            return false;
        };

        if !selection.apply(patch) {
            return false;
        }

        let snapshot = selection.clone();
        self.persist(&snapshot).await;
        true
    }

    /// Drop the draft in memory and in storage.
    pub async fn clear(&self) {
        let mut current = self.current.write().await;
        *current = None;
        if let Err(e) = self.storage.remove(KEY_BOOKING_SELECTION).await {
            tracing::warn!(error = %e, "Failed to delete booking selection");
        }
    }

    async fn persist(&self, selection: &BookingSelection) {
        let encoded = match serde_json::to_string(selection) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode booking selection");
                return;
            },
        };

        if let Err(e) = self.storage.set(KEY_BOOKING_SELECTION, &encoded).await {
            tracing::warn!(error = %e, "Failed to persist booking selection");
        }
    }
}
