//! Actions of the booking wizard.

use crate::availability::Month;
use crate::selection::BookingSelection;
use crate::wizard::types::WizardStep;
use chrono::NaiveDate;
use coral_api::{AvailabilityDay, ExtraPrice, Ticket};

/// Everything that can happen to the wizard.
///
/// User actions come from the booking page; `MonthLoaded` and `MonthFailed`
/// are fed back by the availability fetch effect.
#[derive(Debug, Clone, PartialEq)]
pub enum WizardAction {
    /// Open the wizard for a ticket with a fresh draft.
    Start {
        /// Event the ticket belongs to
        event_id: u64,
        /// Chosen ticket
        ticket: Ticket,
        /// All add-ons of the event; only eligible ones are offered
        addons: Vec<ExtraPrice>,
    },

    /// Resume a persisted draft.
    Restore {
        /// Draft loaded from storage
        selection: BookingSelection,
    },

    /// Choose the visit date.
    SelectDate {
        /// Visit date
        date: NaiveDate,
    },

    /// Choose a time slot on the chosen date.
    SelectTimeslot {
        /// Slot id
        timeslot_id: u64,
    },

    /// One more adult.
    IncrementAdults,

    /// One adult fewer.
    DecrementAdults,

    /// One more child.
    IncrementChildren,

    /// One child fewer.
    DecrementChildren,

    /// Set an add-on quantity.
    SetAddonQuantity {
        /// Add-on id
        addon_id: u64,
        /// Requested units
        quantity: u32,
    },

    /// Select an add-on with one unit, or deselect it.
    ToggleAddon {
        /// Add-on id
        addon_id: u64,
    },

    /// Next step.
    Advance,

    /// Previous step.
    Retreat,

    /// Go to a step.
    JumpTo {
        /// Target step
        step: WizardStep,
    },

    /// Hand the draft to checkout.
    ProceedToCheckout,

    /// Drop the draft and return to the catalog.
    BackToTickets,

    /// Fetch a calendar month of availability.
    LoadMonth {
        /// Month to fetch
        month: Month,
    },

    /// A month was fetched.
    MonthLoaded {
        /// Fetched month
        month: Month,
        /// Days returned by the API
        days: Vec<AvailabilityDay>,
    },

    /// A month could not be fetched.
    MonthFailed {
        /// Month that failed
        month: Month,
        /// Error description
        error: String,
    },

    /// Forget the current warning.
    DismissWarning,
}

impl WizardAction {
    /// Metric label.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::Restore { .. } => "restore",
            Self::SelectDate { .. } => "select_date",
            Self::SelectTimeslot { .. } => "select_timeslot",
            Self::IncrementAdults => "increment_adults",
            Self::DecrementAdults => "decrement_adults",
            Self::IncrementChildren => "increment_children",
            Self::DecrementChildren => "decrement_children",
            Self::SetAddonQuantity { .. } => "set_addon_quantity",
            Self::ToggleAddon { .. } => "toggle_addon",
            Self::Advance => "advance",
            Self::Retreat => "retreat",
            Self::JumpTo { .. } => "jump_to",
            Self::ProceedToCheckout => "proceed_to_checkout",
            Self::BackToTickets => "back_to_tickets",
            Self::LoadMonth { .. } => "load_month",
            Self::MonthLoaded { .. } => "month_loaded",
            Self::MonthFailed { .. } => "month_failed",
            Self::DismissWarning => "dismiss_warning",
        }
    }

    /// Whether the customer triggered the action (as opposed to an effect).
    ///
    /// A user action replaces any warning left by the previous one.
    #[must_use]
    pub const fn is_user_action(&self) -> bool {
        !matches!(
            self,
            Self::Restore { .. }
                | Self::LoadMonth { .. }
                | Self::MonthLoaded { .. }
                | Self::MonthFailed { .. }
        )
    }
}
