//! State of the booking wizard.

use crate::availability::AvailabilityCache;
use crate::pricing::PriceBreakdown;
use crate::selection::BookingSelection;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wizard steps in their fixed order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum WizardStep {
    /// Date, time slot and guests
    #[default]
    DateTime,
    /// Optional add-ons
    AddOns,
    /// Review before checkout
    Summary,
}

impl WizardStep {
    /// Form and URL name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DateTime => "datetime",
            Self::AddOns => "addons",
            Self::Summary => "summary",
        }
    }

    /// Heading shown above the step.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::DateTime => "Date & Time",
            Self::AddOns => "Add-ons",
            Self::Summary => "Summary",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WizardStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "datetime" => Ok(Self::DateTime),
            "addons" => Ok(Self::AddOns),
            "summary" => Ok(Self::Summary),
            other => Err(format!("unknown wizard step {other:?}")),
        }
    }
}

/// Why an action was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WizardWarning {
    /// No ticket chosen yet
    NoTicket,
    /// Date lies before today
    DateInPast,
    /// Date is closed
    DateUnavailable,
    /// Pick a date before a slot
    SelectDateFirst,
    /// Slot unknown or disabled on the chosen date
    TimeslotUnavailable,
    /// Pick a slot before changing guests
    SelectTimeslotFirst,
    /// Guest cap reached
    MaxGuestsReached {
        /// Ticket's guest cap
        max: u32,
    },
    /// Adult minimum reached
    MinAdultsReached {
        /// Ticket's adult minimum
        min: u32,
    },
    /// No children to remove
    NoChildren,
    /// Add-on not offered with the ticket
    UnknownAddOn,
    /// Add-on quantity above the guest total
    AddOnLimit {
        /// Guest total
        max: u32,
    },
    /// Current step is missing a date, slot or adult
    StepIncomplete,
    /// Step cannot be reached from the current one
    StepUnreachable,
    /// Checkout is only reachable from the summary
    NotOnSummary,
}

impl fmt::Display for WizardWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTicket => f.write_str("Please choose a ticket first."),
            Self::DateInPast => f.write_str("Please choose a date from today onwards."),
            Self::DateUnavailable => f.write_str("This date is not available. Please choose another date."),
            Self::SelectDateFirst => f.write_str("Please select a date first."),
            Self::TimeslotUnavailable => f.write_str("This time slot is not available on the selected date."),
            Self::SelectTimeslotFirst => f.write_str("Please select a time slot first."),
            Self::MaxGuestsReached { max } => write!(f, "Maximum {max} guests per booking."),
            Self::MinAdultsReached { min } => write!(f, "At least {min} adult(s) required."),
            Self::NoChildren => f.write_str("There are no children to remove."),
            Self::UnknownAddOn => f.write_str("This add-on is not available for the selected ticket."),
            Self::AddOnLimit { max } => {
                write!(f, "Add-on quantity cannot exceed the number of guests ({max}).")
            },
            Self::StepIncomplete => f.write_str("Please select a date, time slot and at least one adult."),
            Self::StepUnreachable => f.write_str("Please complete the current step first."),
            Self::NotOnSummary => f.write_str("Please review your booking before checking out."),
        }
    }
}

/// Wizard state of one browser session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WizardState {
    /// Active step
    pub step: WizardStep,
    /// Working copy of the draft
    pub selection: Option<BookingSelection>,
    /// Availability of the chosen ticket
    pub availability: AvailabilityCache,
    /// Refusal to show on the next render
    pub warning: Option<WizardWarning>,
    /// Draft handed to checkout
    pub checkout_ready: bool,
}

impl WizardState {
    /// Empty wizard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Active steps: add-ons are skipped when the ticket offers none.
    #[must_use]
    pub fn steps(&self) -> &'static [WizardStep] {
        let has_addons = self
            .selection
            .as_ref()
            .is_some_and(|selection| !selection.addons.is_empty());

        if has_addons {
            &[WizardStep::DateTime, WizardStep::AddOns, WizardStep::Summary]
        } else {
            &[WizardStep::DateTime, WizardStep::Summary]
        }
    }

    /// Whether `step` allows moving forward.
    #[must_use]
    pub fn can_proceed(&self, step: WizardStep) -> bool {
        match step {
            WizardStep::DateTime => self
                .selection
                .as_ref()
                .is_some_and(BookingSelection::is_complete),
            WizardStep::AddOns | WizardStep::Summary => true,
        }
    }

    /// Position of the active step in [`Self::steps`].
    #[must_use]
    pub fn step_index(&self) -> usize {
        self.steps()
            .iter()
            .position(|step| *step == self.step)
            .unwrap_or(0)
    }

    /// Totals of the draft.
    #[must_use]
    pub fn prices(&self) -> Option<PriceBreakdown> {
        self.selection.as_ref().map(PriceBreakdown::of)
    }
}
