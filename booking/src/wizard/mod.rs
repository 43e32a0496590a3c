//! Booking wizard.
//!
//! A three-step flow (`datetime → addons → summary`) over one
//! [`BookingSelection`](crate::selection::BookingSelection). The add-ons step
//! is skipped for tickets without eligible add-ons.
//!
//! # Architecture
//!
//! ```text
//! POST /booking ──► WizardAction ──► Store<WizardState, ..., WizardReducer>
//!                                        │
//!                                        ├─► persist effect ──► SelectionStore
//!                                        └─► month effect ────► BookingApi::availability
//!                                                                   │
//!                                    MonthLoaded / MonthFailed ◄────┘
//! ```
//!
//! The reducer is pure apart from the effects it returns, so every guard is
//! testable without HTTP or storage.

pub mod actions;
pub mod environment;
pub mod reducer;
pub mod types;

#[cfg(test)]
mod tests;

pub use actions::WizardAction;
pub use environment::WizardEnvironment;
pub use reducer::WizardReducer;
pub use types::{WizardState, WizardStep, WizardWarning};

/// Runtime store driving one session's wizard.
pub type WizardStore =
    coral_runtime::Store<WizardState, WizardAction, WizardEnvironment, WizardReducer>;
