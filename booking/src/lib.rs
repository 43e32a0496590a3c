//! Coral Island Pattaya booking site.
//!
//! A server-rendered booking site over a remote catalog, booking and payment
//! API. Visitors browse tickets, build a booking in a three-step wizard, enter
//! their details at checkout and pay by card.
//!
//! # Architecture
//!
//! ```text
//! Browser ──► axum handlers ──► WizardAction ──► Store<WizardState, WizardReducer>
//!                 │                                   │
//!                 │                                   ├─► SelectionStore ──► KeyValueStorage
//!                 │                                   └─► BookingApi::availability
//!                 │
//!                 ├─► CheckoutService ──► signup + create_booking
//!                 └─► PaymentService ───► charge / 3-D-Secure / confirmation poll
//! ```
//!
//! # Key Features
//!
//! ## 1. Wizard as a Reducer
//!
//! Every wizard guard (past dates, closed dates, guest caps, add-on limits,
//! step order) lives in [`wizard::WizardReducer`] and is tested without HTTP.
//!
//! ## 2. Drafts Survive Reloads
//!
//! The in-progress [`selection::BookingSelection`] is mirrored to per-session
//! storage (memory or Redis) and restored when a session is mounted again.
//!
//! ## 3. Confirmation Poll Decides
//!
//! Inline card results are never trusted; the payment return page polls the
//! API until the booking is paid, failed, or attempts run out.
//!
//! # Usage
//!
//! See the [`server`] module for the router and the `server` binary for
//! startup.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod availability;
pub mod checkout;
pub mod config;
pub mod currency;
pub mod metrics;
#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;
pub mod payment;
pub mod pricing;
pub mod selection;
pub mod server;
pub mod session;
pub mod storage;
pub mod wizard;

pub use config::Config;
pub use selection::{BookingSelection, SelectionStore};
pub use server::{build_router, AppState};
pub use session::SessionRegistry;
pub use wizard::{WizardAction, WizardReducer, WizardState};
