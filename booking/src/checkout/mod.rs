//! Checkout: customer details, signup and booking creation.
//!
//! The flow is a plain async procedure rather than a reducer. Each step
//! either succeeds or stops the flow with a [`CheckoutError`]; payment
//! starts only once a booking code exists.

pub mod customer_id;
pub mod form;
pub mod service;

pub use customer_id::decode_customer_id;
pub use form::{CustomerForm, CustomerInfo, FieldError, ValidationErrors};
pub use service::{booking_request, CheckoutError, CheckoutReceipt, CheckoutService};
