//! # Coral Island Booking API Client
//!
//! Typed client for the remote REST API behind the booking site: the event
//! and ticket catalog, per-date availability, customer signup, booking
//! records, currency rates and card payments.
//!
//! ## Example
//!
//! ```no_run
//! use coral_api::{ApiClient, ApiConfig, BookingApi};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ApiClient::new(ApiConfig::new("https://api.example.com/api/v1", "token"))?;
//!
//!     for ticket in client.tickets(1).await? {
//!         println!("{} from {} THB", ticket.title, ticket.display_price());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - Bearer-token authentication and a fixed request timeout
//! - `{success, message, data}` envelope handling
//! - Schema validation of every payload at the boundary
//! - Exact money arithmetic in satang

pub mod client;
pub mod error;
pub mod money;
pub mod types;

// Re-export main types for convenience
pub use client::{parse_envelope, ApiClient, ApiConfig, BookingApi, DEFAULT_TIMEOUT};
pub use error::{ApiError, GENERIC_ERROR_MESSAGE};
pub use money::Money;
pub use types::{
    AvailabilityDay, BookedAddOn, BookingAddOn, BookingRecord, BookingStatus, ChargeRequest,
    ChargeResult, CreateBookingRequest, CreatedBooking, CurrencyRate, CustomerSummary,
    EventDetails, ExtraPrice, Nationality, PaymentConfirmation, PaymentToken, SignupRequest,
    SignupResponse, ThreeDsRequest, Ticket, TicketTypeAvailability, TimeSlot, Voucher,
};
