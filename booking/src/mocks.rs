//! In-memory fakes for tests.
//!
//! [`FakeBookingApi`] serves a small catalog and records every request;
//! [`RecordingStorage`] counts writes and can be switched to fail.

use crate::storage::{KeyValueStorage, MemoryStorage, StorageError};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use coral_api::{
    ApiError, AvailabilityDay, BookingApi, BookingRecord, BookingStatus, ChargeRequest,
    ChargeResult, CreateBookingRequest, CreatedBooking, CurrencyRate, CustomerSummary,
    EventDetails, ExtraPrice, Money, Nationality, PaymentConfirmation, PaymentToken,
    SignupRequest, SignupResponse, ThreeDsRequest, Ticket, TimeSlot, Voucher,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

fn slot(id: u64, hour: u32, minute: u32, adult: u64, child: u64, disabled: bool) -> TimeSlot {
    TimeSlot {
        id,
        time: NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN),
        adult_price: Money::from_baht(adult),
        child_price: Money::from_baht(child),
        disabled,
    }
}

/// Day trip: 1–4 guests, slots 11 (09:00) and 12 (13:00), slot 13 disabled.
#[must_use]
pub fn sample_ticket() -> Ticket {
    Ticket {
        id: 3,
        title: "Coral Island Day Trip".to_string(),
        slug: "coral-island-day-trip".to_string(),
        base_price: Money::from_baht(1500),
        sale_price: Some(Money::from_baht(1200)),
        min_guest: 1,
        max_guest: 4,
        time_slots: vec![
            slot(11, 9, 0, 500, 250, false),
            slot(12, 13, 0, 600, 300, false),
            slot(13, 16, 0, 600, 300, true),
        ],
        description: Some("Speedboat to Koh Larn with beach time.".to_string()),
        image_url: None,
        highlights: vec!["Speedboat transfer".to_string()],
        includes: vec!["Hotel pickup".to_string()],
        excludes: vec!["Beach chairs".to_string()],
    }
}

/// Sunset cruise: 2–6 guests, one slot (21, 17:30), no add-ons.
#[must_use]
pub fn sample_cruise() -> Ticket {
    Ticket {
        id: 5,
        title: "Sunset Cruise".to_string(),
        slug: "sunset-cruise".to_string(),
        base_price: Money::from_baht(800),
        sale_price: None,
        min_guest: 2,
        max_guest: 6,
        time_slots: vec![slot(21, 17, 30, 800, 400, false)],
        description: None,
        image_url: None,
        highlights: Vec::new(),
        includes: Vec::new(),
        excludes: Vec::new(),
    }
}

/// Lunch (100 THB, day trip only) and parasailing (another ticket).
#[must_use]
pub fn sample_extras() -> Vec<ExtraPrice> {
    vec![
        ExtraPrice {
            id: 100,
            name: "Seafood lunch".to_string(),
            description: Some("Buffet on the beach".to_string()),
            price: Money::from_baht(100),
            ticket_ids: vec![3],
        },
        ExtraPrice {
            id: 101,
            name: "Parasailing".to_string(),
            description: None,
            price: Money::from_baht(600),
            ticket_ids: vec![9],
        },
    ]
}

/// Event 1 with [`sample_extras`].
#[must_use]
pub fn sample_event() -> EventDetails {
    EventDetails {
        id: 1,
        name: "Coral Island Pattaya".to_string(),
        description: None,
        extra_prices: sample_extras(),
    }
}

/// Stored unpaid booking of the day trip.
#[must_use]
pub fn sample_record(code: &str) -> BookingRecord {
    BookingRecord {
        booking_code: code.to_string(),
        status: BookingStatus::Unpaid,
        ticket_id: 3,
        ticket_slug: Some("coral-island-day-trip".to_string()),
        ticket_title: Some("Coral Island Day Trip".to_string()),
        booking_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap_or(NaiveDate::MIN),
        timeslot: Some("09:00".to_string()),
        adults: 2,
        children: 1,
        addons: Vec::new(),
        grand_total: Money::from_baht(1250),
        customer: Some(CustomerSummary {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "jane@example.com".to_string(),
            phone: Some("+66812345678".to_string()),
        }),
    }
}

#[derive(Debug)]
struct FakeState {
    event: EventDetails,
    tickets: Vec<Ticket>,
    availability: HashMap<u64, Vec<AvailabilityDay>>,
    availability_error: Option<ApiError>,
    nationalities: Vec<Nationality>,
    signup: Result<SignupResponse, ApiError>,
    booking: Result<CreatedBooking, ApiError>,
    records: HashMap<String, BookingRecord>,
    voucher_error: Option<ApiError>,
    rates: HashMap<String, f64>,
    confirmations: HashMap<String, VecDeque<Result<BookingStatus, ApiError>>>,
    charge: Result<ChargeResult, ApiError>,
    calls: Vec<&'static str>,
    signups: Vec<SignupRequest>,
    created: Vec<CreateBookingRequest>,
    charges: Vec<ChargeRequest>,
    three_ds: Vec<ThreeDsRequest>,
}

/// In-memory [`BookingApi`] serving the sample catalog.
#[derive(Debug)]
pub struct FakeBookingApi {
    state: Mutex<FakeState>,
}

impl Default for FakeBookingApi {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBookingApi {
    /// Catalog of [`sample_event`], [`sample_ticket`] and [`sample_cruise`].
    ///
    /// Signup returns customer 42, bookings are created as `CIP-0001`, and
    /// payments confirm as `paid` on the first probe.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                event: sample_event(),
                tickets: vec![sample_ticket(), sample_cruise()],
                availability: HashMap::new(),
                availability_error: None,
                nationalities: vec![
                    Nationality {
                        id: 66,
                        name: "Thai".to_string(),
                        code: Some("TH".to_string()),
                    },
                    Nationality {
                        id: 44,
                        name: "British".to_string(),
                        code: Some("GB".to_string()),
                    },
                ],
                signup: Ok(SignupResponse {
                    id: 42,
                    customer_id: None,
                }),
                booking: Ok(CreatedBooking {
                    booking_id: 1,
                    booking_code: "CIP-0001".to_string(),
                    status: BookingStatus::Unpaid,
                    total: Money::ZERO,
                }),
                records: HashMap::new(),
                voucher_error: None,
                rates: HashMap::from([("USD".to_string(), 0.028)]),
                confirmations: HashMap::new(),
                charge: Ok(ChargeResult {
                    charge_id: Some("chrg_test".to_string()),
                    status: Some("successful".to_string()),
                    authorize_uri: None,
                }),
                calls: Vec::new(),
                signups: Vec::new(),
                created: Vec::new(),
                charges: Vec::new(),
                three_ds: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: &'static str) -> MutexGuard<'_, FakeState> {
        let mut state = self.lock();
        state.calls.push(call);
        state
    }

    /// Serve `days` for a ticket.
    #[must_use]
    pub fn with_availability(self, ticket_id: u64, days: Vec<AvailabilityDay>) -> Self {
        self.lock().availability.insert(ticket_id, days);
        self
    }

    /// Fail every availability request.
    #[must_use]
    pub fn failing_availability(self, error: ApiError) -> Self {
        self.lock().availability_error = Some(error);
        self
    }

    /// Answer signups with `response`.
    #[must_use]
    pub fn with_signup(self, response: Result<SignupResponse, ApiError>) -> Self {
        self.lock().signup = response;
        self
    }

    /// Answer booking creation with `response`.
    #[must_use]
    pub fn with_created_booking(self, response: Result<CreatedBooking, ApiError>) -> Self {
        self.lock().booking = response;
        self
    }

    /// Serve a stored booking.
    #[must_use]
    pub fn with_record(self, record: BookingRecord) -> Self {
        self.lock()
            .records
            .insert(record.booking_code.clone(), record);
        self
    }

    /// Fail voucher lookups.
    #[must_use]
    pub fn failing_voucher(self, error: ApiError) -> Self {
        self.lock().voucher_error = Some(error);
        self
    }

    /// Answer successive confirmation probes of `code`; the last answer repeats.
    #[must_use]
    pub fn with_confirmations(
        self,
        code: &str,
        answers: Vec<Result<BookingStatus, ApiError>>,
    ) -> Self {
        self.lock()
            .confirmations
            .insert(code.to_string(), answers.into());
        self
    }

    /// Answer charges with `response`.
    #[must_use]
    pub fn with_charge(self, response: Result<ChargeResult, ApiError>) -> Self {
        self.lock().charge = response;
        self
    }

    /// Names of the operations called, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }

    /// Number of calls to one operation.
    #[must_use]
    pub fn call_count(&self, name: &str) -> usize {
        self.lock().calls.iter().filter(|call| **call == name).count()
    }

    /// Signup requests received.
    #[must_use]
    pub fn signups(&self) -> Vec<SignupRequest> {
        self.lock().signups.clone()
    }

    /// Booking requests received.
    #[must_use]
    pub fn created_bookings(&self) -> Vec<CreateBookingRequest> {
        self.lock().created.clone()
    }

    /// Charge requests received.
    #[must_use]
    pub fn charges(&self) -> Vec<ChargeRequest> {
        self.lock().charges.clone()
    }

    /// 3-D-Secure completions received.
    #[must_use]
    pub fn three_ds_requests(&self) -> Vec<ThreeDsRequest> {
        self.lock().three_ds.clone()
    }
}

fn not_found(what: &str) -> ApiError {
    ApiError::NotFound {
        message: Some(format!("{what} not found")),
    }
}

#[async_trait]
impl BookingApi for FakeBookingApi {
    async fn event_details(&self, event_id: u64) -> Result<EventDetails, ApiError> {
        let state = self.record("event_details");
        if state.event.id == event_id {
            Ok(state.event.clone())
        } else {
            Err(not_found("Event"))
        }
    }

    async fn tickets(&self, _event_id: u64) -> Result<Vec<Ticket>, ApiError> {
        Ok(self.record("tickets").tickets.clone())
    }

    async fn ticket_by_slug(&self, slug: &str) -> Result<Ticket, ApiError> {
        self.record("ticket_by_slug")
            .tickets
            .iter()
            .find(|ticket| ticket.slug == slug)
            .cloned()
            .ok_or_else(|| not_found("Ticket"))
    }

    async fn availability(
        &self,
        ticket_id: u64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<AvailabilityDay>, ApiError> {
        let state = self.record("availability");
        if let Some(error) = &state.availability_error {
            return Err(error.clone());
        }
        Ok(state
            .availability
            .get(&ticket_id)
            .map(|days| {
                days.iter()
                    .filter(|day| day.date >= start_date && day.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn nationalities(&self) -> Result<Vec<Nationality>, ApiError> {
        Ok(self.record("nationalities").nationalities.clone())
    }

    async fn signup(&self, request: &SignupRequest) -> Result<SignupResponse, ApiError> {
        let mut state = self.record("signup");
        state.signups.push(request.clone());
        state.signup.clone()
    }

    async fn create_booking(
        &self,
        request: &CreateBookingRequest,
    ) -> Result<CreatedBooking, ApiError> {
        let mut state = self.record("create_booking");
        state.created.push(request.clone());
        state.booking.clone().map(|mut created| {
            created.total = request.grand_total;
            created
        })
    }

    async fn booking(&self, booking_code: &str) -> Result<BookingRecord, ApiError> {
        self.record("booking")
            .records
            .get(booking_code)
            .cloned()
            .ok_or_else(|| not_found("Booking"))
    }

    async fn voucher(&self, booking_code: &str) -> Result<Voucher, ApiError> {
        let state = self.record("voucher");
        if let Some(error) = &state.voucher_error {
            return Err(error.clone());
        }
        Ok(Voucher {
            url: format!("https://vouchers.example.com/{booking_code}.pdf"),
        })
    }

    async fn currency_rate(&self, code: &str) -> Result<CurrencyRate, ApiError> {
        self.record("currency_rate")
            .rates
            .get(code)
            .map(|rate| CurrencyRate {
                code: code.to_string(),
                exchange_rate: *rate,
            })
            .ok_or_else(|| not_found("Currency"))
    }

    async fn create_payment_token(&self, booking_code: &str) -> Result<PaymentToken, ApiError> {
        let state = self.record("payment_token");
        let amount = state
            .records
            .get(booking_code)
            .map_or(Money::ZERO, |record| record.grand_total);
        Ok(PaymentToken {
            token: format!("pt_{booking_code}"),
            amount,
            currency: "THB".to_string(),
        })
    }

    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeResult, ApiError> {
        let mut state = self.record("charge");
        state.charges.push(request.clone());
        state.charge.clone()
    }

    async fn charge_3ds(&self, request: &ThreeDsRequest) -> Result<ChargeResult, ApiError> {
        let mut state = self.record("charge_3ds");
        state.three_ds.push(request.clone());
        state.charge.clone()
    }

    async fn confirm_payment(&self, booking_code: &str) -> Result<PaymentConfirmation, ApiError> {
        let mut state = self.record("confirm_payment");
        let answer = match state.confirmations.get_mut(booking_code) {
            Some(answers) if answers.len() > 1 => answers.pop_front(),
            Some(answers) => answers.front().cloned(),
            None => Some(Ok(BookingStatus::Paid)),
        };

        match answer {
            Some(Ok(status)) => Ok(PaymentConfirmation {
                booking_code: booking_code.to_string(),
                status,
            }),
            Some(Err(error)) => Err(error),
            None => Err(not_found("Booking")),
        }
    }
}

/// Memory storage that counts writes and can be made to fail.
#[derive(Debug, Default)]
pub struct RecordingStorage {
    inner: MemoryStorage,
    writes: AtomicUsize,
    failing: AtomicBool,
}

impl RecordingStorage {
    /// Working storage with no writes recorded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail (or succeed again).
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Successful `set_item` calls so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StorageError::Connection("storage disabled".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KeyValueStorage for RecordingStorage {
    async fn get_item(&self, namespace: &str, key: &str) -> Result<Option<String>, StorageError> {
        self.check()?;
        self.inner.get_item(namespace, key).await
    }

    async fn set_item(&self, namespace: &str, key: &str, value: &str) -> Result<(), StorageError> {
        self.check()?;
        self.inner.set_item(namespace, key, value).await?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove_item(&self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.check()?;
        self.inner.remove_item(namespace, key).await
    }

    async fn ping(&self) -> Result<(), StorageError> {
        self.check()
    }

    fn backend(&self) -> &'static str {
        "recording"
    }
}
