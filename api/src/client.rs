//! Booking API client implementation

use crate::{
    error::ApiError,
    types::{
        AvailabilityDay, BookingRecord, ChargeRequest, ChargeResult, CreateBookingRequest,
        CreatedBooking, CurrencyRate, Envelope, ErrorBody, EventDetails, Nationality,
        PaymentConfirmation, PaymentToken, SignupRequest, SignupResponse, ThreeDsRequest, Ticket,
        Validate, Voucher,
    },
};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Operations of the remote catalog, booking and payment API.
///
/// Implemented by [`ApiClient`] over HTTP and by in-memory fakes in tests.
#[async_trait]
pub trait BookingApi: Send + Sync {
    /// Event details including its add-ons.
    async fn event_details(&self, event_id: u64) -> Result<EventDetails, ApiError>;

    /// Tickets sold for an event.
    async fn tickets(&self, event_id: u64) -> Result<Vec<Ticket>, ApiError>;

    /// Ticket by URL slug.
    async fn ticket_by_slug(&self, slug: &str) -> Result<Ticket, ApiError>;

    /// Per-date availability of a ticket between two dates, inclusive.
    async fn availability(
        &self,
        ticket_id: u64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<AvailabilityDay>, ApiError>;

    /// Nationalities offered on the checkout form.
    async fn nationalities(&self) -> Result<Vec<Nationality>, ApiError>;

    /// Register the customer placing a booking.
    async fn signup(&self, request: &SignupRequest) -> Result<SignupResponse, ApiError>;

    /// Create a booking.
    async fn create_booking(&self, request: &CreateBookingRequest)
        -> Result<CreatedBooking, ApiError>;

    /// Booking by code.
    async fn booking(&self, booking_code: &str) -> Result<BookingRecord, ApiError>;

    /// Voucher download link of a booking.
    async fn voucher(&self, booking_code: &str) -> Result<Voucher, ApiError>;

    /// Exchange rate from THB to a currency.
    async fn currency_rate(&self, code: &str) -> Result<CurrencyRate, ApiError>;

    /// Prepare a payment session for a booking.
    async fn create_payment_token(&self, booking_code: &str) -> Result<PaymentToken, ApiError>;

    /// Charge a card token.
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeResult, ApiError>;

    /// Complete a charge after 3-D-Secure authentication.
    async fn charge_3ds(&self, request: &ThreeDsRequest) -> Result<ChargeResult, ApiError>;

    /// Current payment status of a booking.
    async fn confirm_payment(&self, booking_code: &str) -> Result<PaymentConfirmation, ApiError>;
}

/// Connection settings for [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL including the version prefix, e.g. `https://api.example.com/api/v1`
    pub base_url: String,
    /// Bearer token
    pub token: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ApiConfig {
    /// Create settings with the default timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// HTTP client for the booking API
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    token: String,
    base_url: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidConfig` if the base URL is empty or the
    /// HTTP client cannot be built.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ApiError::InvalidConfig("base URL is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            token: config.token,
            base_url,
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.get(self.url(path)))
    }

    fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> RequestBuilder {
        self.authorize(self.client.post(self.url(path)).json(body))
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header(reqwest::header::ACCEPT, "application/json");
        if self.token.is_empty() {
            builder
        } else {
            builder.bearer_auth(&self.token)
        }
    }

    /// Send a request, record metrics, and unwrap the response envelope.
    async fn execute<T>(&self, endpoint: &'static str, request: RequestBuilder) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Validate,
    {
        let start = Instant::now();
        let result = Self::send_and_parse(request).await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        metrics::counter!(
            "coral_api_requests_total",
            "endpoint" => endpoint,
            "outcome" => outcome
        )
        .increment(1);
        metrics::histogram!("coral_api_request_duration_seconds", "endpoint" => endpoint)
            .record(start.elapsed().as_secs_f64());

        match &result {
            Ok(_) => tracing::debug!(endpoint, "API request succeeded"),
            Err(e) => tracing::warn!(endpoint, error = %e, "API request failed"),
        }

        result
    }

    async fn send_and_parse<T>(request: RequestBuilder) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Validate,
    {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout
            } else {
                ApiError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout
            } else {
                ApiError::Network(e.to_string())
            }
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message);
            return Err(match status {
                StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
                StatusCode::NOT_FOUND => ApiError::NotFound { message },
                other => ApiError::Status {
                    status: other.as_u16(),
                    message,
                },
            });
        }

        parse_envelope(&body)
    }
}

/// Unwrap `{success, message, data}` and validate the payload.
///
/// # Errors
///
/// - `ApiError::Malformed` if the body is not an envelope of `T`, has no
///   data, or the data breaks a schema rule
/// - `ApiError::Rejected` if the envelope reports `success: false`
pub fn parse_envelope<T>(body: &str) -> Result<T, ApiError>
where
    T: DeserializeOwned + Validate,
{
    let envelope: Envelope<T> =
        serde_json::from_str(body).map_err(|e| ApiError::Malformed(e.to_string()))?;

    if !envelope.success {
        return Err(ApiError::Rejected {
            message: envelope.message,
        });
    }

    let data = envelope
        .data
        .ok_or_else(|| ApiError::Malformed("response has no data".to_string()))?;
    data.validate().map_err(ApiError::Malformed)?;
    Ok(data)
}

fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

#[async_trait]
impl BookingApi for ApiClient {
    async fn event_details(&self, event_id: u64) -> Result<EventDetails, ApiError> {
        self.execute("event_details", self.get(&format!("/events/{event_id}")))
            .await
    }

    async fn tickets(&self, event_id: u64) -> Result<Vec<Ticket>, ApiError> {
        self.execute("tickets", self.get(&format!("/events/{event_id}/tickets")))
            .await
    }

    async fn ticket_by_slug(&self, slug: &str) -> Result<Ticket, ApiError> {
        self.execute("ticket_by_slug", self.get(&format!("/tickets/{}", segment(slug))))
            .await
    }

    async fn availability(
        &self,
        ticket_id: u64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<AvailabilityDay>, ApiError> {
        let request = self
            .get(&format!("/tickets/{ticket_id}/availability"))
            .query(&[
                ("start_date", start_date.format("%Y-%m-%d").to_string()),
                ("end_date", end_date.format("%Y-%m-%d").to_string()),
            ]);
        self.execute("availability", request).await
    }

    async fn nationalities(&self) -> Result<Vec<Nationality>, ApiError> {
        self.execute("nationalities", self.get("/nationalities")).await
    }

    async fn signup(&self, request: &SignupRequest) -> Result<SignupResponse, ApiError> {
        self.execute("signup", self.post("/customers/signup", request))
            .await
    }

    async fn create_booking(
        &self,
        request: &CreateBookingRequest,
    ) -> Result<CreatedBooking, ApiError> {
        self.execute("create_booking", self.post("/bookings", request))
            .await
    }

    async fn booking(&self, booking_code: &str) -> Result<BookingRecord, ApiError> {
        self.execute("booking", self.get(&format!("/bookings/{}", segment(booking_code))))
            .await
    }

    async fn voucher(&self, booking_code: &str) -> Result<Voucher, ApiError> {
        self.execute(
            "voucher",
            self.get(&format!("/bookings/{}/voucher", segment(booking_code))),
        )
        .await
    }

    async fn currency_rate(&self, code: &str) -> Result<CurrencyRate, ApiError> {
        self.execute("currency_rate", self.get(&format!("/currencies/{}/rate", segment(code))))
            .await
    }

    async fn create_payment_token(&self, booking_code: &str) -> Result<PaymentToken, ApiError> {
        let body = serde_json::json!({ "booking_code": booking_code });
        self.execute("payment_token", self.post("/payments/token", &body))
            .await
    }

    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeResult, ApiError> {
        self.execute("charge", self.post("/payments/charge", request))
            .await
    }

    async fn charge_3ds(&self, request: &ThreeDsRequest) -> Result<ChargeResult, ApiError> {
        self.execute("charge_3ds", self.post("/payments/charge/3ds", request))
            .await
    }

    async fn confirm_payment(&self, booking_code: &str) -> Result<PaymentConfirmation, ApiError> {
        self.execute(
            "confirm_payment",
            self.get(&format!("/payments/confirm/{}", segment(booking_code))),
        )
        .await
    }
}
