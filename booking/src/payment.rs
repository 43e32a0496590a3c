//! Card payment and its confirmation.
//!
//! The hosted card form returns a card token that is charged through the
//! API. A charge may need 3-D-Secure, in which case the browser leaves the
//! site and comes back through the callback route. Whatever the inline
//! result was, the booking only counts as paid once
//! [`PaymentService::confirm`] observes `paid`.

use coral_api::{
    ApiError, BookingApi, BookingRecord, BookingStatus, ChargeRequest, PaymentToken,
    ThreeDsRequest,
};
use coral_runtime::poll::{poll_until, PollOutcome, PollPolicy, Probe};
use std::sync::Arc;

/// Authoritative result of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// The API confirmed the payment
    Paid,
    /// The API reported the payment failed
    Failed,
    /// Attempts ran out before the payment settled
    StillProcessing,
}

impl PaymentOutcome {
    /// Metric label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::StillProcessing => "still_processing",
        }
    }
}

/// Where to send the browser after a charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeNext {
    /// Off-site to the card issuer for 3-D-Secure
    Authorize(String),
    /// Straight to the payment return page
    Return,
}

/// URL the issuer sends the browser back to after 3-D-Secure.
#[must_use]
pub fn three_ds_return_uri(site_url: &str, booking_code: &str) -> String {
    format!(
        "{}/payment/3ds-callback?booking_code={}",
        site_url.trim_end_matches('/'),
        urlencoding::encode(booking_code)
    )
}

/// Payment steps against the remote API.
#[derive(Clone)]
pub struct PaymentService {
    api: Arc<dyn BookingApi>,
    site_url: String,
    policy: PollPolicy,
}

impl PaymentService {
    /// Service over `api`; `site_url` is the public base URL of this site.
    #[must_use]
    pub fn new(api: Arc<dyn BookingApi>, site_url: impl Into<String>, policy: PollPolicy) -> Self {
        Self {
            api,
            site_url: site_url.into(),
            policy,
        }
    }

    /// Confirmation polling policy.
    #[must_use]
    pub const fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Booking to pay for and a fresh gateway token, fetched concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first [`ApiError`] of either request.
    pub async fn prepare(&self, booking_code: &str) -> Result<(BookingRecord, PaymentToken), ApiError> {
        let (record, token) = tokio::join!(
            self.api.booking(booking_code),
            self.api.create_payment_token(booking_code)
        );
        Ok((record?, token?))
    }

    /// Charge a card token.
    ///
    /// A missing `payment_token` (for example after a reload) is fetched
    /// again before charging.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the token or the charge request fails.
    #[tracing::instrument(skip(self, payment_token, card_token))]
    pub async fn charge(
        &self,
        booking_code: &str,
        payment_token: Option<&str>,
        card_token: &str,
    ) -> Result<ChargeNext, ApiError> {
        let payment_token = match payment_token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(token) => token.to_string(),
            None => self.api.create_payment_token(booking_code).await?.token,
        };

        let result = self
            .api
            .charge(&ChargeRequest {
                booking_code: booking_code.to_string(),
                payment_token,
                card_token: card_token.to_string(),
                return_uri: three_ds_return_uri(&self.site_url, booking_code),
            })
            .await?;

        tracing::info!(
            charge_id = result.charge_id.as_deref().unwrap_or("-"),
            status = result.status.as_deref().unwrap_or("-"),
            "Charge submitted"
        );

        Ok(match result.authorize_uri {
            Some(uri) if !uri.trim().is_empty() => ChargeNext::Authorize(uri),
            _ => ChargeNext::Return,
        })
    }

    /// Finish a 3-D-Secure charge. Failures are only logged; the
    /// confirmation poll decides the outcome.
    pub async fn complete_3ds(&self, booking_code: &str) {
        let request = ThreeDsRequest {
            booking_code: booking_code.to_string(),
        };
        if let Err(e) = self.api.charge_3ds(&request).await {
            tracing::warn!(booking_code, error = %e, "3-D-Secure charge failed");
        }
    }

    /// Poll the confirmation endpoint until the payment settles.
    ///
    /// API errors and `unpaid`/`pending` answers count as not settled yet.
    #[tracing::instrument(skip(self))]
    pub async fn confirm(&self, booking_code: &str) -> PaymentOutcome {
        let api = &self.api;
        let outcome = poll_until(&self.policy, |attempt| async move {
            match api.confirm_payment(booking_code).await {
                Ok(confirmation) => match confirmation.status {
                    BookingStatus::Paid => Probe::Ready(PaymentOutcome::Paid),
                    BookingStatus::Failed => Probe::Ready(PaymentOutcome::Failed),
                    BookingStatus::Unpaid | BookingStatus::Pending => Probe::Pending,
                },
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Payment confirmation probe failed");
                    Probe::Pending
                },
            }
        })
        .await;

        let outcome = match outcome {
            PollOutcome::Settled(outcome) => outcome,
            PollOutcome::Exhausted { .. } => PaymentOutcome::StillProcessing,
        };
        metrics::counter!("coral_payments_total", "outcome" => outcome.as_str()).increment(1);
        tracing::info!(outcome = outcome.as_str(), "Payment confirmation finished");
        outcome
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::{sample_record, FakeBookingApi};
    use coral_api::ChargeResult;
    use std::time::Duration;

    fn service(api: &Arc<FakeBookingApi>) -> PaymentService {
        PaymentService::new(
            Arc::clone(api) as Arc<dyn BookingApi>,
            "https://coral.example.com/",
            PollPolicy::new(3, Duration::from_secs(2)),
        )
    }

    #[test]
    fn return_uri_points_at_callback() {
        assert_eq!(
            three_ds_return_uri("https://coral.example.com/", "CIP 1"),
            "https://coral.example.com/payment/3ds-callback?booking_code=CIP%201"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn confirm_waits_for_paid() {
        let api = Arc::new(FakeBookingApi::new().with_confirmations(
            "CIP-1",
            vec![
                Ok(BookingStatus::Pending),
                Err(ApiError::Timeout),
                Ok(BookingStatus::Paid),
            ],
        ));

        assert_eq!(service(&api).confirm("CIP-1").await, PaymentOutcome::Paid);
        assert_eq!(api.call_count("confirm_payment"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_payment_stops_polling() {
        let api = Arc::new(
            FakeBookingApi::new().with_confirmations("CIP-1", vec![Ok(BookingStatus::Failed)]),
        );

        assert_eq!(service(&api).confirm("CIP-1").await, PaymentOutcome::Failed);
        assert_eq!(api.call_count("confirm_payment"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unpaid_until_attempts_run_out() {
        let api = Arc::new(
            FakeBookingApi::new().with_confirmations("CIP-1", vec![Ok(BookingStatus::Unpaid)]),
        );

        assert_eq!(
            service(&api).confirm("CIP-1").await,
            PaymentOutcome::StillProcessing
        );
        assert_eq!(api.call_count("confirm_payment"), 3);
    }

    #[tokio::test]
    async fn charge_with_authorize_uri_redirects_off_site() {
        let api = Arc::new(FakeBookingApi::new().with_charge(Ok(ChargeResult {
            charge_id: Some("chrg_1".to_string()),
            status: Some("pending".to_string()),
            authorize_uri: Some("https://bank.example.com/3ds".to_string()),
        })));

        let next = service(&api)
            .charge("CIP-1", Some("pt_CIP-1"), "tokn_1")
            .await
            .unwrap();

        assert_eq!(next, ChargeNext::Authorize("https://bank.example.com/3ds".to_string()));
        let charge = &api.charges()[0];
        assert_eq!(charge.card_token, "tokn_1");
        assert_eq!(
            charge.return_uri,
            "https://coral.example.com/payment/3ds-callback?booking_code=CIP-1"
        );
    }

    #[tokio::test]
    async fn missing_payment_token_is_fetched_again() {
        let api = Arc::new(FakeBookingApi::new());

        let next = service(&api).charge("CIP-1", None, "tokn_1").await.unwrap();

        assert_eq!(next, ChargeNext::Return);
        assert_eq!(api.calls(), ["payment_token", "charge"]);
        assert_eq!(api.charges()[0].payment_token, "pt_CIP-1");
    }

    #[tokio::test]
    async fn prepare_loads_record_and_token() {
        let api = Arc::new(FakeBookingApi::new().with_record(sample_record("CIP-1")));

        let (record, token) = service(&api).prepare("CIP-1").await.unwrap();

        assert_eq!(record.booking_code, "CIP-1");
        assert_eq!(token.amount, record.grand_total);
    }

    #[tokio::test]
    async fn three_ds_failure_is_not_fatal() {
        let api = Arc::new(FakeBookingApi::new().with_charge(Err(ApiError::Timeout)));

        service(&api).complete_3ds("CIP-1").await;

        assert_eq!(api.three_ds_requests().len(), 1);
    }
}
