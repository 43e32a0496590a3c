//! Display currency.
//!
//! Prices are THB. A browser may pick another display currency; the choice
//! and its exchange rate are stored per session and only scale what is
//! rendered. Charges are always made in THB.

use crate::storage::{SessionStorage, StorageError, KEY_CURRENCY_CODE, KEY_EXCHANGE_RATE};
use coral_api::{ApiError, BookingApi, Money};
use thiserror::Error;

/// Base currency of every amount.
pub const BASE_CURRENCY: &str = "THB";

/// Reasons a currency preference cannot be built.
#[derive(Debug, Clone, Error)]
pub enum CurrencyError {
    /// Code is not three ASCII letters
    #[error("invalid currency code {0:?}")]
    InvalidCode(String),

    /// Rate is not a finite positive number
    #[error("invalid exchange rate {0}")]
    InvalidRate(f64),

    /// Rate lookup failed
    #[error("exchange rate lookup failed: {0}")]
    Api(#[from] ApiError),

    /// Preference could not be saved
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Display currency and its rate from THB.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyPreference {
    code: String,
    exchange_rate: f64,
}

impl CurrencyPreference {
    /// Build a preference; the code is upper-cased.
    ///
    /// # Errors
    ///
    /// Returns [`CurrencyError`] for a malformed code or a rate that is not
    /// finite and positive.
    pub fn new(code: &str, exchange_rate: f64) -> Result<Self, CurrencyError> {
        let code = normalize_code(code)?;
        if !exchange_rate.is_finite() || exchange_rate <= 0.0 {
            return Err(CurrencyError::InvalidRate(exchange_rate));
        }
        Ok(Self {
            code,
            exchange_rate,
        })
    }

    /// Thai baht at rate 1.
    #[must_use]
    pub fn thb() -> Self {
        Self {
            code: BASE_CURRENCY.to_string(),
            exchange_rate: 1.0,
        }
    }

    /// ISO currency code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Units of this currency per baht.
    #[must_use]
    pub const fn exchange_rate(&self) -> f64 {
        self.exchange_rate
    }
}

fn normalize_code(code: &str) -> Result<String, CurrencyError> {
    let trimmed = code.trim();
    if trimmed.len() == 3 && trimmed.bytes().all(|b| b.is_ascii_alphabetic()) {
        Ok(trimmed.to_ascii_uppercase())
    } else {
        Err(CurrencyError::InvalidCode(code.to_string()))
    }
}

/// Symbol and minor-unit digits of the currencies the site knows.
fn known_format(code: &str) -> Option<(&'static str, usize)> {
    Some(match code {
        "THB" => ("฿", 2),
        "USD" => ("$", 2),
        "EUR" => ("€", 2),
        "GBP" => ("£", 2),
        "JPY" => ("¥", 0),
        "KRW" => ("₩", 0),
        "CNY" => ("CN¥", 2),
        "AUD" => ("A$", 2),
        "SGD" => ("S$", 2),
        "HKD" => ("HK$", 2),
        "INR" => ("₹", 2),
        "MYR" => ("RM", 2),
        "RUB" => ("₽", 2),
        _ => return None,
    })
}

/// Render a THB amount in the preferred currency.
///
/// Without a preference the amount is shown in baht. When the converted
/// value cannot be formatted the THB amount is shown with two decimals.
///
/// ```
/// use coral_api::Money;
/// use coral_booking::currency::{display, CurrencyPreference};
///
/// let usd = CurrencyPreference::new("USD", 0.028).unwrap();
/// assert_eq!(display(Money::from_baht(1000), Some(&usd)), "$28.00");
/// assert_eq!(display(Money::from_baht(1000), None), "฿1,000.00");
/// ```
#[must_use]
pub fn display(amount: Money, preference: Option<&CurrencyPreference>) -> String {
    let thb = CurrencyPreference::thb();
    let preference = preference.unwrap_or(&thb);
    let converted = amount.as_baht_f64() * preference.exchange_rate;

    let formatted = match known_format(&preference.code) {
        Some((symbol, decimals)) => {
            group_thousands(converted, decimals).map(|number| format!("{symbol}{number}"))
        },
        None => group_thousands(converted, 2).map(|number| format!("{} {number}", preference.code)),
    };

    formatted.unwrap_or_else(|| format!("฿{:.2}", amount.as_baht_f64()))
}

/// en-US grouping: `1234567.891` with 2 decimals is `1,234,567.89`.
fn group_thousands(value: f64, decimals: usize) -> Option<String> {
    if !value.is_finite() || value < 0.0 || value >= 1e15 {
        return None;
    }

    let fixed = format!("{value:.decimals$}");
    let (whole, fraction) = match fixed.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(fixed.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }
    Some(grouped)
}

/// Resolve a code to a preference, asking the API for the rate.
///
/// THB is answered locally at rate 1.
///
/// # Errors
///
/// Returns [`CurrencyError`] for a malformed code or a failed lookup.
pub async fn fetch_preference(
    api: &dyn BookingApi,
    code: &str,
) -> Result<CurrencyPreference, CurrencyError> {
    let code = normalize_code(code)?;
    if code == BASE_CURRENCY {
        return Ok(CurrencyPreference::thb());
    }

    let rate = api.currency_rate(&code).await?;
    CurrencyPreference::new(&code, rate.exchange_rate)
}

/// Per-session persistence of the currency preference.
#[derive(Debug, Clone)]
pub struct CurrencyStore {
    storage: SessionStorage,
}

impl CurrencyStore {
    /// Wrap a session's storage.
    #[must_use]
    pub const fn new(storage: SessionStorage) -> Self {
        Self { storage }
    }

    /// Stored preference; missing, invalid or unreadable entries read as none.
    pub async fn load(&self) -> Option<CurrencyPreference> {
        let code = self.read(KEY_CURRENCY_CODE).await?;
        let rate = self.read(KEY_EXCHANGE_RATE).await?;

        let rate: f64 = rate.trim().parse().ok()?;
        match CurrencyPreference::new(&code, rate) {
            Ok(preference) => Some(preference),
            Err(e) => {
                tracing::debug!(error = %e, "Discarding stored currency preference");
                None
            },
        }
    }

    /// Store a preference.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend fails.
    pub async fn save(&self, preference: &CurrencyPreference) -> Result<(), StorageError> {
        self.storage.set(KEY_CURRENCY_CODE, &preference.code).await?;
        self.storage
            .set(KEY_EXCHANGE_RATE, &preference.exchange_rate.to_string())
            .await
    }

    async fn read(&self, key: &str) -> Option<String> {
        match self.storage.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read currency preference");
                None
            },
        }
    }
}
