//! Customer details form and its validation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw checkout form as posted by the browser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerForm {
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Email address
    pub email: String,
    /// Phone number
    pub phone: String,
    /// Nationality id from the select box
    pub nationality_id: String,
    /// Free-text request
    pub special_request: String,
}

/// Validated customer details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerInfo {
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Email address, trimmed
    pub email: String,
    /// Phone number without spaces or dashes
    pub phone: String,
    /// Nationality id
    pub nationality_id: u64,
    /// Free-text request, if any
    pub special_request: Option<String>,
}

/// Problem with one form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldError {
    /// Form field name
    pub field: &'static str,
    /// Message shown next to the field
    pub message: &'static str,
}

/// Every problem found in a form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    fn push(&mut self, field: &'static str, message: &'static str) {
        self.errors.push(FieldError { field, message });
    }

    /// Message for a field, if it is invalid.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.errors
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message)
    }

    /// All problems in form order.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Returns `true` if nothing is wrong.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.errors.iter().map(|error| error.field).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

impl CustomerForm {
    /// Validate every field, reporting all problems at once.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] listing each invalid field.
    pub fn validate(&self) -> Result<CustomerInfo, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let first_name = self.first_name.trim();
        if first_name.is_empty() {
            errors.push("first_name", "First name is required");
        }

        let last_name = self.last_name.trim();
        if last_name.is_empty() {
            errors.push("last_name", "Last name is required");
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.push("email", "Email is required");
        } else if !is_valid_email(email) {
            errors.push("email", "Please enter a valid email address");
        }

        let phone = self.phone.trim();
        let normalized_phone = normalize_phone(phone);
        if phone.is_empty() {
            errors.push("phone", "Phone number is required");
        } else if normalized_phone.is_none() {
            errors.push("phone", "Please enter a valid phone number");
        }

        let nationality_id = self
            .nationality_id
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|id| *id > 0);
        if nationality_id.is_none() {
            errors.push("nationality_id", "Please select your nationality");
        }

        match (normalized_phone, nationality_id) {
            (Some(phone), Some(nationality_id)) if errors.is_empty() => Ok(CustomerInfo {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                email: email.to_string(),
                phone,
                nationality_id,
                special_request: Some(self.special_request.trim())
                    .filter(|text| !text.is_empty())
                    .map(str::to_string),
            }),
            _ => Err(errors),
        }
    }
}

/// `local@domain.tld` with no whitespace.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((name, tld)) => !name.is_empty() && tld.len() >= 2,
        None => false,
    }
}

/// Strip spaces and dashes; 7–15 digits with an optional leading `+`.
fn normalize_phone(phone: &str) -> Option<String> {
    let compact: String = phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect();
    let digits = compact.strip_prefix('+').unwrap_or(&compact);

    let valid = (7..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit());
    valid.then_some(compact)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn filled() -> CustomerForm {
        CustomerForm {
            first_name: " Jane ".to_string(),
            last_name: "Doe".to_string(),
            email: "jane@example.com".to_string(),
            phone: "+66 81-234-5678".to_string(),
            nationality_id: "66".to_string(),
            special_request: "  ".to_string(),
        }
    }

    #[test]
    fn valid_form_is_normalized() {
        let info = filled().validate().unwrap();
        assert_eq!(info.first_name, "Jane");
        assert_eq!(info.phone, "+66812345678");
        assert_eq!(info.nationality_id, 66);
        assert_eq!(info.special_request, None);
    }

    #[test]
    fn all_problems_are_reported_together() {
        let errors = CustomerForm::default().validate().unwrap_err();
        let fields: Vec<_> = errors.errors().iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            ["first_name", "last_name", "email", "phone", "nationality_id"]
        );
        assert_eq!(errors.get("phone"), Some("Phone number is required"));
    }

    #[test]
    fn malformed_email_and_phone() {
        let form = CustomerForm {
            email: "jane@localhost".to_string(),
            phone: "12ab".to_string(),
            ..filled()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("email"), Some("Please enter a valid email address"));
        assert_eq!(errors.get("phone"), Some("Please enter a valid phone number"));
        assert_eq!(errors.get("first_name"), None);
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a@@b.co"));
        assert!(!is_valid_email("a b@c.co"));
    }

    #[test]
    fn phone_length_bounds() {
        assert_eq!(normalize_phone("1234567").as_deref(), Some("1234567"));
        assert!(normalize_phone("123456").is_none());
        assert!(normalize_phone("+1234567890123456").is_none());
    }
}
