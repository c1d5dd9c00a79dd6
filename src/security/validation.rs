use bigdecimal::BigDecimal;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::core::error::ApiError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$"
    ).expect("Invalid email regex")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Trimmed, lower-cased form used for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Collects field errors so a request reports every problem at once.
#[derive(Debug, Default)]
pub struct ValidationResult {
    errors: Vec<FieldError>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn add_error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn required(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.add_error(field, "is required");
        }
        self
    }

    /// Like [`Self::required`] but only when the value was supplied at all,
    /// for partial updates.
    pub fn not_blank(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value {
            self.required(field, v);
        }
        self
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if !is_valid_email(value.trim()) {
            self.add_error(field, "must be a valid email address");
        }
        self
    }

    pub fn min_length(&mut self, field: &str, value: &str, min: usize) -> &mut Self {
        let actual = value.chars().count();
        if actual < min {
            self.add_error(field, format!("must be at least {min} characters"));
        }
        self
    }

    pub fn max_length(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        let actual = value.chars().count();
        if actual > max {
            self.add_error(field, format!("must be at most {max} characters"));
        }
        self
    }

    pub fn non_negative(&mut self, field: &str, value: Option<i32>) -> &mut Self {
        if matches!(value, Some(v) if v < 0) {
            self.add_error(field, "must not be negative");
        }
        self
    }

    pub fn decimal_range(
        &mut self,
        field: &str,
        value: Option<&BigDecimal>,
        min: i32,
        max: Option<i32>,
    ) -> &mut Self {
        if let Some(v) = value {
            let below = *v < BigDecimal::from(min);
            let above = max.is_some_and(|m| *v > BigDecimal::from(m));
            if below || above {
                let message = match max {
                    Some(m) => format!("must be between {min} and {m}"),
                    None => format!("must be at least {min}"),
                };
                self.add_error(field, message);
            }
        }
        self
    }

    pub fn one_of(&mut self, field: &str, value: Option<&str>, allowed: &[&str]) -> &mut Self {
        if let Some(v) = value {
            if !allowed.contains(&v) {
                self.add_error(field, format!("must be one of: {}", allowed.join(", ")));
            }
        }
        self
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }
}
