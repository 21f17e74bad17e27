//! Validation Support
//!
//! Field-level validation errors and the small set of validators shared by the
//! filter rules and the user forms. Validators return a single
//! `ValidationError`; callers collect them into `ValidationErrors` so a
//! request reports every failing field at once.
//!
//! # Example
//!
//! ```rust,ignore
//! use roster::validation::{ValidationErrors, validators};
//!
//! let mut errors = ValidationErrors::new();
//! errors.check(validators::validate_required("first_name", &form.first_name));
//! errors.check(validators::validate_email("email", &form.email));
//! errors.result()?;
//! ```

use serde::Serialize;
use thiserror::Error;

/// Validation error with field name and message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// The field that failed validation
    pub field: String,
    /// Human-readable error message
    pub message: String,
}

impl ValidationError {
    /// Create a new validation error
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Collection of validation errors, in the order they were found
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[error("Validation failed with {} error(s)", .errors.len())]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    /// Create a new empty validation errors collection
    #[must_use]
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Add a validation error
    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Record the error of a failed validator, ignore a passing one
    pub fn check(&mut self, outcome: Result<(), ValidationError>) {
        if let Err(error) = outcome {
            self.errors.push(error);
        }
    }

    /// Check if there are any errors
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get the number of errors
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Get all errors
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Convert to Result
    pub fn result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

/// Helper validators for common patterns
pub mod validators {
    use chrono::NaiveDate;

    use super::ValidationError;

    /// Date format accepted by the `from` / `to` filters (`DD/MM/YYYY`)
    pub const DATE_FORMAT: &str = "%d/%m/%Y";

    /// Validate value is not empty
    pub fn validate_required(field: &str, value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::new(
                field,
                format!("The {} field is required.", label(field)),
            ));
        }
        Ok(())
    }

    /// Validate string length does not exceed `max` characters
    pub fn validate_max_length(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
        if value.chars().count() > max {
            return Err(ValidationError::new(
                field,
                format!("The {} may not be greater than {max} characters.", label(field)),
            ));
        }
        Ok(())
    }

    /// Basic email validation: one `@`, a non-empty local part and a dotted domain
    pub fn validate_email(field: &str, value: &str) -> Result<(), ValidationError> {
        let invalid = || {
            ValidationError::new(
                field,
                format!("The {} must be a valid email address.", label(field)),
            )
        };

        if value.len() > 255 || value.chars().any(char::is_whitespace) {
            return Err(invalid());
        }

        let Some((local, domain)) = value.split_once('@') else {
            return Err(invalid());
        };

        if local.is_empty()
            || domain.contains('@')
            || domain.starts_with('.')
            || domain.ends_with('.')
            || !domain.contains('.')
        {
            return Err(invalid());
        }

        Ok(())
    }

    /// Validate value is one of an allowed set, compared verbatim
    pub fn validate_one_of(field: &str, value: &str, allowed: &[&str]) -> Result<(), ValidationError> {
        if allowed.contains(&value) {
            Ok(())
        } else {
            Err(ValidationError::new(
                field,
                format!("The selected {} is invalid.", label(field)),
            ))
        }
    }

    /// Validate an absolute `http` / `https` URL
    pub fn validate_url(field: &str, value: &str) -> Result<(), ValidationError> {
        match url::Url::parse(value) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => Ok(()),
            _ => Err(ValidationError::new(
                field,
                format!("The {} format is invalid.", label(field)),
            )),
        }
    }

    /// Parse a `DD/MM/YYYY` calendar date
    pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ValidationError> {
        NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
            ValidationError::new(
                field,
                format!("The {} does not match the format d/m/Y.", label(field)),
            )
        })
    }

    /// Parse a positive integer id
    pub fn parse_id(field: &str, value: &str) -> Result<i32, ValidationError> {
        match value.trim().parse::<i32>() {
            Ok(id) if id > 0 => Ok(id),
            _ => Err(ValidationError::new(
                field,
                format!("The {} must be an integer.", label(field)),
            )),
        }
    }

    /// `profession_id` reads as "profession id" in messages
    pub(crate) fn label(field: &str) -> String {
        field.replace('_', " ")
    }
}
