//! Per-field form validation.
//!
//! Validation runs before any state change or simulated network call. All
//! failing fields are reported together so a form can mark each one.

use std::fmt;

use styleaura_core::Email;

/// One invalid form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Form field name, e.g. `"pincode"`.
    pub field: &'static str,
    /// User-facing message.
    pub message: String,
}

/// The set of invalid fields of a submitted form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// Start collecting errors.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Record an error for `field`.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Record an error for `field` unless `ok` holds.
    pub fn ensure(&mut self, ok: bool, field: &'static str, message: impl Into<String>) {
        if !ok {
            self.add(field, message);
        }
    }

    /// Require at least `min` characters (after trimming).
    pub fn min_chars(&mut self, field: &'static str, value: &str, min: usize, message: &str) {
        self.ensure(value.trim().chars().count() >= min, field, message);
    }

    /// Parse an email, recording the failure under `field`.
    pub fn email(&mut self, field: &'static str, value: &str) -> Option<Email> {
        match Email::parse(value) {
            Ok(email) => Some(email),
            Err(_) => {
                self.add(field, "Please enter a valid email address");
                None
            }
        }
    }

    /// Whether no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `field` failed.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// The failing fields, in form order.
    #[must_use]
    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    /// `Ok(())` when nothing failed, otherwise the collected errors.
    ///
    /// # Errors
    ///
    /// Returns `self` if any field failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_every_failing_field() {
        let mut errors = ValidationErrors::new();
        errors.min_chars("name", "A", 2, "Name must be at least 2 characters");
        errors.min_chars("city", "Pune", 2, "City must be at least 2 characters");
        let email = errors.email("email", "not-an-email");

        assert!(email.is_none());
        assert!(errors.has("name"));
        assert!(errors.has("email"));
        assert!(!errors.has("city"));
        assert_eq!(
            errors.to_string(),
            "name: Name must be at least 2 characters; email: Please enter a valid email address"
        );
    }

    #[test]
    fn test_min_chars_ignores_padding() {
        let mut errors = ValidationErrors::new();
        errors.min_chars("pincode", "  4000 ", 6, "Please enter a valid pincode");
        assert!(errors.into_result().is_err());
    }
}
