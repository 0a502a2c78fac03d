//! Field-level input validation.
//!
//! Rules collect failures into [`ValidationErrors`] instead of stopping at the
//! first one, so callers get every problem with a request in one response.

use std::fmt;

use serde::Serialize;

/// A single failed rule for one input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Ordered collection of field errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection holding a single error.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Whether any error was recorded for `field`.
    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.message.clone()).collect()
    }

    /// `Ok(())` when nothing failed, otherwise the collected errors.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.messages().join(" "))
    }
}

fn label(field: &str) -> String {
    field.replace('_', " ")
}

/// Presence check. Blank strings count as missing.
///
/// Returns the value when present so further rules can chain on it.
pub fn required<'a>(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&'a str>,
) -> Option<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Some(v),
        _ => {
            errors.add(field, format!("The {} field is required.", label(field)));
            None
        }
    }
}

/// Rejects a value that was supplied but is blank.
pub fn filled<'a>(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&'a str>,
) -> Option<&'a str> {
    match value {
        None => None,
        Some(v) if v.trim().is_empty() => {
            errors.add(field, format!("The {} field must have a value.", label(field)));
            None
        }
        Some(v) => Some(v),
    }
}

pub fn max_chars(errors: &mut ValidationErrors, field: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.add(
            field,
            format!(
                "The {} field must not be greater than {} characters.",
                label(field),
                max
            ),
        );
    }
}

pub fn min_chars(errors: &mut ValidationErrors, field: &str, value: &str, min: usize) {
    if value.chars().count() < min {
        errors.add(
            field,
            format!("The {} field must be at least {} characters.", label(field), min),
        );
    }
}

pub fn email(errors: &mut ValidationErrors, field: &str, value: &str) {
    if !is_valid_email(value) {
        errors.add(
            field,
            format!("The {} field must be a valid email address.", label(field)),
        );
    }
}

pub fn same(errors: &mut ValidationErrors, field: &str, value: &str, other: &str, other_value: &str) {
    if value != other_value {
        errors.add(
            field,
            format!("The {} field must match {}.", label(field), label(other)),
        );
    }
}

/// Message used when a unique column already holds the value.
pub fn taken_message(field: &str) -> String {
    format!("The {} has already been taken.", label(field))
}

/// Structural email check: one `@`, non-empty local part, dot-separated
/// non-empty domain labels, no whitespace.
pub fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && domain.split('.').all(|part| !part.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_treats_blank_as_missing() {
        let mut errors = ValidationErrors::new();

        assert_eq!(required(&mut errors, "name", Some("Alice")), Some("Alice"));
        assert!(required(&mut errors, "name", Some("   ")).is_none());
        assert!(required(&mut errors, "title", None).is_none());

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.errors()[0].message, "The name field is required.");
        assert!(errors.has("title"));
    }

    #[test]
    fn test_filled_ignores_absent_values() {
        let mut errors = ValidationErrors::new();

        assert!(filled(&mut errors, "title", None).is_none());
        assert!(errors.is_empty());

        assert!(filled(&mut errors, "title", Some("")).is_none());
        assert!(errors.has("title"));
    }

    #[test]
    fn test_length_rules_count_characters() {
        let mut errors = ValidationErrors::new();

        max_chars(&mut errors, "title", &"é".repeat(255), 255);
        assert!(errors.is_empty());

        max_chars(&mut errors, "title", &"a".repeat(256), 255);
        min_chars(&mut errors, "password", "12345", 6);

        assert_eq!(
            errors.messages(),
            vec![
                "The title field must not be greater than 255 characters.".to_string(),
                "The password field must be at least 6 characters.".to_string(),
            ]
        );
    }

    #[test]
    fn test_same_uses_readable_labels() {
        let mut errors = ValidationErrors::new();
        same(&mut errors, "confirm_password", "secret2", "password", "secret1");

        assert_eq!(
            errors.errors()[0].message,
            "The confirm password field must match password."
        );
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.example.org"));
        assert!(!is_valid_email("plainaddress"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("a@"));
        assert!(!is_valid_email("a@@x.com"));
        assert!(!is_valid_email("a@x..com"));
        assert!(!is_valid_email("a b@x.com"));
    }

    #[test]
    fn test_into_result() {
        assert!(ValidationErrors::new().into_result().is_ok());

        let err = ValidationErrors::single("email", taken_message("email"))
            .into_result()
            .unwrap_err();
        assert_eq!(err.to_string(), "The email has already been taken.");
    }
}
