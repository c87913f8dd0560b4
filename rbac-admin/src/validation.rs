//! Input validation
//!
//! Field-level checks on already parsed admin input. Failures accumulate into
//! a [`ValidationErrors`] map so the caller can show every message at once.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use validator::ValidateEmail;

/// Field name → messages for a rejected input.
///
/// # Examples
///
/// ```
/// use rbac_admin::validation::ValidationErrors;
///
/// let mut errors = ValidationErrors::new();
/// errors.add("name", "The name field is required.");
/// assert_eq!(errors.first("name"), Some("The name field is required."));
/// assert!(errors.check().is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    /// Create an empty error map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a map holding a single message.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record a message against a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.entry(field.into()).or_default().push(message.into());
    }

    /// Check if no field failed.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check if a field failed.
    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Messages recorded for a field.
    pub fn messages(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First message recorded for a field.
    pub fn first(&self, field: &str) -> Option<&str> {
        self.messages(field).first().map(String::as_str)
    }

    /// `Ok` when empty, otherwise the collected errors.
    pub fn check(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Trimmed value of a required text field, or `None` after recording an error.
pub fn required<'a>(errors: &mut ValidationErrors, field: &str, value: &'a str) -> Option<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, format!("The {} field is required.", field));
        None
    } else {
        Some(trimmed)
    }
}

/// Check a length bound in characters.
pub fn max_len(errors: &mut ValidationErrors, field: &str, value: &str, max: usize) -> bool {
    if value.chars().count() > max {
        errors.add(
            field,
            format!("The {} may not be greater than {} characters.", field, max),
        );
        false
    } else {
        true
    }
}

/// Check that an email address is well-formed and lowercase.
pub fn email(errors: &mut ValidationErrors, field: &str, value: &str) -> bool {
    if !value.validate_email() {
        errors.add(field, format!("The {} must be a valid email address.", field));
        return false;
    }
    if value.chars().any(char::is_uppercase) {
        errors.add(field, format!("The {} must be lowercase.", field));
        return false;
    }
    true
}

/// Check a new password: minimum length and, when given, a matching confirmation.
pub fn password(
    errors: &mut ValidationErrors,
    field: &str,
    value: &str,
    confirmation: Option<&str>,
    min_len: usize,
) -> bool {
    let mut ok = true;
    if value.chars().count() < min_len {
        errors.add(
            field,
            format!("The {} must be at least {} characters.", field, min_len),
        );
        ok = false;
    }
    if let Some(confirmation) = confirmation {
        if confirmation != value {
            errors.add(field, format!("The {} confirmation does not match.", field));
            ok = false;
        }
    }
    ok
}

/// Message for ids in a submitted list that reference no record.
pub fn invalid_ids_message(field: &str, ids: &[u64]) -> String {
    let list = ids
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("The selected {} are invalid: {}.", field, list)
}
