//! Validation of incoming JSON payloads.
//!
//! Request types declare their checks with `#[derive(Validate)]`. The [`Valid`] extractor
//! trims every string in the body, deserializes it, runs the checks and turns the
//! `validator::ValidationErrors` into a field-keyed [`Report`]. Every check of every field
//! runs; an empty report means the payload is accepted.

pub mod extractor;
pub mod rules;

pub use extractor::{Form, Valid};

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use validator::ValidationErrors;

use crate::error::AppError;

/// Key under which form-level (not field-specific) violations are reported.
pub const FORM_KEY: &str = "body";

// Key `validator` files struct-level (schema) errors under.
const SCHEMA_KEY: &str = "__all__";

/// Field name mapped to the ordered messages of every rule it violated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Report(BTreeMap<String, Vec<String>>);

impl Report {
    pub fn add(&mut self, field: &str, message: &str) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields with at least one violation.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `Ok(())` for an empty report, `AppError::ValidationFailed` otherwise.
    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::ValidationFailed(self))
        }
    }
}

/// Keys follow the JSON field names; messages keep the order the checks are declared in.
impl From<ValidationErrors> for Report {
    fn from(errors: ValidationErrors) -> Self {
        let mut report = Report::default();
        for (field, field_errors) in errors.field_errors() {
            let key = if field == SCHEMA_KEY {
                FORM_KEY.to_string()
            } else {
                camel_case(field)
            };
            for error in field_errors {
                let message: &str = match &error.message {
                    Some(message) => message,
                    None => &error.code,
                };
                report.add(&key, message);
            }
        }
        report
    }
}

/// Validates `form`, reporting every violation.
pub fn check<T: validator::Validate>(form: &T) -> Report {
    match form.validate() {
        Ok(()) => Report::default(),
        Err(errors) => errors.into(),
    }
}

/// Trims the top-level string values of a JSON body in place.
pub fn trim_strings(payload: &mut Map<String, Value>) {
    for value in payload.values_mut() {
        if let Value::String(text) = value {
            let trimmed = text.trim();
            if trimmed.len() != text.len() {
                *text = trimmed.to_string();
            }
        }
    }
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
