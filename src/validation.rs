//! Collects request validation failures so that every violated field can be
//! reported to the client at once.

use std::{collections::BTreeMap, fmt::Display};

use axum::{
    Json,
    extract::{
        Path, Query,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
};
use serde::Serialize;

use crate::Error;

/// Validation messages keyed by the name of the offending request field.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    /// Create a set of errors containing a single message for `field`.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    /// Record `message` against `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    /// Whether no errors have been recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The messages recorded for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Turn the collected errors into a result.
    ///
    /// # Errors
    /// Returns [Error::Validation] if any error was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, Error> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<&str> = self.0.keys().map(String::as_str).collect();
        write!(f, "{}", fields.join(", "))
    }
}

/// Unwrap a JSON request body, reporting a malformed body as a validation
/// error on the `body` field.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Error> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!("Rejected request body: {rejection}");
            Err(Error::Validation(ValidationErrors::single(
                "body",
                rejection.body_text(),
            )))
        }
    }
}

/// Unwrap a path parameter, reporting a malformed value as a validation
/// error on `field`.
pub fn path_param<T>(path: Result<Path<T>, PathRejection>, field: &str) -> Result<T, Error> {
    match path {
        Ok(Path(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!("Rejected path parameter: {rejection}");
            Err(Error::Validation(ValidationErrors::single(
                field,
                format!("The {field} is invalid."),
            )))
        }
    }
}

/// Unwrap a query string, reporting one that cannot be deserialized, e.g.
/// a repeated parameter, as a validation error on the `query` field.
pub fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, Error> {
    match query {
        Ok(Query(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!("Rejected query string: {rejection}");
            Err(Error::Validation(ValidationErrors::single(
                "query",
                rejection.body_text(),
            )))
        }
    }
}

/// Check that a required text field is present and not longer than
/// `max_length` characters, returning the trimmed value.
pub fn required_text(
    value: Option<String>,
    field: &str,
    label: &str,
    max_length: usize,
    errors: &mut ValidationErrors,
) -> String {
    let value = value.map(|value| value.trim().to_owned()).unwrap_or_default();

    if value.is_empty() {
        errors.add(field, format!("The {label} field is required."));
    } else if value.chars().count() > max_length {
        errors.add(
            field,
            format!("The {label} may not be greater than {max_length} characters."),
        );
    }

    value
}
