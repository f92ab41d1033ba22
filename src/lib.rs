//! Pocket Ledger is a REST API for tracking personal income and expenses.
//!
//! This library provides the JSON API: user accounts, cookie based sessions
//! and a transaction ledger with soft-delete, trash, search, sorting,
//! pagination and date-windowed reports.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod auth;
mod database_id;
mod db;
mod endpoints;
mod listing;
mod logging;
mod pagination;
mod response;
mod routing;
mod timezone;
mod transaction;
mod user;
mod validation;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{PasswordHash, ValidatedPassword};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use pagination::PaginationConfig;
pub use routing::build_router;
pub use timezone::get_local_offset;
pub use transaction::{Transaction, TransactionKind, create_transaction};
pub use user::{NewUser, User, UserID, create_user, get_user_by_email, update_password};
pub use validation::ValidationErrors;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The email and password combination did not match a registered, active user.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The request did not carry a valid, unexpired session cookie.
    #[error("the request is not authenticated")]
    Unauthenticated,

    /// One or more request parameters were missing, malformed or contradict
    /// each other.
    ///
    /// Always produced before any query is executed.
    #[error("invalid request parameters: {0}")]
    Validation(ValidationErrors),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// There was an error formatting or parsing the expiry date of a session
    /// token.
    ///
    /// Callers should pass in the original error as a string and the date
    /// string that caused the error.
    #[error("could not format expiry date-time string \"{1}\": {0}")]
    InvalidDateFormat(String, String),

    /// The email address is already used by another user.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource is in the expected state,
    /// e.g. only trashed transactions can be restored.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::Validation(errors) => {
                error_response(StatusCode::UNPROCESSABLE_ENTITY, json!(errors))
            }
            Error::TooWeak(feedback) => error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                json!(ValidationErrors::single("password", feedback)),
            ),
            Error::DuplicateEmail => error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                json!(ValidationErrors::single(
                    "email",
                    "The email has already been taken."
                )),
            ),
            Error::InvalidCredentials => {
                error_response(StatusCode::BAD_REQUEST, json!("Invalid credentials"))
            }
            Error::Unauthenticated => {
                error_response(StatusCode::UNAUTHORIZED, json!("Unauthenticated"))
            }
            Error::NotFound => error_response(
                StatusCode::NOT_FOUND,
                json!("The requested resource could not be found"),
            ),
            Error::InvalidTimezoneError(timezone) => {
                tracing::error!(
                    "Could not get local timezone \"{timezone}\". Check the server settings."
                );
                internal_server_error()
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                internal_server_error()
            }
        }
    }
}

fn error_response(status: StatusCode, message: serde_json::Value) -> Response {
    let body = Json(json!({
        "status": status.as_u16(),
        "message": message,
    }));

    (status, body).into_response()
}

fn internal_server_error() -> Response {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!("An unexpected error occurred, check the server logs for more details."),
    )
}

#[cfg(test)]
mod error_response_tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use serde_json::{Value, json};

    use crate::{Error, ValidationErrors};

    async fn into_json(error: Error) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn validation_error_lists_every_field() {
        let mut errors = ValidationErrors::default();
        errors.add("sort_by", "The sort by field is required when sort order is present.");
        errors.add("per_page", "The per page must be a positive integer.");

        let (status, body) = into_json(Error::Validation(errors)).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["status"], json!(422));
        assert!(body["message"]["sort_by"].is_array());
        assert!(body["message"]["per_page"].is_array());
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let (status, body) = into_json(Error::NotFound).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], json!(404));
    }

    #[tokio::test]
    async fn sql_error_is_not_leaked() {
        let (status, body) =
            into_json(Error::SqlError(rusqlite::Error::InvalidQuery)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body["message"].as_str().unwrap().contains("SQL"));
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }
}
