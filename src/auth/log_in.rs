//! This file defines the route for handling log-in requests.
//! The cookie module handles the lower level cookie auth logic.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use email_address::EmailAddress;
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error,
    auth::set_auth_cookie,
    db,
    response::ApiResponse,
    user::{User, get_user_by_email},
    validation::{ValidationErrors, json_body},
};

/// How long the auth cookie should last if the user selects "remember me" at log-in.
const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// The credentials entered during log-in.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogInData {
    /// The email of the user logging in.
    #[serde(default)]
    pub email: Option<String>,
    /// Password entered during log-in.
    #[serde(default)]
    pub password: Option<String>,
    /// Whether to extend the initial auth cookie duration.
    #[serde(default)]
    pub remember_me: Option<bool>,
}

impl LogInData {
    fn validate(self) -> Result<(String, String, bool), Error> {
        let mut errors = ValidationErrors::default();

        let email = self.email.unwrap_or_default().trim().to_owned();
        if email.is_empty() {
            errors.add("email", "The email field is required.");
        } else if !EmailAddress::is_valid(&email) {
            errors.add("email", "The email must be a valid email address.");
        }

        let password = self.password.unwrap_or_default();
        if password.is_empty() {
            errors.add("password", "The password field is required.");
        }

        errors.into_result((email, password, self.remember_me.unwrap_or(false)))
    }
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, the auth cookie is set and the user is returned.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The email or password is missing or malformed.
/// - The email does not belong to an active user, or the password is not correct.
/// - An internal error occurred when verifying the password.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    payload: Result<Json<LogInData>, JsonRejection>,
) -> Response {
    match log_in(state, jar, payload) {
        Ok(response) => response,
        Err(error) => error.into_response(),
    }
}

fn log_in(
    state: LoginState,
    jar: PrivateCookieJar,
    payload: Result<Json<LogInData>, JsonRejection>,
) -> Result<Response, Error> {
    let (email, password, remember_me) = json_body(payload)?.validate()?;

    let user: User = {
        let connection = db::lock(&state.db_connection)?;

        match get_user_by_email(&email, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => return Err(Error::InvalidCredentials),
            Err(error) => return Err(error),
        }
    };

    let is_password_valid = user.password_hash.verify(&password).map_err(|error| {
        tracing::error!("Error verifying password: {error}");
        Error::HashingError(error.to_string())
    })?;

    if !is_password_valid {
        return Err(Error::InvalidCredentials);
    }

    let cookie_duration = if remember_me {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };
    let jar = set_auth_cookie(jar, user.id, cookie_duration)?;

    Ok((
        jar,
        ApiResponse::ok("User has been successfully logged in", user),
    )
        .into_response())
}

#[cfg(test)]
mod log_in_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;
    use time::{Duration, OffsetDateTime};

    use crate::{
        app_state::create_cookie_key,
        auth::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, PasswordHash, ValidatedPassword},
        db::initialize,
        endpoints,
        timezone::current_timestamp,
        user::{NewUser, create_user, trash_user},
    };

    use super::{LoginState, post_log_in};

    const PASSWORD: &str = "averysafeandsecurepassword";

    fn get_test_server() -> (TestServer, LoginState) {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");
        create_user(
            NewUser {
                name: "Alice".to_owned(),
                email: "alice@example.com".to_owned(),
                password_hash: PasswordHash::new(ValidatedPassword::new_unchecked(PASSWORD), 4)
                    .unwrap(),
            },
            current_timestamp(),
            &connection,
        )
        .expect("Could not create test user");

        let state = LoginState {
            cookie_key: create_cookie_key("foobar"),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let app = Router::new()
            .route(endpoints::LOG_IN, post(post_log_in))
            .with_state(state.clone());

        (TestServer::try_new(app).unwrap(), state)
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let (server, _) = get_test_server();

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({"email": "alice@example.com", "password": PASSWORD}))
            .await;

        response.assert_status_ok();
        let body = response.json::<serde_json::Value>();
        assert_eq!(body["message"], "User has been successfully logged in");
        assert_eq!(body["results"]["email"], "alice@example.com");
        assert!(body["results"].get("password_hash").is_none());

        let token_cookie = response.cookie(COOKIE_TOKEN);
        let expires = token_cookie.expires_datetime().unwrap();
        assert!(
            (expires - (OffsetDateTime::now_utc() + DEFAULT_COOKIE_DURATION)).abs()
                < Duration::seconds(1)
        );
    }

    #[tokio::test]
    async fn log_in_with_remember_me_lasts_a_week() {
        let (server, _) = get_test_server();

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({
                "email": "ALICE@example.com",
                "password": PASSWORD,
                "remember_me": true,
            }))
            .await;

        response.assert_status_ok();
        let expires = response.cookie(COOKIE_TOKEN).expires_datetime().unwrap();
        assert!(
            (expires - (OffsetDateTime::now_utc() + Duration::days(7))).abs()
                < Duration::seconds(1)
        );
    }

    #[tokio::test]
    async fn log_in_fails_with_incorrect_password() {
        let (server, _) = get_test_server();

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({"email": "alice@example.com", "password": "wrongpassword"}))
            .await;

        response.assert_status_bad_request();
        response.assert_json(&json!({"status": 400, "message": "Invalid credentials"}));
    }

    #[tokio::test]
    async fn log_in_fails_with_unknown_email() {
        let (server, _) = get_test_server();

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({"email": "bob@example.com", "password": PASSWORD}))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn trashed_user_cannot_log_in() {
        let (server, state) = get_test_server();
        {
            let connection = state.db_connection.lock().unwrap();
            let user = crate::user::get_user_by_email("alice@example.com", &connection).unwrap();
            trash_user(user.id, current_timestamp(), &connection).unwrap();
        }

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({"email": "alice@example.com", "password": PASSWORD}))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn log_in_reports_missing_fields() {
        let (server, _) = get_test_server();

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({"email": "not an email"}))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body = response.json::<serde_json::Value>();
        assert_eq!(body["status"], 422);
        assert!(body["message"]["email"].is_array());
        assert!(body["message"]["password"].is_array());
    }
}
