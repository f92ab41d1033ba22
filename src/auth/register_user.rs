//! The registration endpoint for creating a new account without logging in.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, db,
    response::ApiResponse,
    timezone::current_timestamp,
    user::{UserForm, create_user},
    validation::json_body,
};

/// The state needed to register a user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The bcrypt cost for hashing the new password.
    pub password_hash_cost: u32,
    /// The database connection for storing the user.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            password_hash_cost: state.password_hash_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Register a new user.
///
/// The new user is not logged in, they must log in separately.
///
/// # Errors
///
/// Responds with a 422 listing every invalid field if the name, email or
/// password are invalid, or if the email is already registered.
pub async fn register_user(
    State(state): State<RegistrationState>,
    payload: Result<Json<UserForm>, JsonRejection>,
) -> Response {
    let result = json_body(payload)
        .and_then(|form| form.validate(state.password_hash_cost))
        .and_then(|new_user| {
            let connection = db::lock(&state.db_connection)?;

            create_user(new_user, current_timestamp(), &connection)
        });

    match result {
        Ok(user) => ApiResponse::ok("User has been successfully created", user).into_response(),
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod register_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{db::initialize, endpoints, user::get_user_by_email};

    use super::{RegistrationState, register_user};

    fn get_test_server() -> (TestServer, RegistrationState) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let state = RegistrationState {
            password_hash_cost: 4,
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let app = Router::new()
            .route(endpoints::REGISTER, post(register_user))
            .with_state(state.clone());

        (TestServer::try_new(app).unwrap(), state)
    }

    fn registration() -> Value {
        json!({
            "name": "Alice",
            "email": "alice@example.com",
            "password": "averysafeandsecurepassword",
        })
    }

    #[tokio::test]
    async fn register_creates_user() {
        let (server, state) = get_test_server();

        let response = server.post(endpoints::REGISTER).json(&registration()).await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["message"], "User has been successfully created");
        assert_eq!(body["results"]["name"], "Alice");
        assert!(body["results"].get("password").is_none());

        let user =
            get_user_by_email("alice@example.com", &state.db_connection.lock().unwrap()).unwrap();
        assert!(
            user.password_hash
                .verify("averysafeandsecurepassword")
                .unwrap()
        );
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let (server, _) = get_test_server();
        server
            .post(endpoints::REGISTER)
            .json(&registration())
            .await
            .assert_status_ok();

        let mut duplicate = registration();
        duplicate["email"] = json!("Alice@Example.com");
        let response = server.post(endpoints::REGISTER).json(&duplicate).await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.json::<Value>()["message"]["email"].is_array());
    }

    #[tokio::test]
    async fn register_rejects_malformed_json() {
        let (server, _) = get_test_server();

        let response = server
            .post(endpoints::REGISTER)
            .content_type("application/json")
            .bytes("{\"name\":".into())
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.json::<Value>()["message"]["body"].is_array());
    }
}
