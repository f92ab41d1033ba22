#![allow(missing_docs)]

//! Helpers for testing the full router over HTTP.

use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::{Value, json};

use time::macros::datetime;

use crate::{
    AppState, PaginationConfig,
    auth::{COOKIE_TOKEN, PasswordHash},
    build_router,
    db::initialize,
    endpoints,
    user::{NewUser, UserID, create_user},
};

/// An initialized in-memory database.
pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");

    connection
}

/// Insert a user directly into the database and return their ID.
pub(crate) fn insert_test_user(connection: &Connection, email: &str) -> UserID {
    create_user(
        NewUser {
            name: "Test User".to_owned(),
            email: email.to_owned(),
            password_hash: PasswordHash::new_unchecked("hunter2"),
        },
        datetime!(2024-01-01 00:00:00 UTC),
        connection,
    )
    .expect("Could not create test user")
    .id
}

/// An application backed by an in-memory database.
pub(crate) struct TestApp {
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        let state = AppState::new(
            Connection::open_in_memory().expect("Could not open in-memory SQLite database"),
            "foobar",
            "Etc/UTC",
            PaginationConfig::default(),
        )
        .expect("Could not create app state")
        .with_password_hash_cost(4);

        Self { state }
    }

    pub fn server(&self) -> TestServer {
        TestServer::try_new(build_router(self.state.clone())).expect("Could not create test server.")
    }
}

/// Register a user and return their ID.
pub(crate) async fn register(server: &TestServer, name: &str, email: &str, password: &str) -> i64 {
    let response = server
        .post(endpoints::REGISTER)
        .json(&json!({"name": name, "email": email, "password": password}))
        .await;
    response.assert_status_ok();

    response.json::<Value>()["results"]["id"]
        .as_i64()
        .expect("registered user should have an integer ID")
}

/// Log in and send the session cookie with every later request.
pub(crate) async fn log_in_as(server: &mut TestServer, email: &str, password: &str) {
    let response = server
        .post(endpoints::LOG_IN)
        .json(&json!({"email": email, "password": password}))
        .await;
    response.assert_status_ok();

    let token_cookie = response.cookie(COOKIE_TOKEN);
    server.add_cookie(token_cookie);
}
