//! The user management endpoints.
//!
//! Any logged in user may manage the accounts on the server.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{
        FromRef, Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, db,
    listing::{ListOptions, RawListQuery, Visibility},
    pagination::{Page, PaginationConfig},
    response::ApiResponse,
    timezone::current_timestamp,
    user::{
        User, UserForm, UserID, UserSortKey, create_user, get_user_by_id, list_users, purge_all_users,
        purge_user, restore_all_users, restore_user, trash_user, update_user,
    },
    validation::{ValidationErrors, json_body, path_param, query_params},
};

/// The state needed by the user management endpoints.
#[derive(Debug, Clone)]
pub struct UserState {
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The config that controls how to display pages of users.
    pub pagination_config: PaginationConfig,
    /// The bcrypt cost for hashing new passwords.
    pub password_hash_cost: u32,
}

impl FromRef<AppState> for UserState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
            password_hash_cost: state.password_hash_cost,
        }
    }
}

fn into_response<T: serde::Serialize>(
    message: &'static str,
    result: Result<T, Error>,
) -> Response {
    match result {
        Ok(results) => ApiResponse::ok(message, results).into_response(),
        Err(error) => error.into_response(),
    }
}

fn parse_list_query(
    query: &RawListQuery,
    config: &PaginationConfig,
) -> Result<ListOptions<UserSortKey>, Error> {
    let mut errors = ValidationErrors::default();
    let options = ListOptions::parse(query, config, &mut errors);

    errors.into_result(options)
}

fn list(
    state: &UserState,
    query: &RawListQuery,
    visibility: Visibility,
) -> Result<Page<User>, Error> {
    let options = parse_list_query(query, &state.pagination_config)?;
    let connection = db::lock(&state.db_connection)?;

    list_users(&options, visibility, &connection)
}

/// List the active users.
pub async fn list_users_endpoint(
    State(state): State<UserState>,
    query: Result<Query<RawListQuery>, QueryRejection>,
) -> Response {
    let result = query_params(query).and_then(|query| list(&state, &query, Visibility::Active));

    into_response("Users list", result)
}

/// List the users in the trash.
pub async fn user_trash_endpoint(
    State(state): State<UserState>,
    query: Result<Query<RawListQuery>, QueryRejection>,
) -> Response {
    let result = query_params(query).and_then(|query| list(&state, &query, Visibility::Trashed));

    into_response("Users trash list", result)
}

/// Get the logged in user.
pub async fn get_me(
    State(state): State<UserState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let result = db::lock(&state.db_connection)
        .and_then(|connection| get_user_by_id(user_id, &connection));

    into_response("Users logged in", result)
}

/// Create a new user.
pub async fn create_user_endpoint(
    State(state): State<UserState>,
    payload: Result<Json<UserForm>, JsonRejection>,
) -> Response {
    let result = json_body(payload)
        .and_then(|form| form.validate(state.password_hash_cost))
        .and_then(|new_user| {
            let connection = db::lock(&state.db_connection)?;
            create_user(new_user, current_timestamp(), &connection)
        });

    into_response("User has been successfully created", result)
}

/// Replace the name, email and password of an active user.
pub async fn update_user_endpoint(
    State(state): State<UserState>,
    user_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UserForm>, JsonRejection>,
) -> Response {
    let result = path_param(user_id, "id").and_then(|user_id| {
        let new_user = json_body(payload)?.validate(state.password_hash_cost)?;
        let connection = db::lock(&state.db_connection)?;

        update_user(
            UserID::new(user_id),
            new_user,
            current_timestamp(),
            &connection,
        )
    });

    into_response("User has been successfully updated", result)
}

/// Move an active user to the trash.
pub async fn delete_user_endpoint(
    State(state): State<UserState>,
    user_id: Result<Path<i64>, PathRejection>,
) -> Response {
    let result = path_param(user_id, "id").and_then(|user_id| {
        let connection = db::lock(&state.db_connection)?;
        trash_user(UserID::new(user_id), current_timestamp(), &connection)
    });

    into_response("User has been successfully deleted", result)
}

/// Take a user out of the trash.
pub async fn restore_user_endpoint(
    State(state): State<UserState>,
    user_id: Result<Path<i64>, PathRejection>,
) -> Response {
    let result = path_param(user_id, "id").and_then(|user_id| {
        let connection = db::lock(&state.db_connection)?;
        restore_user(UserID::new(user_id), &connection)
    });

    into_response("User has been successfully restored", result)
}

/// Take every user out of the trash.
pub async fn restore_all_users_endpoint(State(state): State<UserState>) -> Response {
    let result =
        db::lock(&state.db_connection).and_then(|connection| restore_all_users(&connection));

    into_response("User has been successfully restored", result)
}

/// Permanently delete a trashed user along with their transactions.
pub async fn purge_user_endpoint(
    State(state): State<UserState>,
    user_id: Result<Path<i64>, PathRejection>,
) -> Response {
    let result = path_param(user_id, "id").and_then(|user_id| {
        let connection = db::lock(&state.db_connection)?;
        purge_user(UserID::new(user_id), &connection)
    });

    into_response("User has been successfully deleted", result)
}

/// Permanently delete every trashed user.
pub async fn purge_all_users_endpoint(State(state): State<UserState>) -> Response {
    let result = db::lock(&state.db_connection).and_then(|connection| purge_all_users(&connection));

    into_response("User has been successfully deleted", result)
}
