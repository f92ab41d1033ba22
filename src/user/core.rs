//! The user model and the database functions for storing and managing users.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    auth::PasswordHash,
    listing::{
        ListOptions, QueryFilter, Sort, SortColumn, Visibility, contains_pattern, sql_integer,
    },
    pagination::Page,
    timezone::normalize_timestamp,
};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
///
/// The password hash is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's display name.
    pub name: String,
    /// The user's email address, unique across all users.
    pub email: String,
    /// The user's password hash.
    #[serde(skip)]
    pub password_hash: PasswordHash,
    /// When the user registered.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the user was last modified.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    /// When the user was moved to the trash, `None` for active users.
    #[serde(with = "time::serde::rfc3339::option")]
    pub deleted_at: Option<OffsetDateTime>,
}

/// The validated data needed to create or update a user.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    /// The user's display name.
    pub name: String,
    /// A valid email address.
    pub email: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

/// The fields users can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSortKey {
    /// Sort by user ID, i.e. registration order.
    Id,
    /// Sort by display name.
    Name,
}

impl SortColumn for UserSortKey {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
        }
    }
}

const USER_COLUMNS: &str = "id, name, email, password, created_at, updated_at, deleted_at";

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                deleted_at TEXT
                )",
        (),
    )?;

    Ok(())
}

/// Map a database row to a [User].
pub fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(3)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
        deleted_at: row.get(6)?,
    })
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a:
/// - [Error::DuplicateEmail] if the email address is already registered,
/// - or [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(
    new_user: NewUser,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<User, Error> {
    let now = normalize_timestamp(now);

    connection
        .prepare(&format!(
            "INSERT INTO user (name, email, password, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             RETURNING {USER_COLUMNS}"
        ))?
        .query_row(
            (
                new_user.name,
                new_user.email,
                new_user.password_hash.to_string(),
                now,
            ),
            map_user_row,
        )
        .map_err(|error| error.into())
}

/// Get the user with an ID equal to `user_id`, whether active or trashed.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!("SELECT {USER_COLUMNS} FROM user WHERE id = :id"))?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the active user with the email address `email`, ignoring case.
///
/// # Errors
///
/// Returns [Error::NotFound] if no active user has that email address.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!(
            "SELECT {USER_COLUMNS} FROM user WHERE email = :email AND deleted_at IS NULL"
        ))?
        .query_row(&[(":email", &email)], map_user_row)
        .map_err(|error| error.into())
}

/// Replace the name, email and password of the active user `user_id`.
///
/// # Errors
///
/// Returns a:
/// - [Error::NotFound] if `user_id` is not an active user,
/// - [Error::DuplicateEmail] if another user already has the email address,
/// - or [Error::SqlError] if some other SQL related error occurred.
pub fn update_user(
    user_id: UserID,
    user: NewUser,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<User, Error> {
    let now = normalize_timestamp(now);

    connection
        .prepare(&format!(
            "UPDATE user SET name = ?1, email = ?2, password = ?3, updated_at = ?4
             WHERE id = ?5 AND deleted_at IS NULL
             RETURNING {USER_COLUMNS}"
        ))?
        .query_row(
            (
                user.name,
                user.email,
                user.password_hash.to_string(),
                now,
                user_id.as_i64(),
            ),
            map_user_row,
        )
        .map_err(|error| error.into())
}

/// Replace the password of the user `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if `user_id` does not exist.
pub fn update_password(
    user_id: UserID,
    password_hash: PasswordHash,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<(), Error> {
    let now = normalize_timestamp(now);

    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1, updated_at = ?2 WHERE id = ?3",
        (password_hash.to_string(), now, user_id.as_i64()),
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Move the active user `user_id` to the trash.
///
/// # Errors
///
/// Returns [Error::NotFound] if `user_id` is not an active user.
pub fn trash_user(
    user_id: UserID,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<User, Error> {
    let now = normalize_timestamp(now);

    connection
        .prepare(&format!(
            "UPDATE user SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL
             RETURNING {USER_COLUMNS}"
        ))?
        .query_row((now, user_id.as_i64()), map_user_row)
        .map_err(|error| error.into())
}

/// Take the trashed user `user_id` out of the trash.
///
/// # Errors
///
/// Returns [Error::NotFound] if `user_id` is not in the trash.
pub fn restore_user(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!(
            "UPDATE user SET deleted_at = NULL WHERE id = ?1 AND deleted_at IS NOT NULL
             RETURNING {USER_COLUMNS}"
        ))?
        .query_row((user_id.as_i64(),), map_user_row)
        .map_err(|error| error.into())
}

/// Take every trashed user out of the trash, returning how many were restored.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn restore_all_users(connection: &Connection) -> Result<usize, Error> {
    connection
        .execute(
            "UPDATE user SET deleted_at = NULL WHERE deleted_at IS NOT NULL",
            (),
        )
        .map_err(|error| error.into())
}

/// Permanently delete the trashed user `user_id` and all of their transactions.
///
/// # Errors
///
/// Returns [Error::NotFound] if `user_id` is not in the trash.
pub fn purge_user(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!(
            "DELETE FROM user WHERE id = ?1 AND deleted_at IS NOT NULL RETURNING {USER_COLUMNS}"
        ))?
        .query_row((user_id.as_i64(),), map_user_row)
        .map_err(|error| error.into())
}

/// Permanently delete every trashed user, returning how many were deleted.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn purge_all_users(connection: &Connection) -> Result<usize, Error> {
    connection
        .execute("DELETE FROM user WHERE deleted_at IS NOT NULL", ())
        .map_err(|error| error.into())
}

/// Get one page of the users in `visibility`, filtered and ordered by `options`.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn list_users(
    options: &ListOptions<UserSortKey>,
    visibility: Visibility,
    connection: &Connection,
) -> Result<Page<User>, Error> {
    let mut filter = QueryFilter::default().condition(visibility.condition());
    if let Some(search) = &options.search {
        filter = filter.bind(
            "name LIKE :search ESCAPE '\\'",
            ":search",
            contains_pattern(search),
        );
    }
    let where_clause = filter.where_clause();

    let total: i64 = connection.query_row(
        &format!("SELECT COUNT(id) FROM user {where_clause}"),
        filter.params().as_slice(),
        |row| row.get(0),
    )?;

    let limit = sql_integer(options.page.per_page);
    let offset = sql_integer(options.page.offset());
    let mut params = filter.params();
    params.push((":limit", &limit));
    params.push((":offset", &offset));

    let users = connection
        .prepare(&format!(
            "SELECT {USER_COLUMNS} FROM user {where_clause} {} LIMIT :limit OFFSET :offset",
            Sort::order_by_clause(options.sort)
        ))?
        .query_map(params.as_slice(), map_user_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page::new(users, total as u64, options.page))
}
