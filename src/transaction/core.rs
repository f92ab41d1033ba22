//! Defines the core data models and database queries for transactions.

use std::fmt::Display;

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::TransactionId,
    timezone::normalize_timestamp,
    user::UserID,
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was earned or spent.
///
/// Serialized as `1` for income and `2` for expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TransactionKind {
    /// Money earned.
    Income,
    /// Money spent.
    Expense,
}

impl TransactionKind {
    /// Parse the wire value of a kind, e.g. "1" for income.
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim()
            .parse::<u8>()
            .ok()
            .and_then(|value| Self::try_from(value).ok())
    }

    /// The wire and database value of the kind.
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Income => 1,
            Self::Expense => 2,
        }
    }
}

impl TryFrom<u8> for TransactionKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Income),
            2 => Ok(Self::Expense),
            other => Err(format!("{other} is not a transaction type, expected 1 or 2")),
        }
    }
}

impl From<TransactionKind> for u8 {
    fn from(kind: TransactionKind) -> Self {
        kind.as_u8()
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Income => write!(f, "income"),
            Self::Expense => write!(f, "expense"),
        }
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(i64::from(self.as_u8())))
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_i64()?;

        u8::try_from(raw)
            .ok()
            .and_then(|raw| Self::try_from(raw).ok())
            .ok_or(FromSqlError::OutOfRange(raw))
    }
}

/// An expense or income recorded by a user.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that recorded the transaction.
    pub user_id: UserID,
    /// Whether the transaction is income or an expense.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// A text description of what the transaction was for.
    pub name: String,
    /// The amount of money spent or earned.
    pub amount: f64,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the transaction was last modified.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    /// When the transaction was moved to the trash, `None` for active transactions.
    #[serde(with = "time::serde::rfc3339::option")]
    pub deleted_at: Option<OffsetDateTime>,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(kind: TransactionKind, name: &str, amount: f64) -> TransactionBuilder {
        TransactionBuilder {
            kind,
            name: name.to_owned(),
            amount,
            created_at: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// Whether the transaction is income or an expense.
    pub kind: TransactionKind,

    /// A human-readable description of the transaction.
    pub name: String,

    /// The amount of money spent or earned.
    pub amount: f64,

    /// When the transaction was recorded.
    ///
    /// Defaults to the time the transaction is inserted.
    pub created_at: Option<OffsetDateTime>,
}

impl TransactionBuilder {
    /// Set when the transaction was recorded.
    pub fn created_at(mut self, created_at: OffsetDateTime) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

pub(crate) const TRANSACTION_COLUMNS: &str =
    "id, user_id, type, name, amount, created_at, updated_at, deleted_at";

/// Create a new transaction owned by `user_id` in the database from a builder.
///
/// `now` is used for the creation time unless the builder sets one.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `user_id` does not refer to a user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    user_id: UserID,
    builder: TransactionBuilder,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let created_at = normalize_timestamp(builder.created_at.unwrap_or(now));

    connection
        .prepare(&format!(
            "INSERT INTO \"transaction\" (user_id, type, name, amount, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                user_id.as_i64(),
                builder.kind,
                builder.name,
                builder.amount,
                created_at,
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            // Code 787 occurs when a FOREIGN KEY constraint failed.
            rusqlite::Error::SqliteFailure(error, Some(_)) if error.extended_code == 787 => {
                Error::NotFound
            }
            error => error.into(),
        })
}

/// Replace the kind, name and amount of an active transaction owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` is not an active transaction owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    user_id: UserID,
    id: TransactionId,
    builder: TransactionBuilder,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "UPDATE \"transaction\" SET type = ?1, name = ?2, amount = ?3, updated_at = ?4
             WHERE id = ?5 AND user_id = ?6 AND deleted_at IS NULL
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                builder.kind,
                builder.name,
                builder.amount,
                normalize_timestamp(now),
                id,
                user_id.as_i64(),
            ),
            map_transaction_row,
        )
        .map_err(|error| error.into())
}

/// Move an active transaction owned by `user_id` to the trash.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` is not an active transaction owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn trash_transaction(
    user_id: UserID,
    id: TransactionId,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "UPDATE \"transaction\" SET deleted_at = ?1
             WHERE id = ?2 AND user_id = ?3 AND deleted_at IS NULL
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (normalize_timestamp(now), id, user_id.as_i64()),
            map_transaction_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve a transaction owned by `user_id`, whether active or trashed.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
#[cfg(test)]
pub fn get_transaction(
    user_id: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = :id AND user_id = :user_id"
        ))?
        .query_row(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_transaction_row,
        )
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// Deleting a user deletes their transactions.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                type INTEGER NOT NULL CHECK (type IN (1, 2)),
                name TEXT NOT NULL,
                amount REAL NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                deleted_at TEXT,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_created
         ON \"transaction\"(user_id, created_at);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        kind: row.get(2)?,
        name: row.get(3)?,
        amount: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
        deleted_at: row.get(7)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
