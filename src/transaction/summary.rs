//! Aggregate reports over a user's active transactions.

use rusqlite::Connection;
use serde::Serialize;

use crate::{
    Error,
    transaction::{
        Transaction, TransactionKind,
        core::{TRANSACTION_COLUMNS, map_transaction_row},
        window::UtcBounds,
    },
    user::UserID,
};

/// The total of a kind of transaction within a window and the transactions
/// that make it up.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// The sum of the amounts, zero when there are no transactions.
    pub total: f64,
    /// The matching transactions in insertion order.
    pub records: Vec<Transaction>,
}

/// Sum the active transactions of `kind` owned by `user_id` within `bounds`.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn summarize(
    user_id: UserID,
    kind: TransactionKind,
    bounds: UtcBounds,
    connection: &Connection,
) -> Result<Summary, Error> {
    let user_id = user_id.as_i64();
    let params = rusqlite::named_params! {
        ":user_id": user_id,
        ":type": kind,
        ":start": bounds.start,
        ":end": bounds.end,
    };
    let condition = "user_id = :user_id AND type = :type AND deleted_at IS NULL \
                     AND created_at >= :start AND created_at < :end";

    let total: f64 = connection.query_row(
        &format!("SELECT COALESCE(SUM(amount), 0.0) FROM \"transaction\" WHERE {condition}"),
        params,
        |row| row.get(0),
    )?;

    let records = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE {condition} ORDER BY id ASC"
        ))?
        .query_map(params, map_transaction_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Summary { total, records })
}

/// The largest amount among the active transactions of `kind` owned by
/// `user_id`, optionally limited to `bounds`.
///
/// Returns `None` if there are no matching transactions.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn highest(
    user_id: UserID,
    kind: TransactionKind,
    bounds: Option<UtcBounds>,
    connection: &Connection,
) -> Result<Option<f64>, Error> {
    let base = "SELECT MAX(amount) FROM \"transaction\" \
                WHERE user_id = :user_id AND type = :type AND deleted_at IS NULL";

    let highest = match bounds {
        Some(bounds) => connection.query_row(
            &format!("{base} AND created_at >= :start AND created_at < :end"),
            rusqlite::named_params! {
                ":user_id": user_id.as_i64(),
                ":type": kind,
                ":start": bounds.start,
                ":end": bounds.end,
            },
            |row| row.get(0),
        )?,
        None => connection.query_row(
            base,
            rusqlite::named_params! {
                ":user_id": user_id.as_i64(),
                ":type": kind,
            },
            |row| row.get(0),
        )?,
    };

    Ok(highest)
}

/// Income minus expenses for the active transactions owned by `user_id`
/// within `bounds`.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn net(user_id: UserID, bounds: UtcBounds, connection: &Connection) -> Result<f64, Error> {
    let income = summarize(user_id, TransactionKind::Income, bounds, connection)?;
    let expenses = summarize(user_id, TransactionKind::Expense, bounds, connection)?;

    Ok(income.total - expenses.total)
}
