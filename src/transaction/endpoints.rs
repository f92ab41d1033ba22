//! The ledger endpoints: CRUD, the trash and the reports.
//!
//! Every handler acts only on the transactions of the logged in user.

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
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error, db,
    listing::{Visibility, present},
    pagination::{Page, PaginationConfig},
    response::ApiResponse,
    timezone::{current_timestamp, get_local_offset},
    transaction::{
        Transaction, TransactionKind, create_transaction,
        form::TransactionForm,
        query::{TransactionFilter, TransactionListQuery, list_transactions},
        summary::{highest, net, summarize},
        trash::{
            purge_transaction, purge_transactions_of_kind, restore_transaction,
            restore_transactions_of_kind,
        },
        trash_transaction, update_transaction,
        window::{UtcBounds, Window},
    },
    user::UserID,
    validation::{ValidationErrors, json_body, path_param, query_params},
};

/// The state needed by the transaction endpoints.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The config that controls how to display pages of transactions.
    pub pagination_config: PaginationConfig,
    /// The canonical name of the timezone the report windows are evaluated in.
    pub local_timezone: String,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

impl TransactionState {
    /// Resolve `window` against the local calendar.
    fn utc_bounds(&self, window: Window) -> Result<UtcBounds, Error> {
        let offset = get_local_offset(&self.local_timezone)
            .ok_or_else(|| Error::InvalidTimezoneError(self.local_timezone.clone()))?;
        let today = OffsetDateTime::now_utc().to_offset(offset).date();

        Ok(window.date_range(today).utc_bounds(offset))
    }
}

/// The query string of the summary reports.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct WindowQuery {
    /// The window selector: "today", "this_month" or "custom".
    #[serde(rename = "type")]
    pub window: Option<String>,
    /// The first date of a custom window, formatted YYYY-MM-DD.
    pub start_date: Option<String>,
    /// The last date of a custom window, formatted YYYY-MM-DD.
    pub end_date: Option<String>,
}

impl WindowQuery {
    fn parse(&self) -> Result<Window, Error> {
        let mut errors = ValidationErrors::default();
        let window = Window::parse(
            &self.window,
            "type",
            &self.start_date,
            &self.end_date,
            &mut errors,
        );

        match window {
            Some(window) if errors.is_empty() => Ok(window),
            _ => {
                if present(&self.window).is_none() {
                    errors.add("type", "The type field is required.");
                }
                Err(Error::Validation(errors))
            }
        }
    }
}

/// The query string of the highest transaction report.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct HighestQuery {
    /// The kind of transaction, "1" or "2".
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// An optional window selector: "today", "this_month" or "custom".
    pub time: Option<String>,
    /// The first date of a custom window, formatted YYYY-MM-DD.
    pub start_date: Option<String>,
    /// The last date of a custom window, formatted YYYY-MM-DD.
    pub end_date: Option<String>,
}

impl HighestQuery {
    fn parse(&self) -> Result<(TransactionKind, Option<Window>), Error> {
        let mut errors = ValidationErrors::default();

        let kind = match present(&self.kind) {
            None => {
                errors.add("type", "The type field is required.");
                None
            }
            Some(raw) => {
                let kind = TransactionKind::parse(raw);
                if kind.is_none() {
                    errors.add("type", "The selected type is invalid.");
                }
                kind
            }
        };
        let window = Window::parse(
            &self.time,
            "time",
            &self.start_date,
            &self.end_date,
            &mut errors,
        );

        match kind {
            Some(kind) if errors.is_empty() => Ok((kind, window)),
            _ => Err(Error::Validation(errors)),
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

fn kind_param(kind: Result<Path<String>, PathRejection>) -> Result<TransactionKind, Error> {
    let raw = path_param(kind, "type")?;

    TransactionKind::parse(&raw).ok_or_else(|| {
        Error::Validation(ValidationErrors::single(
            "type",
            "The selected type is invalid.",
        ))
    })
}

fn list(
    state: &TransactionState,
    user_id: UserID,
    query: &TransactionListQuery,
    visibility: Visibility,
) -> Result<Page<Transaction>, Error> {
    let filter = TransactionFilter::parse(query, &state.pagination_config)?;
    let connection = db::lock(&state.db_connection)?;

    list_transactions(user_id, &filter, visibility, &connection)
}

/// List the active transactions of the logged in user.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    query: Result<Query<TransactionListQuery>, QueryRejection>,
) -> Response {
    let result =
        query_params(query).and_then(|query| list(&state, user_id, &query, Visibility::Active));

    into_response("Transactions list", result)
}

/// List the trashed transactions of the logged in user.
pub async fn transaction_trash_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    query: Result<Query<TransactionListQuery>, QueryRejection>,
) -> Response {
    let result =
        query_params(query).and_then(|query| list(&state, user_id, &query, Visibility::Trashed));

    into_response("Transactions trash list", result)
}

/// Record a new transaction.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    payload: Result<Json<TransactionForm>, JsonRejection>,
) -> Response {
    let result = json_body(payload)
        .and_then(TransactionForm::validate)
        .and_then(|builder| {
            let connection = db::lock(&state.db_connection)?;
            create_transaction(user_id, builder, current_timestamp(), &connection)
        });

    into_response("Transaction has been successfully created", result)
}

/// Replace the kind, name and amount of an active transaction.
pub async fn update_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    transaction_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<TransactionForm>, JsonRejection>,
) -> Response {
    let result = path_param(transaction_id, "id").and_then(|transaction_id| {
        let builder = json_body(payload)?.validate()?;
        let connection = db::lock(&state.db_connection)?;

        update_transaction(
            user_id,
            transaction_id,
            builder,
            current_timestamp(),
            &connection,
        )
    });

    into_response("Transaction has been successfully updated", result)
}

/// Move an active transaction to the trash.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    transaction_id: Result<Path<i64>, PathRejection>,
) -> Response {
    let result = path_param(transaction_id, "id").and_then(|transaction_id| {
        let connection = db::lock(&state.db_connection)?;
        trash_transaction(user_id, transaction_id, current_timestamp(), &connection)
    });

    into_response("Transaction has been successfully deleted", result)
}

fn summary_response(
    message: &'static str,
    kind: TransactionKind,
    state: &TransactionState,
    user_id: UserID,
    query: Result<Query<WindowQuery>, QueryRejection>,
) -> Response {
    let result = query_params(query)
        .and_then(|query| query.parse())
        .and_then(|window| {
            let bounds = state.utc_bounds(window)?;
            let connection = db::lock(&state.db_connection)?;

            summarize(user_id, kind, bounds, &connection)
        });

    match result {
        Ok(summary) => ApiResponse::ok(message, summary.records)
            .with_total(summary.total)
            .into_response(),
        Err(error) => error.into_response(),
    }
}

/// The total income of the logged in user within a window.
pub async fn income_summary_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    query: Result<Query<WindowQuery>, QueryRejection>,
) -> Response {
    summary_response(
        "Income summary",
        TransactionKind::Income,
        &state,
        user_id,
        query,
    )
}

/// The total expenses of the logged in user within a window.
pub async fn expense_summary_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    query: Result<Query<WindowQuery>, QueryRejection>,
) -> Response {
    summary_response(
        "Expense Summary",
        TransactionKind::Expense,
        &state,
        user_id,
        query,
    )
}

/// The largest income or expense of the logged in user, optionally within a
/// window.
pub async fn highest_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    query: Result<Query<HighestQuery>, QueryRejection>,
) -> Response {
    let (kind, window) = match query_params(query).and_then(|query| query.parse()) {
        Ok(parsed) => parsed,
        Err(error) => return error.into_response(),
    };

    let result = window
        .map(|window| state.utc_bounds(window))
        .transpose()
        .and_then(|bounds| {
            let connection = db::lock(&state.db_connection)?;
            highest(user_id, kind, bounds, &connection)
        });

    let message = match kind {
        TransactionKind::Income => "Highest income",
        TransactionKind::Expense => "Highest expense",
    };

    into_response(message, result)
}

/// Income minus expenses of the logged in user within a window.
pub async fn left_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    query: Result<Query<WindowQuery>, QueryRejection>,
) -> Response {
    let result = query_params(query)
        .and_then(|query| query.parse())
        .and_then(|window| {
            let bounds = state.utc_bounds(window)?;
            let connection = db::lock(&state.db_connection)?;

            net(user_id, bounds, &connection)
        });

    into_response("Left in a month", result)
}

/// Take a trashed transaction out of the trash.
pub async fn restore_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    transaction_id: Result<Path<i64>, PathRejection>,
) -> Response {
    let result = path_param(transaction_id, "id").and_then(|transaction_id| {
        let connection = db::lock(&state.db_connection)?;
        restore_transaction(user_id, transaction_id, &connection)
    });

    into_response("Transaction has been successfully restored", result)
}

/// Take every trashed transaction of a kind out of the trash.
pub async fn restore_transactions_of_kind_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    kind: Result<Path<String>, PathRejection>,
) -> Response {
    let result = kind_param(kind).and_then(|kind| {
        let connection = db::lock(&state.db_connection)?;
        restore_transactions_of_kind(user_id, kind, &connection)
    });

    into_response("Transaction has been successfully restored", result)
}

/// Permanently delete a trashed transaction.
pub async fn purge_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    transaction_id: Result<Path<i64>, PathRejection>,
) -> Response {
    let result = path_param(transaction_id, "id").and_then(|transaction_id| {
        let connection = db::lock(&state.db_connection)?;
        purge_transaction(user_id, transaction_id, &connection)
    });

    into_response("Transaction has been successfully deleted", result)
}

/// Permanently delete every trashed transaction of a kind.
pub async fn purge_transactions_of_kind_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    kind: Result<Path<String>, PathRejection>,
) -> Response {
    let result = kind_param(kind).and_then(|kind| {
        let connection = db::lock(&state.db_connection)?;
        purge_transactions_of_kind(user_id, kind, &connection)
    });

    into_response("Transaction has been successfully deleted", result)
}
