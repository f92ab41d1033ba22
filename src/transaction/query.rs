//! Listing a user's transactions with search, kind filter, sorting and
//! paging, for both the active ledger and the trash.

use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    Error,
    listing::{
        ListOptions, QueryFilter, RawListQuery, Sort, SortColumn, Visibility, contains_pattern,
        present, sql_integer,
    },
    pagination::{Page, PaginationConfig},
    transaction::{
        Transaction, TransactionKind,
        core::{TRANSACTION_COLUMNS, map_transaction_row},
    },
    user::UserID,
    validation::ValidationErrors,
};

/// The columns a transaction list may be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionSortKey {
    /// Sort by insertion order.
    Id,
    /// Sort by the amount of money.
    Amount,
}

impl SortColumn for TransactionSortKey {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "id" => Some(Self::Id),
            // "total" is the name older clients use for the amount.
            "amount" | "total" => Some(Self::Amount),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Amount => "amount",
        }
    }
}

/// The raw query string of a transaction list request.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TransactionListQuery {
    /// Search, sort and paging parameters.
    #[serde(flatten)]
    pub list: RawListQuery,
    /// Only list transactions of this kind, "1" or "2".
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Validated options for listing transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFilter {
    /// Search, sort and paging options.
    pub options: ListOptions<TransactionSortKey>,
    /// Only include transactions of this kind.
    pub kind: Option<TransactionKind>,
}

impl TransactionFilter {
    /// Validate a list request.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] listing every invalid parameter.
    pub fn parse(query: &TransactionListQuery, config: &PaginationConfig) -> Result<Self, Error> {
        let mut errors = ValidationErrors::default();
        let options = ListOptions::parse(&query.list, config, &mut errors);

        let kind = present(&query.kind).and_then(|raw| {
            let kind = TransactionKind::parse(raw);
            if kind.is_none() {
                errors.add("type", "The selected type is invalid.");
            }
            kind
        });

        errors.into_result(Self { options, kind })
    }
}

/// Get one page of the transactions owned by `user_id` in `visibility`.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn list_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    visibility: Visibility,
    connection: &Connection,
) -> Result<Page<Transaction>, Error> {
    let mut query_filter = QueryFilter::default()
        .bind("user_id = :user_id", ":user_id", user_id.as_i64())
        .condition(visibility.condition());
    if let Some(kind) = filter.kind {
        query_filter = query_filter.bind("type = :type", ":type", kind);
    }
    if let Some(search) = &filter.options.search {
        query_filter = query_filter.bind(
            "name LIKE :search ESCAPE '\\'",
            ":search",
            contains_pattern(search),
        );
    }
    let where_clause = query_filter.where_clause();

    let total: i64 = connection.query_row(
        &format!("SELECT COUNT(id) FROM \"transaction\" {where_clause}"),
        query_filter.params().as_slice(),
        |row| row.get(0),
    )?;

    let page = filter.options.page;
    let limit = sql_integer(page.per_page);
    let offset = sql_integer(page.offset());
    let mut params = query_filter.params();
    params.push((":limit", &limit));
    params.push((":offset", &offset));

    let transactions = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" {where_clause} {} \
             LIMIT :limit OFFSET :offset",
            Sort::order_by_clause(filter.options.sort)
        ))?
        .query_map(params.as_slice(), map_transaction_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page::new(transactions, total as u64, page))
}
