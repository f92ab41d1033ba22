//! Shared building blocks for list endpoints: search, sorting and paging
//! options, their validation, and the parameterised SQL they compile to.

use rusqlite::ToSql;
use serde::Deserialize;

use crate::{
    pagination::{PageRequest, PaginationConfig},
    validation::ValidationErrors,
};

/// The raw, unvalidated query string of a list request.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawListQuery {
    /// Text to search for in record names.
    pub search: Option<String>,
    /// The field to sort by.
    pub sort_by: Option<String>,
    /// The direction to sort in, "asc" or "desc".
    pub sort_order: Option<String>,
    /// The number of records per page.
    pub per_page: Option<String>,
    /// The 1-based page number.
    pub page: Option<String>,
}

/// The order to sort records in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Sort in order of increasing value.
    Ascending,
    /// Sort in order of decreasing value.
    Descending,
}

impl SortOrder {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "asc" => Some(Self::Ascending),
            "desc" => Some(Self::Descending),
            _ => None,
        }
    }

    fn as_sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// A column that a list query may be sorted by.
///
/// Implementors map a closed set of request values onto column names so that
/// no client text ever reaches the SQL.
pub trait SortColumn: Copy {
    /// Parse the `sort_by` request value.
    fn parse(raw: &str) -> Option<Self>;

    /// The SQL column to order by.
    fn column(self) -> &'static str;
}

/// A validated sort key and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort<K> {
    /// What to sort by.
    pub key: K,
    /// Which direction to sort in.
    pub order: SortOrder,
}

impl<K: SortColumn> Sort<K> {
    /// The `ORDER BY` clause for this sort.
    ///
    /// `id` is appended as a tie-breaker so that pages are stable.
    pub fn order_by_clause(sort: Option<Self>) -> String {
        match sort {
            Some(sort) if sort.key.column() == "id" => {
                format!("ORDER BY id {}", sort.order.as_sql())
            }
            Some(sort) => format!(
                "ORDER BY {} {}, id ASC",
                sort.key.column(),
                sort.order.as_sql()
            ),
            None => "ORDER BY id ASC".to_owned(),
        }
    }
}

/// Validated search, sort and paging options.
#[derive(Debug, Clone, PartialEq)]
pub struct ListOptions<K> {
    /// Text that record names must contain.
    pub search: Option<String>,
    /// How to order the records, `None` for insertion order.
    pub sort: Option<Sort<K>>,
    /// Which page of records to return.
    pub page: PageRequest,
}

impl<K: SortColumn> ListOptions<K> {
    /// Validate `raw`, recording every problem in `errors`.
    ///
    /// The returned options are only meaningful if no errors were recorded.
    pub fn parse(
        raw: &RawListQuery,
        config: &PaginationConfig,
        errors: &mut ValidationErrors,
    ) -> Self {
        let search = present(&raw.search).map(str::to_owned);
        let sort_by = present(&raw.sort_by);
        let sort_order = present(&raw.sort_order);

        let key = sort_by.and_then(|raw_key| {
            let key = K::parse(raw_key);
            if key.is_none() {
                errors.add("sort_by", "The selected sort by is invalid.");
            }
            key
        });
        let order = sort_order.and_then(|raw_order| {
            let order = SortOrder::parse(raw_order);
            if order.is_none() {
                errors.add("sort_order", "The selected sort order is invalid.");
            }
            order
        });

        match (sort_by, sort_order) {
            (Some(_), None) => errors.add(
                "sort_order",
                "The sort order field is required when sort by is present.",
            ),
            (None, Some(_)) => errors.add(
                "sort_by",
                "The sort by field is required when sort order is present.",
            ),
            _ => {}
        }

        let sort = match (key, order) {
            (Some(key), Some(order)) => Some(Sort { key, order }),
            _ => None,
        };

        let per_page = parse_positive(&raw.per_page, "per_page", "per page", errors);
        if per_page.is_some_and(|per_page| per_page > config.max_page_size) {
            errors.add(
                "per_page",
                format!(
                    "The per page may not be greater than {}.",
                    config.max_page_size
                ),
            );
        }
        let page = parse_positive(&raw.page, "page", "page", errors);

        Self {
            search,
            sort,
            page: PageRequest::with_defaults(page, per_page, config),
        }
    }
}

/// Which side of the soft-delete line a query looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Records that have not been deleted.
    Active,
    /// Records that have been moved to the trash.
    Trashed,
}

impl Visibility {
    /// The SQL condition selecting records with this visibility.
    pub fn condition(self) -> &'static str {
        match self {
            Self::Active => "deleted_at IS NULL",
            Self::Trashed => "deleted_at IS NOT NULL",
        }
    }
}

/// Treat empty query values the same as missing ones.
pub fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

fn parse_positive(
    value: &Option<String>,
    field: &str,
    label: &str,
    errors: &mut ValidationErrors,
) -> Option<u64> {
    let raw = present(value)?;

    match raw.parse::<u64>() {
        Ok(number) if number > 0 => Some(number),
        _ => {
            errors.add(field, format!("The {label} must be a positive integer."));
            None
        }
    }
}

/// Build a `LIKE` pattern that matches `search` literally anywhere in a value.
///
/// Use with `ESCAPE '\'`.
pub fn contains_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');

    pattern
}

/// Accumulates `WHERE` conditions and their named parameters.
#[derive(Default)]
pub struct QueryFilter {
    conditions: Vec<String>,
    params: Vec<(&'static str, Box<dyn ToSql>)>,
}

impl QueryFilter {
    /// Add a condition without parameters.
    pub fn condition(mut self, condition: &str) -> Self {
        self.conditions.push(condition.to_owned());
        self
    }

    /// Add a condition that references the named parameter `name`.
    pub fn bind(mut self, condition: &str, name: &'static str, value: impl ToSql + 'static) -> Self {
        self.conditions.push(condition.to_owned());
        self.params.push((name, Box::new(value)));
        self
    }

    /// The `WHERE` clause, or an empty string if there are no conditions.
    pub fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }

    /// The named parameters in the form rusqlite expects.
    pub fn params(&self) -> Vec<(&str, &dyn ToSql)> {
        self.params
            .iter()
            .map(|(name, value)| (*name, value.as_ref()))
            .collect()
    }
}

/// Convert a page size or offset to a SQL integer.
pub fn sql_integer(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
