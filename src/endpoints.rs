//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/user/{id}', use [format_endpoint].

/// The route for registering a new user.
pub const REGISTER: &str = "/api/user/register";
/// The route for logging in.
pub const LOG_IN: &str = "/api/user/login";
/// The route for logging out.
pub const LOG_OUT: &str = "/api/user/logout";
/// The route for getting the logged in user.
pub const ME: &str = "/api/user/me";
/// The route for listing and creating users.
pub const USERS: &str = "/api/user";
/// The route for updating or deleting a user.
pub const USER: &str = "/api/user/{id}";
/// The route for listing trashed users.
pub const USER_TRASH: &str = "/api/user/trash";
/// The route for restoring a trashed user.
pub const USER_RESTORE: &str = "/api/user/restore/{id}";
/// The route for restoring every trashed user.
pub const USER_RESTORE_ALL: &str = "/api/user/restores";
/// The route for permanently deleting a trashed user.
pub const USER_PURGE: &str = "/api/user/force_delete/{id}";
/// The route for permanently deleting every trashed user.
pub const USER_PURGE_ALL: &str = "/api/user/force_deletes";

/// The route for listing and creating transactions.
pub const TRANSACTIONS: &str = "/api/transaction";
/// The route for updating or deleting a transaction.
pub const TRANSACTION: &str = "/api/transaction/{id}";
/// The route for the income summary report.
pub const INCOME_SUMMARY: &str = "/api/transaction/income_summary";
/// The route for the expense summary report.
pub const EXPENSE_SUMMARY: &str = "/api/transaction/expense_summary";
/// The route for the largest transaction of a kind.
pub const HIGHEST: &str = "/api/transaction/highest";
/// The route for income minus expenses.
pub const LEFT: &str = "/api/transaction/left";
/// The route for listing trashed transactions.
pub const TRANSACTION_TRASH: &str = "/api/transaction/trash";
/// The route for restoring a trashed transaction.
pub const TRANSACTION_RESTORE: &str = "/api/transaction/restore/{id}";
/// The route for restoring every trashed transaction of a kind.
pub const TRANSACTION_RESTORE_KIND: &str = "/api/transaction/restores/{type}";
/// The route for permanently deleting a trashed transaction.
pub const TRANSACTION_PURGE: &str = "/api/transaction/force_delete/{id}";
/// The route for permanently deleting every trashed transaction of a kind.
pub const TRANSACTION_PURGE_KIND: &str = "/api/transaction/force_deletes/{type}";

/// The route to access the coffee.
pub const COFFEE: &str = "/api/coffee";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// Only the first parameter is replaced, e.g. '/api/user/{id}' becomes '/api/user/1'.
/// Paths without a parameter are returned unchanged.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.char_indices() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
