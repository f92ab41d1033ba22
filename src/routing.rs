//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};

use crate::{
    AppState, Error,
    auth::{auth_guard, post_log_in, post_log_out, register_user},
    endpoints,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, expense_summary_endpoint,
        highest_endpoint, income_summary_endpoint, left_endpoint, list_transactions_endpoint,
        purge_transaction_endpoint, purge_transactions_of_kind_endpoint,
        restore_transaction_endpoint, restore_transactions_of_kind_endpoint,
        transaction_trash_endpoint, update_transaction_endpoint,
    },
    user::{
        create_user_endpoint, delete_user_endpoint, get_me, list_users_endpoint,
        purge_all_users_endpoint, purge_user_endpoint, restore_all_users_endpoint,
        restore_user_endpoint, update_user_endpoint, user_trash_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::COFFEE, get(get_coffee))
        .route(endpoints::REGISTER, post(register_user))
        .route(endpoints::LOG_IN, post(post_log_in));

    let protected_routes = Router::new()
        .route(endpoints::LOG_OUT, post(post_log_out))
        .route(endpoints::ME, get(get_me))
        .route(
            endpoints::USERS,
            get(list_users_endpoint).post(create_user_endpoint),
        )
        .route(
            endpoints::USER,
            put(update_user_endpoint).delete(delete_user_endpoint),
        )
        .route(endpoints::USER_TRASH, get(user_trash_endpoint))
        .route(endpoints::USER_RESTORE, post(restore_user_endpoint))
        .route(endpoints::USER_RESTORE_ALL, post(restore_all_users_endpoint))
        .route(endpoints::USER_PURGE, delete(purge_user_endpoint))
        .route(endpoints::USER_PURGE_ALL, delete(purge_all_users_endpoint))
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            put(update_transaction_endpoint).delete(delete_transaction_endpoint),
        )
        .route(endpoints::INCOME_SUMMARY, get(income_summary_endpoint))
        .route(endpoints::EXPENSE_SUMMARY, get(expense_summary_endpoint))
        .route(endpoints::HIGHEST, get(highest_endpoint))
        .route(endpoints::LEFT, get(left_endpoint))
        .route(endpoints::TRANSACTION_TRASH, get(transaction_trash_endpoint))
        .route(
            endpoints::TRANSACTION_RESTORE,
            post(restore_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION_RESTORE_KIND,
            post(restore_transactions_of_kind_endpoint),
        )
        .route(
            endpoints::TRANSACTION_PURGE,
            delete(purge_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION_PURGE_KIND,
            delete(purge_transactions_of_kind_endpoint),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (StatusCode::IM_A_TEAPOT, "I'm a teapot").into_response()
}

async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}
