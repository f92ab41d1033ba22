//! Log-out route handler that invalidates the session cookie.

use axum::response::{IntoResponse, Response};
use axum_extra::extract::PrivateCookieJar;

use crate::{auth::invalidate_auth_cookie, response::ApiResponse};

/// Invalidate the auth cookie.
pub async fn post_log_out(jar: PrivateCookieJar) -> Response {
    let jar = invalidate_auth_cookie(jar);

    (
        jar,
        ApiResponse::ok("User has been successfully logged out", ()),
    )
        .into_response()
}
