//! Password hashing, the session cookie, the auth middleware and the log in,
//! log out and registration endpoints.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod register_user;
mod token;

pub(crate) use cookie::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use log_in::post_log_in;
pub use log_out::post_log_out;
pub use middleware::auth_guard;
pub use password::{PasswordHash, ValidatedPassword};
pub use register_user::register_user;
pub(super) use token::Token;

#[cfg(test)]
pub use middleware::AuthState;
