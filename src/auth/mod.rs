//! Identifies the caller of protected routes from a private cookie.
//!
//! Issuing the cookie (e.g. after checking a password) is left to whatever
//! sits in front of this API, which calls [set_auth_cookie].

mod cookie;
mod middleware;

pub use cookie::{COOKIE_EXPIRY, COOKIE_USER_ID, DEFAULT_COOKIE_DURATION, set_auth_cookie};
pub use middleware::{AuthState, auth_guard};

/// The ways reading the auth cookies can fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum AuthError {
    /// The user ID or expiry cookie is not in the cookie jar.
    #[error("the auth cookies are missing")]
    CookieMissing,
    /// The cookies could not be decrypted or parsed, or have expired.
    #[error("the auth cookies are invalid")]
    InvalidCredentials,
    /// The expiry could not be extended or formatted.
    #[error("could not update the auth cookie expiry")]
    DateError,
}
