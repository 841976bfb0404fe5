//! The private cookies that identify a logged-in user.
//!
//! A session is two cookies: the user's ID and the time the session expires.
//! Both are encrypted, so the expiry can be trusted when a client ignores the
//! cookie's own `Expires` attribute.

use std::cmp::max;

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{
    Duration, OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
};

use crate::{auth::AuthError, user::UserID};

/// The name of the cookie holding the logged-in user's ID.
pub const COOKIE_USER_ID: &str = "user_id";
/// The name of the cookie holding when the session expires.
pub const COOKIE_EXPIRY: &str = "expiry";
/// The default duration for which auth cookies are valid.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::minutes(5);

/// Zero-padded so that times just after midnight parse again, e.g.
/// "2024-03-01 00:05:00.0 +00:00:00".
const EXPIRY_FORMAT: &[BorrowedFormatItem] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond] [offset_hour \
         sign:mandatory]:[offset_minute]:[offset_second]"
);

/// Start a session for `user_id` that lasts `duration` from now.
///
/// You can use [DEFAULT_COOKIE_DURATION] for the default duration.
///
/// # Errors
///
/// Returns a [time::error::Format] if the expiry time cannot be formatted.
pub fn set_auth_cookie(
    jar: PrivateCookieJar,
    user_id: UserID,
    duration: Duration,
) -> Result<PrivateCookieJar, time::error::Format> {
    let expiry = OffsetDateTime::now_utc() + duration;
    let expiry_text = expiry.format(EXPIRY_FORMAT)?;

    Ok(jar
        .add(session_cookie(COOKIE_USER_ID, user_id.to_string(), expiry))
        .add(session_cookie(COOKIE_EXPIRY, expiry_text, expiry)))
}

fn session_cookie(name: &'static str, value: String, expiry: OffsetDateTime) -> Cookie<'static> {
    Cookie::build((name, value))
        .expires(expiry)
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(true)
        .build()
}

/// Push the session's expiry out to `duration` from now, unless it already
/// ends later than that.
///
/// # Errors
///
/// The jar is left untouched on error, which is one of:
/// - [AuthError::CookieMissing] if either session cookie is missing.
/// - [AuthError::DateError] if the new expiry overflows or cannot be formatted.
pub(crate) fn extend_auth_cookie_duration_if_needed(
    jar: PrivateCookieJar,
    duration: Duration,
) -> Result<PrivateCookieJar, AuthError> {
    let (Some(user_id_cookie), Some(expiry_cookie)) =
        (jar.get(COOKIE_USER_ID), jar.get(COOKIE_EXPIRY))
    else {
        return Err(AuthError::CookieMissing);
    };

    let current_expiry = parse_expiry(&expiry_cookie).ok_or(AuthError::DateError)?;
    let requested_expiry = OffsetDateTime::now_utc()
        .checked_add(duration)
        .ok_or(AuthError::DateError)?;
    let expiry = max(current_expiry, requested_expiry);
    let expiry_text = expiry
        .format(EXPIRY_FORMAT)
        .map_err(|_| AuthError::DateError)?;

    Ok(jar
        .add(session_cookie(
            COOKIE_USER_ID,
            user_id_cookie.value_trimmed().to_owned(),
            expiry,
        ))
        .add(session_cookie(COOKIE_EXPIRY, expiry_text, expiry)))
}

/// Get the ID of the logged-in user from the session cookies in `jar`.
///
/// # Errors
///
/// Returns [AuthError::InvalidCredentials] if either cookie is missing,
/// cannot be parsed, or the session has expired.
pub(crate) fn get_user_id_from_auth_cookie(jar: &PrivateCookieJar) -> Result<UserID, AuthError> {
    let (Some(user_id_cookie), Some(expiry_cookie)) =
        (jar.get(COOKIE_USER_ID), jar.get(COOKIE_EXPIRY))
    else {
        return Err(AuthError::InvalidCredentials);
    };

    match parse_expiry(&expiry_cookie) {
        Some(expiry) if expiry > OffsetDateTime::now_utc() => {}
        _ => return Err(AuthError::InvalidCredentials),
    }

    user_id_cookie
        .value_trimmed()
        .parse()
        .map(UserID::new)
        .map_err(|_| AuthError::InvalidCredentials)
}

fn parse_expiry(cookie: &Cookie) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(cookie.value_trimmed(), EXPIRY_FORMAT).ok()
}
