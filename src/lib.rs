//! Fintrack is a personal finance tracker.
//!
//! Users record income and expense transactions tagged with free-form
//! categories, then ask for summaries of a calendar month: totals, a
//! per-category breakdown of expenses, a month-by-month series over their
//! whole history and, optionally, how they are tracking against a monthly
//! budget.
//!
//! This library provides a JSON REST API over a SQLite database.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde::Serialize;
use tokio::signal;

mod app_state;
mod auth;
mod category;
mod database_id;
mod db;
mod endpoints;
mod health;
mod logging;
mod routing;
mod summary;
mod timezone;
mod transaction;
mod user;

pub use app_state::AppState;
pub use auth::{COOKIE_USER_ID, DEFAULT_COOKIE_DURATION, set_auth_cookie};
pub use database_id::{DatabaseId, TransactionId};
pub use db::initialize as initialize_db;
pub use endpoints::format_endpoint;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use summary::{
    BudgetStatus, CategoryStat, MonthlyTotal, RunningBalance, Summary, compute_category_stats,
    compute_summary,
};
pub use timezone::get_local_offset;
pub use transaction::{
    MAX_AMOUNT, NewTransaction, SQLiteTransactionStore, SortOrder, Transaction, TransactionFilter,
    TransactionForm, TransactionQuery, TransactionStore, TransactionType, create_transaction,
    delete_transaction, update_transaction,
};
pub use user::{User, UserID, create_user, get_user_by_id};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// A problem with a single field of a request, e.g. an empty title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// The name of the offending field as the client sent it.
    pub field: String,
    /// A message suitable for showing next to the field.
    pub message: String,
}

impl FieldError {
    /// Create a new field error.
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_owned(),
            message: message.to_owned(),
        }
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|error| format!("{}: {}", error.field, error.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// One or more fields in the request were missing or invalid.
    ///
    /// Validation happens before anything is written to the store, so this
    /// error never leaves partial state behind.
    #[error("validation failed: {}", join_field_errors(.0))]
    ValidationFailed(Vec<FieldError>),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The caller does not own the resource they tried to change.
    ///
    /// Existence is checked before ownership, so this error confirms to the
    /// caller that the resource exists.
    #[error("the resource belongs to another user")]
    Forbidden,

    /// The request did not carry a valid caller identity.
    #[error("no valid credentials were provided")]
    Unauthenticated,

    /// The underlying database failed, or its lock was poisoned.
    ///
    /// The string is for the server logs only and is never sent to clients.
    #[error("the store is unavailable: {0}")]
    StoreUnavailable(String),

    /// The configured timezone is not a valid, canonical timezone name.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected JSON body: {rejection}");
        Error::ValidationFailed(vec![FieldError::new("body", &rejection.body_text())])
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::StoreUnavailable(error.to_string())
            }
        }
    }
}

/// The JSON body sent to clients when a request fails.
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<FieldError>,
}

impl ErrorBody {
    fn new(message: &str) -> Self {
        Self {
            message: message.to_owned(),
            errors: Vec::new(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Error::ValidationFailed(errors) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    message: "Validation failed".to_owned(),
                    errors,
                },
            ),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                ErrorBody::new("The requested resource could not be found"),
            ),
            Error::Forbidden => (StatusCode::FORBIDDEN, ErrorBody::new("Not authorized")),
            Error::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("You must be logged in to access this resource"),
            ),
            Error::StoreUnavailable(error) => {
                tracing::error!("The store is unavailable: {error}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorBody::new("The service is temporarily unavailable, try again later"),
                )
            }
            Error::InvalidTimezone(timezone) => {
                tracing::error!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("Invalid timezone settings, check the server logs"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
