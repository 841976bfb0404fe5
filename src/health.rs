//! A route for checking that the server and its database are reachable.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Serialize;
use time::OffsetDateTime;

use crate::AppState;

/// The state needed to check the server's health.
#[derive(Debug, Clone)]
pub struct HealthState {
    /// The database connection to check.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for HealthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The status of the server and its database.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// "ok" if every check passed, otherwise "degraded".
    pub status: &'static str,
    /// "connected" if the database answered a query, otherwise "unavailable".
    pub database: &'static str,
    /// When the check ran.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// A route handler that reports whether the database can be queried.
///
/// Responds with 503 if the database is unavailable. No login is needed.
pub async fn get_health(State(state): State<HealthState>) -> (StatusCode, Json<HealthStatus>) {
    let database_ok = match state.db_connection.lock() {
        Ok(connection) => connection
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .is_ok(),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            false
        }
    };

    let (code, status, database) = if database_ok {
        (StatusCode::OK, "ok", "connected")
    } else {
        tracing::warn!("Health check failed: the database is unavailable");
        (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unavailable")
    };

    (
        code,
        Json(HealthStatus {
            status,
            database,
            timestamp: OffsetDateTime::now_utc(),
        }),
    )
}
