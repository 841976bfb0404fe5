//! Defines the endpoint for creating a new transaction.

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use time::OffsetDateTime;

use crate::{
    Error,
    timezone::local_offset_or_error,
    transaction::{TransactionForm, TransactionState, create_transaction},
    user::User,
};

/// A route handler for creating a new transaction, responds with the created
/// transaction and status 201.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user): Extension<User>,
    payload: Result<Json<TransactionForm>, JsonRejection>,
) -> Result<Response, Error> {
    let Json(form) = payload?;
    let local_offset = local_offset_or_error(&state.local_timezone)?;
    let now = OffsetDateTime::now_utc().to_offset(local_offset);

    let transaction = create_transaction(user.id, form, now, &state.store)?;

    Ok((StatusCode::CREATED, Json(transaction)).into_response())
}
