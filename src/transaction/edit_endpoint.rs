//! Defines the endpoint for updating a transaction.

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::TransactionId,
    timezone::local_offset_or_error,
    transaction::{Transaction, TransactionForm, TransactionState, update_transaction},
    user::User,
};

/// A route handler for replacing the fields of a transaction, responds with
/// the updated transaction.
pub async fn edit_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user): Extension<User>,
    Path(transaction_id): Path<TransactionId>,
    payload: Result<Json<TransactionForm>, JsonRejection>,
) -> Result<Json<Transaction>, Error> {
    let Json(form) = payload?;
    let local_offset = local_offset_or_error(&state.local_timezone)?;
    let now = OffsetDateTime::now_utc().to_offset(local_offset);

    update_transaction(transaction_id, user.id, form, now, &state.store).map(Json)
}
