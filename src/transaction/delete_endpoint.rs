//! Defines the endpoint for deleting a transaction.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde_json::{Value, json};

use crate::{
    Error,
    database_id::TransactionId,
    transaction::{TransactionState, delete_transaction},
    user::User,
};

/// A route handler for deleting a transaction.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user): Extension<User>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<Value>, Error> {
    delete_transaction(transaction_id, user.id, &state.store)?;

    Ok(Json(json!({ "message": "Transaction removed" })))
}
