//! Defines the endpoint for listing a user's transactions.

use axum::{
    Extension, Json,
    extract::{Query, State},
};

use crate::{
    Error,
    timezone::local_offset_or_error,
    transaction::{SortOrder, Transaction, TransactionFilter, TransactionState, TransactionStore},
    user::User,
};

/// A route handler for listing the transactions that match the query
/// parameters, most recent first.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user): Extension<User>,
    Query(filter): Query<TransactionFilter>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let local_offset = local_offset_or_error(&state.local_timezone)?;
    let query = filter
        .build_query(user.id, local_offset)?
        .sort_date(Some(SortOrder::Descending));

    state.store.find(&query).map(Json)
}
