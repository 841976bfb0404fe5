use axum::extract::FromRef;

use crate::{AppState, transaction::SQLiteTransactionStore};

/// The state needed by the transaction endpoints.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The store for reading and writing transactions.
    pub store: SQLiteTransactionStore,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            store: state.transaction_store.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}
