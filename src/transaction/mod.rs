//! Transaction management for the finance tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and its table schema
//! - Validation of client input and the month windows used for filtering
//! - The `TransactionStore` trait and its SQLite implementation
//! - The create, update and delete operations and their route handlers

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod form;
mod list_endpoint;
mod mutation;
mod query;
mod sqlite;
mod state;
mod store;
pub(crate) mod window;

pub use core::{
    NewTransaction, ParseTransactionTypeError, Transaction, TransactionType,
    create_transaction_table, map_transaction_row,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use form::{MAX_AMOUNT, TransactionFields, TransactionForm};
pub use list_endpoint::list_transactions_endpoint;
pub use mutation::{create_transaction, delete_transaction, update_transaction};
pub use query::{SortOrder, TransactionFilter, TransactionQuery};
pub(crate) use query::MonthYear;
pub use sqlite::SQLiteTransactionStore;
pub use state::TransactionState;
pub use store::TransactionStore;
pub use window::{DateWindow, month_window, resolve_window};

pub(crate) use form::parse_decimal;
