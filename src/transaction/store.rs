//! Defines the transaction store trait.

use crate::{
    Error,
    database_id::TransactionId,
    transaction::{NewTransaction, Transaction, TransactionQuery},
    user::UserID,
};

/// Handles the persistence of transactions.
///
/// Each call is atomic on its own, there are no multi-call transactions.
pub trait TransactionStore {
    /// Retrieve the transactions that match `query`.
    fn find(&self, query: &TransactionQuery) -> Result<Vec<Transaction>, Error>;

    /// Retrieve a single transaction regardless of its owner.
    ///
    /// Returns `Ok(None)` if there is no transaction with `id`.
    fn find_by_id(&self, id: TransactionId) -> Result<Option<Transaction>, Error>;

    /// Store a new transaction and return it with its assigned ID.
    fn insert(&self, transaction: NewTransaction) -> Result<Transaction, Error>;

    /// Overwrite every field except the ID and owner of the transaction `id`.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if there is no transaction with `id`.
    fn replace(&self, id: TransactionId, transaction: &Transaction)
    -> Result<Transaction, Error>;

    /// Remove the transaction `id`.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if there is no transaction with `id`.
    fn remove(&self, id: TransactionId) -> Result<(), Error>;

    /// The unique categories used by `owner`, sorted alphabetically.
    fn distinct_categories(&self, owner: UserID) -> Result<Vec<String>, Error>;
}
