//! Creating, updating and deleting transactions on behalf of a user.

use time::OffsetDateTime;

use crate::{
    Error,
    database_id::TransactionId,
    transaction::{NewTransaction, Transaction, TransactionForm, TransactionStore},
    user::UserID,
};

/// Validate `form` and store it as a new transaction owned by `owner`.
///
/// The date defaults to `now` and plain dates are taken as midnight in the
/// offset of `now`.
///
/// # Errors
/// Returns [Error::ValidationFailed] without touching the store if any field is
/// invalid, or a store error if the insert fails.
pub fn create_transaction(
    owner: UserID,
    form: TransactionForm,
    now: OffsetDateTime,
    store: &impl TransactionStore,
) -> Result<Transaction, Error> {
    let fields = form.validate(now.offset())?;

    let transaction = store.insert(NewTransaction {
        owner,
        title: fields.title,
        amount: fields.amount,
        kind: fields.kind,
        category: fields.category,
        date: fields.date.unwrap_or(now),
        description: fields.description,
    })?;

    tracing::info!(
        "User {owner} created {} transaction {}",
        transaction.kind,
        transaction.id
    );

    Ok(transaction)
}

/// Replace the fields of transaction `id` with those in `form`.
///
/// The date is kept if `form` does not have one.
///
/// # Errors
/// Returns:
/// - [Error::NotFound] if there is no transaction with `id`,
/// - [Error::Forbidden] if the transaction belongs to someone other than `owner`,
/// - [Error::ValidationFailed] if any field is invalid,
/// - or a store error.
///
/// The store is not changed when an error is returned.
pub fn update_transaction(
    id: TransactionId,
    owner: UserID,
    form: TransactionForm,
    now: OffsetDateTime,
    store: &impl TransactionStore,
) -> Result<Transaction, Error> {
    let existing = load_owned(id, owner, store)?;
    let fields = form.validate(now.offset())?;

    let updated = Transaction {
        id: existing.id,
        owner: existing.owner,
        title: fields.title,
        amount: fields.amount,
        kind: fields.kind,
        category: fields.category,
        date: fields.date.unwrap_or(existing.date),
        description: fields.description,
    };

    let transaction = store.replace(id, &updated)?;
    tracing::info!("User {owner} updated transaction {id}");

    Ok(transaction)
}

/// Delete transaction `id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no transaction with `id`, or
/// [Error::Forbidden] if it belongs to someone other than `owner`.
pub fn delete_transaction(
    id: TransactionId,
    owner: UserID,
    store: &impl TransactionStore,
) -> Result<(), Error> {
    load_owned(id, owner, store)?;
    store.remove(id)?;
    tracing::info!("User {owner} deleted transaction {id}");

    Ok(())
}

fn load_owned(
    id: TransactionId,
    owner: UserID,
    store: &impl TransactionStore,
) -> Result<Transaction, Error> {
    let transaction = store.find_by_id(id)?.ok_or(Error::NotFound)?;

    if transaction.owner != owner {
        tracing::warn!(
            "User {owner} tried to modify transaction {id} owned by user {}",
            transaction.owner
        );
        return Err(Error::Forbidden);
    }

    Ok(transaction)
}
