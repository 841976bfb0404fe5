//! Implements a SQLite backed transaction store.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, params_from_iter, types::Value};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::TransactionId,
    transaction::{
        NewTransaction, SortOrder, Transaction, TransactionQuery, TransactionStore,
        core::{TRANSACTION_COLUMNS, map_transaction_row},
    },
    user::UserID,
};

/// Stores transactions in a SQLite database.
///
/// The `user` and `transaction` tables must exist, see [crate::initialize_db].
#[derive(Debug, Clone)]
pub struct SQLiteTransactionStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteTransactionStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::StoreUnavailable("the database lock is poisoned".to_owned())
        })
    }
}

/// Dates are stored with a precision of one second.
fn truncate_to_seconds(date: OffsetDateTime) -> Result<OffsetDateTime, Error> {
    OffsetDateTime::from_unix_timestamp(date.unix_timestamp())
        .map_err(|error| Error::StoreUnavailable(error.to_string()))
}

impl TransactionStore for SQLiteTransactionStore {
    /// Query for transactions in the database.
    ///
    /// The window bounds are compared as unix timestamps, so a window ending
    /// at 23:59:59.999 includes a transaction stored at 23:59:59.
    fn find(&self, query: &TransactionQuery) -> Result<Vec<Transaction>, Error> {
        let mut query_string_parts =
            vec![format!("SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"")];
        let mut where_clause_parts = vec!["owner_id = ?1".to_owned()];
        let mut query_parameters = vec![Value::Integer(query.owner.as_i64())];

        if let Some(window) = query.window {
            where_clause_parts.push(format!(
                "date BETWEEN ?{} AND ?{}",
                query_parameters.len() + 1,
                query_parameters.len() + 2,
            ));
            query_parameters.push(Value::Integer(window.start.unix_timestamp()));
            query_parameters.push(Value::Integer(window.end.unix_timestamp()));
        }

        if let Some(category) = &query.category {
            where_clause_parts.push(format!("category = ?{}", query_parameters.len() + 1));
            query_parameters.push(Value::Text(category.clone()));
        }

        if let Some(kind) = query.kind {
            where_clause_parts.push(format!("type = ?{}", query_parameters.len() + 1));
            query_parameters.push(Value::Text(kind.as_str().to_owned()));
        }

        query_string_parts.push(String::from("WHERE ") + &where_clause_parts.join(" AND "));

        match query.sort_date {
            Some(SortOrder::Ascending) => {
                query_string_parts.push("ORDER BY date ASC, id ASC".to_owned())
            }
            Some(SortOrder::Descending) => {
                query_string_parts.push("ORDER BY date DESC, id DESC".to_owned())
            }
            None => {}
        }

        let query_string = query_string_parts.join(" ");
        let params = params_from_iter(query_parameters.iter());

        let connection = self.lock()?;
        let mut statement = connection.prepare(&query_string)?;
        let transactions = statement
            .query_map(params, map_transaction_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    fn find_by_id(&self, id: TransactionId) -> Result<Option<Transaction>, Error> {
        let transaction = self
            .lock()?
            .prepare(&format!(
                "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = :id"
            ))?
            .query_row(&[(":id", &id)], map_transaction_row)
            .optional()?;

        Ok(transaction)
    }

    fn insert(&self, transaction: NewTransaction) -> Result<Transaction, Error> {
        let date = truncate_to_seconds(transaction.date)?;
        let connection = self.lock()?;

        connection.execute(
            "INSERT INTO \"transaction\" (owner_id, title, amount, type, category, date, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            (
                transaction.owner.as_i64(),
                &transaction.title,
                transaction.amount.to_string(),
                transaction.kind,
                &transaction.category,
                date.unix_timestamp(),
                &transaction.description,
            ),
        )?;

        let id = connection.last_insert_rowid();

        Ok(NewTransaction {
            date,
            ..transaction
        }
        .finalise(id))
    }

    fn replace(
        &self,
        id: TransactionId,
        transaction: &Transaction,
    ) -> Result<Transaction, Error> {
        let date = truncate_to_seconds(transaction.date)?;

        let updated = self
            .lock()?
            .prepare(&format!(
                "UPDATE \"transaction\"
                 SET title = ?1, amount = ?2, type = ?3, category = ?4, date = ?5, description = ?6
                 WHERE id = ?7
                 RETURNING {TRANSACTION_COLUMNS}"
            ))?
            .query_row(
                (
                    &transaction.title,
                    transaction.amount.to_string(),
                    transaction.kind,
                    &transaction.category,
                    date.unix_timestamp(),
                    &transaction.description,
                    id,
                ),
                map_transaction_row,
            )?;

        Ok(updated)
    }

    fn remove(&self, id: TransactionId) -> Result<(), Error> {
        let rows_affected = self
            .lock()?
            .execute("DELETE FROM \"transaction\" WHERE id = ?1", (id,))?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }

    fn distinct_categories(&self, owner: UserID) -> Result<Vec<String>, Error> {
        let connection = self.lock()?;
        let mut statement = connection.prepare(
            "SELECT DISTINCT category FROM \"transaction\" WHERE owner_id = ?1 ORDER BY category ASC",
        )?;
        let categories = statement
            .query_map((owner.as_i64(),), |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(categories)
    }
}
