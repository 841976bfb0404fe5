//! Defines the core data models and table schema for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Type, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{database_id::TransactionId, user::UserID};

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was earned or spent.
///
/// The amount of a transaction is always positive, the direction of the cash
/// flow is carried by this type alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money coming in, e.g. a salary.
    Income,
    /// Money going out, e.g. groceries.
    Expense,
}

impl TransactionType {
    /// The lowercase name used in queries, JSON and the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error returned when a string is neither "income" nor "expense".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("\"{0}\" is not a transaction type, expected \"income\" or \"expense\"")]
pub struct ParseTransactionTypeError(String);

impl FromStr for TransactionType {
    type Err = ParseTransactionTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(ParseTransactionTypeError(other.to_owned())),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user the transaction belongs to. Never changes after creation.
    pub owner: UserID,
    /// A short name for the transaction, e.g. "Weekly shop".
    pub title: String,
    /// The amount of money spent or earned. Always greater than zero.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// Whether the money was spent or earned.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// A free-form label, grouped by its exact text in summaries.
    pub category: String,
    /// When the transaction happened.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    /// Any extra detail the user wants to keep.
    pub description: Option<String>,
}

/// A validated transaction that has not been stored yet.
///
/// The store assigns the ID on insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// The user the transaction will belong to.
    pub owner: UserID,
    /// A short name for the transaction.
    pub title: String,
    /// The amount of money spent or earned, greater than zero.
    pub amount: Decimal,
    /// Whether the money was spent or earned.
    pub kind: TransactionType,
    /// A free-form label.
    pub category: String,
    /// When the transaction happened.
    pub date: OffsetDateTime,
    /// Any extra detail.
    pub description: Option<String>,
}

impl NewTransaction {
    /// Attach the store-assigned `id`.
    pub fn finalise(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            owner: self.owner,
            title: self.title,
            amount: self.amount,
            kind: self.kind,
            category: self.category,
            date: self.date,
            description: self.description,
        }
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// The columns of the transaction table in the order expected by [map_transaction_row].
pub(crate) const TRANSACTION_COLUMNS: &str =
    "id, owner_id, title, amount, type, category, date, description";

/// Create the transaction table in the database.
///
/// Amounts are stored as decimal text and dates as unix timestamps (seconds).
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                amount TEXT NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
                category TEXT NOT NULL,
                date INTEGER NOT NULL,
                description TEXT,
                FOREIGN KEY(owner_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('transaction', 0)",
        (),
    )?;

    // Every query is scoped to an owner, most are also bounded by date.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_owner_date ON \"transaction\"(owner_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
///
/// The row must contain the columns in [TRANSACTION_COLUMNS] order.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let raw_amount: String = row.get(3)?;
    let amount = Decimal::from_str(&raw_amount)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(error)))?;

    let timestamp: i64 = row.get(6)?;
    let date = OffsetDateTime::from_unix_timestamp(timestamp).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(6, Type::Integer, Box::new(error))
    })?;

    Ok(Transaction {
        id: row.get(0)?,
        owner: UserID::new(row.get(1)?),
        title: row.get(2)?,
        amount,
        kind: row.get(4)?,
        category: row.get(5)?,
        date,
        description: row.get(7)?,
    })
}
