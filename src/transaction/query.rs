//! Builds store queries from the optional filters a client can apply when
//! listing transactions or requesting a summary.

use serde::{Deserialize, Serialize};
use time::{Month, UtcOffset};

use crate::{
    Error, FieldError,
    transaction::{
        Transaction, TransactionType,
        window::{DateWindow, resolve_window},
    },
    user::UserID,
};

/// The order to sort transactions in a [TransactionQuery].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Sort in order of increasing value.
    Ascending,
    /// Sort in order of decreasing value.
    Descending,
}

/// Defines which transactions should be fetched from
/// [TransactionStore::find](crate::transaction::TransactionStore::find).
///
/// All conditions are combined with AND. A `None` condition is left out of
/// the query entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionQuery {
    /// Only transactions belonging to this user are returned.
    pub owner: UserID,
    /// Include transactions within the window (inclusive).
    pub window: Option<DateWindow>,
    /// Include transactions whose category is exactly this text.
    pub category: Option<String>,
    /// Include transactions of this type.
    pub kind: Option<TransactionType>,
    /// Orders transactions by date. `None` returns transactions in the order
    /// they are stored.
    pub sort_date: Option<SortOrder>,
}

impl TransactionQuery {
    /// A query for every transaction of `owner`.
    pub fn for_owner(owner: UserID) -> Self {
        Self {
            owner,
            window: None,
            category: None,
            kind: None,
            sort_date: None,
        }
    }

    /// Restrict the query to `window`, or leave it unbounded if `None`.
    pub fn window(mut self, window: Option<DateWindow>) -> Self {
        self.window = window;
        self
    }

    /// Restrict the query to a single category.
    pub fn category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    /// Restrict the query to a single transaction type.
    pub fn kind(mut self, kind: Option<TransactionType>) -> Self {
        self.kind = kind;
        self
    }

    /// Sort the results by date.
    pub fn sort_date(mut self, sort_order: Option<SortOrder>) -> Self {
        self.sort_date = sort_order;
        self
    }

    /// Whether `transaction` satisfies every condition of the query.
    pub fn matches(&self, transaction: &Transaction) -> bool {
        transaction.owner == self.owner
            && self
                .window
                .is_none_or(|window| window.contains(transaction.date))
            && self
                .category
                .as_ref()
                .is_none_or(|category| &transaction.category == category)
            && self.kind.is_none_or(|kind| transaction.kind == kind)
    }
}

/// The optional filters a client may send as query parameters.
///
/// Empty strings are treated the same as a missing parameter.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TransactionFilter {
    /// The month number, 1 to 12. Only used together with `year`.
    pub month: Option<u8>,
    /// The calendar year. Only used together with `month`.
    pub year: Option<i32>,
    /// Only include transactions with exactly this category.
    pub category: Option<String>,
    /// Only include "income" or "expense" transactions.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// The validated month and year of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MonthYear {
    pub month: Option<Month>,
    pub year: Option<i32>,
}

impl MonthYear {
    /// Check that `month` is 1 to 12 and `year` is 1 to 9999.
    pub(crate) fn parse(
        month: Option<u8>,
        year: Option<i32>,
        errors: &mut Vec<FieldError>,
    ) -> Self {
        let month = match month.map(Month::try_from) {
            None => None,
            Some(Ok(month)) => Some(month),
            Some(Err(_)) => {
                errors.push(FieldError::new("month", "Month must be between 1 and 12"));
                None
            }
        };

        let year = match year {
            Some(year) if !(1..=9999).contains(&year) => {
                errors.push(FieldError::new("year", "Year must be between 1 and 9999"));
                None
            }
            year => year,
        };

        Self { month, year }
    }

    /// The window for the month, if both month and year were given.
    pub(crate) fn window(self, local_offset: UtcOffset) -> Option<DateWindow> {
        resolve_window(self.month, self.year, local_offset)
    }
}

impl TransactionFilter {
    /// Build the query for `owner`'s transactions that match this filter.
    ///
    /// The query is not executed.
    ///
    /// # Errors
    /// Returns [Error::ValidationFailed] if the month, year or type is invalid.
    pub fn build_query(
        &self,
        owner: UserID,
        local_offset: UtcOffset,
    ) -> Result<TransactionQuery, Error> {
        let mut errors = Vec::new();

        let month_year = MonthYear::parse(self.month, self.year, &mut errors);

        let kind = match non_empty(&self.kind).map(str::parse::<TransactionType>) {
            None => None,
            Some(Ok(kind)) => Some(kind),
            Some(Err(_)) => {
                errors.push(FieldError::new("type", "Type must be income or expense"));
                None
            }
        };

        if !errors.is_empty() {
            return Err(Error::ValidationFailed(errors));
        }

        Ok(TransactionQuery::for_owner(owner)
            .window(month_year.window(local_offset))
            .category(non_empty(&self.category).map(str::to_owned))
            .kind(kind))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}
