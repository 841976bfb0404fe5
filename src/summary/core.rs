//! The summary models and the function that computes them from the store.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Serialize, Serializer};
use time::UtcOffset;

use crate::{
    Error,
    summary::aggregation::{
        category_stats, expenses_by_category, monthly_totals, running_balances, totals_by_type,
    },
    transaction::{DateWindow, TransactionQuery, TransactionStore, TransactionType},
    user::UserID,
};

/// The total of one transaction type in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotal {
    /// The calendar year.
    pub year: i32,
    /// The month number, 1 to 12.
    pub month: u8,
    /// Whether this is the month's income or expenses.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// The sum of the amounts.
    #[serde(serialize_with = "serialize_money")]
    pub total: Decimal,
}

/// The cumulative balance at the end of a calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunningBalance {
    /// The calendar year.
    pub year: i32,
    /// The month number, 1 to 12.
    pub month: u8,
    /// Income minus expenses from the first transaction up to the end of this month.
    #[serde(serialize_with = "serialize_money")]
    pub balance: Decimal,
}

/// How the expenses of a period compare to a monthly budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetStatus {
    /// The user's monthly budget.
    #[serde(serialize_with = "serialize_money")]
    pub monthly_budget: Decimal,
    /// The expenses in the period.
    #[serde(serialize_with = "serialize_money")]
    pub spent: Decimal,
    /// The budget minus what was spent. Negative once the budget is exceeded.
    #[serde(serialize_with = "serialize_money")]
    pub remaining: Decimal,
    /// Whether more was spent than budgeted.
    pub exceeded: bool,
}

impl BudgetStatus {
    /// Compare `spent` against `monthly_budget`.
    pub fn new(monthly_budget: Decimal, spent: Decimal) -> Self {
        Self {
            monthly_budget,
            spent,
            remaining: monthly_budget.saturating_sub(spent),
            exceeded: spent > monthly_budget,
        }
    }
}

/// The income, expenses and trends of a user's transactions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// The income within the window.
    #[serde(serialize_with = "serialize_money")]
    pub total_income: Decimal,
    /// The expenses within the window.
    #[serde(serialize_with = "serialize_money")]
    pub total_expenses: Decimal,
    /// Income minus expenses within the window.
    #[serde(serialize_with = "serialize_money")]
    pub balance: Decimal,
    /// The expenses within the window by category.
    #[serde(serialize_with = "serialize_money_map")]
    pub category_breakdown: BTreeMap<String, Decimal>,
    /// Totals per month and type over the user's whole history.
    pub monthly_data: Vec<MonthlyTotal>,
    /// The balance at the end of each month in `monthly_data`.
    pub running_balance: Vec<RunningBalance>,
    /// Present only when the user tracks a monthly budget.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<BudgetStatus>,
}

/// The expenses of one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStat {
    /// The category text.
    pub category: String,
    /// The sum of the expenses.
    #[serde(serialize_with = "serialize_money")]
    pub total: Decimal,
    /// The number of expenses.
    pub count: usize,
}

/// Compute the summary of `owner`'s transactions.
///
/// Totals and the category breakdown only include transactions in `window`
/// (all of them if `None`), the monthly series always covers every
/// transaction. Months are taken in `local_offset`. The budget status is
/// included if `monthly_budget` is given.
///
/// # Errors
/// Returns an error if the store cannot be read.
pub fn compute_summary(
    owner: UserID,
    window: Option<DateWindow>,
    local_offset: UtcOffset,
    monthly_budget: Option<Decimal>,
    store: &impl TransactionStore,
) -> Result<Summary, Error> {
    let transactions = store.find(&TransactionQuery::for_owner(owner))?;

    let windowed_query = TransactionQuery::for_owner(owner).window(window);
    let windowed: Vec<_> = transactions
        .iter()
        .filter(|transaction| windowed_query.matches(transaction))
        .collect();

    let (total_income, total_expenses) = totals_by_type(windowed.iter().copied());
    let monthly_data = monthly_totals(&transactions, local_offset);

    Ok(Summary {
        total_income,
        total_expenses,
        balance: total_income - total_expenses,
        category_breakdown: expenses_by_category(windowed.iter().copied()),
        running_balance: running_balances(&monthly_data),
        monthly_data,
        budget: monthly_budget.map(|budget| BudgetStatus::new(budget, total_expenses)),
    })
}

/// Compute the expense statistics per category of `owner`'s transactions in
/// `window` (all of them if `None`).
///
/// # Errors
/// Returns an error if the store cannot be read.
pub fn compute_category_stats(
    owner: UserID,
    window: Option<DateWindow>,
    store: &impl TransactionStore,
) -> Result<Vec<CategoryStat>, Error> {
    let query = TransactionQuery::for_owner(owner)
        .window(window)
        .kind(Some(TransactionType::Expense));

    let transactions = store.find(&query)?;

    Ok(category_stats(&transactions))
}

/// Amounts are rounded to cents only when they are sent to a client.
fn serialize_money<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    rust_decimal::serde::float::serialize(&rounded, serializer)
}

fn serialize_money_map<S: Serializer>(
    values: &BTreeMap<String, Decimal>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(values.iter().map(|(key, value)| (key, Money(*value))))
}

struct Money(Decimal);

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_money(&self.0, serializer)
    }
}
