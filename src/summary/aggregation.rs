//! Decimal-safe aggregation of transactions by type, category and month.
//!
//! Sums saturate at the limits of [Decimal] instead of overflowing.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use time::UtcOffset;

use crate::{
    summary::{CategoryStat, MonthlyTotal, RunningBalance},
    transaction::{Transaction, TransactionType},
};

/// Sums transaction amounts by type.
///
/// # Returns
/// Tuple of (total income, total expenses).
pub(super) fn totals_by_type<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
) -> (Decimal, Decimal) {
    let mut income = Decimal::ZERO;
    let mut expenses = Decimal::ZERO;

    for transaction in transactions {
        match transaction.kind {
            TransactionType::Income => income = income.saturating_add(transaction.amount),
            TransactionType::Expense => expenses = expenses.saturating_add(transaction.amount),
        }
    }

    (income, expenses)
}

/// Sums expense amounts by their exact category text. Income is ignored.
pub(super) fn expenses_by_category<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
) -> BTreeMap<String, Decimal> {
    let mut totals = BTreeMap::new();

    for transaction in expenses(transactions) {
        let total = totals
            .entry(transaction.category.clone())
            .or_insert(Decimal::ZERO);
        *total = total.saturating_add(transaction.amount);
    }

    totals
}

/// Sums transaction amounts by calendar month (in `local_offset`) and type.
///
/// # Returns
/// One entry per month and type that has at least one transaction, sorted by
/// year then month, with income before expenses within a month.
pub(super) fn monthly_totals<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
    local_offset: UtcOffset,
) -> Vec<MonthlyTotal> {
    let mut totals: BTreeMap<(i32, u8, TransactionType), Decimal> = BTreeMap::new();

    for transaction in transactions {
        // Dates at the edge of the supported range fall back to UTC.
        let date = transaction
            .date
            .checked_to_offset(local_offset)
            .unwrap_or(transaction.date);
        let key = (date.year(), u8::from(date.month()), transaction.kind);
        let total = totals.entry(key).or_insert(Decimal::ZERO);
        *total = total.saturating_add(transaction.amount);
    }

    totals
        .into_iter()
        .map(|((year, month, kind), total)| MonthlyTotal {
            year,
            month,
            kind,
            total,
        })
        .collect()
}

/// Calculates the cumulative balance at the end of each month in `monthly_totals`.
///
/// `monthly_totals` must be sorted by year then month.
pub(super) fn running_balances(monthly_totals: &[MonthlyTotal]) -> Vec<RunningBalance> {
    let mut balances: Vec<RunningBalance> = Vec::new();
    let mut cumulative = Decimal::ZERO;

    for entry in monthly_totals {
        match entry.kind {
            TransactionType::Income => cumulative = cumulative.saturating_add(entry.total),
            TransactionType::Expense => cumulative = cumulative.saturating_sub(entry.total),
        }

        match balances.last_mut() {
            Some(last) if last.year == entry.year && last.month == entry.month => {
                last.balance = cumulative;
            }
            _ => balances.push(RunningBalance {
                year: entry.year,
                month: entry.month,
                balance: cumulative,
            }),
        }
    }

    balances
}

/// Sums and counts expenses by category.
///
/// # Returns
/// Stats sorted by total, largest first. Equal totals are sorted by category.
pub(super) fn category_stats<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
) -> Vec<CategoryStat> {
    let mut stats: BTreeMap<&str, (Decimal, usize)> = BTreeMap::new();

    for transaction in expenses(transactions) {
        let (total, count) = stats
            .entry(transaction.category.as_str())
            .or_insert((Decimal::ZERO, 0));
        *total = total.saturating_add(transaction.amount);
        *count += 1;
    }

    let mut stats: Vec<_> = stats
        .into_iter()
        .map(|(category, (total, count))| CategoryStat {
            category: category.to_owned(),
            total,
            count,
        })
        .collect();
    // The map is already sorted by category, so a stable sort keeps ties in that order.
    stats.sort_by(|a, b| b.total.cmp(&a.total));

    stats
}

fn expenses<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
) -> impl Iterator<Item = &'a Transaction> {
    transactions
        .into_iter()
        .filter(|transaction| transaction.kind == TransactionType::Expense)
}
