//! Summaries of a user's income and expenses.
//!
//! Summaries are recomputed from the store on every request.

mod aggregation;
mod core;
mod endpoint;

pub use core::{
    BudgetStatus, CategoryStat, MonthlyTotal, RunningBalance, Summary, compute_category_stats,
    compute_summary,
};
pub use endpoint::{MonthParams, get_summary_endpoint};
