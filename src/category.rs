//! Route handlers for the categories a user has used.
//!
//! Categories are free-form text on each transaction rather than records of
//! their own, so "Food" and "food" are two different categories.

use axum::{
    Extension, Json,
    extract::{Query, State},
};

use crate::{
    Error,
    summary::{CategoryStat, MonthParams, compute_category_stats},
    timezone::local_offset_or_error,
    transaction::{TransactionState, TransactionStore},
    user::User,
};

/// A route handler that lists the unique categories of the logged-in user's
/// transactions, sorted alphabetically.
pub async fn get_categories_endpoint(
    State(state): State<TransactionState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<String>>, Error> {
    state.store.distinct_categories(user.id).map(Json)
}

/// A route handler for the total and number of expenses per category,
/// optionally limited to a month. The largest total comes first.
pub async fn get_category_stats_endpoint(
    State(state): State<TransactionState>,
    Extension(user): Extension<User>,
    Query(params): Query<MonthParams>,
) -> Result<Json<Vec<CategoryStat>>, Error> {
    let local_offset = local_offset_or_error(&state.local_timezone)?;
    let window = params.window(local_offset)?;

    compute_category_stats(user.id, window, &state.store).map(Json)
}
