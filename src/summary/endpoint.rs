//! Defines the endpoint for summarising a user's transactions.

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::Deserialize;
use time::UtcOffset;

use crate::{
    Error,
    summary::{Summary, compute_summary},
    timezone::local_offset_or_error,
    transaction::{DateWindow, MonthYear, TransactionState},
    user::User,
};

/// The optional month to summarise. Both fields must be given to limit the
/// totals to a month.
#[derive(Debug, Default, Deserialize)]
pub struct MonthParams {
    /// The month number, 1 to 12.
    pub month: Option<u8>,
    /// The calendar year.
    pub year: Option<i32>,
}

impl MonthParams {
    /// The window for the month in `local_offset`, or `None` if either field
    /// is missing.
    ///
    /// # Errors
    /// Returns [Error::ValidationFailed] if the month or year is out of range.
    pub fn window(&self, local_offset: UtcOffset) -> Result<Option<DateWindow>, Error> {
        let mut errors = Vec::new();
        let month_year = MonthYear::parse(self.month, self.year, &mut errors);

        if !errors.is_empty() {
            return Err(Error::ValidationFailed(errors));
        }

        Ok(month_year.window(local_offset))
    }
}

/// A route handler for getting the summary of the logged-in user's transactions.
pub async fn get_summary_endpoint(
    State(state): State<TransactionState>,
    Extension(user): Extension<User>,
    Query(params): Query<MonthParams>,
) -> Result<Json<Summary>, Error> {
    let local_offset = local_offset_or_error(&state.local_timezone)?;
    let window = params.window(local_offset)?;

    compute_summary(
        user.id,
        window,
        local_offset,
        user.tracked_budget(),
        &state.store,
    )
    .map(Json)
}
