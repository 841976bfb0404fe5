//! Code for creating the user table, fetching users from the database and
//! managing a user's monthly budget.

use std::{
    fmt::Display,
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Extension, Json,
    extract::{FromRef, State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, Row, types::Type};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, FieldError,
    transaction::{MAX_AMOUNT, parse_decimal},
};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
///
/// The caller should ensure that `id` is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The name shown to the user.
    pub name: String,
    /// How much the user intends to spend each month.
    ///
    /// Zero or `None` means budget tracking is turned off.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub monthly_budget: Option<Decimal>,
}

impl User {
    /// The monthly budget, if budget tracking is enabled.
    pub fn tracked_budget(&self) -> Option<Decimal> {
        self.monthly_budget.filter(|budget| *budget > Decimal::ZERO)
    }
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                monthly_budget TEXT
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a [Error::StoreUnavailable] if an SQL related error occurred.
pub fn create_user(
    name: &str,
    monthly_budget: Option<Decimal>,
    connection: &Connection,
) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO user (name, monthly_budget) VALUES (?1, ?2)",
        (name, monthly_budget.map(|budget| budget.to_string())),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        name: name.to_owned(),
        monthly_budget,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, name, monthly_budget FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Set the monthly budget of the user `user_id` and return the updated user.
///
/// # Errors
///
/// Returns [Error::NotFound] if `user_id` does not belong to a registered user.
pub fn set_monthly_budget(
    user_id: UserID,
    monthly_budget: Option<Decimal>,
    connection: &Connection,
) -> Result<User, Error> {
    connection
        .prepare(
            "UPDATE user SET monthly_budget = ?1 WHERE id = ?2
             RETURNING id, name, monthly_budget",
        )?
        .query_row(
            (
                monthly_budget.map(|budget| budget.to_string()),
                user_id.as_i64(),
            ),
            map_user_row,
        )
        .map_err(|error| error.into())
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_budget: Option<String> = row.get(2)?;
    let monthly_budget = raw_budget
        .map(|budget| Decimal::from_str(&budget))
        .transpose()
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(error)))?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        name: row.get(1)?,
        monthly_budget,
    })
}

/// The state needed to read or change the current user's profile.
#[derive(Debug, Clone)]
pub struct UserState {
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UserState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that returns the logged-in user's profile.
pub async fn get_current_user(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}

/// The request body for setting a monthly budget.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetForm {
    /// The new budget as a JSON number or numeric string. Zero or `null`
    /// turns budget tracking off.
    #[serde(default)]
    pub monthly_budget: Option<serde_json::Value>,
}

impl BudgetForm {
    fn validate(&self) -> Result<Option<Decimal>, Error> {
        match &self.monthly_budget {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => match parse_decimal(value) {
                Some(budget) if budget >= Decimal::ZERO && budget <= MAX_AMOUNT => {
                    Ok(Some(budget))
                }
                Some(budget) if budget < Decimal::ZERO => Err(Error::ValidationFailed(vec![
                    FieldError::new("monthlyBudget", "Monthly budget cannot be negative"),
                ])),
                Some(_) => Err(Error::ValidationFailed(vec![FieldError::new(
                    "monthlyBudget",
                    "Monthly budget must be at most 1000000000000000",
                )])),
                None => Err(Error::ValidationFailed(vec![FieldError::new(
                    "monthlyBudget",
                    "Monthly budget must be a number",
                )])),
            },
        }
    }
}

/// A route handler for setting the logged-in user's monthly budget.
pub async fn set_budget_endpoint(
    State(state): State<UserState>,
    Extension(user): Extension<User>,
    payload: Result<Json<BudgetForm>, JsonRejection>,
) -> Response {
    let form = match payload {
        Ok(Json(form)) => form,
        Err(rejection) => return Error::from(rejection).into_response(),
    };

    let monthly_budget = match form.validate() {
        Ok(budget) => budget,
        Err(error) => return error.into_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::StoreUnavailable(error.to_string()).into_response();
        }
    };

    match set_monthly_budget(user.id, monthly_budget, &connection) {
        Ok(user) => {
            tracing::info!("User {} set their monthly budget to {:?}", user.id, monthly_budget);
            Json(user).into_response()
        }
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;
    use rust_decimal_macros::dec;
    use serde_json::json;

    use crate::{
        Error, FieldError,
        user::{BudgetForm, UserID, create_user, get_user_by_id, set_monthly_budget},
    };

    use super::create_user_table;

    fn get_db_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        create_user_table(&conn).expect("Could not create user table");

        conn
    }

    #[test]
    fn insert_user_succeeds() {
        let db_connection = get_db_connection();

        let inserted_user = create_user("Alice", Some(dec!(500)), &db_connection).unwrap();

        assert!(inserted_user.id.as_i64() > 0);
        assert_eq!(inserted_user.name, "Alice");
        assert_eq!(inserted_user.monthly_budget, Some(dec!(500)));
    }

    #[test]
    fn get_user_fails_with_non_existent_id() {
        let db_connection = get_db_connection();

        let id = UserID::new(42);

        assert_eq!(get_user_by_id(id, &db_connection), Err(Error::NotFound));
    }

    #[test]
    fn get_user_succeeds_with_existing_id() {
        let db_connection = get_db_connection();
        let test_user = create_user("Alice", Some(dec!(123.45)), &db_connection).unwrap();

        let retrieved_user = get_user_by_id(test_user.id, &db_connection).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn set_monthly_budget_updates_user() {
        let db_connection = get_db_connection();
        let test_user = create_user("Alice", None, &db_connection).unwrap();

        let updated = set_monthly_budget(test_user.id, Some(dec!(2000)), &db_connection).unwrap();

        assert_eq!(updated.monthly_budget, Some(dec!(2000)));
        assert_eq!(
            get_user_by_id(test_user.id, &db_connection).unwrap(),
            updated
        );
    }

    #[test]
    fn set_monthly_budget_fails_for_missing_user() {
        let db_connection = get_db_connection();

        let result = set_monthly_budget(UserID::new(7), Some(dec!(10)), &db_connection);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn zero_budget_disables_tracking() {
        let db_connection = get_db_connection();
        let zero = create_user("Zero", Some(dec!(0)), &db_connection).unwrap();
        let none = create_user("None", None, &db_connection).unwrap();
        let some = create_user("Some", Some(dec!(10)), &db_connection).unwrap();

        assert_eq!(zero.tracked_budget(), None);
        assert_eq!(none.tracked_budget(), None);
        assert_eq!(some.tracked_budget(), Some(dec!(10)));
    }

    #[test]
    fn budget_form_accepts_numbers_strings_and_null() {
        let cases = [
            (json!(250.5), Ok(Some(dec!(250.5)))),
            (json!("99.90"), Ok(Some(dec!(99.90)))),
            (json!(null), Ok(None)),
        ];

        for (value, want) in cases {
            let form = BudgetForm {
                monthly_budget: Some(value),
            };

            assert_eq!(form.validate(), want);
        }
    }

    #[test]
    fn budget_form_rejects_negative_and_non_numeric() {
        for value in [json!(-1), json!("lots")] {
            let form = BudgetForm {
                monthly_budget: Some(value),
            };

            assert!(matches!(form.validate(), Err(Error::ValidationFailed(_))));
        }
    }

    #[test]
    fn budget_form_rejects_budget_above_maximum() {
        let form = BudgetForm {
            monthly_budget: Some(json!("1000000000000000.01")),
        };

        assert_eq!(
            form.validate(),
            Err(Error::ValidationFailed(vec![FieldError::new(
                "monthlyBudget",
                "Monthly budget must be at most 1000000000000000"
            )]))
        );
    }
}
