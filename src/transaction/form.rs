//! Parsing and validation of the fields a client sends to create or update a
//! transaction.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{
    Date, OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339,
    macros::format_description,
};

use crate::{Error, FieldError, transaction::TransactionType};

/// The largest amount, or monthly budget, that can be stored.
///
/// Sums of this many amounts stay far below [Decimal::MAX].
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

/// The unvalidated fields of a transaction as sent by a client.
///
/// Every field is optional at this stage so that missing or malformed values
/// are reported as field-level validation errors instead of a generic
/// deserialization failure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TransactionForm {
    /// A short name for the transaction.
    #[serde(default)]
    pub title: Option<String>,
    /// The amount as a JSON number or a numeric string.
    #[serde(default)]
    pub amount: Option<Value>,
    /// Either "income" or "expense".
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// A free-form label.
    #[serde(default)]
    pub category: Option<String>,
    /// An RFC 3339 timestamp or a `YYYY-MM-DD` date. Defaults to now on
    /// creation and to the previous date on update.
    #[serde(default)]
    pub date: Option<String>,
    /// Any extra detail.
    #[serde(default)]
    pub description: Option<String>,
}

/// The fields of a transaction after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFields {
    /// A non-blank title.
    pub title: String,
    /// An amount greater than zero.
    pub amount: Decimal,
    /// Income or expense.
    pub kind: TransactionType,
    /// A non-blank category, as the client sent it.
    pub category: String,
    /// The date, if the client sent one.
    pub date: Option<OffsetDateTime>,
    /// The description, `None` if it was blank.
    pub description: Option<String>,
}

impl TransactionForm {
    /// Check every field and collect all problems.
    ///
    /// Plain dates are interpreted as midnight in `local_offset`.
    ///
    /// # Errors
    /// Returns [Error::ValidationFailed] listing each invalid field.
    pub fn validate(self, local_offset: UtcOffset) -> Result<TransactionFields, Error> {
        let mut errors = Vec::new();

        let title = match self.title {
            Some(title) if !title.trim().is_empty() => Some(title),
            _ => {
                errors.push(FieldError::new("title", "Title is required"));
                None
            }
        };

        let amount = match self.amount.as_ref().map(parse_decimal) {
            Some(Some(amount)) if amount > Decimal::ZERO && amount <= MAX_AMOUNT => Some(amount),
            Some(Some(amount)) if amount <= Decimal::ZERO => {
                errors.push(FieldError::new("amount", "Amount must be greater than zero"));
                None
            }
            Some(Some(_)) => {
                errors.push(FieldError::new(
                    "amount",
                    "Amount must be at most 1000000000000000",
                ));
                None
            }
            _ => {
                errors.push(FieldError::new("amount", "Amount must be a number"));
                None
            }
        };

        let kind = match self.kind.as_deref().map(TransactionType::from_str) {
            Some(Ok(kind)) => Some(kind),
            _ => {
                errors.push(FieldError::new("type", "Type must be income or expense"));
                None
            }
        };

        // Categories are grouped by their exact text, so the value is kept as is.
        let category = match self.category {
            Some(category) if !category.trim().is_empty() => Some(category),
            _ => {
                errors.push(FieldError::new("category", "Category is required"));
                None
            }
        };

        let date = match self.date.as_deref() {
            None => None,
            Some(raw) => match parse_date(raw, local_offset) {
                Some(date) => Some(date),
                None => {
                    errors.push(FieldError::new("date", "Invalid date format"));
                    None
                }
            },
        };

        let description = self
            .description
            .filter(|description| !description.trim().is_empty());

        match (title, amount, kind, category) {
            (Some(title), Some(amount), Some(kind), Some(category)) if errors.is_empty() => {
                Ok(TransactionFields {
                    title,
                    amount,
                    kind,
                    category,
                    date,
                    description,
                })
            }
            _ => Err(Error::ValidationFailed(errors)),
        }
    }
}

/// Parse a JSON number or numeric string into a decimal.
///
/// Numbers are converted via their textual form so that `0.1` becomes exactly
/// `0.1` rather than the nearest binary float.
pub(crate) fn parse_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.trim().to_owned(),
        _ => return None,
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// Parse an RFC 3339 timestamp, or a plain `YYYY-MM-DD` date at midnight in
/// `local_offset`.
///
/// Dates that cannot be represented in UTC, e.g. the last hours of the year
/// 9999 at a negative offset, are rejected.
pub(crate) fn parse_date(raw: &str, local_offset: UtcOffset) -> Option<OffsetDateTime> {
    let raw = raw.trim();

    let date_time = match OffsetDateTime::parse(raw, &Rfc3339) {
        Ok(date_time) => date_time,
        Err(_) => Date::parse(raw, format_description!("[year]-[month]-[day]"))
            .ok()?
            .midnight()
            .assume_offset(local_offset),
    };

    OffsetDateTime::from_unix_timestamp(date_time.unix_timestamp()).ok()?;

    Some(date_time)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;
    use time::{UtcOffset, macros::datetime};

    use crate::{Error, FieldError, transaction::TransactionType};

    use super::{MAX_AMOUNT, TransactionFields, TransactionForm, parse_date, parse_decimal};

    fn valid_form() -> TransactionForm {
        TransactionForm {
            title: Some("Groceries".to_owned()),
            amount: Some(json!(42.5)),
            kind: Some("expense".to_owned()),
            category: Some("Food".to_owned()),
            date: Some("2024-03-15".to_owned()),
            description: Some("Weekly shop".to_owned()),
        }
    }

    #[test]
    fn valid_form_passes() {
        let got = valid_form().validate(UtcOffset::UTC);

        assert_eq!(
            got,
            Ok(TransactionFields {
                title: "Groceries".to_owned(),
                amount: dec!(42.5),
                kind: TransactionType::Expense,
                category: "Food".to_owned(),
                date: Some(datetime!(2024-03-15 00:00 UTC)),
                description: Some("Weekly shop".to_owned()),
            })
        );
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let got = TransactionForm::default().validate(UtcOffset::UTC);

        assert_eq!(
            got,
            Err(Error::ValidationFailed(vec![
                FieldError::new("title", "Title is required"),
                FieldError::new("amount", "Amount must be a number"),
                FieldError::new("type", "Type must be income or expense"),
                FieldError::new("category", "Category is required"),
            ]))
        );
    }

    #[test]
    fn negative_amount_is_rejected() {
        let form = TransactionForm {
            amount: Some(json!(-5)),
            ..valid_form()
        };

        assert_eq!(
            form.validate(UtcOffset::UTC),
            Err(Error::ValidationFailed(vec![FieldError::new(
                "amount",
                "Amount must be greater than zero"
            )]))
        );
    }

    #[test]
    fn zero_amount_is_rejected() {
        let form = TransactionForm {
            amount: Some(json!("0.00")),
            ..valid_form()
        };

        assert!(matches!(
            form.validate(UtcOffset::UTC),
            Err(Error::ValidationFailed(_))
        ));
    }

    #[test]
    fn blank_title_and_category_are_rejected() {
        let form = TransactionForm {
            title: Some("   ".to_owned()),
            category: Some(String::new()),
            ..valid_form()
        };

        assert_eq!(
            form.validate(UtcOffset::UTC),
            Err(Error::ValidationFailed(vec![
                FieldError::new("title", "Title is required"),
                FieldError::new("category", "Category is required"),
            ]))
        );
    }

    #[test]
    fn bad_type_and_date_are_rejected() {
        let form = TransactionForm {
            kind: Some("transfer".to_owned()),
            date: Some("15/03/2024".to_owned()),
            ..valid_form()
        };

        assert_eq!(
            form.validate(UtcOffset::UTC),
            Err(Error::ValidationFailed(vec![
                FieldError::new("type", "Type must be income or expense"),
                FieldError::new("date", "Invalid date format"),
            ]))
        );
    }

    #[test]
    fn category_text_is_kept_verbatim() {
        let form = TransactionForm {
            category: Some(" food ".to_owned()),
            ..valid_form()
        };

        let fields = form.validate(UtcOffset::UTC).unwrap();

        assert_eq!(fields.category, " food ");
    }

    #[test]
    fn blank_description_becomes_none() {
        let form = TransactionForm {
            description: Some("  ".to_owned()),
            ..valid_form()
        };

        let fields = form.validate(UtcOffset::UTC).unwrap();

        assert_eq!(fields.description, None);
    }

    #[test]
    fn decimals_parse_exactly() {
        assert_eq!(parse_decimal(&json!(0.1)), Some(dec!(0.1)));
        assert_eq!(parse_decimal(&json!("19.99")), Some(dec!(19.99)));
        assert_eq!(parse_decimal(&json!(1000)), Some(dec!(1000)));
        assert_eq!(parse_decimal(&json!("abc")), None);
        assert_eq!(parse_decimal(&json!(true)), None);
    }

    #[test]
    fn dates_accept_rfc3339_and_plain_dates() {
        let offset = UtcOffset::from_hms(13, 0, 0).unwrap();

        assert_eq!(
            parse_date("2024-02-29T10:15:00Z", offset),
            Some(datetime!(2024-02-29 10:15 UTC))
        );
        assert_eq!(
            parse_date("2024-02-29", offset),
            Some(datetime!(2024-02-29 00:00 +13))
        );
        assert_eq!(parse_date("2023-02-29", offset), None);
        assert_eq!(parse_date("yesterday", offset), None);
    }

    #[test]
    fn dates_outside_utc_range_are_rejected() {
        let offset = UtcOffset::from_hms(-5, 0, 0).unwrap();

        assert_eq!(parse_date("9999-12-31T23:00:00-05:00", offset), None);
        assert_eq!(
            parse_date("9999-12-31T12:00:00-05:00", offset),
            Some(datetime!(9999-12-31 12:00 -5))
        );
    }

    #[test]
    fn unrepresentable_date_is_a_field_error() {
        let form = TransactionForm {
            date: Some("9999-12-31T23:00:00-05:00".to_owned()),
            ..valid_form()
        };

        assert_eq!(
            form.validate(UtcOffset::UTC),
            Err(Error::ValidationFailed(vec![FieldError::new(
                "date",
                "Invalid date format"
            )]))
        );
    }

    #[test]
    fn amount_above_maximum_is_rejected() {
        let at_max = TransactionForm {
            amount: Some(json!("1000000000000000")),
            ..valid_form()
        };
        let above_max = TransactionForm {
            amount: Some(json!("79228162514264337593543950335")),
            ..valid_form()
        };

        assert_eq!(at_max.validate(UtcOffset::UTC).unwrap().amount, MAX_AMOUNT);
        assert_eq!(
            above_max.validate(UtcOffset::UTC),
            Err(Error::ValidationFailed(vec![FieldError::new(
                "amount",
                "Amount must be at most 1000000000000000"
            )]))
        );
    }
}
