//! The request body for creating and updating transactions.

use serde::Deserialize;
use serde_json::Value;

use crate::{
    Error,
    transaction::{Transaction, TransactionBuilder, TransactionKind},
    validation::{ValidationErrors, required_text},
};

const MAX_NAME_LENGTH: usize = 255;

/// The transaction details entered by a client.
///
/// `type` and `amount` are kept as raw JSON so that a wrong type is reported
/// against the field rather than rejecting the whole body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionForm {
    /// The kind of transaction, `1` for income and `2` for expense.
    #[serde(default, rename = "type")]
    pub kind: Option<Value>,
    /// A text description of what the transaction was for.
    #[serde(default)]
    pub name: Option<String>,
    /// The amount of money spent or earned.
    #[serde(default, alias = "total")]
    pub amount: Option<Value>,
}

impl TransactionForm {
    /// Validate every field.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] listing every invalid field.
    pub fn validate(self) -> Result<TransactionBuilder, Error> {
        let mut errors = ValidationErrors::default();

        let kind = match self.kind {
            None | Some(Value::Null) => {
                errors.add("type", "The type field is required.");
                None
            }
            Some(value) => {
                let kind = parse_kind(&value);
                if kind.is_none() {
                    errors.add("type", "The selected type is invalid.");
                }
                kind
            }
        };

        let name = required_text(self.name, "name", "name", MAX_NAME_LENGTH, &mut errors);

        let amount = match self.amount {
            None | Some(Value::Null) => {
                errors.add("amount", "The amount field is required.");
                None
            }
            Some(value) => {
                let amount = parse_amount(&value);
                if amount.is_none() {
                    errors.add("amount", "The amount must be a number.");
                }
                amount
            }
        };

        match (kind, amount) {
            (Some(kind), Some(amount)) if errors.is_empty() => {
                Ok(Transaction::build(kind, &name, amount))
            }
            _ => Err(Error::Validation(errors)),
        }
    }
}

fn parse_kind(value: &Value) -> Option<TransactionKind> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .and_then(|number| u8::try_from(number).ok())
            .and_then(|number| TransactionKind::try_from(number).ok()),
        Value::String(text) => TransactionKind::parse(text),
        _ => None,
    }
}

fn parse_amount(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    amount.filter(|amount| amount.is_finite())
}
