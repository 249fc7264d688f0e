use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::expense::{ExpenseId, ExpenseMode, Expenses};
use crate::calculations::common::{clamp_fraction, non_negative, sanitize};

/// One immutable snapshot of the calculator inputs.
///
/// Setters never modify `self`; each returns the next snapshot, so a snapshot
/// held by someone else (an undo stack, a pending save) stays as it was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "CalculatorStateRecord")]
pub struct CalculatorState {
    /// Price of one unit.
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub unit_price: Decimal,

    /// Number of units sold. Whole units in practice, not enforced.
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub quantity: Decimal,

    pub expenses: Expenses,
}

// Loaded values get the same treatment as the setters.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalculatorStateRecord {
    #[serde(with = "super::lenient_float")]
    unit_price: Decimal,
    #[serde(with = "super::lenient_float")]
    quantity: Decimal,
    expenses: Expenses,
}

impl From<CalculatorStateRecord> for CalculatorState {
    fn from(record: CalculatorStateRecord) -> Self {
        Self {
            unit_price: non_negative(record.unit_price),
            quantity: non_negative(record.quantity),
            expenses: record.expenses,
        }
    }
}

impl Default for CalculatorState {
    fn default() -> Self {
        Self {
            unit_price: Decimal::from(120_000),
            quantity: Decimal::ONE,
            expenses: Expenses::default(),
        }
    }
}

impl CalculatorState {
    /// Switches `id` to percent mode with the fraction `percent01`.
    ///
    /// Non-finite input is treated as zero, then clamped into `[0, 1]`.
    pub fn set_expense_percent(
        &self,
        id: ExpenseId,
        percent01: f64,
    ) -> Self {
        let fraction = clamp_fraction(sanitize(percent01));
        Self {
            expenses: self.expenses.with_mode(id, ExpenseMode::Percent(fraction)),
            ..self.clone()
        }
    }

    /// Switches `id` to amount mode with a fixed `amount`.
    ///
    /// Non-finite input is treated as zero, negative amounts become zero.
    pub fn set_expense_amount(
        &self,
        id: ExpenseId,
        amount: f64,
    ) -> Self {
        let amount = non_negative(sanitize(amount));
        Self {
            expenses: self.expenses.with_mode(id, ExpenseMode::Amount(amount)),
            ..self.clone()
        }
    }

    pub fn set_unit_price(
        &self,
        unit_price: f64,
    ) -> Self {
        Self {
            unit_price: non_negative(sanitize(unit_price)),
            ..self.clone()
        }
    }

    pub fn set_quantity(
        &self,
        quantity: f64,
    ) -> Self {
        Self {
            quantity: non_negative(sanitize(quantity)),
            ..self.clone()
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
