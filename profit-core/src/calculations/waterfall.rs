//! The expense waterfall: revenue minus a fixed chain of expense deductions.
//!
//! # Chain
//!
//! Expenses are resolved in dependency order, which differs from the order the
//! rows are displayed in.
//!
//! | Step | Expense    | Base                      | Remaining after               |
//! |------|------------|---------------------------|-------------------------------|
//! | 1    | logistics  | revenue                   | revenue - logistics           |
//! | 2    | managers   | remaining after logistics | previous - managers           |
//! | 3    | marketing  | remaining after managers  | previous - marketing          |
//! | 4    | production | revenue                   | previous - production         |
//! | 5    | hardware   | revenue                   | previous - hardware           |
//! | 6    | installers | revenue                   | previous - installers         |
//! | 7    | claims     | revenue                   | previous - claims             |
//!
//! Rows are returned as managers, marketing, production, hardware, logistics,
//! installers, claims.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use profit_core::{CalculatorState, ExpenseId, compute};
//!
//! let result = compute(&CalculatorState::default());
//!
//! assert_eq!(result.revenue, dec!(120000));
//! assert_eq!(result.row(ExpenseId::Managers).map(|r| r.amount), Some(dec!(11800)));
//! assert_eq!(result.profit_amount, dec!(28600));
//! ```

use rust_decimal::Decimal;
use serde::Serialize;

use crate::calculations::common::{add, clamp_fraction, mul, non_negative, ratio, sub};
use crate::models::{CalculatorState, ExpenseEntry, ExpenseId, ExpenseMode};

/// One line of the waterfall. Derived on every [`compute`], never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedRow {
    pub id: ExpenseId,
    pub label: String,

    /// Amount this row's percentage is taken from, floored at zero.
    #[serde(with = "rust_decimal::serde::float")]
    pub base: Decimal,

    /// Effective fraction of `base`, also for amount-mode entries.
    #[serde(with = "rust_decimal::serde::float")]
    pub percent: Decimal,

    /// Amount deducted.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,

    /// Running balance right after this deduction, in chain order.
    #[serde(with = "rust_decimal::serde::float")]
    pub remaining_after: Decimal,
}

/// Full output of the waterfall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputationResult {
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,

    /// Always seven rows, in display order.
    pub rows: Vec<ComputedRow>,

    #[serde(with = "rust_decimal::serde::float")]
    pub total_expenses_amount: Decimal,

    /// Total expenses as a fraction of revenue; zero when revenue is zero.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_expenses_percent: Decimal,

    /// Revenue minus total expenses. May be negative.
    #[serde(with = "rust_decimal::serde::float")]
    pub profit_amount: Decimal,

    /// Profit as a fraction of revenue; zero when revenue is zero.
    #[serde(with = "rust_decimal::serde::float")]
    pub profit_percent: Decimal,
}

impl ComputationResult {
    /// Row for `id`, or `None` when the result carries no such row.
    pub fn row(
        &self,
        id: ExpenseId,
    ) -> Option<&ComputedRow> {
        self.rows.iter().find(|row| row.id == id)
    }
}

/// Percent and amount of one expense against its base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Deduction {
    base: Decimal,
    percent: Decimal,
    amount: Decimal,
}

/// Resolves an expense mode against a base.
///
/// The base is floored at zero first. Percent mode takes `percent` of the base;
/// amount mode derives the effective percent, which is zero on a zero base.
fn resolve(
    base: Decimal,
    mode: ExpenseMode,
) -> Deduction {
    let base = non_negative(base);

    match mode {
        ExpenseMode::Percent(value) => {
            let percent = clamp_fraction(value);
            Deduction {
                base,
                percent,
                amount: mul(base, percent),
            }
        }
        ExpenseMode::Amount(value) => {
            let amount = non_negative(value);
            Deduction {
                base,
                percent: ratio(amount, base),
                amount,
            }
        }
    }
}

fn row(
    entry: &ExpenseEntry,
    deduction: Deduction,
    remaining_after: Decimal,
) -> ComputedRow {
    ComputedRow {
        id: entry.id,
        label: entry.label.clone(),
        base: deduction.base,
        percent: deduction.percent,
        amount: deduction.amount,
        remaining_after,
    }
}

/// Computes the waterfall for a snapshot.
///
/// Pure and total: the same snapshot always yields the same result, and no
/// input makes it fail.
pub fn compute(state: &CalculatorState) -> ComputationResult {
    let expenses = &state.expenses;
    let revenue = mul(non_negative(state.unit_price), non_negative(state.quantity));

    // Logistics comes off the top.
    let logistics = resolve(revenue, expenses.logistics.mode);
    let after_logistics = sub(revenue, logistics.amount);

    let managers = resolve(after_logistics, expenses.managers.mode);
    let after_managers = sub(after_logistics, managers.amount);

    let marketing = resolve(after_managers, expenses.marketing.mode);
    let after_marketing = sub(after_managers, marketing.amount);

    // Bases pinned to revenue; remaining keeps running down from marketing.
    let production = resolve(revenue, expenses.production.mode);
    let after_production = sub(after_marketing, production.amount);

    let hardware = resolve(revenue, expenses.hardware.mode);
    let after_hardware = sub(after_production, hardware.amount);

    let installers = resolve(revenue, expenses.installers.mode);
    let after_installers = sub(after_hardware, installers.amount);

    let claims = resolve(revenue, expenses.claims.mode);
    let after_claims = sub(after_installers, claims.amount);

    let rows = vec![
        row(&expenses.managers, managers, after_managers),
        row(&expenses.marketing, marketing, after_marketing),
        row(&expenses.production, production, after_production),
        row(&expenses.hardware, hardware, after_hardware),
        row(&expenses.logistics, logistics, after_logistics),
        row(&expenses.installers, installers, after_installers),
        row(&expenses.claims, claims, after_claims),
    ];

    let total_expenses_amount = rows
        .iter()
        .fold(Decimal::ZERO, |total, row| add(total, row.amount));
    let profit_amount = sub(revenue, total_expenses_amount);

    ComputationResult {
        revenue,
        total_expenses_percent: ratio(total_expenses_amount, revenue),
        total_expenses_amount,
        profit_amount,
        profit_percent: ratio(profit_amount, revenue),
        rows,
    }
}
