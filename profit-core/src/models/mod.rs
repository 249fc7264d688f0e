mod calculator_state;
mod expense;
mod project;

pub use calculator_state::CalculatorState;
pub use expense::{ExpenseEntry, ExpenseId, ExpenseMode, Expenses};
pub use project::{DEFAULT_PROJECT_NAME, NewProject, Project, ProjectUpdate, normalize_project_name};

/// Decimals stored as plain JSON numbers.
///
/// Reading goes through [`sanitize`](crate::calculations::common::sanitize),
/// so a number beyond the decimal range saturates instead of failing the
/// whole document.
mod lenient_float {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::calculations::common::sanitize;

    pub fn serialize<S>(
        value: &Decimal,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        rust_decimal::serde::float::serialize(value, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        f64::deserialize(deserializer).map(sanitize)
    }
}
