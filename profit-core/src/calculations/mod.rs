//! Profitability calculations.
//!
//! The only calculation in this crate is the expense waterfall: revenue minus a
//! fixed chain of expense deductions. [`common`] holds the sanitizing arithmetic
//! every step goes through.

pub mod common;
pub mod waterfall;

pub use waterfall::{ComputationResult, ComputedRow, compute};
