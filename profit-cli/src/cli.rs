//! Command-line definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use profit_core::{CalculatorState, ExpenseId};

use crate::utils::parse_number;

/// Profitability calculator for partition projects.
///
/// Computes the cost waterfall from a unit price, a quantity and seven
/// expense lines, and keeps named projects either in the configured store
/// (with `--user`) or in a local JSON file.
#[derive(Debug, Parser)]
#[command(name = "profit", version)]
pub struct Cli {
    /// Config file. Defaults to `$PROFIT_CONFIG`, then `./profit.toml`.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Signed-in user id. Without it projects are kept in the local store.
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Log level or filter directive; overrides the config file.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the waterfall for the default inputs, a saved project, or either
    /// with edits applied.
    Compute {
        /// Start from a saved project.
        #[arg(long)]
        project: Option<String>,

        #[command(flatten)]
        edits: EditArgs,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Manage saved projects.
    #[command(subcommand)]
    Projects(ProjectsCommand),
}

#[derive(Debug, Subcommand)]
pub enum ProjectsCommand {
    /// List projects, most recently updated first.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Create a project with the default inputs.
    Create { name: String },
    /// Print a project's waterfall.
    Show {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Apply edits and save. Without `--project` a new project is created.
    Save {
        #[arg(long)]
        project: Option<String>,

        /// New project name.
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        edits: EditArgs,
    },
    Rename { id: String, name: String },
    Delete { id: String },
}

/// One `ID=VALUE` expense edit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpenseEdit {
    pub id: ExpenseId,
    pub value: f64,
}

/// Input edits shared by `compute` and `projects save`.
#[derive(Debug, Clone, Default, Args)]
pub struct EditArgs {
    /// Start from the default inputs.
    #[arg(long)]
    pub reset: bool,

    /// Price of one unit, e.g. `120000` or `99 500,50`.
    #[arg(long, value_parser = parse_number_arg, allow_hyphen_values = true)]
    pub unit_price: Option<f64>,

    /// Number of units; fractions are dropped.
    #[arg(long, value_parser = parse_quantity_arg, allow_hyphen_values = true)]
    pub quantity: Option<f64>,

    /// Percent of the line's base, 0-100, e.g. `managers=10` or `claims=2,5%`.
    #[arg(long = "percent", value_name = "ID=P", value_parser = parse_expense_edit)]
    pub percents: Vec<ExpenseEdit>,

    /// Fixed amount, e.g. `logistics=2000`. Applied after percents.
    #[arg(long = "amount", value_name = "ID=A", value_parser = parse_expense_edit)]
    pub amounts: Vec<ExpenseEdit>,
}

impl EditArgs {
    pub fn is_empty(&self) -> bool {
        !self.reset
            && self.unit_price.is_none()
            && self.quantity.is_none()
            && self.percents.is_empty()
            && self.amounts.is_empty()
    }

    /// Returns `state` with every edit applied, in declaration order.
    pub fn apply_to(
        &self,
        state: &CalculatorState,
    ) -> CalculatorState {
        let mut next = if self.reset {
            CalculatorState::default()
        } else {
            state.clone()
        };

        if let Some(unit_price) = self.unit_price {
            next = next.set_unit_price(unit_price);
        }
        if let Some(quantity) = self.quantity {
            next = next.set_quantity(quantity);
        }
        for edit in &self.percents {
            next = next.set_expense_percent(edit.id, edit.value / 100.0);
        }
        for edit in &self.amounts {
            next = next.set_expense_amount(edit.id, edit.value);
        }
        next
    }
}

fn parse_number_arg(s: &str) -> Result<f64, String> {
    Ok(parse_number(s))
}

fn parse_quantity_arg(s: &str) -> Result<f64, String> {
    Ok(parse_number(s).floor())
}

fn parse_expense_edit(s: &str) -> Result<ExpenseEdit, String> {
    let (id, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ID=VALUE, got '{s}'"))?;
    let id = ExpenseId::parse(id).ok_or_else(|| {
        let known: Vec<_> = ExpenseId::ALL.iter().map(|id| id.as_str()).collect();
        format!("unknown expense '{}'; expected one of {}", id.trim(), known.join(", "))
    })?;

    Ok(ExpenseEdit {
        id,
        value: parse_number(value),
    })
}
