use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{clamp_fraction, non_negative};

/// The seven expense lines of the waterfall. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseId {
    Managers,
    Marketing,
    Production,
    Hardware,
    Logistics,
    Installers,
    Claims,
}

impl ExpenseId {
    /// Every expense id, in display order.
    pub const ALL: [ExpenseId; 7] = [
        Self::Managers,
        Self::Marketing,
        Self::Production,
        Self::Hardware,
        Self::Logistics,
        Self::Installers,
        Self::Claims,
    ];

    /// Position of this id in [`ExpenseId::ALL`].
    pub fn display_index(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Managers => "managers",
            Self::Marketing => "marketing",
            Self::Production => "production",
            Self::Hardware => "hardware",
            Self::Logistics => "logistics",
            Self::Installers => "installers",
            Self::Claims => "claims",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "managers" => Some(Self::Managers),
            "marketing" => Some(Self::Marketing),
            "production" => Some(Self::Production),
            "hardware" => Some(Self::Hardware),
            "logistics" => Some(Self::Logistics),
            "installers" => Some(Self::Installers),
            "claims" => Some(Self::Claims),
            _ => None,
        }
    }

    /// Label used by the seed snapshot.
    pub fn default_label(&self) -> &'static str {
        match self {
            Self::Managers => "Менеджери",
            Self::Marketing => "Маркетинг",
            Self::Production => "Виробництво",
            Self::Hardware => "Фурнітура",
            Self::Logistics => "Логістика",
            Self::Installers => "Монтажники",
            Self::Claims => "Рекламації",
        }
    }
}

impl fmt::Display for ExpenseId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an expense value is interpreted.
///
/// `Percent` holds a fraction of the entry's base (0.1 is ten percent).
/// `Amount` holds a fixed currency amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseMode {
    Percent(Decimal),
    Amount(Decimal),
}

impl ExpenseMode {
    /// Percent mode with the fraction clamped into `[0, 1]`.
    pub fn percent(fraction: Decimal) -> Self {
        Self::Percent(clamp_fraction(fraction))
    }

    /// Amount mode with negative amounts floored at zero.
    pub fn amount(amount: Decimal) -> Self {
        Self::Amount(non_negative(amount))
    }

    pub fn value(&self) -> Decimal {
        match self {
            Self::Percent(v) | Self::Amount(v) => *v,
        }
    }

    pub fn is_percent(&self) -> bool {
        matches!(self, Self::Percent(_))
    }
}

/// One line item of the waterfall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ExpenseEntryRecord", into = "ExpenseEntryRecord")]
pub struct ExpenseEntry {
    pub id: ExpenseId,
    pub label: String,
    pub mode: ExpenseMode,
}

impl ExpenseEntry {
    pub fn new(
        id: ExpenseId,
        mode: ExpenseMode,
    ) -> Self {
        Self {
            id,
            label: id.default_label().to_string(),
            mode,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ModeTag {
    Percent,
    Amount,
}

// Stored shape: {"id": "...", "label": "...", "mode": "percent", "value": 0.1}
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ExpenseEntryRecord {
    id: ExpenseId,
    #[serde(default)]
    label: String,
    mode: ModeTag,
    #[serde(with = "super::lenient_float")]
    value: Decimal,
}

impl From<ExpenseEntryRecord> for ExpenseEntry {
    fn from(record: ExpenseEntryRecord) -> Self {
        let mode = match record.mode {
            ModeTag::Percent => ExpenseMode::percent(record.value),
            ModeTag::Amount => ExpenseMode::amount(record.value),
        };
        let label = if record.label.trim().is_empty() {
            record.id.default_label().to_string()
        } else {
            record.label
        };
        Self {
            id: record.id,
            label,
            mode,
        }
    }
}

impl From<ExpenseEntry> for ExpenseEntryRecord {
    fn from(entry: ExpenseEntry) -> Self {
        let (mode, value) = match entry.mode {
            ExpenseMode::Percent(v) => (ModeTag::Percent, v),
            ExpenseMode::Amount(v) => (ModeTag::Amount, v),
        };
        Self {
            id: entry.id,
            label: entry.label,
            mode,
            value,
        }
    }
}

/// All seven expense entries, one named field per [`ExpenseId`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ExpensesRecord")]
pub struct Expenses {
    pub managers: ExpenseEntry,
    pub marketing: ExpenseEntry,
    pub production: ExpenseEntry,
    pub hardware: ExpenseEntry,
    pub logistics: ExpenseEntry,
    pub installers: ExpenseEntry,
    pub claims: ExpenseEntry,
}

impl Expenses {
    pub fn get(
        &self,
        id: ExpenseId,
    ) -> &ExpenseEntry {
        match id {
            ExpenseId::Managers => &self.managers,
            ExpenseId::Marketing => &self.marketing,
            ExpenseId::Production => &self.production,
            ExpenseId::Hardware => &self.hardware,
            ExpenseId::Logistics => &self.logistics,
            ExpenseId::Installers => &self.installers,
            ExpenseId::Claims => &self.claims,
        }
    }

    fn get_mut(
        &mut self,
        id: ExpenseId,
    ) -> &mut ExpenseEntry {
        match id {
            ExpenseId::Managers => &mut self.managers,
            ExpenseId::Marketing => &mut self.marketing,
            ExpenseId::Production => &mut self.production,
            ExpenseId::Hardware => &mut self.hardware,
            ExpenseId::Logistics => &mut self.logistics,
            ExpenseId::Installers => &mut self.installers,
            ExpenseId::Claims => &mut self.claims,
        }
    }

    /// Returns a copy with the entry for `id` replaced. The entry's own id is
    /// overwritten with `id`.
    pub fn with(
        &self,
        id: ExpenseId,
        entry: ExpenseEntry,
    ) -> Self {
        let mut next = self.clone();
        *next.get_mut(id) = ExpenseEntry { id, ..entry };
        next
    }

    /// Returns a copy with the mode of `id` replaced. The label is kept.
    pub fn with_mode(
        &self,
        id: ExpenseId,
        mode: ExpenseMode,
    ) -> Self {
        let entry = ExpenseEntry {
            mode,
            ..self.get(id).clone()
        };
        self.with(id, entry)
    }

    /// Entries in display order.
    pub fn iter(&self) -> impl Iterator<Item = &ExpenseEntry> {
        ExpenseId::ALL.into_iter().map(move |id| self.get(id))
    }
}

impl Default for Expenses {
    fn default() -> Self {
        Self {
            managers: ExpenseEntry::new(ExpenseId::Managers, ExpenseMode::Percent(Decimal::new(10, 2))),
            marketing: ExpenseEntry::new(ExpenseId::Marketing, ExpenseMode::Percent(Decimal::ZERO)),
            production: ExpenseEntry::new(
                ExpenseId::Production,
                ExpenseMode::Percent(Decimal::new(54, 2)),
            ),
            hardware: ExpenseEntry::new(ExpenseId::Hardware, ExpenseMode::Amount(Decimal::from(2000))),
            logistics: ExpenseEntry::new(ExpenseId::Logistics, ExpenseMode::Amount(Decimal::from(2000))),
            installers: ExpenseEntry::new(
                ExpenseId::Installers,
                ExpenseMode::Percent(Decimal::new(7, 2)),
            ),
            claims: ExpenseEntry::new(ExpenseId::Claims, ExpenseMode::Percent(Decimal::new(2, 2))),
        }
    }
}

#[derive(Deserialize)]
struct ExpensesRecord {
    managers: ExpenseEntry,
    marketing: ExpenseEntry,
    production: ExpenseEntry,
    hardware: ExpenseEntry,
    logistics: ExpenseEntry,
    installers: ExpenseEntry,
    claims: ExpenseEntry,
}

impl From<ExpensesRecord> for Expenses {
    fn from(record: ExpensesRecord) -> Self {
        // The key an entry is stored under wins over its embedded id.
        fn stamp(
            mut entry: ExpenseEntry,
            id: ExpenseId,
        ) -> ExpenseEntry {
            entry.id = id;
            entry
        }

        Self {
            managers: stamp(record.managers, ExpenseId::Managers),
            marketing: stamp(record.marketing, ExpenseId::Marketing),
            production: stamp(record.production, ExpenseId::Production),
            hardware: stamp(record.hardware, ExpenseId::Hardware),
            logistics: stamp(record.logistics, ExpenseId::Logistics),
            installers: stamp(record.installers, ExpenseId::Installers),
            claims: stamp(record.claims, ExpenseId::Claims),
        }
    }
}
