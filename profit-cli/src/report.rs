//! Plain-text and JSON rendering of results and project lists.

use std::fmt::Write;

use profit_core::{ComputationResult, Project, compute};

use crate::utils::{format_pct, format_uah};

const LABEL_WIDTH: usize = 14;
const MONEY_WIDTH: usize = 14;
const PCT_WIDTH: usize = 8;

/// Waterfall table: one line per expense in display order, then totals.
pub fn render_table(result: &ComputationResult) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Дохід: {}", format_uah(result.revenue));
    let _ = writeln!(
        out,
        "{:<LABEL_WIDTH$} {:>MONEY_WIDTH$} {:>PCT_WIDTH$} {:>MONEY_WIDTH$} {:>MONEY_WIDTH$}",
        "Стаття", "База", "%", "Сума", "Залишок"
    );
    for row in &result.rows {
        let _ = writeln!(
            out,
            "{:<LABEL_WIDTH$} {:>MONEY_WIDTH$} {:>PCT_WIDTH$} {:>MONEY_WIDTH$} {:>MONEY_WIDTH$}",
            row.label,
            format_uah(row.base),
            format_pct(row.percent),
            format_uah(row.amount),
            format_uah(row.remaining_after),
        );
    }
    let _ = writeln!(
        out,
        "Витрати: {} ({})",
        format_uah(result.total_expenses_amount),
        format_pct(result.total_expenses_percent)
    );
    let _ = writeln!(
        out,
        "Прибуток: {} ({})",
        format_uah(result.profit_amount),
        format_pct(result.profit_percent)
    );
    out
}

pub fn render_json(result: &ComputationResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(result)
}

/// One line per project: id, last update, name, revenue and profit.
pub fn render_projects(projects: &[Project]) -> String {
    if projects.is_empty() {
        return "Немає збережених проєктів\n".to_string();
    }

    let mut out = String::new();
    for project in projects {
        let result = compute(&project.state);
        let _ = writeln!(
            out,
            "{}  {}  {}  {} / {} ({})",
            project.id,
            project.updated_at.format("%Y-%m-%d %H:%M"),
            project.name,
            format_uah(result.revenue),
            format_uah(result.profit_amount),
            format_pct(result.profit_percent),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use profit_core::CalculatorState;

    use super::*;

    #[test]
    fn table_lists_rows_and_totals() {
        let table = render_table(&compute(&CalculatorState::default()));
        let lines: Vec<_> = table.lines().collect();

        assert_eq!(lines.len(), 11);
        assert_eq!(lines[0], "Дохід: 120\u{a0}000\u{a0}₴");
        assert!(lines[2].starts_with("Менеджери"));
        assert!(lines[8].starts_with("Рекламації"));
        assert_eq!(lines[9], "Витрати: 91\u{a0}400\u{a0}₴ (76.2%)");
        assert_eq!(lines[10], "Прибуток: 28\u{a0}600\u{a0}₴ (23.8%)");
    }

    #[test]
    fn json_uses_camel_case_keys() {
        let json = render_json(&compute(&CalculatorState::default())).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["profitAmount"], 28600.0);
        assert_eq!(value["rows"].as_array().map(Vec::len), Some(7));
        assert_eq!(value["rows"][0]["remainingAfter"], 106200.0);
    }

    #[test]
    fn empty_project_list_has_message() {
        assert_eq!(render_projects(&[]), "Немає збережених проєктів\n");
    }

    #[test]
    fn project_line_shows_profit() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        let project = Project {
            id: "p-1".to_string(),
            owner_id: "local".to_string(),
            name: "Офіс".to_string(),
            created_at: at,
            updated_at: at,
            state: CalculatorState::default(),
        };

        assert_eq!(
            render_projects(&[project]),
            "p-1  2025-03-01 09:30  Офіс  120\u{a0}000\u{a0}₴ / 28\u{a0}600\u{a0}₴ (23.8%)\n"
        );
    }
}
