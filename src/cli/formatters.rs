//! Output formatting module for CLI display
//!
//! Keeps presentation (tables, JSON, colored status lines) apart from the
//! valuation and report logic.

use colored::Colorize;
use rust_decimal::Decimal;
use serde::Serialize;
use tabled::{
    settings::{object::Columns, Alignment, Style},
    Table, Tabled,
};

use crate::app::{MailStatus, ReportRun};
use crate::holdings::{AssetClass, Position};
use crate::utils::{format_amount, format_amount_with, format_price, Sign};
use crate::valuation::{ClassValuation, PortfolioSummary};

#[derive(Serialize)]
struct JsonPosition<'a> {
    asset_class: AssetClass,
    #[serde(flatten)]
    position: &'a Position,
    cost_total: Option<Decimal>,
}

/// Normalized holdings as JSON
pub fn format_holdings_json(classes: &[(AssetClass, Vec<Position>)]) -> String {
    let positions: Vec<JsonPosition> = classes
        .iter()
        .flat_map(|(asset_class, positions)| {
            positions.iter().map(move |p| JsonPosition {
                asset_class: *asset_class,
                position: p,
                cost_total: p.cost_total(),
            })
        })
        .collect();

    serde_json::to_string_pretty(&positions)
        .unwrap_or_else(|e| format!(r#"{{"error": "JSON serialization failed: {}"}}"#, e))
}

/// Normalized holdings as a terminal table
pub fn format_holdings_table(classes: &[(AssetClass, Vec<Position>)]) -> String {
    #[derive(Tabled)]
    struct HoldingRow {
        #[tabled(rename = "Class")]
        asset_class: String,
        #[tabled(rename = "Identifier")]
        identifier: String,
        #[tabled(rename = "Quantity")]
        quantity: String,
        #[tabled(rename = "Unit Cost")]
        unit_cost: String,
        #[tabled(rename = "Total Cost")]
        cost_total: String,
    }

    let rows: Vec<HoldingRow> = classes
        .iter()
        .flat_map(|(asset_class, positions)| {
            positions.iter().map(move |p| HoldingRow {
                asset_class: asset_class.label().to_string(),
                identifier: p.identifier.clone(),
                quantity: format!(
                    "{} {}",
                    format_amount_with(p.quantity, asset_class.quantity_decimals(), Sign::Auto, 0),
                    asset_class.unit_label()
                ),
                unit_cost: format!("{} TL", format_price(p.unit_cost)),
                cost_total: format_cost(p.cost_total()),
            })
        })
        .collect();

    if rows.is_empty() {
        return format!("{} No holdings configured\n", "ℹ".blue().bold());
    }

    let total = classes
        .iter()
        .flat_map(|(_, positions)| positions.iter().map(Position::cost_total))
        .try_fold(Decimal::ZERO, |acc, cost| acc.checked_add(cost?));

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    // Right-align the numeric columns
    table.modify(Columns::new(2..), Alignment::right());

    format!(
        "{}\n\n{:<20} {}\n",
        table,
        "Total Cost:".bold(),
        format_cost(total)
    )
}

fn format_cost(cost: Option<Decimal>) -> String {
    match cost {
        Some(cost) => format!("{} TL", format_amount(cost)),
        None => "out of range".to_string(),
    }
}

/// Report run as JSON, for scripting
pub fn format_report_json(run: &ReportRun) -> String {
    #[derive(Serialize)]
    struct JsonReport<'a> {
        generated_at: String,
        ok: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        classes: &'a [ClassValuation],
        #[serde(skip_serializing_if = "Option::is_none")]
        summary: Option<&'a PortfolioSummary>,
        charts: Vec<String>,
        mail: String,
    }

    let report = JsonReport {
        generated_at: run.generated_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
        ok: run.is_success(),
        error: run.error.as_ref().map(|e| e.to_string()),
        classes: &run.valuations,
        summary: run.summary.as_ref(),
        charts: run.charts.iter().map(|p| p.display().to_string()).collect(),
        mail: mail_status_text(&run.mail),
    };

    serde_json::to_string_pretty(&report)
        .unwrap_or_else(|e| format!(r#"{{"error": "JSON serialization failed: {}"}}"#, e))
}

fn mail_status_text(status: &MailStatus) -> String {
    match status {
        MailStatus::NotConfigured => "not configured".to_string(),
        MailStatus::Disabled => "disabled".to_string(),
        MailStatus::Sent => "sent".to_string(),
        MailStatus::Failed(reason) => format!("failed: {}", reason),
    }
}

/// Status lines shown after the report (charts written, mail outcome)
pub fn format_run_status(run: &ReportRun) -> String {
    let mut output = String::new();

    for path in &run.charts {
        output.push_str(&format!(
            "{} Chart saved: {}\n",
            "✓".green().bold(),
            path.display()
        ));
    }

    match &run.mail {
        MailStatus::Sent => {
            output.push_str(&format!("{} Report mailed\n", "✓".green().bold()));
        }
        MailStatus::Failed(reason) => {
            output.push_str(&format!(
                "{} Report mail failed: {}\n",
                "✗".red().bold(),
                reason
            ));
        }
        MailStatus::NotConfigured | MailStatus::Disabled => {}
    }

    output
}
