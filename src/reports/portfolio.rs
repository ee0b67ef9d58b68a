use chrono::NaiveDateTime;

use crate::holdings::AssetClass;
use crate::utils::{
    format_amount, format_amount_with, format_percent, format_price, format_signed_amount, Sign,
};
use crate::valuation::{ClassValuation, PortfolioSummary, PriceOrigin, ValuedPosition};

pub const REPORT_TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M";

const RULE_WIDTH: usize = 60;
const SECTION_RULE_WIDTH: usize = 30;
const FALLBACK_MARK: &str = "*";

fn header(generated_at: NaiveDateTime) -> Vec<String> {
    vec![
        format!(
            "PORTFOLIO REPORT - {}",
            generated_at.format(REPORT_TIMESTAMP_FORMAT)
        ),
        "=".repeat(RULE_WIDTH),
    ]
}

fn position_line(asset_class: AssetClass, p: &ValuedPosition) -> String {
    let mark = if p.price_origin == PriceOrigin::CostBasis {
        FALLBACK_MARK
    } else {
        " "
    };
    let quantity = format_amount_with(p.quantity, asset_class.quantity_decimals(), Sign::Auto, 6);

    format!(
        "{:>10}{} | {} {} | Cost: {:>9} | Current: {:>9} | Total: {:>10} TL | P/L: {:>8} TL ({:>7}%)",
        p.identifier,
        mark,
        quantity,
        asset_class.unit_label(),
        format_price(p.unit_cost),
        format_price(p.current_price),
        format_amount(p.value_total),
        format_signed_amount(p.gain_loss),
        format_percent(p.gain_loss_pct, 2),
    )
}

fn class_section(valuation: &ClassValuation) -> Vec<String> {
    let class = valuation.asset_class;
    let mut lines = vec![
        format!("{} HOLDINGS", class.title()),
        "-".repeat(SECTION_RULE_WIDTH),
    ];

    if valuation.positions.is_empty() {
        lines.push("(no holdings)".to_string());
    }
    for position in &valuation.positions {
        lines.push(position_line(class, position));
    }

    let s = &valuation.summary;
    lines.push("-".repeat(SECTION_RULE_WIDTH));
    lines.push(format!(
        "{} TOTAL: {} TL | P/L: {} TL ({}%)",
        class.title(),
        format_amount(s.total_value),
        format_signed_amount(s.total_gain_loss),
        format_percent(s.gain_loss_pct, 2),
    ));
    lines.push(String::new());
    lines
}

/// Render the daily report.
///
/// `generated_at` only feeds the header; every figure comes from the
/// valuation results.
pub fn render_report(
    generated_at: NaiveDateTime,
    classes: &[ClassValuation],
    summary: &PortfolioSummary,
) -> String {
    let mut lines = header(generated_at);
    lines.push(String::new());

    for valuation in classes {
        lines.extend(class_section(valuation));
    }

    let total = &summary.total;
    lines.push("OVERALL SUMMARY".to_string());
    lines.push("=".repeat(RULE_WIDTH));
    lines.push(format!(
        "TOTAL PORTFOLIO VALUE: {} TL",
        format_amount(total.total_value)
    ));
    lines.push(format!(
        "OVERALL GAIN/LOSS: {} TL ({}%)",
        format_signed_amount(total.total_gain_loss),
        format_percent(total.gain_loss_pct, 2)
    ));
    lines.push(String::new());
    for breakdown in &summary.classes {
        lines.push(format!(
            "{} Weight: %{}",
            breakdown.asset_class.label(),
            format_amount_with(breakdown.weight_pct, 1, Sign::Auto, 0)
        ));
    }
    lines.push("=".repeat(RULE_WIDTH));

    let fallbacks: usize = classes.iter().map(ClassValuation::fallback_count).sum();
    if fallbacks > 0 {
        lines.push(format!(
            "{} no live price available, valued at cost ({} position{})",
            FALLBACK_MARK,
            fallbacks,
            if fallbacks == 1 { "" } else { "s" }
        ));
    }

    lines.join("\n")
}

/// Explicit failure report used when valuation could not complete
pub fn render_error_report(generated_at: NaiveDateTime, reason: &str) -> String {
    let mut lines = header(generated_at);
    lines.push(String::new());
    lines.push(format!(
        "ERROR: portfolio report could not be generated - {}",
        reason
    ));
    lines.push("=".repeat(RULE_WIDTH));
    lines.join("\n")
}
