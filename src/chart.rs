//! Bar charts of cost versus current value
//!
//! One grouped-bar SVG per asset class: for every position a cost bar and a
//! current-value bar, with the gain/loss written above the group.

use anyhow::{Context, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::holdings::AssetClass;
use crate::utils::{format_amount_with, format_signed_amount, Sign};
use crate::valuation::{ClassValuation, ValuedPosition};

const WIDTH: f64 = 1200.0;
const HEIGHT: f64 = 700.0;
const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 70.0;
const MARGIN_BOTTOM: f64 = 110.0;
const BAR_SHARE: f64 = 0.35;
const ROTATE_LABELS_ABOVE: usize = 5;

const COST_COLOR: &str = "lightcoral";
const VALUE_COLOR: &str = "lightgreen";
const GAIN_COLOR: &str = "green";
const LOSS_COLOR: &str = "red";

/// One bar group
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRow {
    pub label: String,
    pub cost_total: Decimal,
    pub value_total: Decimal,
    pub gain_loss: Decimal,
    pub gain_loss_pct: Decimal,
}

impl From<&ValuedPosition> for ChartRow {
    fn from(p: &ValuedPosition) -> Self {
        Self {
            label: p.identifier.clone(),
            cost_total: p.cost_total,
            value_total: p.value_total,
            gain_loss: p.gain_loss,
            gain_loss_pct: p.gain_loss_pct,
        }
    }
}

pub fn chart_rows(valuation: &ClassValuation) -> Vec<ChartRow> {
    valuation.positions.iter().map(ChartRow::from).collect()
}

pub fn chart_title(asset_class: AssetClass) -> String {
    format!("{} Investment Performance", asset_class.label())
}

pub fn chart_file_name(asset_class: AssetClass) -> String {
    format!("{}-chart.svg", asset_class.as_str())
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Render rows as a standalone SVG document
pub fn render_svg(title: &str, rows: &[ChartRow]) -> String {
    let plot_width = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let baseline = MARGIN_TOP + plot_height;

    let max_value = rows
        .iter()
        .map(|r| to_f64(r.cost_total.max(r.value_total)))
        .fold(0.0_f64, f64::max);
    // Leave headroom for the gain/loss labels
    let scale_max = if max_value > 0.0 { max_value * 1.15 } else { 1.0 };
    let bar_height = |v: Decimal| (to_f64(v).max(0.0) / scale_max) * plot_height;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">"#,
        w = WIDTH,
        h = HEIGHT
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="35" text-anchor="middle" font-size="20" font-weight="bold">{}</text>"#,
        WIDTH / 2.0,
        escape_xml(title)
    );

    // Horizontal grid with axis amounts
    for step in 0..=4 {
        let fraction = step as f64 / 4.0;
        let y = baseline - fraction * plot_height;
        let amount = Decimal::from_f64_retain(scale_max * fraction).unwrap_or_default();
        let _ = writeln!(
            svg,
            r#"<line x1="{x1}" y1="{y:.1}" x2="{x2}" y2="{y:.1}" stroke="gainsboro" stroke-dasharray="4 4"/>"#,
            x1 = MARGIN_LEFT,
            x2 = WIDTH - MARGIN_RIGHT,
            y = y
        );
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{:.1}" text-anchor="end" font-size="11">{}</text>"#,
            MARGIN_LEFT - 8.0,
            y + 4.0,
            format_amount_with(amount, 0, Sign::Auto, 0)
        );
    }

    let group_width = if rows.is_empty() {
        plot_width
    } else {
        plot_width / rows.len() as f64
    };
    let bar_width = group_width * BAR_SHARE;
    let rotate = rows.len() > ROTATE_LABELS_ABOVE;

    for (i, row) in rows.iter().enumerate() {
        let center = MARGIN_LEFT + group_width * (i as f64 + 0.5);
        let cost_h = bar_height(row.cost_total);
        let value_h = bar_height(row.value_total);

        let _ = writeln!(
            svg,
            r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}" fill-opacity="0.8"/>"#,
            center - bar_width,
            baseline - cost_h,
            bar_width,
            cost_h,
            COST_COLOR
        );
        let _ = writeln!(
            svg,
            r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}" fill-opacity="0.8"/>"#,
            center,
            baseline - value_h,
            bar_width,
            value_h,
            VALUE_COLOR
        );

        let color = if row.gain_loss >= Decimal::ZERO {
            GAIN_COLOR
        } else {
            LOSS_COLOR
        };
        let top = baseline - cost_h.max(value_h) - 8.0;
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="11" font-weight="bold" fill="{}"><tspan x="{:.1}" dy="-14">{} TL</tspan><tspan x="{:.1}" dy="14">(%{})</tspan></text>"#,
            center,
            top,
            color,
            center,
            format_signed_amount(row.gain_loss),
            center,
            format_amount_with(row.gain_loss_pct, 1, Sign::Always, 0)
        );

        let label_y = baseline + 20.0;
        if rotate {
            let _ = writeln!(
                svg,
                r#"<text x="{x:.1}" y="{y:.1}" text-anchor="end" font-size="12" transform="rotate(-45 {x:.1} {y:.1})">{label}</text>"#,
                x = center,
                y = label_y,
                label = escape_xml(&row.label)
            );
        } else {
            let _ = writeln!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="12">{}</text>"#,
                center,
                label_y,
                escape_xml(&row.label)
            );
        }
    }

    let _ = writeln!(
        svg,
        r#"<line x1="{x1}" y1="{y}" x2="{x2}" y2="{y}" stroke="black"/>"#,
        x1 = MARGIN_LEFT,
        x2 = WIDTH - MARGIN_RIGHT,
        y = baseline
    );

    // Legend
    let legend_x = WIDTH - MARGIN_RIGHT - 170.0;
    for (offset, (color, text)) in [(COST_COLOR, "Cost"), (VALUE_COLOR, "Current Value")]
        .iter()
        .enumerate()
    {
        let y = MARGIN_TOP + offset as f64 * 22.0;
        let _ = writeln!(
            svg,
            r#"<rect x="{}" y="{}" width="14" height="14" fill="{}"/><text x="{}" y="{}" font-size="12">{}</text>"#,
            legend_x,
            y,
            color,
            legend_x + 20.0,
            y + 12.0,
            text
        );
    }

    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" text-anchor="middle" font-size="13">Asset</text>"#,
        MARGIN_LEFT + plot_width / 2.0,
        HEIGHT - 15.0
    );
    let _ = writeln!(
        svg,
        r#"<text x="20" y="{y}" text-anchor="middle" font-size="13" transform="rotate(-90 20 {y})">Amount (TL)</text>"#,
        y = MARGIN_TOP + plot_height / 2.0
    );
    svg.push_str("</svg>\n");
    svg
}

/// Write the chart for one class into `output_dir`, returning its path
pub fn write_chart(output_dir: &Path, valuation: &ClassValuation) -> Result<PathBuf> {
    let asset_class = valuation.asset_class;
    let svg = render_svg(&chart_title(asset_class), &chart_rows(valuation));

    std::fs::create_dir_all(output_dir).with_context(|| {
        format!("Failed to create chart directory {}", output_dir.display())
    })?;
    let path = output_dir.join(chart_file_name(asset_class));
    std::fs::write(&path, svg)
        .with_context(|| format!("Failed to write chart {}", path.display()))?;

    info!("Chart saved: {}", path.display());
    Ok(path)
}
