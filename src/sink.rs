// 📝 CSV Sink - write the flattened table as delimited text
// Header row is always written, even for an empty table

use crate::transform::OutputRow;
use anyhow::{Context, Result};
use chrono::{NaiveDateTime, NaiveTime};
use std::io::Write;
use std::path::Path;
use tracing::debug;

// ============================================================================
// CELL FORMATTING
// ============================================================================

/// How one date column is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// Every value is at midnight: `YYYY-MM-DD`
    DateOnly,
    /// `YYYY-MM-DD HH:MM:SS`, fractional seconds only when present
    DateTime,
}

impl DateStyle {
    pub fn for_column(values: impl IntoIterator<Item = NaiveDateTime>) -> Self {
        if values.into_iter().all(|v| v.time() == NaiveTime::MIN) {
            DateStyle::DateOnly
        } else {
            DateStyle::DateTime
        }
    }

    pub fn format(&self, value: &NaiveDateTime) -> String {
        match self {
            DateStyle::DateOnly => value.format("%Y-%m-%d").to_string(),
            DateStyle::DateTime => value.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
        }
    }
}

/// Shortest round-trip float text with at least one decimal digit: 20.0, 0.8,
/// 1234.5. Decimal exponents outside -4..16 switch to scientific: 1e+16, 1.5e-07
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return String::new();
    }
    if value.is_infinite() {
        let sign = if value > 0.0 { "" } else { "-" };
        return format!("{}inf", sign);
    }

    let scientific = format!("{:e}", value);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if (-4..16).contains(&exponent) {
        if value.fract() == 0.0 {
            format!("{:.1}", value)
        } else {
            format!("{}", value)
        }
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    }
}

pub fn format_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

fn record_for(row: &OutputRow, registration: DateStyle, order: DateStyle) -> [String; 13] {
    [
        row.customer_id.to_string(),
        row.customer_name.clone().unwrap_or_default(),
        registration.format(&row.registration_date),
        format_bool(row.is_vip).to_string(),
        row.order_id.to_string(),
        order.format(&row.order_date),
        row.product_id.to_string(),
        row.product_name.clone(),
        row.category.clone(),
        format_float(row.unit_price),
        row.item_quantity.to_string(),
        format_float(row.total_item_price),
        format_float(row.total_order_value_percentage),
    ]
}

// ============================================================================
// WRITERS
// ============================================================================

pub fn write_table_to<W: Write>(writer: W, rows: &[OutputRow]) -> Result<()> {
    let registration = DateStyle::for_column(rows.iter().map(|r| r.registration_date));
    let order = DateStyle::for_column(rows.iter().map(|r| r.order_date));

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(OutputRow::COLUMNS)
        .context("Failed to write CSV header")?;

    for (idx, row) in rows.iter().enumerate() {
        wtr.write_record(record_for(row, registration, order))
            .with_context(|| format!("Failed to write CSV row {}", idx + 1))?;
    }

    wtr.flush().context("Failed to flush CSV output")?;
    Ok(())
}

pub fn write_table(path: &Path, rows: &[OutputRow]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;

    write_table_to(file, rows)
        .with_context(|| format!("Failed to write table to {}", path.display()))?;

    debug!(rows = rows.len(), path = %path.display(), "wrote CSV table");
    Ok(())
}
