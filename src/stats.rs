use std::collections::HashSet;

use crate::infer::{ColumnType, parse_date};

/// Per-column aggregates, shaped by the inferred type.
///
/// Recomputed wholesale whenever the active dataset changes, never mutated in
/// place. Internal values keep full precision; `summary_lines` applies the
/// two-decimal display formatting.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSummary {
    Number {
        min: f64,
        max: f64,
        mean: f64,
        std_dev: f64,
        null_count: usize,
    },
    Date {
        min: Option<String>,
        max: Option<String>,
        null_count: usize,
    },
    Text {
        unique_count: usize,
        null_count: usize,
    },
}

/// Lenient float parse: anything that fails becomes NaN and flows into the
/// aggregates (fail-open, never fail-fast).
pub fn parse_float(raw: &str) -> f64 {
    raw.trim().parse().unwrap_or(f64::NAN)
}

/// Format a statistic for display. NaN renders as "NaN", mirroring what the
/// aggregation produced.
pub fn format_stat(value: f64) -> String {
    format!("{:.2}", value)
}

/// Compute the summary matching the column's inferred type.
///
/// Never errors: an empty or all-null column yields NaN / None / zero fields
/// and the grid renders a degraded summary instead of aborting.
pub fn summarize(values: &[Option<String>], ty: ColumnType) -> ColumnSummary {
    match ty {
        ColumnType::Number => number_summary(values),
        ColumnType::Date => date_summary(values),
        ColumnType::Text => text_summary(values),
    }
}

// min/max where a single NaN operand poisons the result. f64::min would
// silently drop the NaN side, which is exactly the masking we do not want.
fn sticky_min(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() { f64::NAN } else { a.min(b) }
}

fn sticky_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() { f64::NAN } else { a.max(b) }
}

fn number_summary(values: &[Option<String>]) -> ColumnSummary {
    let mut null_count = 0;
    let mut parsed: Vec<f64> = Vec::with_capacity(values.len());
    for value in values {
        match value {
            // Only truly missing cells count as null. A non-numeric string
            // among numeric data is not null, it parses to NaN and poisons
            // the arithmetic below instead.
            None => null_count += 1,
            Some(raw) => parsed.push(parse_float(raw)),
        }
    }

    let n = parsed.len() as f64;
    let sum: f64 = parsed.iter().sum();
    let mean = sum / n;

    let mut iter = parsed.iter();
    let (mut min, mut max) = match iter.next() {
        Some(&first) => (first, first),
        None => (f64::NAN, f64::NAN),
    };
    for &x in iter {
        min = sticky_min(min, x);
        max = sticky_max(max, x);
    }

    // Sample standard deviation (Bessel corrected). n <= 1 divides by zero
    // and yields NaN, same as the aggregates of an empty column.
    let variance = parsed.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();

    ColumnSummary::Number {
        min,
        max,
        mean,
        std_dev,
        null_count,
    }
}

// Extent over the raw values' natural string ordering, reformatted to a
// calendar date for display. Values that do not match an accepted date format
// are shown as-is.
fn date_summary(values: &[Option<String>]) -> ColumnSummary {
    let mut null_count = 0;
    let mut min: Option<&str> = None;
    let mut max: Option<&str> = None;
    for value in values {
        match value.as_deref() {
            None => null_count += 1,
            Some(raw) => {
                if min.is_none_or(|m| raw < m) {
                    min = Some(raw);
                }
                if max.is_none_or(|m| raw > m) {
                    max = Some(raw);
                }
            }
        }
    }
    ColumnSummary::Date {
        min: min.map(format_calendar_date),
        max: max.map(format_calendar_date),
        null_count,
    }
}

fn format_calendar_date(raw: &str) -> String {
    match parse_date(raw) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => raw.to_string(),
    }
}

fn text_summary(values: &[Option<String>]) -> ColumnSummary {
    let mut null_count = 0;
    let mut unique: HashSet<&str> = HashSet::new();
    for value in values {
        match value.as_deref() {
            None => null_count += 1,
            Some(raw) => {
                unique.insert(raw);
            }
        }
    }
    ColumnSummary::Text {
        unique_count: unique.len(),
        null_count,
    }
}

impl ColumnSummary {
    pub fn null_count(&self) -> usize {
        match self {
            ColumnSummary::Number { null_count, .. }
            | ColumnSummary::Date { null_count, .. }
            | ColumnSummary::Text { null_count, .. } => *null_count,
        }
    }

    /// Numeric domain for histogram binning, None for non-numeric columns.
    pub fn numeric_extent(&self) -> Option<(f64, f64)> {
        match self {
            ColumnSummary::Number { min, max, .. } => Some((*min, *max)),
            _ => None,
        }
    }

    /// Labelled, display-formatted fields for the rendering layer.
    pub fn summary_lines(&self) -> Vec<(&'static str, String)> {
        match self {
            ColumnSummary::Number {
                min,
                max,
                mean,
                std_dev,
                null_count,
            } => vec![
                ("min", format_stat(*min)),
                ("max", format_stat(*max)),
                ("mean", format_stat(*mean)),
                ("stdDev", format_stat(*std_dev)),
                ("nullCount", null_count.to_string()),
            ],
            ColumnSummary::Date {
                min,
                max,
                null_count,
            } => vec![
                ("min", min.clone().unwrap_or_default()),
                ("max", max.clone().unwrap_or_default()),
                ("nullCount", null_count.to_string()),
            ],
            ColumnSummary::Text {
                unique_count,
                null_count,
            } => vec![
                ("unique values", unique_count.to_string()),
                ("nullCount", null_count.to_string()),
            ],
        }
    }
}
