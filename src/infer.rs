use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

/// Semantic type of a column, inferred from a sample of its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Number,
    Date,
    Text,
}

/// Metadata for one column, created once per dataset load.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub display_name: String,
    pub inferred_type: ColumnType,
}

impl ColumnDescriptor {
    pub fn new(name: &str, inferred_type: ColumnType) -> Self {
        ColumnDescriptor {
            name: name.to_string(),
            display_name: humanize(name),
            inferred_type,
        }
    }
}

/// Turn a machine style identifier into a display label.
/// "row_count" -> "Row count", "a_b_c" -> "A b c"
pub fn humanize(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

// Accepted date shapes, tried in order. chrono parsing is strict, the value
// has to match the pattern completely.
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
const DATE_FORMATS: [&str; 2] = ["%Y/%m/%d", "%Y-%m-%d"];

/// Parse a raw cell against the accepted date formats, returning the calendar
/// date component on success.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d);
        }
    }
    None
}

// Bare time-of-day strings like "00:45:12.000" must not be classified as
// numbers. JS parseFloat() would happily read the leading digits; the guard is
// part of the classification contract and kept explicit.
fn is_time_of_day(raw: &str) -> bool {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M:%S%.3f").is_ok()
}

fn is_finite_number(raw: &str) -> bool {
    raw.trim().parse::<f64>().map(f64::is_finite).unwrap_or(false)
}

/// Classify a single raw cell. First match wins: Date, then Number, then Text.
pub fn classify_value(raw: &str) -> ColumnType {
    if parse_date(raw).is_some() {
        ColumnType::Date
    } else if is_finite_number(raw) && !is_time_of_day(raw) {
        ColumnType::Number
    } else {
        ColumnType::Text
    }
}

/// Strategy seam for column type classification. The default samples the
/// leading rows; a schema-driven implementation can be substituted without
/// touching downstream consumers.
pub trait ColumnTypeClassifier {
    fn classify(&self, values: &[Option<String>]) -> ColumnType;
}

/// Classifies a column from its first `sample_rows` values.
///
/// With the default sample of one this reproduces the cheap single-row
/// heuristic: a malformed first value misclassifies the whole column. That is
/// accepted; raising `sample_rows` trades a longer scan for robustness.
pub struct LeadingRowsClassifier {
    sample_rows: usize,
}

impl LeadingRowsClassifier {
    pub fn new(sample_rows: usize) -> Self {
        LeadingRowsClassifier {
            sample_rows: sample_rows.max(1),
        }
    }
}

impl Default for LeadingRowsClassifier {
    fn default() -> Self {
        LeadingRowsClassifier::new(1)
    }
}

impl ColumnTypeClassifier for LeadingRowsClassifier {
    fn classify(&self, values: &[Option<String>]) -> ColumnType {
        // Majority vote over the sample, ties going to the earlier seen type.
        // A null cell carries no type information and votes Text.
        let mut votes: Vec<(ColumnType, usize)> = Vec::with_capacity(3);
        for value in values.iter().take(self.sample_rows) {
            let ty = match value {
                Some(raw) => classify_value(raw),
                None => ColumnType::Text,
            };
            match votes.iter_mut().find(|(t, _)| *t == ty) {
                Some((_, n)) => *n += 1,
                None => votes.push((ty, 1)),
            }
        }
        votes
            .iter()
            .max_by_key(|(_, n)| *n)
            .map(|(t, _)| *t)
            .unwrap_or(ColumnType::Text)
    }
}
