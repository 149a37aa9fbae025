//! Cell and label formatting shared by the table and the chart.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

// minute precision with an offset; RFC 3339 proper needs seconds
const OFFSET_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%d %H:%M:%S%:z",
];

const COMPACT_UNITS: [(f64, &str); 4] = [(1e3, "K"), (1e6, "M"), (1e9, "B"), (1e12, "T")];

/// Zone timestamps are displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeMode {
    #[default]
    Local,
    Utc,
}

enum Stamp {
    Instant(DateTime<Utc>),
    // no offset given: already wall-clock time in the display zone
    Wall(NaiveDateTime),
}

fn parse_stamp(value: &Value) -> Option<Stamp> {
    match value {
        Value::Number(n) => {
            let ms = n.as_f64()?;
            DateTime::<Utc>::from_timestamp_millis(ms as i64).map(Stamp::Instant)
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(Stamp::Instant(dt.with_timezone(&Utc)));
            }
            if let Some(dt) = parse_with_offset(s) {
                return Some(Stamp::Instant(dt));
            }
            for fmt in NAIVE_FORMATS {
                if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                    return Some(Stamp::Wall(dt));
                }
            }
            // bare dates are midnight UTC
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| Stamp::Instant(dt.and_utc()))
        }
        _ => None,
    }
}

fn parse_with_offset(s: &str) -> Option<DateTime<Utc>> {
    let s = match s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
        Some(head) => format!("{head}+00:00"),
        None => s.to_string(),
    };
    OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(&s, fmt).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// `YYYY-MM-DD HH:MM` in the display zone. Missing or null values give an
/// empty string; anything unparseable is shown as-is.
pub fn format_timestamp(value: Option<&Value>, mode: TimeMode) -> String {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return String::new();
    };
    match parse_stamp(value) {
        Some(Stamp::Wall(dt)) => dt.format(STAMP_FORMAT).to_string(),
        Some(Stamp::Instant(dt)) => match mode {
            TimeMode::Local => dt.with_timezone(&Local).format(STAMP_FORMAT).to_string(),
            TimeMode::Utc => dt.format(STAMP_FORMAT).to_string(),
        },
        None => display_value(value),
    }
}

/// Formats a non-timestamp cell.
pub fn format_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::Number(n)) => n.as_f64().map(format_number).unwrap_or_else(|| n.to_string()),
        Some(v) => display_value(v),
    }
}

/// |v| >= 1000 goes compact (`1.5K`), otherwise fixed point with 6 digits
/// below 1 and 4 digits above.
pub fn format_number(v: f64) -> String {
    if v.is_finite() && v.abs() >= 1000.0 {
        compact_number(v)
    } else if v.abs() < 1.0 {
        format!("{v:.6}")
    } else {
        format!("{v:.4}")
    }
}

/// Short-scale compact notation with at most two fraction digits.
pub fn compact_number(v: f64) -> String {
    let abs = v.abs();
    let sign = if v < 0.0 { "-" } else { "" };

    let Some(mut idx) = COMPACT_UNITS.iter().rposition(|(div, _)| abs >= *div) else {
        return format!("{sign}{}", trim_fraction(round2(abs)));
    };
    let mut scaled = round2(abs / COMPACT_UNITS[idx].0);
    // 999_999 rounds to 1000K; carry into the next unit
    if scaled >= 1000.0 && idx + 1 < COMPACT_UNITS.len() {
        idx += 1;
        scaled = round2(abs / COMPACT_UNITS[idx].0);
    }
    format!("{sign}{}{}", trim_fraction(scaled), COMPACT_UNITS[idx].1)
}

/// Lenient numeric read used by the chart. Non-finite results are `None`.
pub fn coerce_number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn trim_fraction(v: f64) -> String {
    let s = format!("{v:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}
