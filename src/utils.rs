//! Coercive numeric parsing and display formatting helpers.
//!
//! The screener feed is loosely typed: numeric fields arrive as JSON
//! numbers, numeric strings, or null. Coercion turns anything unparseable
//! into `None` (never zero, never an error), and display strings are
//! derived from the raw numeric value only when one exists.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Coerce a JSON value into a float. Numbers pass through, numeric
/// strings are parsed (thousands separators tolerated), everything else
/// becomes `None`.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

/// Coerce a JSON value into a non-negative count.
pub fn coerce_u32(value: &Value) -> Option<u32> {
    coerce_f64(value).and_then(|v| {
        if v.is_finite() && v >= 0.0 && v <= u32::MAX as f64 {
            Some(v.round() as u32)
        } else {
            None
        }
    })
}

/// Coerce a JSON value into a flag. Missing or unrecognized values are
/// simply `false`.
pub fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
        Value::String(s) => {
            matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "y" | "1")
        }
        _ => false,
    }
}

/// Coerce a JSON value into a string. Null becomes empty, scalars are
/// stringified, structured values are dropped.
pub fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

pub fn de_coerced_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(coerce_f64(&Value::deserialize(deserializer)?))
}

pub fn de_coerced_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(coerce_u32(&Value::deserialize(deserializer)?))
}

pub fn de_coerced_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(coerce_bool(&Value::deserialize(deserializer)?))
}

pub fn de_coerced_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(coerce_string(&Value::deserialize(deserializer)?))
}

/// Format a value as currency with thousands separators: `$1,234.56`.
/// Negative values carry a leading minus: `-$0.50`.
pub fn format_currency(value: f64) -> String {
    let negative = value < 0.0;
    // Round to cents first so 0.999 becomes $1.00, not $0.99.
    let cents_total = (value.abs() * 100.0).round() as u64;
    let whole = cents_total / 100;
    let cents = cents_total % 100;
    let sign = if negative { "-" } else { "" };
    format!("{}${}.{:02}", sign, group_thousands(whole), cents)
}

/// Format an AUM value (millions of dollars): `$450,000.00M`.
pub fn format_aum(value: f64) -> String {
    format!("{}M", format_currency(value))
}

/// Format a raw fraction as a percentage: 0.0945 becomes `9.45%`.
pub fn format_ratio_percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

/// Format an already-scaled percentage: 1.0 becomes `1.00%`.
pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value)
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_f64_variants() {
        assert_eq!(coerce_f64(&json!(560.12)), Some(560.12));
        assert_eq!(coerce_f64(&json!("560.12")), Some(560.12));
        assert_eq!(coerce_f64(&json!("1,234.5")), Some(1234.5));
        assert_eq!(coerce_f64(&json!("n/a")), None);
        assert_eq!(coerce_f64(&json!(null)), None);
        assert_eq!(coerce_f64(&json!([1, 2])), None);
    }

    #[test]
    fn test_coerce_u32_rejects_negatives() {
        assert_eq!(coerce_u32(&json!(503)), Some(503));
        assert_eq!(coerce_u32(&json!("503")), Some(503));
        assert_eq!(coerce_u32(&json!(-1)), None);
    }

    #[test]
    fn test_coerce_bool_variants() {
        assert!(coerce_bool(&json!(true)));
        assert!(coerce_bool(&json!("yes")));
        assert!(coerce_bool(&json!(1)));
        assert!(!coerce_bool(&json!("no")));
        assert!(!coerce_bool(&json!(null)));
    }

    #[test]
    fn test_currency_formatting() {
        assert_eq!(format_currency(560.12), "$560.12");
        assert_eq!(format_currency(1234567.891), "$1,234,567.89");
        assert_eq!(format_currency(0.999), "$1.00");
        assert_eq!(format_currency(1.0), "$1.00");
        assert_eq!(format_currency(-0.5), "-$0.50");
    }

    #[test]
    fn test_aum_formatting() {
        assert_eq!(format_aum(450000.0), "$450,000.00M");
    }

    #[test]
    fn test_percent_formatting() {
        assert_eq!(format_ratio_percent(0.0945), "9.45%");
        assert_eq!(format_percent(1.0), "1.00%");
        assert_eq!(format_percent(-0.5), "-0.50%");
    }

    #[test]
    fn test_display_round_trip() {
        // Stripping the symbols must recover the numeric value to 2dp.
        for value in [0.0, 1.0, 99.99, 1234.56, 450000.0] {
            let display = format_currency(value);
            let stripped: f64 = display.replace(['$', ','], "").parse().unwrap();
            assert!((stripped - value).abs() < 0.005, "{display} vs {value}");
        }
    }
}
