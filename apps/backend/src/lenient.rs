//! Tolerant decoding of loosely typed upstream JSON.
//!
//! The upstream catalog is not consistent about types: years arrive as
//! strings or numbers, ratings as numbers or numeric strings. These helpers
//! accept either and turn anything else into `None`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// String value, or the textual form of a number.
pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numeric value, or a string that parses as one.
pub fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Integer prefix of a string: `"2019"` and `"2019-05-01"` both give 2019.
pub fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// `deserialize_with` adapter for [`text`].
pub fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(text))
}

/// `deserialize_with` adapter for [`number`].
pub fn opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(number))
}

/// `deserialize_with` adapter accepting booleans, 0/1 and "true"/"false".
pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => matches!(s.trim(), "true" | "1"),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text() {
        assert_eq!(text(&json!("abc")), Some("abc".to_string()));
        assert_eq!(text(&json!(42)), Some("42".to_string()));
        assert_eq!(text(&json!(null)), None);
        assert_eq!(text(&json!({"a": 1})), None);
    }

    #[test]
    fn test_number() {
        assert_eq!(number(&json!(7.5)), Some(7.5));
        assert_eq!(number(&json!(" 8.25 ")), Some(8.25));
        assert_eq!(number(&json!("n/a")), None);
        assert_eq!(number(&json!(true)), None);
    }

    #[test]
    fn test_leading_int() {
        assert_eq!(leading_int("2019"), Some(2019));
        assert_eq!(leading_int(" 2019-05-01"), Some(2019));
        assert_eq!(leading_int("-3 days"), Some(-3));
        assert_eq!(leading_int("abc"), None);
        assert_eq!(leading_int(""), None);
    }

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "opt_text")]
        year: Option<String>,
        #[serde(default, deserialize_with = "opt_number")]
        rating: Option<f64>,
        #[serde(default, deserialize_with = "flag")]
        is_tv: bool,
    }

    #[test]
    fn test_deserialize_adapters() {
        let sample: Sample =
            serde_json::from_value(json!({"year": 2020, "rating": "6.1", "is_tv": 1})).unwrap();
        assert_eq!(sample.year.as_deref(), Some("2020"));
        assert_eq!(sample.rating, Some(6.1));
        assert!(sample.is_tv);

        let empty: Sample = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.year, None);
        assert_eq!(empty.rating, None);
        assert!(!empty.is_tv);

        let junk: Sample =
            serde_json::from_value(json!({"year": [1], "rating": {}, "is_tv": null})).unwrap();
        assert_eq!(junk.year, None);
        assert_eq!(junk.rating, None);
        assert!(!junk.is_tv);
    }
}
