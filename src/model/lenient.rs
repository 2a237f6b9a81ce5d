//! Deserializers that read malformed optional values as `None`.

use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    String(String),
    Other(serde::de::IgnoredAny),
}

/// Accepts a number or a numeric string (`"50"`, `"50%"`, `"2px"`).
pub(crate) fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumberOrString>::deserialize(deserializer)?;
    Ok(match value {
        Some(NumberOrString::Number(n)) if n.is_finite() => Some(n),
        Some(NumberOrString::String(s)) => {
            let trimmed = s.trim().trim_end_matches('%').trim_end_matches("px").trim();
            trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        _ => None,
    })
}

/// Like [`number`], truncated to a positive integer.
pub(crate) fn count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number(deserializer)?
        .filter(|n| *n >= 1.0 && *n <= f64::from(u32::MAX))
        .map(|n| n as u32))
}

/// Parses a string enum through `FromStr`; unknown values read as `None`.
pub(crate) fn parsed<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let value = Option::<NumberOrString>::deserialize(deserializer)?;
    Ok(match value {
        Some(NumberOrString::String(s)) => s.parse().ok(),
        _ => None,
    })
}

/// Any JSON scalar as a string; `null` and objects read as empty.
pub(crate) fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumberOrString>::deserialize(deserializer)?;
    Ok(match value {
        Some(NumberOrString::String(s)) => s,
        Some(NumberOrString::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

/// A string or number as `Some`; anything else reads as `None`.
pub(crate) fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumberOrString>::deserialize(deserializer)?;
    Ok(match value {
        Some(NumberOrString::String(s)) => Some(s),
        Some(NumberOrString::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Any value `T` accepts; anything else reads as `T::default()`.
pub(crate) fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

/// `None` for `null` and for values `T` rejects.
pub(crate) fn optional<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        value => T::deserialize(value).ok(),
    })
}

/// Array elements `T` accepts, in order. Other elements are dropped and a
/// non-array reads as empty.
pub(crate) fn items<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(values) => values.into_iter().filter_map(|v| T::deserialize(v).ok()).collect(),
        _ => Vec::new(),
    })
}

/// A boolean, tolerating `null`.
pub(crate) fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolLike {
        Bool(bool),
        String(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<BoolLike>::deserialize(deserializer)? {
        Some(BoolLike::Bool(b)) => b,
        Some(BoolLike::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    })
}

/// A boolean that defaults to `true` when absent or malformed.
pub(crate) fn flag_default_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolLike {
        Bool(bool),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<BoolLike>::deserialize(deserializer)? {
        Some(BoolLike::Bool(b)) => b,
        _ => true,
    })
}

pub(crate) fn yes() -> bool {
    true
}
