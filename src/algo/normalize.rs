use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Number, Value};
use unicode_segmentation::UnicodeSegmentation;

use super::feature::Feature;

/// Display value substituted for any absent field.
pub const UNKNOWN: &str = "Unknown";

/// Display value for ethnicity entries that list more than one group.
pub const MIXED: &str = "Mixed";

/// Canonical display form of one demographic field. Never absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Normalized {
    Text(String),
    Number(Number),
}

impl Normalized {
    pub fn unknown() -> Self {
        Self::Text(UNKNOWN.into())
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Text(s) if s == UNKNOWN)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            Self::Text(_) => None,
        }
    }

    /// String form used as a grouping key, so `5` and `"5"` collide.
    pub fn key(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => number_key(n),
        }
    }

    /// Take a value as already normalized: numbers stay numbers, anything
    /// else is shown as text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Number(n) => Self::Number(n.clone()),
            Value::String(s) => Self::Text(s.clone()),
            other => Self::Text(other.to_string()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Number(n) => Value::Number(n.clone()),
        }
    }
}

impl std::fmt::Display for Normalized {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key())
    }
}

/// Map a raw field value to its display form for `feature`.
///
/// Rules, first match wins:
/// 1. absent, `null`, `false`, `""` or `0` becomes `"Unknown"` for every feature
/// 2. gender / bbtype: first character upper-cased, the rest untouched
/// 3. ethnicity: cut at the first `(`; anything with a `/` becomes `"Mixed"`
/// 4. location: first run of two capital letters, else the raw value
/// 5. everything else passes through unchanged
///
/// A genuine zero (e.g. `wfreq: 0`) also collapses to `"Unknown"`.
pub fn normalize(value: Option<&Value>, feature: Feature) -> Normalized {
    let value = match value {
        Some(v) if is_truthy(v) => v,
        _ => return Normalized::unknown(),
    };

    match feature {
        Feature::Gender | Feature::Bbtype => Normalized::Text(capitalize(&coerce_string(value))),
        Feature::Ethnicity => Normalized::Text(ethnicity(&coerce_string(value))),
        Feature::Location => match location_code(&coerce_string(value)) {
            Some(code) => Normalized::Text(code.to_string()),
            None => Normalized::from_json(value),
        },
        Feature::Age | Feature::Wfreq => Normalized::from_json(value),
    }
}

/// Falsy values in the dataset's source encoding.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Upper-case the leading grapheme only.
pub fn capitalize(s: &str) -> String {
    let mut graphemes = s.graphemes(true);
    match graphemes.next() {
        Some(first) => format!("{}{}", first.to_uppercase(), graphemes.as_str()),
        None => String::new(),
    }
}

/// Drop any parenthetical qualifier; multi-valued entries collapse to `"Mixed"`.
/// Whitespace left before the `(` is kept.
pub fn ethnicity(s: &str) -> String {
    let prefix = s.find('(').map_or(s, |i| &s[..i]);
    if prefix.contains('/') {
        MIXED.into()
    } else {
        prefix.to_string()
    }
}

/// First two consecutive capital ASCII letters, e.g. the state in `"Austin, TX"`.
pub fn location_code(s: &str) -> Option<&str> {
    static CODE: OnceLock<Regex> = OnceLock::new();
    let re = CODE.get_or_init(|| Regex::new(r"[A-Z]{2}").expect("location pattern is valid"));
    re.find(s).map(|m| m.as_str())
}

fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => number_key(n),
        other => other.to_string(),
    }
}

/// Grouping key for a JSON number: `5` and `5.0` share the key `"5"`.
pub(crate) fn number_key(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        // f64 Display drops a trailing ".0"
        n.as_f64().map(|f| f.to_string()).unwrap_or_else(|| n.to_string())
    }
}
