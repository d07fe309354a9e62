use nu_protocol::{LabeledError, Record, Span, Value};

use crate::error::DashboardError;

/// Convert a Nushell value into JSON so it can flow through `ops`.
///
/// Handles:
///   - Nothing → null
///   - Int / Float / Bool / String → the matching scalar
///   - List → array, Record → object
///   - Anything else → its string form, or null if it has none
pub fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Nothing { .. } => serde_json::Value::Null,
        Value::Bool { val, .. } => serde_json::Value::Bool(*val),
        Value::Int { val, .. } => serde_json::Value::from(*val),
        Value::Float { val, .. } => serde_json::Number::from_f64(*val)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String { val, .. } => serde_json::Value::String(val.clone()),
        Value::List { vals, .. } => serde_json::Value::Array(vals.iter().map(to_json).collect()),
        Value::Record { val, .. } => {
            let map: serde_json::Map<String, serde_json::Value> = val
                .iter()
                .map(|(k, v)| (k.clone(), to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
        other => other
            .coerce_string()
            .map(serde_json::Value::String)
            .unwrap_or(serde_json::Value::Null),
    }
}

/// Convert an `ops` payload back into a Nushell value.
pub fn from_json(value: &serde_json::Value, span: Span) -> Value {
    match value {
        serde_json::Value::Null => Value::nothing(span),
        serde_json::Value::Bool(b) => Value::bool(*b, span),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::int(i, span),
            None => Value::float(n.as_f64().unwrap_or(f64::NAN), span),
        },
        serde_json::Value::String(s) => Value::string(s.clone(), span),
        serde_json::Value::Array(arr) => {
            Value::list(arr.iter().map(|v| from_json(v, span)).collect(), span)
        }
        serde_json::Value::Object(map) => {
            let mut record = Record::new();
            for (k, v) in map {
                record.push(k.clone(), from_json(v, span));
            }
            Value::record(record, span)
        }
    }
}

/// Attach the call span to a dashboard error.
pub fn labeled(err: DashboardError, span: Span) -> LabeledError {
    let label = match &err {
        DashboardError::NotFound { .. } => "no such sample in this dataset",
        DashboardError::UnknownFeature { .. } => {
            "use: ethnicity, gender, age, location, bbtype, wfreq"
        }
        _ => "while processing the dataset",
    };
    LabeledError::new(err.to_string()).with_label(label, span)
}
