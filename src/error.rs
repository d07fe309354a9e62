use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    #[error("failed to load dataset from {source_name}: {reason}")]
    LoadFailed { source_name: String, reason: String },

    #[error("malformed sample '{sample}': {reason}")]
    Malformed { sample: String, reason: String },

    #[error("unknown feature '{name}'{}", hint(.suggestion))]
    UnknownFeature {
        name: String,
        suggestion: Option<&'static str>,
    },

    #[error("invalid dataset JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn hint(suggestion: &Option<&'static str>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean '{s}'?)"),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
