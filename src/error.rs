use thiserror::Error;

use crate::validation::FieldError;

#[derive(Error, Debug)]
pub enum BillError {
    #[error("Failed to fetch bills: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Bills API responded with HTTP {0}")]
    UpstreamStatus(u16),

    #[error("Failed to decode bills payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Bill not found: {0}")]
    NotFound(String),

    #[error("Invalid bill: {}", join_field_errors(.0))]
    Validation(Vec<FieldError>),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preferences error: {0}")]
    Preferences(String),
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, BillError>;
