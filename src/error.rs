//! Error types for fleet_tco

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing sheet: {0}")]
    MissingSheet(String),

    #[error("Unsupported workbook format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the AI summary collaborator. Never fatal to a report.
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("AI summary disabled: missing GOOGLE_API_KEY")]
    Disabled,

    #[error("AI service error: {0}")]
    Http(#[from] ureq::Error),

    #[error("AI service returned no candidates")]
    NoCandidates,

    #[error("AI response missing text body")]
    MissingText,

    #[error("AI response was not valid JSON")]
    InvalidJson(#[source] serde_json::Error),

    #[error("AI response missing expected keys")]
    MissingKeys,
}
