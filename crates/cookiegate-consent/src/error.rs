//! Consent error types

use cookiegate_taxonomy::ConsentCategory;
use thiserror::Error;

/// Why a persisted consent record was rejected
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Record is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record is not a JSON object")]
    NotAnObject,

    #[error("Record has no consents object")]
    MissingConsents,

    #[error("Consent for '{0}' is not a boolean")]
    NonBoolean(ConsentCategory),

    #[error("Unrecognised decision: {0}")]
    InvalidDecision(String),

    #[error("Unparseable updatedAt: {0}")]
    InvalidTimestamp(String),
}

#[derive(Error, Debug)]
pub enum SignalError {
    #[error("Tag manager unavailable: {0}")]
    Unavailable(String),
}
