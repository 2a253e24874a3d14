//! Taxonomy error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaxonomyError {
    #[error("Invalid pattern for rule '{identifier}': {source}")]
    InvalidPattern {
        identifier: String,
        #[source]
        source: regex::Error,
    },

    #[error("Rule identifier cannot be empty")]
    EmptyIdentifier,

    #[error("Unknown consent category: {0}")]
    UnknownCategory(String),

    #[error("Unknown consent decision: {0}")]
    UnknownDecision(String),

    #[error("Registry parse error: {0}")]
    Json(#[from] serde_json::Error),
}
