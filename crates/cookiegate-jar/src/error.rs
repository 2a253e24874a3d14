//! Cookie jar error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JarError {
    #[error("Invalid page URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Page URL has no host: {0}")]
    MissingHost(String),

    #[error("Cookie jar rejected deletion of '{name}': {reason}")]
    Rejected { name: String, reason: String },
}
