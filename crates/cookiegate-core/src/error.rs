//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] cookiegate_storage::StorageError),

    #[error("Registry error: {0}")]
    Taxonomy(#[from] cookiegate_taxonomy::TaxonomyError),

    #[error("Cookie jar error: {0}")]
    Jar(#[from] cookiegate_jar::JarError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
