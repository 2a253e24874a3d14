//! CookieGate Core
//!
//! Coordination layer tying taxonomy, jar, storage and consent together.
//! The host owns the cookie jar and the key-value store; the [`Engine`]
//! owns the consent state.

mod config;
mod engine;
mod error;

pub use config::Config;
pub use engine::Engine;
pub use error::CoreError;

// Re-export core components
pub use cookiegate_consent::{
    ConsentBus, ConsentChange, ConsentSignal, ConsentUpdate, CookieInventory, CookieStats,
    EnforcementReport, RecordingTagManager, SaveReport, SignalCall, SignalCategory, SignalState,
    StoredConsentRecord, Subscription, TagManager, CONSENT_CHANGE_EVENT,
};
pub use cookiegate_jar::{CookieStore, DeletionDirective, HeaderJar, JarError, MemoryJar, PageContext};
pub use cookiegate_storage::{Database, HistoryRow, MemoryKv, PersistentKv, StorageError};
pub use cookiegate_taxonomy::{
    ConsentCategory, ConsentDecision, ConsentMap, CookieRule, PartialConsents, Registry,
    TaxonomyError, CONSENT_STORAGE_KEY,
};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
