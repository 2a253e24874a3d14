//! CookieGate Consent
//!
//! Turns a consent decision into an enforced cookie jar:
//!
//! ```text
//! save ──► persist record ──► enforce (scan + delete + signal) ──► publish
//! load ──► validate record ─────────┘
//! ```
//!
//! Nothing in this crate fails the caller on persistence, deletion,
//! signalling or listener errors. They are logged and the sequence goes on.

mod bus;
mod enforcement;
mod error;
mod inventory;
mod manager;
mod record;
mod signals;

pub use bus::{ConsentBus, ConsentChange, Subscription, CONSENT_CHANGE_EVENT};
pub use enforcement::{EnforcementReport, Enforcer};
pub use error::{RecordError, SignalError};
pub use inventory::{scan, CookieInventory, CookieStats};
pub use manager::{ConsentManager, SaveReport};
pub use record::{ConsentRecordStore, SaveOutcome, StoredConsentRecord};
pub use signals::{
    ConsentSignal, ConsentUpdate, RecordingTagManager, SignalAdapter, SignalCall,
    SignalCategory, SignalState, TagManager,
};
