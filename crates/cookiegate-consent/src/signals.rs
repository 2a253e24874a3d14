//! Tag-manager consent signals
//!
//! | Category  | Signals                                        |
//! | Analytics | analytics_storage                              |
//! | Marketing | ad_storage, ad_user_data, ad_personalization   |
//!
//! Marketing signals always move together.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use cookiegate_taxonomy::ConsentCategory;

use crate::error::SignalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentSignal {
    AnalyticsStorage,
    AdStorage,
    AdUserData,
    AdPersonalization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalState {
    Granted,
    Denied,
}

impl From<bool> for SignalState {
    fn from(allowed: bool) -> Self {
        if allowed {
            SignalState::Granted
        } else {
            SignalState::Denied
        }
    }
}

/// Categories that have tag-manager signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalCategory {
    Analytics,
    Marketing,
}

impl SignalCategory {
    pub fn signals(&self) -> &'static [ConsentSignal] {
        match self {
            SignalCategory::Analytics => &[ConsentSignal::AnalyticsStorage],
            SignalCategory::Marketing => &[
                ConsentSignal::AdStorage,
                ConsentSignal::AdUserData,
                ConsentSignal::AdPersonalization,
            ],
        }
    }

    pub fn consent_category(&self) -> ConsentCategory {
        match self {
            SignalCategory::Analytics => ConsentCategory::Analytics,
            SignalCategory::Marketing => ConsentCategory::Marketing,
        }
    }
}

/// Payload of one `consent update` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsentUpdate(BTreeMap<ConsentSignal, SignalState>);

impl ConsentUpdate {
    pub fn for_category(category: SignalCategory, allowed: bool) -> Self {
        let state = SignalState::from(allowed);
        Self(
            category
                .signals()
                .iter()
                .map(|signal| (*signal, state))
                .collect(),
        )
    }

    pub fn get(&self, signal: ConsentSignal) -> Option<SignalState> {
        self.0.get(&signal).copied()
    }

    pub fn signals(&self) -> impl Iterator<Item = (&ConsentSignal, &SignalState)> {
        self.0.iter()
    }
}

/// A tag-management integration present in the environment
pub trait TagManager: Send + Sync {
    fn consent_update(&self, update: &ConsentUpdate) -> Result<(), SignalError>;

    /// Set a global integration flag such as `ga-disable-<id>`
    fn set_flag(&self, _name: &str, _value: bool) -> Result<(), SignalError> {
        Ok(())
    }
}

/// Emits category-level signals. Without a tag manager every call is a no-op.
#[derive(Clone, Default)]
pub struct SignalAdapter {
    tag_manager: Option<Arc<dyn TagManager>>,
    measurement_id: Option<String>,
}

impl SignalAdapter {
    pub fn new(tag_manager: Option<Arc<dyn TagManager>>, measurement_id: Option<String>) -> Self {
        Self {
            tag_manager,
            measurement_id: measurement_id.filter(|id| !id.trim().is_empty()),
        }
    }

    pub fn is_present(&self) -> bool {
        self.tag_manager.is_some()
    }

    pub fn signal(&self, category: SignalCategory, allowed: bool) {
        let Some(tag_manager) = self.tag_manager.as_ref() else {
            tracing::trace!(?category, allowed, "No tag manager, skipping consent signal");
            return;
        };

        if category == SignalCategory::Analytics {
            if let Some(id) = self.measurement_id.as_deref() {
                let flag = format!("ga-disable-{}", id);
                if let Err(e) = tag_manager.set_flag(&flag, !allowed) {
                    tracing::warn!(flag = %flag, error = %e, "Failed to set tag manager flag");
                }
            }
        }

        let update = ConsentUpdate::for_category(category, allowed);
        match tag_manager.consent_update(&update) {
            Ok(()) => tracing::debug!(?category, allowed, "Sent consent signal"),
            Err(e) => tracing::warn!(?category, allowed, error = %e, "Consent signal failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignalCall {
    ConsentUpdate { update: ConsentUpdate },
    Flag { name: String, value: bool },
}

/// Tag manager that keeps every call it receives
#[derive(Default)]
pub struct RecordingTagManager {
    calls: Mutex<Vec<SignalCall>>,
}

impl RecordingTagManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SignalCall> {
        self.calls.lock().clone()
    }

    pub fn take(&self) -> Vec<SignalCall> {
        std::mem::take(&mut *self.calls.lock())
    }
}

impl TagManager for RecordingTagManager {
    fn consent_update(&self, update: &ConsentUpdate) -> Result<(), SignalError> {
        self.calls.lock().push(SignalCall::ConsentUpdate {
            update: update.clone(),
        });
        Ok(())
    }

    fn set_flag(&self, name: &str, value: bool) -> Result<(), SignalError> {
        self.calls.lock().push(SignalCall::Flag {
            name: name.to_string(),
            value,
        });
        Ok(())
    }
}
