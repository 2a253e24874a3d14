//! Consent Manager
//!
//! Owns the in-memory consent state and runs every mutation as one
//! sequence: persist, update state, enforce, publish.

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

use cookiegate_jar::CookieStore;
use cookiegate_storage::StorageError;
use cookiegate_taxonomy::{ConsentDecision, ConsentMap};

use crate::bus::{ConsentBus, ConsentChange, Subscription};
use crate::enforcement::{EnforcementReport, Enforcer};
use crate::inventory::{scan, CookieInventory, CookieStats};
use crate::record::{ConsentRecordStore, StoredConsentRecord};

#[derive(Debug, Clone, Serialize)]
pub struct SaveReport {
    pub record: StoredConsentRecord,
    pub persisted: bool,
    pub enforcement: EnforcementReport,
    pub listeners_notified: usize,
}

pub struct ConsentManager {
    store: ConsentRecordStore,
    enforcer: Enforcer,
    bus: ConsentBus,
    jar: Arc<dyn CookieStore>,
    current: Arc<RwLock<Option<StoredConsentRecord>>>,
}

impl ConsentManager {
    pub fn new(store: ConsentRecordStore, enforcer: Enforcer, jar: Arc<dyn CookieStore>) -> Self {
        Self {
            store,
            enforcer,
            bus: ConsentBus::new(),
            jar,
            current: Arc::new(RwLock::new(None)),
        }
    }

    /// Load the stored decision and, if there is one, enforce it at once.
    /// Returns `None` when the user still has to be asked.
    pub fn load_and_enforce(&self) -> Option<StoredConsentRecord> {
        let record = self.store.load();
        *self.current.write() = record.clone();

        match &record {
            Some(record) => {
                tracing::info!(
                    decision = %record.decision,
                    "Loaded stored consent, enforcing"
                );
                self.enforcer.enforce(&record.consents, self.jar.as_ref());
            }
            None => tracing::info!("No stored consent, prompt required"),
        }

        record
    }

    /// Persist, enforce and publish a decision.
    ///
    /// Enforcement and publishing run even when the write fails: the user's
    /// choice applies to this session regardless, and `persisted` reports
    /// the failure.
    pub fn save(&self, consents: ConsentMap, decision: ConsentDecision) -> SaveReport {
        let outcome = self.store.save(consents, decision);
        let persisted = outcome.persisted();
        let record = outcome.record;

        // In-memory state follows the user even when persistence failed
        *self.current.write() = Some(record.clone());

        let enforcement = self.enforcer.enforce(&record.consents, self.jar.as_ref());
        let listeners_notified = self
            .bus
            .publish(&ConsentChange::new(record.consents, record.decision));

        tracing::info!(
            decision = %record.decision,
            persisted,
            deleted = enforcement.deleted.len(),
            "Saved consent"
        );

        SaveReport {
            record,
            persisted,
            enforcement,
            listeners_notified,
        }
    }

    /// Re-apply the current decision, e.g. after third-party scripts ran.
    /// A no-op until the user has decided.
    pub fn enforce_current(&self) -> EnforcementReport {
        let Some(consents) = self.current.read().as_ref().map(|record| record.consents) else {
            tracing::debug!("No consent decision yet, skipping enforcement");
            return EnforcementReport::default();
        };
        self.enforcer.enforce(&consents, self.jar.as_ref())
    }

    /// Forget the stored decision. Deleted cookies stay deleted.
    pub fn reset(&self) -> Result<(), StorageError> {
        self.store.clear()?;
        *self.current.write() = None;
        tracing::info!("Consent record cleared");
        Ok(())
    }

    pub fn current(&self) -> Option<StoredConsentRecord> {
        self.current.read().clone()
    }

    /// Current consents, essential-only when nothing was decided yet
    pub fn consents(&self) -> ConsentMap {
        self.current
            .read()
            .as_ref()
            .map(|record| record.consents)
            .unwrap_or_default()
    }

    pub fn decision(&self) -> Option<ConsentDecision> {
        self.current.read().as_ref().map(|record| record.decision)
    }

    pub fn needs_prompt(&self) -> bool {
        self.current.read().is_none()
    }

    pub fn scan(&self) -> CookieInventory {
        scan(self.jar.as_ref(), self.enforcer.registry())
    }

    pub fn cookie_stats(&self) -> CookieStats {
        self.scan().counts()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ConsentChange) + Send + Sync + 'static,
    {
        self.bus.subscribe(listener)
    }

    pub fn bus(&self) -> &ConsentBus {
        &self.bus
    }

    pub fn storage_key(&self) -> &str {
        self.store.key()
    }
}

impl Drop for ConsentManager {
    fn drop(&mut self) {
        self.bus.clear();
    }
}
