//! Consent engine
//!
//! The single entry point a host talks to. Load-and-enforce runs in
//! [`Engine::initialize`] before the host does anything else; the three UI
//! inputs (accept all, reject all, save custom) each run one full save
//! sequence.

use std::sync::Arc;

use cookiegate_consent::{
    ConsentChange, ConsentManager, ConsentRecordStore, CookieInventory, CookieStats,
    EnforcementReport, Enforcer, SaveReport, SignalAdapter, StoredConsentRecord, Subscription,
    TagManager,
};
use cookiegate_jar::{CookieStore, PageContext};
use cookiegate_storage::{Database, HistoryRow, PersistentKv};
use cookiegate_taxonomy::{ConsentDecision, ConsentMap, PartialConsents, Registry};

use crate::config::Config;
use crate::Result;

/// Main consent engine
pub struct Engine {
    config: Config,
    /// Set when backed by SQLite; enables the audit trail
    db: Option<Database>,
    manager: ConsentManager,
}

impl Engine {
    /// Build an engine over host-provided storage and cookie jar
    pub fn new(
        config: Config,
        kv: Arc<dyn PersistentKv>,
        jar: Arc<dyn CookieStore>,
        tag_manager: Option<Arc<dyn TagManager>>,
    ) -> Result<Self> {
        Self::build(config, kv, None, jar, tag_manager)
    }

    /// Build an engine persisting to the SQLite database at
    /// `config.database_path`
    pub fn open(
        config: Config,
        jar: Arc<dyn CookieStore>,
        tag_manager: Option<Arc<dyn TagManager>>,
    ) -> Result<Self> {
        // Ensure data directory exists
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Database::open(&config.database_path)?;
        Self::build(config, Arc::new(db.clone()), Some(db), jar, tag_manager)
    }

    fn build(
        config: Config,
        kv: Arc<dyn PersistentKv>,
        db: Option<Database>,
        jar: Arc<dyn CookieStore>,
        tag_manager: Option<Arc<dyn TagManager>>,
    ) -> Result<Self> {
        config.validate()?;

        let registry = Arc::new(load_registry(&config)?);
        let context = PageContext::from_url(&config.page_url)?;
        let signals = SignalAdapter::new(tag_manager, config.measurement_id.clone());

        let enforcer = Enforcer::new(registry, context, config.storage_key.clone(), signals)
            .with_cookie_domain(config.cookie_domain.clone());
        let store = ConsentRecordStore::new(kv, config.storage_key.clone());

        tracing::debug!(
            page_url = %config.page_url,
            storage_key = %config.storage_key,
            persistent = db.is_some(),
            "Consent engine created"
        );

        Ok(Self {
            manager: ConsentManager::new(store, enforcer, jar),
            config,
            db,
        })
    }

    /// Load the stored decision and enforce it. Returns true when no valid
    /// decision exists and the host should show the consent prompt.
    pub fn initialize(&self) -> bool {
        let needs_prompt = self.manager.load_and_enforce().is_none();
        tracing::info!(needs_prompt, "Consent engine initialized");
        needs_prompt
    }

    pub fn needs_prompt(&self) -> bool {
        self.manager.needs_prompt()
    }

    // === UI inputs ===

    pub fn accept_all(&self) -> SaveReport {
        self.save(ConsentMap::all(true), ConsentDecision::AcceptedAll)
    }

    pub fn reject_all(&self) -> SaveReport {
        self.save(ConsentMap::all(false), ConsentDecision::RejectedAll)
    }

    /// Overlay `partial` on the current consents and save as a custom decision
    pub fn save_custom(&self, partial: &PartialConsents) -> SaveReport {
        let consents = self.manager.consents().apply(partial);
        self.save(consents, ConsentDecision::Custom)
    }

    fn save(&self, consents: ConsentMap, decision: ConsentDecision) -> SaveReport {
        let report = self.manager.save(consents, decision);

        if report.persisted {
            self.record_history(&report.record);
        }

        report
    }

    fn record_history(&self, record: &StoredConsentRecord) {
        let Some(db) = self.db.as_ref() else {
            return;
        };

        let consents = match serde_json::to_string(&record.consents) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize consents for history");
                return;
            }
        };

        if let Err(e) = db.append_history(record.decision.as_str(), &consents) {
            tracing::warn!(error = %e, "Failed to append consent history");
        }
    }

    // === Queries ===

    pub fn consents(&self) -> ConsentMap {
        self.manager.consents()
    }

    pub fn decision(&self) -> Option<ConsentDecision> {
        self.manager.decision()
    }

    pub fn current(&self) -> Option<StoredConsentRecord> {
        self.manager.current()
    }

    pub fn scan(&self) -> CookieInventory {
        self.manager.scan()
    }

    pub fn cookie_stats(&self) -> CookieStats {
        self.manager.cookie_stats()
    }

    /// Saved decisions, newest first. Empty unless backed by SQLite.
    pub fn history(&self, limit: usize) -> Result<Vec<HistoryRow>> {
        match self.db.as_ref() {
            Some(db) => Ok(db.history(limit)?),
            None => Ok(Vec::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // === Operations ===

    /// Re-apply the current decision to the jar. No-op before a decision.
    pub fn enforce(&self) -> EnforcementReport {
        self.manager.enforce_current()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ConsentChange) + Send + Sync + 'static,
    {
        self.manager.subscribe(listener)
    }

    /// Forget the stored decision so the prompt shows again
    pub fn reset(&self) -> Result<()> {
        Ok(self.manager.reset()?)
    }
}

fn load_registry(config: &Config) -> Result<Registry> {
    match config.registry_path.as_ref() {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            let registry = Registry::from_json(&raw)?;
            tracing::info!(
                path = %path.display(),
                rules = registry.len(),
                "Loaded cookie registry"
            );
            Ok(registry)
        }
        None => Ok(Registry::builtin(&config.storage_key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cookiegate_consent::RecordingTagManager;
    use cookiegate_jar::MemoryJar;
    use cookiegate_storage::MemoryKv;
    use cookiegate_taxonomy::ConsentCategory;
    use std::path::PathBuf;

    fn config() -> Config {
        let mut config = Config::new(PathBuf::from("unused"));
        config.page_url = "https://www.example.com/".to_string();
        config
    }

    fn engine(kv: MemoryKv, jar: MemoryJar) -> Engine {
        Engine::new(config(), Arc::new(kv), Arc::new(jar), None).unwrap()
    }

    #[test]
    fn test_first_visit() {
        let jar = MemoryJar::new();
        jar.set("_ga", "GA1");
        let engine = engine(MemoryKv::new(), jar.clone());

        assert!(engine.initialize());
        assert!(engine.needs_prompt());
        assert_eq!(engine.decision(), None);
        // Nothing is deleted before the user decides
        assert!(jar.contains("_ga"));
    }

    #[test]
    fn test_enforce_before_decision_is_noop() {
        let jar = MemoryJar::new();
        jar.set("_ga", "GA1");
        jar.set("lang", "en");
        let recorder = Arc::new(RecordingTagManager::new());
        let engine = Engine::new(
            config(),
            Arc::new(MemoryKv::new()),
            Arc::new(jar.clone()),
            Some(recorder.clone()),
        )
        .unwrap();
        assert!(engine.initialize());

        let report = engine.enforce();

        assert!(report.is_noop());
        assert!(jar.contains("_ga"));
        assert!(jar.contains("lang"));
        assert!(recorder.calls().is_empty());
        assert!(engine.needs_prompt());
    }

    #[test]
    fn test_save_custom_overlays_current() {
        let engine = engine(MemoryKv::new(), MemoryJar::new());
        engine.accept_all();

        let partial = PartialConsents::from([(ConsentCategory::Marketing, false)]);
        let report = engine.save_custom(&partial);

        assert_eq!(report.record.decision, ConsentDecision::Custom);
        let consents = engine.consents();
        assert!(!consents.get(ConsentCategory::Marketing));
        assert!(consents.get(ConsentCategory::Analytics));
        assert!(consents.get(ConsentCategory::Functional));
    }

    #[test]
    fn test_save_custom_cannot_deny_essential() {
        let engine = engine(MemoryKv::new(), MemoryJar::new());
        let partial = PartialConsents::from([(ConsentCategory::Essential, false)]);

        engine.save_custom(&partial);

        assert!(engine.consents().get(ConsentCategory::Essential));
    }

    #[test]
    fn test_signals_sent_on_save() {
        let recorder = Arc::new(RecordingTagManager::new());
        let engine = Engine::new(
            config(),
            Arc::new(MemoryKv::new()),
            Arc::new(MemoryJar::new()),
            Some(recorder.clone()),
        )
        .unwrap();

        engine.reject_all();

        assert_eq!(recorder.calls().len(), 2);
    }

    #[test]
    fn test_invalid_page_url() {
        let mut config = config();
        config.page_url = "not a url".to_string();

        let result = Engine::new(
            config,
            Arc::new(MemoryKv::new()),
            Arc::new(MemoryJar::new()),
            None,
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_history_empty_without_database() {
        let engine = engine(MemoryKv::new(), MemoryJar::new());
        engine.accept_all();
        assert!(engine.history(10).unwrap().is_empty());
    }

    #[test]
    fn test_custom_registry_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(
            &path,
            r#"[{"identifier": "hj", "category": "analytics", "pattern": "^_hj"}]"#,
        )
        .unwrap();

        let mut config = config();
        config.registry_path = Some(path);
        let jar = MemoryJar::new();
        jar.set("_hjSession", "1");

        let engine =
            Engine::new(config, Arc::new(MemoryKv::new()), Arc::new(jar), None).unwrap();

        assert!(engine
            .scan()
            .get(ConsentCategory::Analytics)
            .contains("_hjSession"));
    }

    #[test]
    fn test_bad_registry_pattern_fails_construction() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(
            &path,
            r#"[{"identifier": "x", "category": "marketing", "pattern": "("}]"#,
        )
        .unwrap();

        let mut config = config();
        config.registry_path = Some(path);

        let result = Engine::new(
            config,
            Arc::new(MemoryKv::new()),
            Arc::new(MemoryJar::new()),
            None,
        );

        assert!(matches!(result, Err(crate::CoreError::Taxonomy(_))));
    }
}
