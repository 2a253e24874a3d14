//! Consent enforcement
//!
//! Deletes every cookie in a denied category, then tells the tag manager.
//! Best-effort: a failed deletion write is counted and skipped, and a
//! cookie set under a scope no directive covers survives.

use serde::Serialize;
use std::sync::Arc;

use cookiegate_jar::{deletion_scopes, CookieStore, PageContext};
use cookiegate_taxonomy::{ConsentMap, Registry};

use crate::inventory::scan;
use crate::signals::{SignalAdapter, SignalCategory};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnforcementReport {
    /// Cookies deletion was attempted for
    pub deleted: Vec<String>,
    /// Cookies in a denied category that were left alone
    pub protected: Vec<String>,
    /// Deletion writes issued
    pub directives: usize,
    /// Deletion writes the jar refused
    pub failures: usize,
}

impl EnforcementReport {
    pub fn is_noop(&self) -> bool {
        self.deleted.is_empty()
    }
}

pub struct Enforcer {
    registry: Arc<Registry>,
    context: PageContext,
    cookie_domain: Option<String>,
    storage_key: String,
    signals: SignalAdapter,
}

impl Enforcer {
    pub fn new(
        registry: Arc<Registry>,
        context: PageContext,
        storage_key: impl Into<String>,
        signals: SignalAdapter,
    ) -> Self {
        Self {
            registry,
            context,
            cookie_domain: None,
            storage_key: storage_key.into(),
            signals,
        }
    }

    /// Extra domain to cover when deleting, for cookies set on a parent domain
    pub fn with_cookie_domain(mut self, domain: Option<String>) -> Self {
        self.cookie_domain = domain.filter(|d| !d.trim().is_empty());
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn context(&self) -> &PageContext {
        &self.context
    }

    pub fn enforce(&self, consents: &ConsentMap, jar: &dyn CookieStore) -> EnforcementReport {
        let inventory = scan(jar, &self.registry);
        let mut report = EnforcementReport::default();

        for category in consents.denied() {
            for name in inventory.get(category) {
                if *name == self.storage_key {
                    report.protected.push(name.clone());
                    continue;
                }

                self.delete_cookie(name, jar, &mut report);
                report.deleted.push(name.clone());
            }
        }

        for category in [SignalCategory::Analytics, SignalCategory::Marketing] {
            self.signals
                .signal(category, consents.is_allowed(category.consent_category()));
        }

        if report.is_noop() {
            tracing::debug!("Consent enforced, nothing to delete");
        } else {
            tracing::info!(
                deleted = report.deleted.len(),
                directives = report.directives,
                failures = report.failures,
                "Consent enforced"
            );
        }

        report
    }

    fn delete_cookie(&self, name: &str, jar: &dyn CookieStore, report: &mut EnforcementReport) {
        let domains: Vec<&str> = self
            .registry
            .lookup(name)
            .and_then(|rule| rule.scope_domain.as_deref())
            .into_iter()
            .chain(self.cookie_domain.as_deref())
            .collect();

        for directive in deletion_scopes(name, &self.context, &domains) {
            report.directives += 1;
            if let Err(e) = jar.delete(&directive) {
                report.failures += 1;
                tracing::warn!(cookie = %name, error = %e, "Cookie deletion write failed");
            }
        }
    }
}
