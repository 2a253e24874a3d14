//! Cookie classification registry
//!
//! Ordered list of rules; the first rule matching a cookie name by exact
//! identifier or by pattern decides its category.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::category::ConsentCategory;
use crate::error::TaxonomyError;
use crate::Result;

/// Key under which the consent record is persisted
pub const CONSENT_STORAGE_KEY: &str = "cookiegate.cookie-consent";

/// Built-in rules: (identifier, category, pattern, description)
const BUILTIN_RULES: &[(&str, ConsentCategory, Option<&str>, &str)] = &[
    // Essential
    (
        "sidebar:state",
        ConsentCategory::Essential,
        None,
        "Stores sidebar state preference",
    ),
    (
        "theme",
        ConsentCategory::Essential,
        None,
        "Stores theme preference (light/dark mode)",
    ),
    // Analytics
    (
        "_ga",
        ConsentCategory::Analytics,
        Some("^_ga"),
        "Google Analytics - Main cookie",
    ),
    (
        "_gid",
        ConsentCategory::Analytics,
        None,
        "Google Analytics - Session ID",
    ),
    (
        "_gat",
        ConsentCategory::Analytics,
        Some("^_gat"),
        "Google Analytics - Throttle requests",
    ),
    // Marketing
    ("_fbp", ConsentCategory::Marketing, None, "Facebook Pixel"),
    ("_gcl_au", ConsentCategory::Marketing, None, "Google AdSense"),
    // Functional
    ("lang", ConsentCategory::Functional, None, "Language preference"),
    (
        "region",
        ConsentCategory::Functional,
        None,
        "Region/location preference",
    ),
];

/// Serializable form of a rule, as found in registry files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub identifier: String,
    pub category: ConsentCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CookieRule {
    pub identifier: String,
    pub category: ConsentCategory,
    pub pattern: Option<Regex>,
    /// Domain the cookie is known to be set on
    pub scope_domain: Option<String>,
    pub description: Option<String>,
}

impl CookieRule {
    pub fn new(identifier: impl Into<String>, category: ConsentCategory) -> Self {
        Self {
            identifier: identifier.into(),
            category,
            pattern: None,
            scope_domain: None,
            description: None,
        }
    }

    pub fn with_pattern(mut self, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| TaxonomyError::InvalidPattern {
            identifier: self.identifier.clone(),
            source,
        })?;
        self.pattern = Some(regex);
        Ok(self)
    }

    pub fn with_scope_domain(mut self, domain: impl Into<String>) -> Self {
        self.scope_domain = Some(domain.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn matches(&self, cookie_name: &str) -> bool {
        if self.identifier == cookie_name {
            return true;
        }

        self.pattern
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(cookie_name))
    }

    pub fn to_definition(&self) -> RuleDefinition {
        RuleDefinition {
            identifier: self.identifier.clone(),
            category: self.category,
            pattern: self.pattern.as_ref().map(|p| p.as_str().to_string()),
            domain: self.scope_domain.clone(),
            description: self.description.clone(),
        }
    }
}

impl TryFrom<RuleDefinition> for CookieRule {
    type Error = TaxonomyError;

    fn try_from(def: RuleDefinition) -> Result<Self> {
        if def.identifier.trim().is_empty() {
            return Err(TaxonomyError::EmptyIdentifier);
        }

        let mut rule = CookieRule::new(def.identifier, def.category);
        if let Some(pattern) = def.pattern.as_deref() {
            rule = rule.with_pattern(pattern)?;
        }
        rule.scope_domain = def.domain.filter(|d| !d.trim().is_empty());
        rule.description = def.description;
        Ok(rule)
    }
}

/// Classify a cookie name against an ordered rule list.
///
/// Total: unrecognised names fall back to [`ConsentCategory::Functional`].
pub fn classify(cookie_name: &str, rules: &[CookieRule]) -> ConsentCategory {
    rules
        .iter()
        .find(|rule| rule.matches(cookie_name))
        .map(|rule| rule.category)
        .unwrap_or_else(ConsentCategory::fallback)
}

/// Immutable, ordered rule set built at startup
#[derive(Debug, Clone)]
pub struct Registry {
    rules: Vec<CookieRule>,
}

impl Registry {
    pub fn new(rules: Vec<CookieRule>) -> Self {
        Self { rules }
    }

    /// Built-in rules, with the consent record key registered as essential
    pub fn builtin(storage_key: &str) -> Self {
        let mut rules = Vec::with_capacity(BUILTIN_RULES.len() + 1);

        for (identifier, category, pattern, description) in BUILTIN_RULES {
            let mut rule = CookieRule::new(*identifier, *category).with_description(*description);
            if let Some(pattern) = pattern {
                rule.pattern = Regex::new(pattern).ok();
            }
            rules.push(rule);
        }

        rules.insert(
            1,
            CookieRule::new(storage_key, ConsentCategory::Essential)
                .with_description("Stores cookie consent preferences"),
        );

        Self { rules }
    }

    pub fn from_definitions(definitions: Vec<RuleDefinition>) -> Result<Self> {
        let rules = definitions
            .into_iter()
            .map(CookieRule::try_from)
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(rule_count = rules.len(), "Loaded cookie registry");

        Ok(Self { rules })
    }

    /// Parse a JSON array of [`RuleDefinition`]s
    pub fn from_json(json: &str) -> Result<Self> {
        let definitions: Vec<RuleDefinition> = serde_json::from_str(json)?;
        Self::from_definitions(definitions)
    }

    pub fn to_json(&self) -> Result<String> {
        let definitions: Vec<RuleDefinition> =
            self.rules.iter().map(CookieRule::to_definition).collect();
        Ok(serde_json::to_string_pretty(&definitions)?)
    }

    /// First rule matching `cookie_name`
    pub fn lookup(&self, cookie_name: &str) -> Option<&CookieRule> {
        self.rules.iter().find(|rule| rule.matches(cookie_name))
    }

    pub fn classify(&self, cookie_name: &str) -> ConsentCategory {
        classify(cookie_name, &self.rules)
    }

    pub fn rules(&self) -> &[CookieRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin(CONSENT_STORAGE_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_classification() {
        let registry = Registry::default();

        assert_eq!(registry.classify("_ga"), ConsentCategory::Analytics);
        assert_eq!(registry.classify("_ga_XYZ123"), ConsentCategory::Analytics);
        assert_eq!(registry.classify("_gat_123"), ConsentCategory::Analytics);
        assert_eq!(registry.classify("_fbp"), ConsentCategory::Marketing);
        assert_eq!(registry.classify("theme"), ConsentCategory::Essential);
        assert_eq!(registry.classify("lang"), ConsentCategory::Functional);
        assert_eq!(
            registry.classify(CONSENT_STORAGE_KEY),
            ConsentCategory::Essential
        );
    }

    #[test]
    fn test_unknown_defaults_to_functional() {
        let registry = Registry::default();

        assert_eq!(registry.classify("mystery_cookie"), ConsentCategory::Functional);
        assert_eq!(registry.classify(""), ConsentCategory::Functional);
        assert_eq!(classify("anything", &[]), ConsentCategory::Functional);
    }

    #[test]
    fn test_first_match_wins() {
        let rules = vec![
            CookieRule::new("session", ConsentCategory::Essential),
            CookieRule::new("tracker", ConsentCategory::Marketing)
                .with_pattern("^sess")
                .unwrap(),
            CookieRule::new("session_prefs", ConsentCategory::Functional),
        ];

        assert_eq!(classify("session", &rules), ConsentCategory::Essential);
        // Pattern on the second rule shadows the exact identifier on the third
        assert_eq!(
            classify("session_prefs", &rules),
            ConsentCategory::Marketing
        );
        assert_eq!(classify("sessx", &rules), ConsentCategory::Marketing);
    }

    #[test]
    fn test_from_json() {
        let registry = Registry::from_json(
            r#"[
                {"identifier": "_hj", "category": "analytics", "pattern": "^_hj"},
                {"identifier": "ads", "category": "marketing", "domain": "ads.example.com"}
            ]"#,
        )
        .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.classify("_hjSession_1"), ConsentCategory::Analytics);
        assert_eq!(
            registry.lookup("ads").unwrap().scope_domain.as_deref(),
            Some("ads.example.com")
        );
    }

    #[test]
    fn test_invalid_pattern_rejected_at_load() {
        let err = Registry::from_json(
            r#"[{"identifier": "broken", "category": "analytics", "pattern": "(["}]"#,
        )
        .unwrap_err();

        assert!(matches!(err, TaxonomyError::InvalidPattern { .. }));
    }

    #[test]
    fn test_definitions_round_trip_through_json() {
        let registry = Registry::default();
        let json = registry.to_json().unwrap();
        let reloaded = Registry::from_json(&json).unwrap();

        assert_eq!(reloaded.len(), registry.len());
        assert_eq!(reloaded.classify("_gat_9"), ConsentCategory::Analytics);
    }
}
