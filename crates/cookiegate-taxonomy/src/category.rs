//! Consent categories, decisions and the consent map
//!
//! `Essential` is always permitted. Every constructor and setter on
//! [`ConsentMap`] keeps it that way, including deserialization.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::TaxonomyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsentCategory {
    /// Required for the site to work, never deniable
    Essential,
    /// Advertising and cross-site profiling
    Marketing,
    /// Usage statistics
    Analytics,
    /// Preferences and enhanced features
    Functional,
}

impl ConsentCategory {
    /// All categories in declaration order
    pub const ALL: [ConsentCategory; 4] = [
        ConsentCategory::Essential,
        ConsentCategory::Marketing,
        ConsentCategory::Analytics,
        ConsentCategory::Functional,
    ];

    /// Whether consent for this category can be withheld
    pub fn is_required(&self) -> bool {
        matches!(self, ConsentCategory::Essential)
    }

    /// Category assigned to cookies no registry rule recognises
    pub fn fallback() -> Self {
        ConsentCategory::Functional
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsentCategory::Essential => "essential",
            ConsentCategory::Marketing => "marketing",
            ConsentCategory::Analytics => "analytics",
            ConsentCategory::Functional => "functional",
        }
    }
}

impl std::fmt::Display for ConsentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ConsentCategory {
    type Err = TaxonomyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "essential" => Ok(ConsentCategory::Essential),
            "marketing" => Ok(ConsentCategory::Marketing),
            "analytics" => Ok(ConsentCategory::Analytics),
            "functional" => Ok(ConsentCategory::Functional),
            other => Err(TaxonomyError::UnknownCategory(other.to_string())),
        }
    }
}

/// How the current consent map was produced. Kept for audit only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConsentDecision {
    AcceptedAll,
    RejectedAll,
    Custom,
}

impl ConsentDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsentDecision::AcceptedAll => "accepted-all",
            ConsentDecision::RejectedAll => "rejected-all",
            ConsentDecision::Custom => "custom",
        }
    }
}

impl std::fmt::Display for ConsentDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ConsentDecision {
    type Err = TaxonomyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accepted-all" => Ok(ConsentDecision::AcceptedAll),
            "rejected-all" => Ok(ConsentDecision::RejectedAll),
            "custom" => Ok(ConsentDecision::Custom),
            other => Err(TaxonomyError::UnknownDecision(other.to_string())),
        }
    }
}

/// Per-category overrides supplied by a custom save
pub type PartialConsents = BTreeMap<ConsentCategory, bool>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "UncheckedConsentMap")]
pub struct ConsentMap {
    essential: bool,
    marketing: bool,
    analytics: bool,
    functional: bool,
}

#[derive(Deserialize)]
struct UncheckedConsentMap {
    #[serde(default)]
    marketing: bool,
    #[serde(default)]
    analytics: bool,
    #[serde(default)]
    functional: bool,
}

impl From<UncheckedConsentMap> for ConsentMap {
    fn from(raw: UncheckedConsentMap) -> Self {
        Self {
            essential: true,
            marketing: raw.marketing,
            analytics: raw.analytics,
            functional: raw.functional,
        }
    }
}

impl ConsentMap {
    /// First-visit state: only essential cookies allowed
    pub fn essential_only() -> Self {
        Self::all(false)
    }

    /// Every deniable category set to `allowed`
    pub fn all(allowed: bool) -> Self {
        Self {
            essential: true,
            marketing: allowed,
            analytics: allowed,
            functional: allowed,
        }
    }

    pub fn get(&self, category: ConsentCategory) -> bool {
        match category {
            ConsentCategory::Essential => self.essential,
            ConsentCategory::Marketing => self.marketing,
            ConsentCategory::Analytics => self.analytics,
            ConsentCategory::Functional => self.functional,
        }
    }

    pub fn is_allowed(&self, category: ConsentCategory) -> bool {
        category.is_required() || self.get(category)
    }

    /// Set a category. Attempts to deny `Essential` are ignored.
    pub fn set(&mut self, category: ConsentCategory, allowed: bool) {
        match category {
            ConsentCategory::Essential => self.essential = true,
            ConsentCategory::Marketing => self.marketing = allowed,
            ConsentCategory::Analytics => self.analytics = allowed,
            ConsentCategory::Functional => self.functional = allowed,
        }
    }

    pub fn with(mut self, category: ConsentCategory, allowed: bool) -> Self {
        self.set(category, allowed);
        self
    }

    /// Overlay a partial map onto this one
    pub fn apply(mut self, partial: &PartialConsents) -> Self {
        for (category, allowed) in partial {
            self.set(*category, *allowed);
        }
        self
    }

    /// Categories the user has withheld consent for
    pub fn denied(&self) -> Vec<ConsentCategory> {
        ConsentCategory::ALL
            .into_iter()
            .filter(|category| !self.is_allowed(*category))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConsentCategory, bool)> + '_ {
        ConsentCategory::ALL
            .into_iter()
            .map(move |category| (category, self.get(category)))
    }
}

impl Default for ConsentMap {
    fn default() -> Self {
        Self::essential_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_essential_cannot_be_denied() {
        let mut map = ConsentMap::all(false);
        map.set(ConsentCategory::Essential, false);
        assert!(map.get(ConsentCategory::Essential));

        let map = ConsentMap::all(true).with(ConsentCategory::Essential, false);
        assert!(map.is_allowed(ConsentCategory::Essential));
    }

    #[test]
    fn test_deserialize_forces_essential() {
        let map: ConsentMap = serde_json::from_str(
            r#"{"essential":false,"marketing":true,"analytics":false,"functional":true}"#,
        )
        .unwrap();

        assert!(map.get(ConsentCategory::Essential));
        assert!(map.get(ConsentCategory::Marketing));
        assert!(!map.get(ConsentCategory::Analytics));
        assert!(map.get(ConsentCategory::Functional));
    }

    #[test]
    fn test_apply_partial() {
        let mut partial = PartialConsents::new();
        partial.insert(ConsentCategory::Analytics, true);
        partial.insert(ConsentCategory::Essential, false);

        let map = ConsentMap::essential_only().apply(&partial);
        assert!(map.get(ConsentCategory::Essential));
        assert!(map.get(ConsentCategory::Analytics));
        assert_eq!(
            map.denied(),
            vec![ConsentCategory::Marketing, ConsentCategory::Functional]
        );
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ConsentMap::all(true)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "essential": true,
                "marketing": true,
                "analytics": true,
                "functional": true
            })
        );
        assert_eq!(
            serde_json::to_value(ConsentDecision::RejectedAll).unwrap(),
            serde_json::json!("rejected-all")
        );
    }

    #[test]
    fn test_parse_category() {
        assert_eq!(
            "Analytics".parse::<ConsentCategory>().unwrap(),
            ConsentCategory::Analytics
        );
        assert!("advertising".parse::<ConsentCategory>().is_err());
    }
}
