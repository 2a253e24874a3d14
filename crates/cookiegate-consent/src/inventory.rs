//! Cookie inventory scanning
//!
//! The inventory is rebuilt from the jar on every scan and never stored.

use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};

use cookiegate_jar::CookieStore;
use cookiegate_taxonomy::{ConsentCategory, Registry};

/// Cookie count per category
pub type CookieStats = BTreeMap<ConsentCategory, usize>;

fn slot(category: ConsentCategory) -> usize {
    match category {
        ConsentCategory::Essential => 0,
        ConsentCategory::Marketing => 1,
        ConsentCategory::Analytics => 2,
        ConsentCategory::Functional => 3,
    }
}

/// Cookie names grouped by category. Every category is present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieInventory {
    categories: [BTreeSet<String>; 4],
}

impl CookieInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category: ConsentCategory, name: impl Into<String>) {
        self.categories[slot(category)].insert(name.into());
    }

    pub fn get(&self, category: ConsentCategory) -> &BTreeSet<String> {
        &self.categories[slot(category)]
    }

    pub fn category_of(&self, name: &str) -> Option<ConsentCategory> {
        ConsentCategory::ALL
            .into_iter()
            .find(|category| self.get(*category).contains(name))
    }

    pub fn counts(&self) -> CookieStats {
        ConsentCategory::ALL
            .into_iter()
            .map(|category| (category, self.get(category).len()))
            .collect()
    }

    pub fn total(&self) -> usize {
        self.categories.iter().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn to_map(&self) -> BTreeMap<ConsentCategory, Vec<String>> {
        ConsentCategory::ALL
            .into_iter()
            .map(|category| (category, self.get(category).iter().cloned().collect()))
            .collect()
    }
}

impl Serialize for CookieInventory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

/// Read the jar and classify every cookie it exposes. Read-only.
pub fn scan(jar: &dyn CookieStore, registry: &Registry) -> CookieInventory {
    let mut inventory = CookieInventory::new();

    for (name, _) in jar.list() {
        let category = registry.classify(&name);
        inventory.insert(category, name);
    }

    tracing::debug!(
        essential = inventory.get(ConsentCategory::Essential).len(),
        marketing = inventory.get(ConsentCategory::Marketing).len(),
        analytics = inventory.get(ConsentCategory::Analytics).len(),
        functional = inventory.get(ConsentCategory::Functional).len(),
        "Scanned cookie inventory"
    );

    inventory
}
