//! In-memory cookie jar
//!
//! Models the parts of browser cookie scoping that decide whether a
//! deletion write lands: host-only vs domain cookies, and exact paths.

use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::JarError;
use crate::scope::DeletionDirective;
use crate::store::CookieStore;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCookie {
    pub name: String,
    /// Raw (still encoded) value
    pub value: String,
    /// `None` for host-only cookies
    pub domain: Option<String>,
    pub path: String,
}

impl StoredCookie {
    fn same_scope(&self, other: &StoredCookie) -> bool {
        self.name == other.name
            && self.path == other.path
            && domains_match(self.domain.as_deref(), other.domain.as_deref())
    }
}

fn domains_match(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a
            .trim_start_matches('.')
            .eq_ignore_ascii_case(b.trim_start_matches('.')),
        _ => false,
    }
}

#[derive(Default)]
struct JarState {
    cookies: Vec<StoredCookie>,
    issued: Vec<DeletionDirective>,
    locked: HashSet<String>,
}

/// Path applied to deletion writes that carry no path attribute
const DEFAULT_PATH: &str = "/";

pub struct MemoryJar {
    state: Arc<RwLock<JarState>>,
}

impl MemoryJar {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(JarState::default())),
        }
    }

    /// Host-only cookie at `/`
    pub fn set(&self, name: &str, value: &str) {
        self.set_scoped(name, value, None, "/");
    }

    pub fn set_scoped(&self, name: &str, value: &str, domain: Option<&str>, path: &str) {
        let cookie = StoredCookie {
            name: name.to_string(),
            value: value.to_string(),
            domain: domain.map(str::to_string),
            path: path.to_string(),
        };

        let mut state = self.state.write();
        match state.cookies.iter_mut().find(|c| c.same_scope(&cookie)) {
            Some(existing) => existing.value = cookie.value,
            None => state.cookies.push(cookie),
        }
    }

    /// Make every deletion of `name` fail
    pub fn lock(&self, name: &str) {
        self.state.write().locked.insert(name.to_string());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.state.read().cookies.iter().any(|c| c.name == name)
    }

    pub fn cookies(&self) -> Vec<StoredCookie> {
        self.state.read().cookies.clone()
    }

    /// Every deletion write received, in order
    pub fn issued(&self) -> Vec<DeletionDirective> {
        self.state.read().issued.clone()
    }

    /// Distinct cookie names a deletion was attempted for
    pub fn deletion_targets(&self) -> HashSet<String> {
        self.state
            .read()
            .issued
            .iter()
            .map(|d| d.name.clone())
            .collect()
    }

    pub fn clear_issued(&self) {
        self.state.write().issued.clear();
    }
}

impl Default for MemoryJar {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MemoryJar {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl CookieStore for MemoryJar {
    fn raw(&self) -> String {
        self.state
            .read()
            .cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn delete(&self, directive: &DeletionDirective) -> Result<()> {
        let mut state = self.state.write();
        state.issued.push(directive.clone());

        if state.locked.contains(&directive.name) {
            return Err(JarError::Rejected {
                name: directive.name.clone(),
                reason: "cookie is locked".to_string(),
            });
        }

        let target = StoredCookie {
            name: directive.name.clone(),
            value: String::new(),
            domain: directive.domain.clone(),
            path: directive
                .path
                .clone()
                .unwrap_or_else(|| DEFAULT_PATH.to_string()),
        };

        state.cookies.retain(|c| !c.same_scope(&target));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::{deletion_scopes, PageContext};

    #[test]
    fn test_raw_lists_cookies() {
        let jar = MemoryJar::new();
        jar.set("theme", "dark");
        jar.set("_ga", "GA1.2.3");

        assert_eq!(jar.raw(), "theme=dark; _ga=GA1.2.3");
        assert_eq!(jar.list().len(), 2);
    }

    #[test]
    fn test_delete_requires_matching_scope() {
        let jar = MemoryJar::new();
        jar.set_scoped("_ga", "1", Some(".example.com"), "/");

        // Host-only write does not remove a domain cookie
        jar.delete(&DeletionDirective::new("_ga", Some("/"), None))
            .unwrap();
        assert!(jar.contains("_ga"));

        // Leading dot is ignored when matching domains
        jar.delete(&DeletionDirective::new("_ga", Some("/"), Some("example.com")))
            .unwrap();
        assert!(!jar.contains("_ga"));
    }

    #[test]
    fn test_scope_exhaustive_deletion() {
        let jar = MemoryJar::new();
        let context = PageContext::new("shop.example.com", "/cart");

        jar.set("host_only", "1");
        jar.set_scoped("page_scoped", "1", None, "/cart");
        jar.set_scoped("dotted", "1", Some(".shop.example.com"), "/");
        jar.set_scoped("parent", "1", Some("example.com"), "/cart");
        jar.set_scoped("elsewhere", "1", Some("example.com"), "/blog");

        for name in ["host_only", "page_scoped", "dotted", "parent", "elsewhere"] {
            for directive in deletion_scopes(name, &context, &["example.com"]) {
                jar.delete(&directive).unwrap();
            }
        }

        // Only the cookie scoped to an unrelated path survives
        let remaining: Vec<String> = jar.cookies().into_iter().map(|c| c.name).collect();
        assert_eq!(remaining, vec!["elsewhere".to_string()]);
    }

    #[test]
    fn test_locked_cookie_rejects_deletion() {
        let jar = MemoryJar::new();
        jar.set("pinned", "1");
        jar.lock("pinned");

        let result = jar.delete(&DeletionDirective::bare("pinned"));
        assert!(matches!(result, Err(JarError::Rejected { .. })));
        assert!(jar.contains("pinned"));
        assert_eq!(jar.issued().len(), 1);
    }
}
