//! Scope-exhaustive cookie deletion
//!
//! A cookie can only be removed by a write carrying the same path and
//! domain it was set with, and a cookie string does not reveal either.
//! Deletion therefore covers every plausible scope:
//!
//! ```text
//! paths   {"/", page path}
//!   x
//! domains {hostname, .hostname, configured, .configured}
//! + one path-only write per path (host-only cookies)
//! + one bare write
//! ```
//!
//! Cookies set under any other scope survive. That is accepted.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::JarError;
use crate::Result;

/// Expiry used on every deletion write
pub const EXPIRED_DATE: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// Where the engine is running: the page the cookies are visible to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContext {
    pub hostname: String,
    pub path: String,
}

impl PageContext {
    pub fn new(hostname: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            hostname: hostname.into().to_lowercase(),
            path: if path.is_empty() { "/".to_string() } else { path },
        }
    }

    pub fn from_url(page_url: &str) -> Result<Self> {
        let parsed = Url::parse(page_url)?;
        let host = parsed
            .host_str()
            .ok_or_else(|| JarError::MissingHost(page_url.to_string()))?;

        Ok(Self::new(host, parsed.path()))
    }
}

/// One expiring write for a cookie name under a given scope
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeletionDirective {
    pub name: String,
    pub path: Option<String>,
    pub domain: Option<String>,
}

impl DeletionDirective {
    pub fn new(name: impl Into<String>, path: Option<&str>, domain: Option<&str>) -> Self {
        Self {
            name: name.into(),
            path: path.map(str::to_string),
            domain: domain.map(str::to_string),
        }
    }

    /// Write with neither path nor domain
    pub fn bare(name: impl Into<String>) -> Self {
        Self::new(name, None, None)
    }

    /// Render as a `Set-Cookie` value / `document.cookie` assignment
    pub fn to_header(&self) -> String {
        let mut out = format!("{}=", self.name);
        if let Some(path) = &self.path {
            out.push_str("; path=");
            out.push_str(path);
        }
        if let Some(domain) = &self.domain {
            out.push_str("; domain=");
            out.push_str(domain);
        }
        out.push_str("; expires=");
        out.push_str(EXPIRED_DATE);
        out.push_str("; max-age=0");
        out
    }
}

impl std::fmt::Display for DeletionDirective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_header())
    }
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !value.is_empty() && !list.contains(&value) {
        list.push(value);
    }
}

/// Every deletion write to issue for `name`, in issue order. Each entry of
/// `configured_domains` is covered in addition to the page host.
pub fn deletion_scopes(
    name: &str,
    context: &PageContext,
    configured_domains: &[&str],
) -> Vec<DeletionDirective> {
    let mut paths = Vec::new();
    push_unique(&mut paths, "/".to_string());
    push_unique(&mut paths, context.path.clone());

    let mut domains = Vec::new();
    let host = context.hostname.trim_start_matches('.');
    push_unique(&mut domains, host.to_string());
    push_unique(&mut domains, format!(".{}", host));

    for configured in configured_domains {
        let configured = configured.trim().trim_start_matches('.').to_lowercase();
        if !configured.is_empty() {
            push_unique(&mut domains, configured.clone());
            push_unique(&mut domains, format!(".{}", configured));
        }
    }

    let mut directives = Vec::with_capacity(paths.len() * (domains.len() + 1) + 1);
    for path in &paths {
        for domain in &domains {
            directives.push(DeletionDirective::new(
                name,
                Some(path.as_str()),
                Some(domain.as_str()),
            ));
        }
    }
    for path in &paths {
        directives.push(DeletionDirective::new(name, Some(path.as_str()), None));
    }
    directives.push(DeletionDirective::bare(name));

    directives
}
