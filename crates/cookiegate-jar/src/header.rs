//! Server-side jar backed by a request `Cookie` header

use parking_lot::Mutex;
use std::collections::HashSet;

use crate::parse::segment_name;
use crate::scope::DeletionDirective;
use crate::store::CookieStore;
use crate::Result;

#[derive(Default)]
struct ResponseState {
    deleted: HashSet<String>,
    set_cookies: Vec<String>,
}

/// Reads cookies from one request and collects the `Set-Cookie` headers
/// the response must carry to delete them.
///
/// A deleted name is hidden from later reads of the same request.
pub struct HeaderJar {
    request_header: String,
    response: Mutex<ResponseState>,
}

impl HeaderJar {
    pub fn from_header(request_header: impl Into<String>) -> Self {
        Self {
            request_header: request_header.into(),
            response: Mutex::new(ResponseState::default()),
        }
    }

    /// `Set-Cookie` values to send back, in issue order
    pub fn set_cookie_headers(&self) -> Vec<String> {
        self.response.lock().set_cookies.clone()
    }

    pub fn deleted_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.response.lock().deleted.iter().cloned().collect();
        names.sort();
        names
    }
}

impl CookieStore for HeaderJar {
    fn raw(&self) -> String {
        let response = self.response.lock();

        self.request_header
            .split(';')
            .filter(|segment| match segment_name(segment) {
                Some(name) => !response.deleted.contains(name),
                None => true,
            })
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn delete(&self, directive: &DeletionDirective) -> Result<()> {
        let mut response = self.response.lock();
        response.set_cookies.push(directive.to_header());
        response.deleted.insert(directive.name.clone());
        Ok(())
    }
}
