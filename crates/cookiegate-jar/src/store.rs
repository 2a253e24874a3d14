//! Cookie jar capability

use crate::parse::parse_cookie_header;
use crate::scope::DeletionDirective;
use crate::Result;

/// Read/delete access to the cookies visible to the current page.
///
/// Implementations must be `Send + Sync`. Reads never mutate the jar.
pub trait CookieStore: Send + Sync {
    /// Raw cookie string, as in `document.cookie` or a `Cookie` header
    fn raw(&self) -> String;

    /// Issue one expiring write for `directive`. Success only means the
    /// write was accepted, not that a cookie with that scope existed.
    fn delete(&self, directive: &DeletionDirective) -> Result<()>;

    /// Decoded name/value pairs currently visible
    fn list(&self) -> Vec<(String, String)> {
        parse_cookie_header(&self.raw())
    }
}

impl<T: CookieStore + ?Sized> CookieStore for std::sync::Arc<T> {
    fn raw(&self) -> String {
        (**self).raw()
    }

    fn delete(&self, directive: &DeletionDirective) -> Result<()> {
        (**self).delete(directive)
    }

    fn list(&self) -> Vec<(String, String)> {
        (**self).list()
    }
}
