//! CookieGate Cookie Jar
//!
//! The cookie jar is a process-wide resource owned by the host. This crate
//! abstracts it behind [`CookieStore`] so enforcement never depends on a
//! live browser:
//! - [`MemoryJar`]: in-memory jar with real scope matching
//! - [`HeaderJar`]: server-side jar fed by a request `Cookie` header that
//!   answers with `Set-Cookie` deletion headers

mod error;
mod header;
mod memory;
mod parse;
mod scope;
mod store;

pub use error::JarError;
pub use header::HeaderJar;
pub use memory::{MemoryJar, StoredCookie};
pub use parse::parse_cookie_header;
pub use scope::{deletion_scopes, DeletionDirective, PageContext, EXPIRED_DATE};
pub use store::CookieStore;

pub type Result<T> = std::result::Result<T, JarError>;
