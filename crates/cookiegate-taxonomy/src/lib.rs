//! CookieGate Taxonomy
//!
//! The closed set of consent categories and the static registry that maps
//! cookie names to them.
//!
//! | Category   | Deniable | Fallback for unknown cookies |
//! | Essential  | No       | No                           |
//! | Marketing  | Yes      | No                           |
//! | Analytics  | Yes      | No                           |
//! | Functional | Yes      | Yes                          |

mod category;
mod error;
mod registry;

pub use category::{ConsentCategory, ConsentDecision, ConsentMap, PartialConsents};
pub use error::TaxonomyError;
pub use registry::{classify, CookieRule, Registry, RuleDefinition, CONSENT_STORAGE_KEY};

pub type Result<T> = std::result::Result<T, TaxonomyError>;
