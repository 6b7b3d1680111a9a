//! Tenant identification.
//!
//! - [`SiteId`] - the immutable key every partition derives from
//! - [`normalize_hostname`] - canonical form for domain comparisons
//! - [`DomainResolver`] - maps inbound hostnames to sites
//!
//! # Examples
//!
//! ```
//! use siteforge_persistence::tenant::{normalize_hostname, SiteId};
//!
//! let id = SiteId::generate();
//! assert_eq!(id.as_str().len(), 32);
//!
//! assert_eq!(normalize_hostname("Plumber.COM:8080").as_deref(), Some("plumber.com"));
//! ```

mod hostname;
mod id;
mod resolver;

pub use hostname::normalize_hostname;
pub use id::SiteId;
pub use resolver::{DomainResolver, ResolutionSource, ResolvedSite};
