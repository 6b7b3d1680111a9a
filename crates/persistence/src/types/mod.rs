//! Records stored by the persistence layer.
//!
//! - [`Site`] and [`User`] live in the shared partition.
//! - [`Page`] and [`Lead`] live in each site's own partition.
//!
//! All records serialize to camelCase JSON, which is both the flat-file
//! format and the content of the PostgreSQL `JSONB` columns.
//!
//! ```
//! use siteforge_persistence::types::{HeroSection, Page, Section};
//!
//! let page = Page::home().with_section(Section::Hero(HeroSection {
//!     id: "hero-1".to_string(),
//!     headline: "Fast, friendly plumbing".to_string(),
//!     subheadline: None,
//!     cta_label: None,
//!     cta_href: None,
//!     background_image: None,
//! }));
//! assert_eq!(page.sections[0].kind_name(), "hero");
//! ```

mod lead;
mod page;
mod pagination;
mod site;
mod user;

pub use lead::{Lead, NewLead};
pub use page::{
    ContactSection, HOME_PAGE_SLUG, HeroSection, ImagePosition, Page, Section, ServiceItem,
    ServicesSection, TextImageSection,
};
pub use pagination::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, Pagination};
pub use site::{
    AnalyticsSettings, CustomCode, FooterConfig, HeaderConfig, NavLink, NotificationSettings,
    SeoSettings, Site, Theme,
};
pub use user::{User, UserRole};
