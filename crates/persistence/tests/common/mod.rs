//! Shared test infrastructure.
//!
//! [`scenarios`] holds end-to-end flows written against [`SiteStore`] only,
//! so every backend runs the same assertions.
//!
//! [`SiteStore`]: siteforge_persistence::SiteStore

#![allow(dead_code)]

pub mod fixtures;
pub mod scenarios;

pub use fixtures::*;
