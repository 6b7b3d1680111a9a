//! Site records.

// Settings structs mirror their JSON documents field for field
#![allow(missing_docs)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tenant::SiteId;

/// A tenant: one customer's website.
///
/// Stored in the shared partition. `id` is assigned once and never changes;
/// `slug` is the human-facing alias resolved through the tenant directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    /// Immutable partition key.
    pub id: SiteId,
    /// Globally unique, URL-safe slug.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Custom domains bound to this site, normalized to lowercase hostnames.
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo: Option<SeoSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<HeaderConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<FooterConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytics: Option<AnalyticsSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<NotificationSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_code: Option<CustomCode>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Site {
    /// Creates a site with a freshly generated id and default theme.
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: SiteId::generate(),
            slug: slug.into(),
            name: name.into(),
            domains: Vec::new(),
            theme: Theme::default(),
            seo: None,
            header: None,
            footer: None,
            analytics: None,
            notifications: None,
            custom_code: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Adds a bound domain.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domains.push(domain.into());
        self
    }

    /// Sets the theme.
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Returns `true` if `hostname` (already normalized) is bound to this site.
    pub fn has_domain(&self, hostname: &str) -> bool {
        self.domains.iter().any(|d| d == hostname)
    }
}

/// Visual theme settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    #[serde(default = "default_primary_color")]
    pub primary_color: String,
    #[serde(default = "default_font")]
    pub font: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon_url: Option<String>,
}

fn default_primary_color() -> String {
    "#2563eb".to_string()
}

fn default_font() -> String {
    "Inter".to_string()
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_color: default_primary_color(),
            font: default_font(),
            logo_url: None,
            favicon_url: None,
        }
    }
}

/// Search-engine metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoSettings {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
}

/// A navigation link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavLink {
    pub label: String,
    pub href: String,
}

/// Header configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderConfig {
    #[serde(default)]
    pub logo_text: String,
    #[serde(default)]
    pub nav_links: Vec<NavLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta: Option<NavLink>,
}

/// Footer configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FooterConfig {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub links: Vec<NavLink>,
    #[serde(default)]
    pub show_contact: bool,
}

/// Third-party analytics identifiers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_analytics_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook_pixel_id: Option<String>,
}

/// Lead notification settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_email: Option<String>,
    #[serde(default)]
    pub enabled: bool,
}

/// Owner-supplied HTML injected into every page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomCode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_end: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_site_defaults() {
        let site = Site::new("plumber", "Joe's Plumbing");
        assert_eq!(site.slug, "plumber");
        assert_eq!(site.id.as_str().len(), 32);
        assert!(site.domains.is_empty());
        assert_eq!(site.theme.font, "Inter");
        assert_eq!(site.created_at, site.updated_at);
    }

    #[test]
    fn test_camel_case_wire_format() {
        let mut site = Site::new("plumber", "Joe's Plumbing").with_domain("joesplumbing.com");
        site.custom_code = Some(CustomCode {
            head: None,
            body_end: Some("<script></script>".to_string()),
        });
        let json = serde_json::to_value(&site).unwrap();
        assert_eq!(json["theme"]["primaryColor"], "#2563eb");
        assert_eq!(json["customCode"]["bodyEnd"], "<script></script>");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("seo").is_none());
    }

    #[test]
    fn test_minimal_document_deserializes() {
        let json = serde_json::json!({
            "id": "abc",
            "slug": "plumber",
            "name": "Plumber",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        });
        let site: Site = serde_json::from_value(json).unwrap();
        assert_eq!(site.theme, Theme::default());
        assert!(site.header.is_none());
    }
}
