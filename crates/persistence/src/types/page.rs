//! Pages and their content sections.

// Section content fields are named after what the editor shows
#![allow(missing_docs)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Slug of the page every site must keep.
pub const HOME_PAGE_SLUG: &str = "home";

/// A page of a site, stored in the site's partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Unique within the site.
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Ordered content blocks. Always rewritten as a whole.
    #[serde(default)]
    pub sections: Vec<Section>,
    pub updated_at: DateTime<Utc>,
}

impl Page {
    /// Creates an empty page.
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            title: None,
            sections: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// The empty `home` page seeded for every new site.
    pub fn home() -> Self {
        Self::new(HOME_PAGE_SLUG).with_title("Home")
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Appends a section.
    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Returns `true` for the protected `home` page.
    pub fn is_home(&self) -> bool {
        self.slug == HOME_PAGE_SLUG
    }
}

/// One content block of a page.
///
/// Serialized with a `"type"` tag, e.g. `{"type": "hero", "id": "h1", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Section {
    Hero(HeroSection),
    Services(ServicesSection),
    TextImage(TextImageSection),
    Contact(ContactSection),
}

impl Section {
    /// The section id, unique within its page.
    pub fn id(&self) -> &str {
        match self {
            Section::Hero(s) => &s.id,
            Section::Services(s) => &s.id,
            Section::TextImage(s) => &s.id,
            Section::Contact(s) => &s.id,
        }
    }

    /// The wire tag of this section kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Section::Hero(_) => "hero",
            Section::Services(_) => "services",
            Section::TextImage(_) => "text_image",
            Section::Contact(_) => "contact",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroSection {
    pub id: String,
    pub headline: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subheadline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta_href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicesSection {
    pub id: String,
    pub heading: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,
    #[serde(default)]
    pub items: Vec<ServiceItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceItem {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextImageSection {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_alt: Option<String>,
    #[serde(default)]
    pub image_position: ImagePosition,
}

/// Which side of the text the image sits on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImagePosition {
    Left,
    #[default]
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSection {
    pub id: String,
    pub heading: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_section_tagging() {
        let section = Section::Hero(HeroSection {
            id: "h1".to_string(),
            headline: "Fast, friendly plumbing".to_string(),
            subheadline: None,
            cta_label: Some("Call now".to_string()),
            cta_href: Some("tel:555".to_string()),
            background_image: None,
        });
        let value = serde_json::to_value(&section).unwrap();
        assert_eq!(value["type"], "hero");
        assert_eq!(value["ctaLabel"], "Call now");
        assert_eq!(section.id(), "h1");
        assert_eq!(section.kind_name(), "hero");
    }

    #[test]
    fn test_text_image_defaults() {
        let value = json!({"type": "text_image", "id": "t1", "body": "About us"});
        let section: Section = serde_json::from_value(value).unwrap();
        match section {
            Section::TextImage(s) => assert_eq!(s.image_position, ImagePosition::Right),
            other => panic!("unexpected section {:?}", other),
        }
    }

    #[test]
    fn test_unknown_section_kind_rejected() {
        let value = json!({"type": "carousel", "id": "c1"});
        assert!(serde_json::from_value::<Section>(value).is_err());
    }

    #[test]
    fn test_home_page() {
        let page = Page::home();
        assert!(page.is_home());
        assert!(page.sections.is_empty());
    }
}
