//! Record builders for tests.

use siteforge_persistence::types::{HeroSection, NewLead, Section, ServiceItem, ServicesSection};

/// A hero section with only the required fields.
pub fn hero(id: &str, headline: &str) -> Section {
    Section::Hero(HeroSection {
        id: id.to_string(),
        headline: headline.to_string(),
        subheadline: None,
        cta_label: None,
        cta_href: None,
        background_image: None,
    })
}

/// A services section listing `names`.
pub fn services(id: &str, names: &[&str]) -> Section {
    Section::Services(ServicesSection {
        id: id.to_string(),
        heading: "What we do".to_string(),
        intro: None,
        items: names
            .iter()
            .map(|name| ServiceItem {
                title: name.to_string(),
                description: String::new(),
                icon: None,
            })
            .collect(),
    })
}

/// The lead used by the lead scenario.
pub fn jane() -> NewLead {
    NewLead::new(
        "Jane",
        "jane@x.com",
        "Need a quote for a new heater install please",
    )
}

/// A slug that will not collide with other tests sharing a database.
pub fn unique_slug(base: &str) -> String {
    format!("{}-{}", base, &uuid::Uuid::new_v4().simple().to_string()[..8])
}
