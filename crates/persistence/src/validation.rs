//! Input validation shared by every backend.
//!
//! Each backend calls these before touching storage so that both backends
//! reject exactly the same inputs with exactly the same errors.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;
use crate::tenant::normalize_hostname;
use crate::types::{Lead, NewLead, Page, Section, Site, User};

/// Maximum length of a site slug.
pub const MAX_SITE_SLUG_LEN: usize = 63;

/// Maximum length of a page slug.
pub const MAX_PAGE_SLUG_LEN: usize = 100;

/// Maximum length of a lead message, in characters.
pub const MAX_LEAD_MESSAGE_LEN: usize = 5000;

/// Maximum length of a lead or site display name, in characters.
pub const MAX_NAME_LEN: usize = 200;

/// Maximum length of a record id.
pub const MAX_RECORD_ID_LEN: usize = 128;

const MAX_EMAIL_LEN: usize = 254;

static SLUG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9](?:[a-z0-9-]*[a-z0-9])?$").expect("slug pattern is valid")
});

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

static RECORD_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("record id pattern is valid"));

fn validate_slug(slug: &str, max: usize) -> Result<(), ValidationError> {
    if slug.is_empty() {
        return Err(ValidationError::InvalidSlug {
            slug: slug.to_string(),
            reason: "slug must not be empty".to_string(),
        });
    }
    if slug.len() > max {
        return Err(ValidationError::InvalidSlug {
            slug: slug.to_string(),
            reason: format!("slug must be at most {} characters", max),
        });
    }
    if !SLUG_RE.is_match(slug) {
        return Err(ValidationError::InvalidSlug {
            slug: slug.to_string(),
            reason: "use lowercase letters, digits and inner hyphens only".to_string(),
        });
    }
    Ok(())
}

/// Checks a site slug: `[a-z0-9]` with inner hyphens, at most 63 characters.
///
/// ```
/// use siteforge_persistence::validation::validate_site_slug;
///
/// assert!(validate_site_slug("plumbing-co").is_ok());
/// assert!(validate_site_slug("Plumbing Co").is_err());
/// assert!(validate_site_slug("-plumber").is_err());
/// ```
pub fn validate_site_slug(slug: &str) -> Result<(), ValidationError> {
    validate_slug(slug, MAX_SITE_SLUG_LEN)
}

/// Checks a page slug. Same grammar as site slugs, up to 100 characters.
pub fn validate_page_slug(slug: &str) -> Result<(), ValidationError> {
    validate_slug(slug, MAX_PAGE_SLUG_LEN)
}

/// Checks that every section has a non-empty id and no two share one.
pub fn validate_sections(page_slug: &str, sections: &[Section]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(sections.len());
    for section in sections {
        let id = section.id();
        if id.trim().is_empty() {
            return Err(ValidationError::MissingRequiredField {
                field: format!("sections[{}].id", section.kind_name()),
            });
        }
        if !seen.insert(id) {
            return Err(ValidationError::DuplicateSectionId {
                page_slug: page_slug.to_string(),
                section_id: id.to_string(),
            });
        }
    }
    Ok(())
}

/// Validates a page before it is written.
pub fn validate_page(page: &Page) -> Result<(), ValidationError> {
    validate_page_slug(&page.slug)?;
    validate_sections(&page.slug, &page.sections)
}

/// Validates a site and returns it with its domain list normalized.
///
/// Domains are lowercased, stripped of ports and trailing dots, and
/// de-duplicated in their original order.
pub fn normalize_site(mut site: Site) -> Result<Site, ValidationError> {
    validate_site_slug(&site.slug)?;

    validate_record_id("id", site.id.as_str())?;

    site.name = site.name.trim().to_string();
    if site.name.is_empty() {
        return Err(ValidationError::MissingRequiredField {
            field: "name".to_string(),
        });
    }
    check_length("name", &site.name, MAX_NAME_LEN)?;

    let mut domains: Vec<String> = Vec::with_capacity(site.domains.len());
    for raw in &site.domains {
        let domain = normalize_hostname(raw).ok_or_else(|| ValidationError::InvalidField {
            field: "domains".to_string(),
            message: format!("'{}' is not a valid hostname", raw),
        })?;
        if !domains.contains(&domain) {
            domains.push(domain);
        }
    }
    site.domains = domains;

    Ok(site)
}

/// Validates a public form submission.
pub fn validate_new_lead(lead: &NewLead) -> Result<(), ValidationError> {
    validate_lead_fields(&lead.name, &lead.email, &lead.message)
}

/// Validates a fully formed lead, including its caller-supplied id.
pub fn validate_lead(lead: &Lead) -> Result<(), ValidationError> {
    validate_lead_id(&lead.id)?;
    validate_lead_fields(&lead.name, &lead.email, &lead.message)
}

/// Lead ids become file names in the flat-file backend, so they are limited
/// to `[A-Za-z0-9_-]`.
pub fn validate_lead_id(id: &str) -> Result<(), ValidationError> {
    validate_record_id("id", id)
}

/// Checks an opaque record id (site, user or lead): `[A-Za-z0-9_-]`, at
/// most 128 characters.
pub fn validate_record_id(field: &str, id: &str) -> Result<(), ValidationError> {
    if id.is_empty() {
        return Err(ValidationError::MissingRequiredField {
            field: field.to_string(),
        });
    }
    check_length(field, id, MAX_RECORD_ID_LEN)?;
    if !RECORD_ID_RE.is_match(id) {
        return Err(ValidationError::InvalidField {
            field: field.to_string(),
            message: "ids may contain letters, digits, '-' and '_' only".to_string(),
        });
    }
    Ok(())
}

fn validate_lead_fields(name: &str, email: &str, message: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::MissingRequiredField {
            field: "name".to_string(),
        });
    }
    check_length("name", name, MAX_NAME_LEN)?;
    validate_email(email)?;
    check_length("message", message, MAX_LEAD_MESSAGE_LEN)
}

/// Checks the rough shape of an email address (`local@domain.tld`).
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::MissingRequiredField {
            field: "email".to_string(),
        });
    }
    check_length("email", email, MAX_EMAIL_LEN)?;
    if !EMAIL_RE.is_match(email.trim()) {
        return Err(ValidationError::InvalidField {
            field: "email".to_string(),
            message: format!("'{}' is not a valid email address", email),
        });
    }
    Ok(())
}

/// Validates a user and returns it with its email lowercased.
pub fn normalize_user(mut user: User) -> Result<User, ValidationError> {
    validate_record_id("id", &user.id)?;
    user.email = user.email.trim().to_ascii_lowercase();
    validate_email(&user.email)?;
    let mut seen = HashSet::with_capacity(user.site_ids.len());
    user.site_ids.retain(|id| seen.insert(id.clone()));
    Ok(user)
}

fn check_length(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
            actual,
        });
    }
    Ok(())
}
