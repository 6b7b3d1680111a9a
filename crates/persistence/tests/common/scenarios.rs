//! Backend-agnostic end-to-end scenarios.
//!
//! Each scenario takes the slug to use so that callers sharing one database
//! can keep runs apart.

use siteforge_persistence::error::ErrorKind;
use siteforge_persistence::tenant::DomainResolver;
use siteforge_persistence::types::{HOME_PAGE_SLUG, Page, Site};
use siteforge_persistence::SiteStore;

use super::fixtures::{hero, jane, services};

/// Create a site, save its home page with one hero, read it back, and fail
/// to delete it.
pub async fn home_page_round_trip(store: &SiteStore, slug: &str) {
    store
        .create_site(Site::new(slug, "Joe's Plumbing"))
        .await
        .unwrap();

    let section = hero("hero-1", "Fast, friendly plumbing");
    store
        .save_page(slug, Page::home().with_section(section.clone()))
        .await
        .unwrap();

    let page = store.get_page(slug, HOME_PAGE_SLUG).await.unwrap().unwrap();
    assert_eq!(page.sections, vec![section]);

    let err = store.delete_page(slug, HOME_PAGE_SLUG).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProtectedResource);
    assert!(store.get_page(slug, HOME_PAGE_SLUG).await.unwrap().is_some());
}

/// Submit one lead and list it back with its server-assigned id and time.
pub async fn lead_submission(store: &SiteStore, slug: &str) {
    store.create_site(Site::new(slug, "Plumber")).await.unwrap();

    let before = chrono::Utc::now();
    let stored = store.submit_lead(slug, jane()).await.unwrap();

    let leads = store.list_leads(slug, 10, 0).await.unwrap();
    assert_eq!(leads.len(), 1);
    let lead = &leads[0];
    assert_eq!(lead, &stored);
    assert!(!lead.id.is_empty());
    assert!(lead.created_at >= before - chrono::Duration::seconds(1));
    assert_eq!(lead.name, "Jane");
    assert_eq!(lead.email, "jane@x.com");
    assert_eq!(
        lead.message,
        "Need a quote for a new heater install please"
    );
    assert_eq!(store.count_leads(slug).await.unwrap(), 1);
}

/// Rename a site and find its pages, leads and domains under the new slug.
pub async fn rename_keeps_content(store: &SiteStore, old_slug: &str, new_slug: &str, domain: &str) {
    let site = store
        .create_site(Site::new(old_slug, "Plumber").with_domain(domain))
        .await
        .unwrap();
    store
        .save_page(
            old_slug,
            Page::home()
                .with_section(hero("hero-1", "Welcome"))
                .with_section(services("svc-1", &["Repairs", "Installs"])),
        )
        .await
        .unwrap();
    store.submit_lead(old_slug, jane()).await.unwrap();
    let before = store.get_page(old_slug, HOME_PAGE_SLUG).await.unwrap().unwrap();

    let renamed = store.rename_site_slug(old_slug, new_slug).await.unwrap();
    assert_eq!(renamed.id, site.id);
    assert_eq!(renamed.slug, new_slug);

    let after = store.get_page(new_slug, HOME_PAGE_SLUG).await.unwrap().unwrap();
    assert_eq!(after, before);
    assert!(store.get_page(old_slug, HOME_PAGE_SLUG).await.unwrap().is_none());
    assert!(store.get_site_by_slug(old_slug).await.unwrap().is_none());
    assert_eq!(store.list_leads(new_slug, 10, 0).await.unwrap().len(), 1);

    let resolver = DomainResolver::new(store.clone());
    let resolved = resolver.resolve_site(domain).await.unwrap().unwrap();
    assert_eq!(resolved.slug, new_slug);

    // The old slug is free again
    store.create_site(Site::new(old_slug, "Newcomer")).await.unwrap();
}
