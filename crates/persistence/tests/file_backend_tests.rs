//! Flat-file backend integration tests.
//!
//! Every test works in its own temporary data directory.
//!
//! Run with: `cargo test -p siteforge-persistence --test file_backend_tests`

use std::path::Path;
use std::sync::Arc;

use chrono::{Duration, Utc};

use siteforge_persistence::backends::file::{FileBackend, FileBackendConfig};
use siteforge_persistence::core::{Backend, LeadStore, PageStore, TenantDirectory};
use siteforge_persistence::error::{ErrorKind, ResourceError, StorageError, TenantError};
use siteforge_persistence::partition::PartitionProvisioner;
use siteforge_persistence::types::{
    ContactSection, HeroSection, Lead, NewLead, Page, Section, Site, User,
};
use siteforge_persistence::{SiteId, SiteStore};

// ============================================================================
// Helpers
// ============================================================================

fn backend(dir: &Path) -> FileBackend {
    FileBackend::new(FileBackendConfig::new(dir)).unwrap()
}

async fn store(dir: &Path) -> SiteStore {
    let store = SiteStore::new(Arc::new(backend(dir)));
    store.migrate().await.unwrap();
    store
}

fn hero(id: &str, headline: &str) -> Section {
    Section::Hero(HeroSection {
        id: id.to_string(),
        headline: headline.to_string(),
        subheadline: None,
        cta_label: None,
        cta_href: None,
        background_image: None,
    })
}

fn contact(id: &str) -> Section {
    Section::Contact(ContactSection {
        id: id.to_string(),
        heading: "Get in touch".to_string(),
        description: None,
        submit_label: None,
        success_message: None,
    })
}

fn lead_at(id: &str, age_secs: i64) -> Lead {
    Lead {
        id: id.to_string(),
        name: "Jane".to_string(),
        email: "jane@example.com".to_string(),
        message: format!("lead {}", id),
        created_at: Utc::now() - Duration::seconds(age_secs),
    }
}

// ============================================================================
// Layout
// ============================================================================

#[tokio::test]
async fn test_migrate_creates_layout() {
    let dir = tempfile::tempdir().unwrap();
    store(dir.path()).await;

    for sub in ["sites", "users", "pages", "leads"] {
        assert!(dir.path().join(sub).is_dir(), "{} missing", sub);
    }
}

#[tokio::test]
async fn test_site_record_is_camel_case_json() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path()).await;
    let site = store
        .create_site(Site::new("plumber", "Plumber"))
        .await
        .unwrap();

    let path = dir.path().join("sites").join(format!("{}.json", site.id));
    let raw = std::fs::read_to_string(path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["slug"], "plumber");
    assert!(json.get("createdAt").is_some());
    assert!(json["theme"].get("primaryColor").is_some());
}

#[tokio::test]
async fn test_no_temp_files_left_behind() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path()).await;
    let site = store
        .create_site(Site::new("plumber", "Plumber"))
        .await
        .unwrap();
    store
        .save_page("plumber", Page::new("about").with_section(hero("h1", "About")))
        .await
        .unwrap();
    store
        .submit_lead("plumber", NewLead::new("Jane", "jane@example.com", "Hi"))
        .await
        .unwrap();

    let partition = backend(dir.path()).partition_for(&site.id).unwrap();
    for sub in [
        dir.path().join("sites"),
        dir.path().join("pages").join(partition.as_str()),
        dir.path().join("leads").join(partition.as_str()),
    ] {
        for entry in std::fs::read_dir(&sub).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().to_string();
            assert!(!name.ends_with(".tmp"), "stray temp file {}", name);
        }
    }
}

// ============================================================================
// Partitions
// ============================================================================

#[tokio::test]
async fn test_ensure_partition_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let backend = backend(dir.path());
    let id = SiteId::new("3f2a9c0e5b7d4e1f");

    let first = backend.ensure_partition(&id).await.unwrap();
    let second = backend.ensure_partition(&id).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.as_str(), "tenant_3f2a9c0e5b7d4e1f");
    assert!(backend.partition_exists(&id).await.unwrap());
}

#[tokio::test]
async fn test_concurrent_ensure_partition() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(backend(dir.path()));
    let id = SiteId::generate();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let backend = backend.clone();
            let id = id.clone();
            tokio::spawn(async move { backend.ensure_partition(&id).await })
        })
        .collect();

    let mut names = Vec::new();
    for handle in handles {
        names.push(handle.await.unwrap().unwrap());
    }
    names.dedup();
    assert_eq!(names.len(), 1);
}

#[tokio::test]
async fn test_partition_prefix_is_configurable() {
    let dir = tempfile::tempdir().unwrap();
    let backend =
        FileBackend::new(FileBackendConfig::new(dir.path()).with_partition_prefix("site_"))
            .unwrap();
    let partition = backend.ensure_partition(&SiteId::new("abc")).await.unwrap();
    assert_eq!(partition.as_str(), "site_abc");
    assert!(dir.path().join("pages").join("site_abc").is_dir());
}

#[tokio::test]
async fn test_reprovision_all_restores_missing_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path()).await;
    let site = store
        .create_site(Site::new("plumber", "Plumber"))
        .await
        .unwrap();

    let partition = backend(dir.path()).partition_for(&site.id).unwrap();
    std::fs::remove_dir_all(dir.path().join("leads").join(partition.as_str())).unwrap();
    assert!(!store.partition_exists("plumber").await.unwrap());

    // A fresh backend has an empty provisioned cache
    let fresh = SiteStore::new(Arc::new(backend(dir.path())));
    assert_eq!(fresh.reprovision_all().await.unwrap(), 1);
    assert!(fresh.partition_exists("plumber").await.unwrap());
}

fn site_with_id(slug: &str, id: &str) -> Site {
    let mut site = Site::new(slug, slug);
    site.id = SiteId::new(id);
    site
}

#[tokio::test]
async fn test_site_ids_sharing_a_partition_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path()).await;

    store.create_site(site_with_id("alpha", "Legacy-42")).await.unwrap();
    store
        .save_page("alpha", Page::new("secret").with_section(hero("h1", "Private")))
        .await
        .unwrap();
    store
        .submit_lead("alpha", NewLead::new("Jane", "jane@example.com", "Hi"))
        .await
        .unwrap();

    let err = store
        .create_site(site_with_id("beta", "legacy_42"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidIdentifier);

    let err = store
        .save_site(site_with_id("beta", "legacy_42"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidIdentifier);

    assert!(store.get_site_by_slug("beta").await.unwrap().is_none());
    assert!(store.list_pages("beta").await.unwrap().is_empty());
    assert!(store.list_leads("beta", 10, 0).await.unwrap().is_empty());
    assert_eq!(store.count_leads("alpha").await.unwrap(), 1);
    assert_eq!(store.list_pages("alpha").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_partition_owner_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    backend(dir.path())
        .ensure_partition(&SiteId::new("Legacy-42"))
        .await
        .unwrap();

    // no site record exists, only the provisioned partition
    let fresh = backend(dir.path());
    let err = fresh
        .ensure_partition(&SiteId::new("legacy_42"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidIdentifier);

    let err = fresh
        .save_site(site_with_id("beta", "legacy_42"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidIdentifier);
}

// ============================================================================
// Tenant directory
// ============================================================================

#[tokio::test]
async fn test_save_site_upserts_by_slug() {
    let dir = tempfile::tempdir().unwrap();
    let backend = backend(dir.path());
    backend.initialize().await.unwrap();

    let mut site = backend
        .save_site(Site::new("plumber", "Plumber"))
        .await
        .unwrap();
    site.name = "Joe's Plumbing".to_string();
    let updated = backend.save_site(site.clone()).await.unwrap();

    assert_eq!(updated.id, site.id);
    assert_eq!(updated.created_at, site.created_at);
    assert!(updated.updated_at >= site.updated_at);
    assert_eq!(backend.list_sites().await.unwrap().len(), 1);
    assert_eq!(
        backend
            .get_site_by_slug("plumber")
            .await
            .unwrap()
            .unwrap()
            .name,
        "Joe's Plumbing"
    );
}

#[tokio::test]
async fn test_save_site_rejects_slug_taken_by_other_id() {
    let dir = tempfile::tempdir().unwrap();
    let backend = backend(dir.path());
    backend.initialize().await.unwrap();

    backend
        .save_site(Site::new("plumber", "First"))
        .await
        .unwrap();
    let err = backend
        .save_site(Site::new("plumber", "Second"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StorageError::Resource(ResourceError::AlreadyExists { .. })
    ));
}

#[tokio::test]
async fn test_save_site_refuses_slug_change() {
    let dir = tempfile::tempdir().unwrap();
    let backend = backend(dir.path());
    backend.initialize().await.unwrap();

    let mut site = backend
        .save_site(Site::new("plumber", "Plumber"))
        .await
        .unwrap();
    site.slug = "plumbing-co".to_string();
    let err = backend.save_site(site).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_domain_claimed_by_another_site() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path()).await;

    store
        .create_site(Site::new("plumber", "Plumber").with_domain("joes.com"))
        .await
        .unwrap();
    let err = store
        .create_site(Site::new("roofer", "Roofer").with_domain("JOES.com"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StorageError::Tenant(TenantError::DomainClaimed { ref domain, .. }) if domain == "joes.com"
    ));
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
}

#[tokio::test]
async fn test_get_site_by_domain_normalizes() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path()).await;
    store
        .create_site(Site::new("plumber", "Plumber").with_domain("www.joes.com"))
        .await
        .unwrap();

    for host in ["www.joes.com", "WWW.JOES.COM", "www.joes.com:8443", "www.joes.com."] {
        let site = store.get_site_by_domain(host).await.unwrap();
        assert_eq!(site.map(|s| s.slug).as_deref(), Some("plumber"), "{}", host);
    }
    assert!(store.get_site_by_domain("").await.unwrap().is_none());
    assert!(store.get_site_by_domain("joes.com").await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_sites_in_creation_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path()).await;
    for slug in ["zeta", "alpha", "mid"] {
        store.create_site(Site::new(slug, slug)).await.unwrap();
    }
    let slugs: Vec<_> = store
        .list_sites()
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.slug)
        .collect();
    assert_eq!(slugs, vec!["zeta", "alpha", "mid"]);
}

#[tokio::test]
async fn test_invalid_site_slug_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path()).await;
    for slug in ["", "Plumber", "../etc", "a b"] {
        let err = store.create_site(Site::new(slug, "x")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "{:?}", slug);
    }
}

#[tokio::test]
async fn test_rename_to_taken_slug_fails() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path()).await;
    store.create_site(Site::new("plumber", "A")).await.unwrap();
    store.create_site(Site::new("roofer", "B")).await.unwrap();

    let err = store.rename_site_slug("plumber", "roofer").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);

    let err = store.rename_site_slug("ghost", "new-ghost").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = store.rename_site_slug("plumber", "Bad Slug").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
async fn test_users_by_email_and_site() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path()).await;
    let site = store
        .create_site(Site::new("plumber", "Plumber"))
        .await
        .unwrap();

    store
        .save_user(User::new("Zoe@Example.com", "Zoe").with_site(site.id.clone()))
        .await
        .unwrap();
    store
        .save_user(User::new("adam@example.com", "Adam").with_site(site.id.clone()))
        .await
        .unwrap();
    store
        .save_user(User::new("other@example.com", "Other"))
        .await
        .unwrap();

    let zoe = store.get_user_by_email("ZOE@example.COM").await.unwrap().unwrap();
    assert_eq!(zoe.email, "zoe@example.com");
    assert!(zoe.can_manage(&site.id));

    let emails: Vec<_> = store
        .list_users_for_site("plumber")
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.email)
        .collect();
    assert_eq!(emails, vec!["adam@example.com", "zoe@example.com"]);

    let err = store
        .save_user(User::new("zoe@example.com", "Impostor"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
}

#[tokio::test]
async fn test_memberships_survive_rename() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path()).await;
    let site = store
        .create_site(Site::new("plumber", "Plumber"))
        .await
        .unwrap();
    store
        .save_user(User::new("owner@example.com", "Owner").with_site(site.id))
        .await
        .unwrap();

    store.rename_site_slug("plumber", "plumbing-co").await.unwrap();
    let users = store.list_users_for_site("plumbing-co").await.unwrap();
    assert_eq!(users.len(), 1);
}

// ============================================================================
// Pages
// ============================================================================

#[tokio::test]
async fn test_save_page_replaces_sections() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path()).await;
    store
        .create_site(Site::new("plumber", "Plumber"))
        .await
        .unwrap();

    store
        .save_page(
            "plumber",
            Page::new("about")
                .with_section(hero("h1", "Old"))
                .with_section(contact("c1")),
        )
        .await
        .unwrap();
    store
        .save_page("plumber", Page::new("about").with_section(hero("h1", "New")))
        .await
        .unwrap();

    let page = store.get_page("plumber", "about").await.unwrap().unwrap();
    assert_eq!(page.sections, vec![hero("h1", "New")]);
}

#[tokio::test]
async fn test_save_page_rejects_duplicate_section_ids() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path()).await;
    store
        .create_site(Site::new("plumber", "Plumber"))
        .await
        .unwrap();

    let err = store
        .save_page(
            "plumber",
            Page::new("about")
                .with_section(hero("s1", "A"))
                .with_section(contact("s1")),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(store.get_page("plumber", "about").await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_pages_home_first() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path()).await;
    store
        .create_site(Site::new("plumber", "Plumber"))
        .await
        .unwrap();
    for slug in ["services", "about", "contact"] {
        store.save_page("plumber", Page::new(slug)).await.unwrap();
    }

    let slugs: Vec<_> = store
        .list_pages("plumber")
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.slug)
        .collect();
    assert_eq!(slugs, vec!["home", "about", "contact", "services"]);
}

#[tokio::test]
async fn test_delete_page() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path()).await;
    store
        .create_site(Site::new("plumber", "Plumber"))
        .await
        .unwrap();
    store.save_page("plumber", Page::new("about")).await.unwrap();

    store.delete_page("plumber", "about").await.unwrap();
    assert!(store.get_page("plumber", "about").await.unwrap().is_none());

    let err = store.delete_page("plumber", "about").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_pages_are_isolated_per_site() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path()).await;
    store.create_site(Site::new("a", "A")).await.unwrap();
    store.create_site(Site::new("b", "B")).await.unwrap();

    store.save_page("a", Page::new("about")).await.unwrap();
    assert!(store.get_page("b", "about").await.unwrap().is_none());
    assert_eq!(store.list_pages("b").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_traversal_page_slug_reads_as_missing() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path()).await;
    store
        .create_site(Site::new("plumber", "Plumber"))
        .await
        .unwrap();

    assert!(
        store
            .get_page("plumber", "../../sites/x")
            .await
            .unwrap()
            .is_none()
    );
    let err = store
        .save_page("plumber", Page::new("../escape"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

// ============================================================================
// Leads
// ============================================================================

#[tokio::test]
async fn test_duplicate_lead_id_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path()).await;
    store
        .create_site(Site::new("plumber", "Plumber"))
        .await
        .unwrap();

    store.save_lead("plumber", lead_at("l1", 0)).await.unwrap();
    let err = store
        .save_lead("plumber", lead_at("l1", 5))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StorageError::Resource(ResourceError::DuplicateId { .. })
    ));
    assert_eq!(store.count_leads("plumber").await.unwrap(), 1);
}

#[tokio::test]
async fn test_list_leads_newest_first_with_pagination() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path()).await;
    store
        .create_site(Site::new("plumber", "Plumber"))
        .await
        .unwrap();
    for (id, age) in [("old", 30), ("new", 0), ("mid", 10)] {
        store.save_lead("plumber", lead_at(id, age)).await.unwrap();
    }

    let ids = |leads: Vec<Lead>| leads.into_iter().map(|l| l.id).collect::<Vec<_>>();
    assert_eq!(
        ids(store.list_leads("plumber", 10, 0).await.unwrap()),
        vec!["new", "mid", "old"]
    );
    assert_eq!(
        ids(store.list_leads("plumber", 1, 1).await.unwrap()),
        vec!["mid"]
    );
    // Out-of-range input is clamped, not rejected
    assert_eq!(store.list_leads("plumber", 0, -5).await.unwrap().len(), 3);
    assert_eq!(store.list_leads("plumber", 1000, 0).await.unwrap().len(), 3);
    assert!(store.list_leads("plumber", 10, 99).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_lead_submissions() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path()).await;
    store
        .create_site(Site::new("plumber", "Plumber"))
        .await
        .unwrap();

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .submit_lead(
                        "plumber",
                        NewLead::new(format!("Visitor {}", i), "v@example.com", "hello"),
                    )
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.count_leads("plumber").await.unwrap(), 20);
}

#[tokio::test]
async fn test_leads_on_unprovisioned_partition_read_empty() {
    let dir = tempfile::tempdir().unwrap();
    let backend = backend(dir.path());
    let id = SiteId::generate();

    assert!(
        backend
            .list_leads(&id, Default::default())
            .await
            .unwrap()
            .is_empty()
    );
    assert_eq!(backend.count_leads(&id).await.unwrap(), 0);
    assert!(backend.list_pages(&id).await.unwrap().is_empty());
}
