//! End-to-end scenarios on the flat-file backend.
//!
//! The same scenarios run against PostgreSQL in `postgres_tests.rs`.

mod common;

use std::sync::Arc;

use siteforge_persistence::SiteStore;
use siteforge_persistence::backends::file::{FileBackend, FileBackendConfig};

async fn file_store(dir: &std::path::Path) -> SiteStore {
    let backend = FileBackend::new(FileBackendConfig::new(dir)).unwrap();
    let store = SiteStore::new(Arc::new(backend));
    store.migrate().await.unwrap();
    store
}

#[tokio::test]
async fn scenario_home_page_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(dir.path()).await;
    common::scenarios::home_page_round_trip(&store, "plumber").await;
}

#[tokio::test]
async fn scenario_lead_submission() {
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(dir.path()).await;
    common::scenarios::lead_submission(&store, "plumber").await;
}

#[tokio::test]
async fn scenario_rename_keeps_content() {
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(dir.path()).await;
    common::scenarios::rename_keeps_content(&store, "plumber", "plumbing-co", "joesplumbing.com")
        .await;
}

#[tokio::test]
async fn scenario_data_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = file_store(dir.path()).await;
        common::scenarios::home_page_round_trip(&store, "plumber").await;
    }

    let store = file_store(dir.path()).await;
    let page = store.get_page("plumber", "home").await.unwrap().unwrap();
    assert_eq!(page.sections.len(), 1);
}
