//! Command execution.
//!
//! Each command renders its result to a string; `main` prints it.

use std::fmt::Write;

use anyhow::Context;
use siteforge_persistence::tenant::DomainResolver;
use siteforge_persistence::types::{Lead, Page, Site};
use siteforge_persistence::{SelectedBackend, SiteStore};

use crate::config::{Command, LeadsCommand, PagesCommand, SitesCommand};

/// Runs one command against the selected backend.
pub async fn run(
    command: &Command,
    selected: &SelectedBackend,
    resolver: &DomainResolver,
) -> anyhow::Result<String> {
    let store = &selected.store;
    match command {
        // Selection already ran the migrations
        Command::Migrate => Ok(format!("{} storage is up to date\n", selected.mode)),
        Command::Reprovision => {
            let count = store.reprovision_all().await?;
            Ok(format!("reprovisioned {} partition(s)\n", count))
        }
        Command::Status => Ok(status(selected)),
        Command::Sites(cmd) => sites(store, cmd).await,
        Command::Resolve { hostname } => {
            let resolved = resolver.resolve(hostname).await?;
            Ok(match resolved {
                Some(r) => format!("{} -> {} ({}, id {})\n", r.hostname, r.site.slug, r.source, r.site.id),
                None => format!("{} does not resolve to a site\n", hostname),
            })
        }
        Command::Pages(cmd) => pages(store, cmd).await,
        Command::Leads(cmd) => leads(store, cmd).await,
    }
}

fn status(selected: &SelectedBackend) -> String {
    let mut out = format!("backend: {}\n", selected.mode);
    if selected.fell_back {
        out.push_str("note: the configured database was unavailable at startup\n");
    }
    out
}

async fn sites(store: &SiteStore, cmd: &SitesCommand) -> anyhow::Result<String> {
    match cmd {
        SitesCommand::List => {
            let sites = store.list_sites().await?;
            let mut out = String::new();
            for site in &sites {
                writeln!(out, "{}", site_line(site))?;
            }
            if sites.is_empty() {
                out.push_str("no sites\n");
            }
            Ok(out)
        }
        SitesCommand::Show { slug } => {
            let site = store
                .get_site_by_slug(slug)
                .await?
                .with_context(|| format!("site '{}' not found", slug))?;
            Ok(format!("{}\n", serde_json::to_string_pretty(&site)?))
        }
        SitesCommand::Create {
            slug,
            name,
            domains,
        } => {
            let mut site = Site::new(slug.as_str(), name.as_str());
            site.domains = domains.clone();
            let site = store.create_site(site).await?;
            Ok(format!("created {}\n", site_line(&site)))
        }
        SitesCommand::Rename { old_slug, new_slug } => {
            let site = store.rename_site_slug(old_slug, new_slug).await?;
            Ok(format!("renamed {} -> {}\n", old_slug, site.slug))
        }
        SitesCommand::AddDomain { slug, domain } => {
            let site = store.add_domain(slug, domain).await?;
            Ok(format!("{}\n", site_line(&site)))
        }
    }
}

async fn pages(store: &SiteStore, cmd: &PagesCommand) -> anyhow::Result<String> {
    match cmd {
        PagesCommand::List { site } => {
            let pages = store.list_pages(site).await?;
            let mut out = String::new();
            for page in &pages {
                writeln!(out, "{}", page_line(page))?;
            }
            Ok(out)
        }
        PagesCommand::Show { site, page } => {
            let found = store
                .get_page(site, page)
                .await?
                .with_context(|| format!("page '{}' not found on site '{}'", page, site))?;
            Ok(format!("{}\n", serde_json::to_string_pretty(&found)?))
        }
        PagesCommand::Delete { site, page } => {
            store.delete_page(site, page).await?;
            Ok(format!("deleted {}/{}\n", site, page))
        }
    }
}

async fn leads(store: &SiteStore, cmd: &LeadsCommand) -> anyhow::Result<String> {
    match cmd {
        LeadsCommand::List {
            site,
            limit,
            offset,
        } => {
            let leads = store.list_leads(site, *limit, *offset).await?;
            let mut out = String::new();
            for lead in &leads {
                writeln!(out, "{}", lead_line(lead))?;
            }
            Ok(out)
        }
        LeadsCommand::Count { site } => Ok(format!("{}\n", store.count_leads(site).await?)),
    }
}

fn site_line(site: &Site) -> String {
    if site.domains.is_empty() {
        format!("{}\t{}\t{}", site.slug, site.id, site.name)
    } else {
        format!(
            "{}\t{}\t{}\t[{}]",
            site.slug,
            site.id,
            site.name,
            site.domains.join(", ")
        )
    }
}

fn page_line(page: &Page) -> String {
    format!(
        "{}\t{}\t{} section(s)\t{}",
        page.slug,
        page.title.as_deref().unwrap_or("-"),
        page.sections.len(),
        page.updated_at.to_rfc3339()
    )
}

fn lead_line(lead: &Lead) -> String {
    format!(
        "{}\t{}\t{} <{}>",
        lead.created_at.to_rfc3339(),
        lead.id,
        lead.name,
        lead.email
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use siteforge_persistence::types::NewLead;
    use siteforge_persistence::{StorageConfig, select_backend};

    async fn setup(dir: &std::path::Path) -> (SelectedBackend, DomainResolver) {
        let selected = select_backend(&StorageConfig::new().with_data_dir(dir))
            .await
            .unwrap();
        let resolver =
            DomainResolver::new(selected.store.clone()).with_platform_domain("siteforge.app");
        (selected, resolver)
    }

    fn create(slug: &str, domains: &[&str]) -> Command {
        Command::Sites(SitesCommand::Create {
            slug: slug.to_string(),
            name: "Plumber".to_string(),
            domains: domains.iter().map(|d| d.to_string()).collect(),
        })
    }

    #[tokio::test]
    async fn test_create_list_and_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let (selected, resolver) = setup(dir.path()).await;

        let out = run(&create("plumber", &["joes.com"]), &selected, &resolver)
            .await
            .unwrap();
        assert!(out.starts_with("created plumber"));

        let out = run(&Command::Sites(SitesCommand::List), &selected, &resolver)
            .await
            .unwrap();
        assert!(out.contains("[joes.com]"));

        let out = run(
            &Command::Resolve {
                hostname: "plumber.siteforge.app".to_string(),
            },
            &selected,
            &resolver,
        )
        .await
        .unwrap();
        assert!(out.contains("-> plumber (platform_subdomain"));

        let out = run(
            &Command::Resolve {
                hostname: "nobody.example".to_string(),
            },
            &selected,
            &resolver,
        )
        .await
        .unwrap();
        assert!(out.contains("does not resolve"));
    }

    #[tokio::test]
    async fn test_pages_and_leads() {
        let dir = tempfile::tempdir().unwrap();
        let (selected, resolver) = setup(dir.path()).await;
        run(&create("plumber", &[]), &selected, &resolver)
            .await
            .unwrap();
        selected
            .store
            .submit_lead("plumber", NewLead::new("Jane", "jane@x.com", "Quote please"))
            .await
            .unwrap();

        let out = run(
            &Command::Pages(PagesCommand::List {
                site: "plumber".to_string(),
            }),
            &selected,
            &resolver,
        )
        .await
        .unwrap();
        assert!(out.starts_with("home\tHome\t0 section(s)"));

        let err = run(
            &Command::Pages(PagesCommand::Delete {
                site: "plumber".to_string(),
                page: "home".to_string(),
            }),
            &selected,
            &resolver,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("protected"));

        let out = run(
            &Command::Leads(LeadsCommand::List {
                site: "plumber".to_string(),
                limit: 10,
                offset: 0,
            }),
            &selected,
            &resolver,
        )
        .await
        .unwrap();
        assert!(out.contains("Jane <jane@x.com>"));
    }

    #[tokio::test]
    async fn test_show_missing_site() {
        let dir = tempfile::tempdir().unwrap();
        let (selected, resolver) = setup(dir.path()).await;
        let err = run(
            &Command::Sites(SitesCommand::Show {
                slug: "ghost".to_string(),
            }),
            &selected,
            &resolver,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_status_mentions_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (mut selected, _) = runtime.block_on(setup(dir.path()));
        selected.fell_back = true;
        let out = status(&selected);
        assert!(out.starts_with("backend: flat-file"));
        assert!(out.contains("unavailable"));
    }
}
