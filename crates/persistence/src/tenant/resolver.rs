//! Hostname to site resolution.
//!
//! Provides the [`DomainResolver`] the request-routing layer uses to turn an
//! inbound `Host` header into a [`Site`].

use std::fmt;

use crate::error::StorageResult;
use crate::site_store::SiteStore;
use crate::types::Site;
use crate::validation::validate_site_slug;

use super::hostname::normalize_hostname;

/// How a hostname was matched to a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionSource {
    /// `<slug>.<platform domain>`, e.g. `plumber.siteforge.app`.
    PlatformSubdomain,
    /// A custom domain bound to the site.
    BoundDomain,
}

impl fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionSource::PlatformSubdomain => write!(f, "platform_subdomain"),
            ResolutionSource::BoundDomain => write!(f, "bound_domain"),
        }
    }
}

/// Result of resolving a hostname.
#[derive(Debug, Clone)]
pub struct ResolvedSite {
    /// The matched site.
    pub site: Site,
    /// Which rule matched.
    pub source: ResolutionSource,
    /// The normalized hostname that was looked up.
    pub hostname: String,
}

/// Maps inbound hostnames to sites.
///
/// Platform subdomains are tried first, then bound domains. Hostnames that
/// fail normalization resolve to nothing.
#[derive(Debug, Clone)]
pub struct DomainResolver {
    store: SiteStore,
    platform_domains: Vec<String>,
}

impl DomainResolver {
    /// Creates a resolver with no platform domains.
    pub fn new(store: SiteStore) -> Self {
        Self {
            store,
            platform_domains: Vec::new(),
        }
    }

    /// Adds a platform domain whose subdomains are site slugs.
    ///
    /// Invalid values are ignored with a warning.
    pub fn with_platform_domain(mut self, domain: &str) -> Self {
        match normalize_hostname(domain) {
            Some(domain) if !self.platform_domains.contains(&domain) => {
                self.platform_domains.push(domain)
            }
            Some(_) => {}
            None => tracing::warn!(domain, "ignoring invalid platform domain"),
        }
        self
    }

    /// Returns the configured platform domains.
    pub fn platform_domains(&self) -> &[String] {
        &self.platform_domains
    }

    /// Resolves `hostname` to a site.
    pub async fn resolve(&self, hostname: &str) -> StorageResult<Option<ResolvedSite>> {
        let Some(host) = normalize_hostname(hostname) else {
            tracing::debug!(hostname, "unresolvable hostname");
            return Ok(None);
        };

        if let Some(slug) = self.platform_slug(&host)
            && let Some(site) = self.store.get_site_by_slug(slug).await?
        {
            tracing::debug!(hostname = %host, site_id = %site.id, "resolved by platform subdomain");
            return Ok(Some(ResolvedSite {
                site,
                source: ResolutionSource::PlatformSubdomain,
                hostname: host,
            }));
        }

        if let Some(site) = self.store.get_site_by_domain(&host).await? {
            tracing::debug!(hostname = %host, site_id = %site.id, "resolved by bound domain");
            return Ok(Some(ResolvedSite {
                site,
                source: ResolutionSource::BoundDomain,
                hostname: host,
            }));
        }

        Ok(None)
    }

    /// Resolves `hostname` and returns just the site.
    pub async fn resolve_site(&self, hostname: &str) -> StorageResult<Option<Site>> {
        Ok(self.resolve(hostname).await?.map(|resolved| resolved.site))
    }

    /// Extracts the slug label from `<slug>.<platform domain>`.
    fn platform_slug<'a>(&self, host: &'a str) -> Option<&'a str> {
        self.platform_domains.iter().find_map(|platform| {
            let label = host.strip_suffix(platform.as_str())?.strip_suffix('.')?;
            (!label.contains('.') && validate_site_slug(label).is_ok()).then_some(label)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::file::{FileBackend, FileBackendConfig};
    use std::sync::Arc;

    async fn store(dir: &std::path::Path) -> SiteStore {
        let backend = FileBackend::new(FileBackendConfig::new(dir)).unwrap();
        let store = SiteStore::new(Arc::new(backend));
        store.migrate().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_platform_subdomain_and_bound_domain() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path()).await;
        store
            .create_site(Site::new("plumber", "Plumber").with_domain("joesplumbing.com"))
            .await
            .unwrap();

        let resolver = DomainResolver::new(store).with_platform_domain("SiteForge.app");

        let by_sub = resolver.resolve("plumber.siteforge.app:443").await.unwrap().unwrap();
        assert_eq!(by_sub.site.slug, "plumber");
        assert_eq!(by_sub.source, ResolutionSource::PlatformSubdomain);

        let by_domain = resolver.resolve("JOESPLUMBING.com.").await.unwrap().unwrap();
        assert_eq!(by_domain.source, ResolutionSource::BoundDomain);
        assert_eq!(by_domain.hostname, "joesplumbing.com");

        assert!(resolver.resolve("siteforge.app").await.unwrap().is_none());
        assert!(resolver.resolve("a.b.siteforge.app").await.unwrap().is_none());
        assert!(resolver.resolve("unknown.siteforge.app").await.unwrap().is_none());
        assert!(resolver.resolve("").await.unwrap().is_none());
    }

    #[test]
    fn test_invalid_platform_domain_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(FileBackendConfig::new(dir.path())).unwrap();
        let resolver = DomainResolver::new(SiteStore::new(Arc::new(backend)))
            .with_platform_domain("not valid")
            .with_platform_domain("siteforge.app")
            .with_platform_domain("siteforge.app.");
        assert_eq!(resolver.platform_domains(), ["siteforge.app".to_string()]);
    }

    #[test]
    fn test_source_display() {
        assert_eq!(ResolutionSource::BoundDomain.to_string(), "bound_domain");
    }
}
