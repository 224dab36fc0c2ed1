//! Per-request theme resolution
//!
//! Decides which theme and base URL apply to a request:
//! - Console execution: no decision, there is no request to theme
//! - Administrative area: the theme of the site the operator is assigned to
//! - Public area: the first binding whose domain host prefixes the request host

use multisite_shared::{Binding, BindingSet, ResolvedTheme, SiteId};
use url::Url;

use super::HostResolutionCache;

/// Namespace prefix for host resolution cache keys
pub const HOST_KEY_PREFIX: &str = "multhem-";

/// Inputs the resolver needs about the current request
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    pub is_admin_area: bool,
    pub is_console: bool,
    /// Site of the authenticated operator, if any
    pub operator_site_id: Option<SiteId>,
    pub request_host: &'a str,
}

/// Resolve the active theme for a request.
///
/// Returns `None` when no binding applies and the default theme should be used. The
/// binding set is only read; `hosts` receives the public-area lookup result, including
/// "no match", so each host is scanned once per cache lifetime. `generation` is the
/// cache generation `bindings` was loaded under; a result from a set that has since
/// been invalidated is returned but not cached.
pub fn resolve(
    bindings: &BindingSet,
    generation: u64,
    ctx: &ResolveContext<'_>,
    hosts: &HostResolutionCache,
) -> Option<ResolvedTheme> {
    if ctx.is_console {
        return None;
    }

    if ctx.is_admin_area {
        let binding = bindings.get(ctx.operator_site_id?)?;
        return Some(ResolvedTheme::from(binding));
    }

    let key = host_key(ctx.request_host);
    let binding = match hosts.get(&key) {
        Some(cached) => cached,
        None => {
            let found = match_host(bindings, ctx.request_host).cloned();
            tracing::debug!(
                host = %ctx.request_host,
                site_id = ?found.as_ref().map(|b| b.site_id),
                "Host resolved against bindings"
            );
            hosts.set(&key, found.clone(), generation);
            found
        }
    };

    binding.as_ref().map(ResolvedTheme::from)
}

/// First binding whose domain host is a case-insensitive prefix of the request host
pub fn match_host<'a>(bindings: &'a BindingSet, request_host: &str) -> Option<&'a Binding> {
    let host = request_host.to_lowercase();
    bindings.iter().find(|binding| {
        binding_host(&binding.domain).is_some_and(|bound| host.starts_with(&bound))
    })
}

/// Extract the lower-cased host from a binding domain.
///
/// Domains are usually full URLs; a bare hostname (optionally with a port) is read as
/// if it had an `http://` scheme.
pub fn binding_host(domain: &str) -> Option<String> {
    let domain = domain.trim();
    if domain.is_empty() {
        return None;
    }

    Url::parse(domain)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .or_else(|| {
            Url::parse(&format!("http://{}", domain))
                .ok()
                .and_then(|url| url.host_str().map(str::to_string))
        })
        .map(|host| host.to_lowercase())
}

/// Derive the host resolution cache key for a request host
pub fn host_key(request_host: &str) -> String {
    slugify(&format!("{}{}", HOST_KEY_PREFIX, request_host))
}

/// Lower-case, collapse every run of non-alphanumeric characters into a single `-`
fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_separator = false;

    for c in value.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_separator = true;
        }
    }

    slug
}

/// Normalize a host header value
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    // Remove port if present; IPv6 literals keep their brackets
    let end = if host.starts_with('[') {
        host.find(']').map_or(host.len(), |i| i + 1)
    } else {
        host.find(':').unwrap_or(host.len())
    };
    host[..end].to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site5() -> BindingSet {
        BindingSet::from_bindings(vec![Binding::new(5, "https://site5.com", "theme5", false)])
    }

    fn public(host: &str) -> ResolveContext<'_> {
        ResolveContext {
            is_admin_area: false,
            is_console: false,
            operator_site_id: None,
            request_host: host,
        }
    }

    fn site5_theme() -> ResolvedTheme {
        ResolvedTheme {
            theme: "theme5".to_string(),
            base_url: "https://site5.com".to_string(),
        }
    }

    #[test]
    fn test_host_key() {
        assert_eq!(host_key("site5.com"), "multhem-site5-com");
        assert_eq!(host_key("Shop.Example.COM"), "multhem-shop-example-com");
        assert_eq!(host_key("a..b--c"), "multhem-a-b-c");
        assert_eq!(host_key(""), "multhem");
    }

    #[test]
    fn test_binding_host() {
        assert_eq!(binding_host("https://site5.com"), Some("site5.com".to_string()));
        assert_eq!(binding_host("http://Site5.com:8080/path"), Some("site5.com".to_string()));
        assert_eq!(binding_host("a.example.com"), Some("a.example.com".to_string()));
        assert_eq!(binding_host("localhost:8080"), Some("localhost".to_string()));
        assert_eq!(binding_host("   "), None);
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("Example.COM"), "example.com");
        assert_eq!(normalize_host("example.com:8080"), "example.com");
        assert_eq!(normalize_host("EXAMPLE.COM:443"), "example.com");
        assert_eq!(normalize_host("[::1]:8080"), "[::1]");
        assert_eq!(normalize_host("[2001:DB8::1]"), "[2001:db8::1]");
    }

    #[test]
    fn test_console_never_decides() {
        let hosts = HostResolutionCache::new();
        let ctx = ResolveContext {
            is_admin_area: true,
            is_console: true,
            operator_site_id: Some(SiteId(5)),
            request_host: "site5.com",
        };
        assert_eq!(resolve(&site5(), 0, &ctx, &hosts), None);
        assert_eq!(hosts.stats().total_entries, 0);
    }

    #[test]
    fn test_admin_uses_operator_site() {
        let hosts = HostResolutionCache::new();
        let ctx = ResolveContext {
            is_admin_area: true,
            is_console: false,
            operator_site_id: Some(SiteId(5)),
            request_host: "unrelated.example.org",
        };
        assert_eq!(resolve(&site5(), 0, &ctx, &hosts), Some(site5_theme()));
    }

    #[test]
    fn test_admin_without_binding_defers() {
        let hosts = HostResolutionCache::new();
        let mut ctx = ResolveContext {
            is_admin_area: true,
            is_console: false,
            operator_site_id: Some(SiteId(6)),
            request_host: "site5.com",
        };
        assert_eq!(resolve(&site5(), 0, &ctx, &hosts), None);

        ctx.operator_site_id = None;
        assert_eq!(resolve(&site5(), 0, &ctx, &hosts), None);
    }

    #[test]
    fn test_public_host_resolution_is_cached() {
        let hosts = HostResolutionCache::new();

        assert_eq!(resolve(&site5(), 0, &public("site5.com"), &hosts), Some(site5_theme()));
        assert_eq!(hosts.get("multhem-site5-com"), Some(site5().get(SiteId(5)).cloned()));

        // Served from the host cache even though the set no longer has the binding
        assert_eq!(
            resolve(&BindingSet::default(), 0, &public("site5.com"), &hosts),
            Some(site5_theme())
        );
    }

    #[test]
    fn test_public_host_prefix_match() {
        let hosts = HostResolutionCache::new();
        assert_eq!(resolve(&site5(), 0, &public("SITE5.com"), &hosts), Some(site5_theme()));
        assert_eq!(resolve(&site5(), 0, &public("www.site5.com"), &hosts), None);
    }

    #[test]
    fn test_unmatched_host_is_cached_as_none() {
        let hosts = HostResolutionCache::new();

        assert_eq!(resolve(&site5(), 0, &public("other.org"), &hosts), None);
        assert_eq!(hosts.get("multhem-other-org"), Some(None));
    }

    #[test]
    fn test_invalidated_set_is_not_cached() {
        let hosts = HostResolutionCache::new();
        let loaded_under = hosts.generation();
        hosts.clear();

        assert_eq!(
            resolve(&site5(), loaded_under, &public("site5.com"), &hosts),
            Some(site5_theme())
        );
        assert!(hosts.get("multhem-site5-com").is_none());
    }

    #[test]
    fn test_empty_set_defers() {
        let hosts = HostResolutionCache::new();
        assert_eq!(
            resolve(&BindingSet::default(), 0, &public("anything.example.com"), &hosts),
            None
        );
    }

    #[test]
    fn test_first_matching_binding_wins() {
        let bindings = BindingSet::from_bindings(vec![
            Binding::new(2, "https://shop.example.com", "shop", false),
            Binding::new(1, "https://shop.example.com.au", "shop-au", false),
        ]);
        let hosts = HostResolutionCache::new();

        let resolved = resolve(&bindings, 0, &public("shop.example.com.au"), &hosts);
        assert_eq!(resolved.map(|r| r.theme), Some("shop".to_string()));
    }
}
