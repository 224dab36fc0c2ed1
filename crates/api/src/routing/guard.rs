//! Backend protection
//!
//! Blocks requests that reach the administrative area through a host bound to a
//! protected site.
//!
//! Host matching is a case-insensitive substring test of the request host against the
//! binding's domain, not hostname equality. A host that is a fragment of a protected
//! domain (e.g. `example.com` against `https://shop.example.com`) is therefore blocked
//! as well. Existing deployments rely on this, so it is kept as is.

use multisite_shared::{Binding, BindingSet};

/// Find the protected binding that forbids this request, if any
pub fn protected_binding<'a>(
    bindings: &'a BindingSet,
    request_host: &str,
    request_url: &str,
    admin_prefix: &str,
) -> Option<&'a Binding> {
    if !request_url.contains(admin_prefix) {
        return None;
    }

    let host = request_host.to_lowercase();
    bindings
        .iter()
        .find(|binding| binding.is_protected && binding.domain.to_lowercase().contains(&host))
}

/// Whether the request is an unauthorized attempt to reach a protected backend
pub fn is_unauthorized(
    bindings: &BindingSet,
    request_host: &str,
    request_url: &str,
    admin_prefix: &str,
) -> bool {
    match protected_binding(bindings, request_host, request_url, admin_prefix) {
        Some(binding) => {
            tracing::warn!(
                host = %request_host,
                site_id = %binding.site_id,
                "Backend access blocked on protected domain"
            );
            true
        }
        None => false,
    }
}
