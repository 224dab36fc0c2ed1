//! Domain-based site routing
//!
//! This module resolves incoming requests to sites (domain-to-theme bindings):
//! - Binding store: lists every binding from the database
//! - Binding cache: keeps the binding set until invalidated
//! - Guard: blocks the backend on protected domains
//! - Theme resolver: picks the theme and base URL for a request

mod binding_cache;
mod cache;
pub mod guard;
mod store;
pub mod theme_resolver;

pub use binding_cache::{BindingCache, CachedBindings, STORE_UNAVAILABLE_NOTICE};
pub use cache::{CacheStats, HostResolutionCache};
pub use guard::is_unauthorized;
pub use store::{BindingStore, PgBindingStore, StaticBindingStore};
pub use theme_resolver::{resolve, ResolveContext};
