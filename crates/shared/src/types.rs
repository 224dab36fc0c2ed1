//! Common types used across multisite

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// ID Wrappers
// =============================================================================

/// Site (tenant) ID wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(pub i64);

impl From<i64> for SiteId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Bindings
// =============================================================================

/// One domain-to-theme binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub site_id: SiteId,
    /// Public address of the site, either a full URL or a bare hostname
    pub domain: String,
    pub theme: String,
    /// When set, the administrative area must not be served on hosts matching `domain`
    pub is_protected: bool,
}

impl Binding {
    pub fn new(
        site_id: impl Into<SiteId>,
        domain: impl Into<String>,
        theme: impl Into<String>,
        is_protected: bool,
    ) -> Self {
        Self {
            site_id: site_id.into(),
            domain: domain.into(),
            theme: theme.into(),
            is_protected,
        }
    }
}

/// Immutable set of bindings indexed by site ID.
///
/// Iteration follows the order the bindings were supplied in, which is the order
/// host matching and protection checks walk them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingSet {
    bindings: Vec<Binding>,
    index: HashMap<SiteId, usize>,
}

impl BindingSet {
    /// Build a set from store rows. A repeated site ID overwrites the earlier
    /// binding but keeps its position.
    pub fn from_bindings(rows: impl IntoIterator<Item = Binding>) -> Self {
        let mut set = Self::default();
        for binding in rows {
            match set.index.get(&binding.site_id) {
                Some(&pos) => set.bindings[pos] = binding,
                None => {
                    set.index.insert(binding.site_id, set.bindings.len());
                    set.bindings.push(binding);
                }
            }
        }
        set
    }

    pub fn get(&self, site_id: SiteId) -> Option<&Binding> {
        self.index.get(&site_id).map(|&pos| &self.bindings[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl FromIterator<Binding> for BindingSet {
    fn from_iter<I: IntoIterator<Item = Binding>>(iter: I) -> Self {
        Self::from_bindings(iter)
    }
}

// =============================================================================
// Request-side values
// =============================================================================

/// Authenticated backend operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub id: Uuid,
    /// Site the operator is assigned to, if any
    pub site_id: Option<SiteId>,
}

/// Theme and base URL selected for a single request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTheme {
    pub theme: String,
    pub base_url: String,
}

impl From<&Binding> for ResolvedTheme {
    fn from(binding: &Binding) -> Self {
        Self {
            theme: binding.theme.clone(),
            base_url: binding.domain.clone(),
        }
    }
}
