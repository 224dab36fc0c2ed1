//! Multisite API Library
//!
//! Per-request site resolution: domain-to-theme bindings, backend protection for
//! protected domains, and active theme selection.

pub mod auth;
pub mod config;
pub mod error;
pub mod gate;
pub mod notices;
pub mod routes;
pub mod routing;
pub mod state;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use gate::{ActiveTheme, GateOutcome, GateRequest, RequestGate};
pub use routing::{BindingCache, BindingStore, HostResolutionCache};
pub use state::AppState;
