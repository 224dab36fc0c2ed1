//! Request gate
//!
//! Runs once per request before any handler: loads bindings, enforces backend
//! protection and selects the active theme. Handlers (the rendering layer) read the
//! outcome from the [`ActiveTheme`] request extension.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use multisite_shared::{Operator, ResolvedTheme};

use crate::{
    auth,
    error::ApiError,
    routing::{guard, theme_resolver, BindingCache, CachedBindings, ResolveContext},
    state::AppState,
};

/// Theme-selector page that gets the extra partials directory
const THEME_SELECTOR_PATH: &str = "/cms/themes";

/// Theme selected for the current request (`None` keeps the default theme)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveTheme(pub Option<ResolvedTheme>);

/// Extra partial-view directory for the backend theme selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraViewPath(pub String);

/// What the gate knows about one request
#[derive(Debug, Clone, Copy)]
pub struct GateRequest<'a> {
    /// Normalized host, without port
    pub host: &'a str,
    /// Request URL without query string
    pub url: &'a str,
    /// Running outside an HTTP request (jobs, CLI)
    pub is_console: bool,
    pub operator: Option<&'a Operator>,
}

/// Decision for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Serve the request, with the theme to apply if one was resolved
    Continue(Option<ResolvedTheme>),
    /// Terminate with 401
    Unauthorized,
}

/// Composition root for per-request multisite handling
pub struct RequestGate {
    bindings: Arc<BindingCache>,
    backend_uri: String,
    operator_themes: bool,
}

impl RequestGate {
    pub fn new(
        bindings: Arc<BindingCache>,
        backend_uri: impl Into<String>,
        operator_themes: bool,
    ) -> Self {
        Self {
            bindings,
            backend_uri: backend_uri.into(),
            operator_themes,
        }
    }

    /// Whether a URL targets the administrative area
    pub fn is_admin_area(&self, url: &str) -> bool {
        url.contains(&self.backend_uri)
    }

    pub async fn evaluate(&self, request: &GateRequest<'_>) -> GateOutcome {
        let (bindings, generation) = match self.bindings.get_bindings(request.operator).await {
            CachedBindings::Ready { set, generation } => (set, generation),
            // Fail open: no protection and no theme override while the store is down
            CachedBindings::Unavailable => return GateOutcome::Continue(None),
        };

        if guard::is_unauthorized(&bindings, request.host, request.url, &self.backend_uri) {
            return GateOutcome::Unauthorized;
        }

        let is_admin_area = self.is_admin_area(request.url);
        if is_admin_area && !(self.operator_themes && request.operator.is_some()) {
            return GateOutcome::Continue(None);
        }

        let ctx = ResolveContext {
            is_admin_area,
            is_console: request.is_console,
            operator_site_id: request.operator.and_then(|op| op.site_id),
            request_host: request.host,
        };
        let resolved = theme_resolver::resolve(&bindings, generation, &ctx, self.bindings.hosts());

        if let Some(theme) = &resolved {
            tracing::debug!(
                host = %request.host,
                theme = %theme.theme,
                base_url = %theme.base_url,
                "Active theme selected"
            );
        }

        GateOutcome::Continue(resolved)
    }
}

/// Middleware that applies the request gate to every request
pub async fn gate_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let raw_host = request_host(&request);
    let host = theme_resolver::normalize_host(&raw_host);
    let url = request_url(&request, &raw_host);
    let operator = auth::authenticate(request.headers(), &state.jwt);

    let outcome = state
        .gate
        .evaluate(&GateRequest {
            host: &host,
            url: &url,
            is_console: false,
            operator: operator.as_ref(),
        })
        .await;

    let theme = match outcome {
        GateOutcome::Unauthorized => return ApiError::Unauthorized.into_response(),
        GateOutcome::Continue(theme) => theme,
    };

    let theme_selector = format!("{}{}", state.config.backend_uri, THEME_SELECTOR_PATH);
    if request.uri().path().contains(&theme_selector) {
        request
            .extensions_mut()
            .insert(ExtraViewPath(state.config.partials_path.clone()));
    }

    if let Some(operator) = operator {
        request.extensions_mut().insert(operator);
    }
    request.extensions_mut().insert(ActiveTheme(theme));

    next.run(request).await
}

/// Host header, falling back to the URI authority
fn request_host(request: &Request<Body>) -> String {
    request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| request.uri().authority().map(|a| a.to_string()))
        .unwrap_or_default()
}

/// Scheme, host and path of the request, without the query string
fn request_url(request: &Request<Body>, raw_host: &str) -> String {
    let scheme = request
        .headers()
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok())
        .or_else(|| request.uri().scheme_str())
        .unwrap_or("http");

    format!("{}://{}{}", scheme, raw_host, request.uri().path())
}
