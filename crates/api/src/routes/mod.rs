//! API routes

pub mod health;
pub mod multisite;
pub mod site;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{gate::gate_middleware, state::AppState};

/// Create all routes
pub fn create_router(state: AppState) -> Router {
    let backend = state.config.backend_uri.trim_end_matches('/').to_string();

    // Health check routes (at root level for infrastructure monitoring, outside the gate)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    // Backend routes (operator required)
    let backend_routes = Router::new()
        .route(
            &format!("{}/multisite/cache/invalidate", backend),
            post(multisite::invalidate_cache),
        )
        .route(
            &format!("{}/multisite/notices", backend),
            get(multisite::list_notices),
        );

    // Everything else is site traffic; the gate runs in front of all of it
    let gated = backend_routes
        .fallback(site::active_theme)
        .layer(middleware::from_fn_with_state(state.clone(), gate_middleware));

    Router::new()
        .merge(gated)
        .merge(health_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
