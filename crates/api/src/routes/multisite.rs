//! Backend multisite endpoints
//!
//! Mounted under the configured backend URI and restricted to authenticated operators.

use axum::{extract::State, Extension, Json};
use multisite_shared::Operator;
use serde::Serialize;

use crate::{
    auth::require_operator,
    error::ApiResult,
    notices::Notice,
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct InvalidateResponse {
    pub invalidated: bool,
    pub cleared_hosts: usize,
}

/// Invalidate the binding and host caches (called after bindings are saved)
pub async fn invalidate_cache(
    State(state): State<AppState>,
    operator: Option<Extension<Operator>>,
) -> ApiResult<Json<InvalidateResponse>> {
    let operator = require_operator(operator)?;
    let cleared_hosts = state.bindings.invalidate();

    tracing::info!(operator_id = %operator.id, cleared_hosts, "Multisite cache invalidated by operator");

    Ok(Json(InvalidateResponse {
        invalidated: true,
        cleared_hosts,
    }))
}

#[derive(Debug, Serialize)]
pub struct NoticesResponse {
    pub notices: Vec<Notice>,
}

/// Drain the operator's pending notices
pub async fn list_notices(
    State(state): State<AppState>,
    operator: Option<Extension<Operator>>,
) -> ApiResult<Json<NoticesResponse>> {
    let operator = require_operator(operator)?;

    Ok(Json(NoticesResponse {
        notices: state.notices.drain(operator.id),
    }))
}
