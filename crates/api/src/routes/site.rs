//! Site fallback
//!
//! Every path not owned by the API ends here. Page rendering lives outside this
//! service, so the fallback reports the theme the gate selected for the request.

use axum::{Extension, Json};
use serde::Serialize;

use crate::gate::{ActiveTheme, ExtraViewPath};

#[derive(Debug, Serialize)]
pub struct ActiveThemeResponse {
    pub theme: Option<String>,
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_path: Option<String>,
}

pub async fn active_theme(
    Extension(active): Extension<ActiveTheme>,
    view_path: Option<Extension<ExtraViewPath>>,
) -> Json<ActiveThemeResponse> {
    let (theme, base_url) = match active.0 {
        Some(resolved) => (Some(resolved.theme), Some(resolved.base_url)),
        None => (None, None),
    };

    Json(ActiveThemeResponse {
        theme,
        base_url,
        view_path: view_path.map(|Extension(ExtraViewPath(path))| path),
    })
}
