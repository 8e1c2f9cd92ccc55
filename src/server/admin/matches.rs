use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::auth::RequireAdmin;
use crate::matching;
use crate::server::AppState;
use crate::server::dto::MatchSettings;
use crate::server::response::{ApiError, ApiResponse};

pub async fn list_all_matches(
    admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let matches = matching::list_all_matches(state.store.as_ref(), &admin.actor())?;

    Ok::<_, ApiError>(Json(ApiResponse::success(matches)))
}

pub async fn update_settings(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<MatchSettings>,
) -> impl IntoResponse {
    matching::set_system_enabled(state.store.as_ref(), req.enabled)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(MatchSettings {
        enabled: req.enabled,
    })))
}
