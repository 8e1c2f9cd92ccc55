use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireUser;
use crate::matching;
use crate::server::AppState;
use crate::server::dto::{
    CreateMatchRequest, MatchSettings, MatchStatusResponse, UpdateMatchStatusRequest,
};
use crate::server::response::{ApiError, ApiResponse};

pub async fn get_settings(
    _auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let enabled = matching::get_system_enabled(state.store.as_ref())?;

    Ok::<_, ApiError>(Json(ApiResponse::success(MatchSettings { enabled })))
}

pub async fn create_match(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateMatchRequest>,
) -> impl IntoResponse {
    let created = matching::create_match(
        state.store.as_ref(),
        &auth.actor(),
        req.challenge_id,
        req.capacity_id,
    )?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

pub async fn list_matches(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let matches = matching::list_matches_for_user(state.store.as_ref(), &auth.actor())?;

    Ok::<_, ApiError>(Json(ApiResponse::success(matches)))
}

pub async fn get_match(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let found = matching::get_match(state.store.as_ref(), &auth.actor(), id)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(found)))
}

pub async fn update_match_status(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateMatchStatusRequest>,
) -> impl IntoResponse {
    let new_state =
        matching::transition_match_by_name(state.store.as_ref(), &auth.actor(), id, &req.action)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(MatchStatusResponse {
        id,
        state: new_state,
    })))
}
