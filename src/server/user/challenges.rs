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
use crate::server::dto::{LinkKeywordsRequest, LinkKeywordsResponse};
use crate::server::response::{ApiError, ApiResponse};
use crate::types::{EntityKind, NewChallenge};

pub async fn create_challenge(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewChallenge>,
) -> impl IntoResponse {
    let challenge = matching::create_challenge(state.store.as_ref(), &auth.actor(), req)?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(challenge))))
}

pub async fn list_challenges(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let challenges = matching::list_challenges(state.store.as_ref(), &auth.actor())?;

    Ok::<_, ApiError>(Json(ApiResponse::success(challenges)))
}

pub async fn get_challenge(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let challenge = matching::get_challenge(state.store.as_ref(), &auth.actor(), id)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(challenge)))
}

pub async fn link_keywords(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<LinkKeywordsRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let actor = auth.actor();

    let linked =
        matching::link_owned_keywords(store, &actor, EntityKind::Challenge, id, &req.keywords)?;
    let challenge = matching::get_challenge(store, &actor, id)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(LinkKeywordsResponse {
        linked,
        keywords: challenge.keywords,
    })))
}

pub async fn rank_capacities(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let ranked =
        matching::rank_matches_for(state.store.as_ref(), &auth.actor(), EntityKind::Challenge, id)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(ranked)))
}
