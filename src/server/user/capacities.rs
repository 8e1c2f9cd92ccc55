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
use crate::types::{EntityKind, NewCapacity};

pub async fn create_capacity(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewCapacity>,
) -> impl IntoResponse {
    let capacity = matching::create_capacity(state.store.as_ref(), &auth.actor(), req)?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(capacity))))
}

pub async fn list_capacities(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let capacities = matching::list_capacities(state.store.as_ref(), &auth.actor())?;

    Ok::<_, ApiError>(Json(ApiResponse::success(capacities)))
}

pub async fn get_capacity(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let capacity = matching::get_capacity(state.store.as_ref(), &auth.actor(), id)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(capacity)))
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
        matching::link_owned_keywords(store, &actor, EntityKind::Capacity, id, &req.keywords)?;
    let capacity = matching::get_capacity(store, &actor, id)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(LinkKeywordsResponse {
        linked,
        keywords: capacity.keywords,
    })))
}

pub async fn rank_challenges(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let ranked =
        matching::rank_matches_for(state.store.as_ref(), &auth.actor(), EntityKind::Capacity, id)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(ranked)))
}
