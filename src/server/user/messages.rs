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
use crate::server::dto::{MarkReadResponse, SendMessageRequest};
use crate::server::response::{ApiError, ApiResponse};

pub async fn list_messages(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let messages = matching::list_messages(state.store.as_ref(), id, &auth.user.id)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(messages)))
}

pub async fn send_message(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<SendMessageRequest>,
) -> impl IntoResponse {
    let message = matching::send_message(state.store.as_ref(), id, &auth.user.id, &req.content)?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(message))))
}

pub async fn mark_read(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let updated = matching::mark_read(state.store.as_ref(), id, &auth.user.id)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(MarkReadResponse { updated })))
}
