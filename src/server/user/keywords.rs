use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

use crate::auth::RequireUser;
use crate::matching;
use crate::server::AppState;
use crate::server::dto::KeywordStatsParams;
use crate::server::response::{ApiError, ApiResponse};

pub async fn keyword_stats(
    _auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<KeywordStatsParams>,
) -> impl IntoResponse {
    let stats = matching::keyword_stats(state.store.as_ref(), params.limit)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(stats)))
}
