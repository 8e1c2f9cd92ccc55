mod matches;
mod users;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::server::AppState;

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        // Match oversight
        .route("/matches", get(matches::list_all_matches))
        .route("/matches/settings", put(matches::update_settings))
        // User provisioning
        .route("/users", post(users::create_user))
        .route("/users", get(users::list_users))
}
