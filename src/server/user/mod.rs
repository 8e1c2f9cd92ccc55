mod capacities;
mod challenges;
mod keywords;
mod matches;
mod messages;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::server::AppState;

pub fn user_router() -> Router<Arc<AppState>> {
    Router::new()
        // Challenges (externo side)
        .route("/challenges", get(challenges::list_challenges))
        .route("/challenges", post(challenges::create_challenge))
        .route("/challenges/{id}", get(challenges::get_challenge))
        .route("/challenges/{id}/keywords", post(challenges::link_keywords))
        .route("/challenges/{id}/matches", get(challenges::rank_capacities))
        // Capacities (unsa side)
        .route("/capacities", get(capacities::list_capacities))
        .route("/capacities", post(capacities::create_capacity))
        .route("/capacities/{id}", get(capacities::get_capacity))
        .route("/capacities/{id}/keywords", post(capacities::link_keywords))
        .route("/capacities/{id}/matches", get(capacities::rank_challenges))
        // Keywords
        .route("/keywords/stats", get(keywords::keyword_stats))
        // Match requests
        .route("/matches/settings", get(matches::get_settings))
        .route("/matches", get(matches::list_matches))
        .route("/matches", post(matches::create_match))
        .route("/matches/{id}", get(matches::get_match))
        .route("/matches/{id}/status", patch(matches::update_match_status))
        // Chat on accepted matches
        .route("/matches/{id}/messages", get(messages::list_messages))
        .route("/matches/{id}/messages", post(messages::send_message))
        .route("/matches/{id}/messages/read", post(messages::mark_read))
}
