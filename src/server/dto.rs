use serde::{Deserialize, Serialize};

use crate::types::{MatchState, User};

#[derive(Debug, Deserialize)]
pub struct LinkKeywordsRequest {
    pub keywords: String,
}

#[derive(Debug, Serialize)]
pub struct LinkKeywordsResponse {
    /// Keyword links written by this call.
    pub linked: usize,
    /// Full keyword set of the entity afterwards.
    pub keywords: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct KeywordStatsParams {
    #[serde(default)]
    pub limit: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMatchRequest {
    pub challenge_id: i64,
    pub capacity_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMatchStatusRequest {
    /// One of `aceptar`, `rechazar`, `cancelar`.
    #[serde(alias = "accion")]
    pub action: String,
}

#[derive(Debug, Serialize)]
pub struct MatchStatusResponse {
    pub id: i64,
    pub state: MatchState,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub updated: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MatchSettings {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub role: String,
    pub display_name: String,
}

#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    pub user: User,
    /// Raw bearer token. Only returned once.
    pub token: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    #[serde(default)]
    pub cursor: Option<String>,
}
