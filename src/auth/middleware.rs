use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::helpers::{TokenValidationError, extract_token_from_header, validate_token};
use crate::server::AppState;
use crate::types::{Actor, Token, User};

/// Extractor that requires any authenticated user
pub struct RequireUser {
    pub token: Token,
    pub user: User,
}

impl RequireUser {
    /// The caller as seen by the core operations.
    pub fn actor(&self) -> Actor {
        Actor::new(self.user.id.clone(), self.user.role)
    }
}

/// Extractor that requires an admin user
pub struct RequireAdmin {
    pub token: Token,
    pub user: User,
}

impl RequireAdmin {
    pub fn actor(&self) -> Actor {
        Actor::new(self.user.id.clone(), self.user.role)
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingAuth,
    InvalidScheme,
    InvalidToken,
    TokenExpired,
    NotAdmin,
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingAuth => (StatusCode::UNAUTHORIZED, "Authentication required"),
            AuthError::InvalidScheme => (StatusCode::UNAUTHORIZED, "Invalid authorization scheme"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token"),
            AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "Token expired"),
            AuthError::NotAdmin => (StatusCode::FORBIDDEN, "Admin access required"),
            AuthError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = json!({ "data": null, "error": message });

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                "WWW-Authenticate",
                HeaderValue::from_static("Bearer realm=\"vinculo\""),
            );
        }

        response
    }
}

impl FromRequestParts<Arc<AppState>> for RequireUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let (token, user) = extract_and_validate_token(parts, state)?;
        Ok(RequireUser { token, user })
    }
}

impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let (token, user) = extract_and_validate_token(parts, state)?;

        if !user.role.is_admin() {
            return Err(AuthError::NotAdmin);
        }

        Ok(RequireAdmin { token, user })
    }
}

fn extract_and_validate_token(
    parts: &Parts,
    state: &Arc<AppState>,
) -> Result<(Token, User), AuthError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let raw_token = extract_token_from_header(auth_header)
        .map_err(|e| match e {
            TokenValidationError::InvalidScheme => AuthError::InvalidScheme,
            _ => AuthError::InvalidToken,
        })?
        .ok_or(AuthError::MissingAuth)?;

    let validated = validate_token(state.store.as_ref(), &raw_token).map_err(|e| match e {
        TokenValidationError::InvalidScheme => AuthError::InvalidScheme,
        TokenValidationError::InvalidToken | TokenValidationError::UnknownUser => {
            AuthError::InvalidToken
        }
        TokenValidationError::TokenExpired => AuthError::TokenExpired,
        TokenValidationError::InternalError => AuthError::InternalError,
    })?;

    Ok((validated.token, validated.user))
}
