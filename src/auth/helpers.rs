use chrono::Utc;

use super::{TokenGenerator, parse_token};
use crate::store::Store;
use crate::types::{Token, User};

#[derive(Debug)]
pub enum TokenValidationError {
    InvalidScheme,
    InvalidToken,
    TokenExpired,
    UnknownUser,
    InternalError,
}

pub struct ValidatedToken {
    pub token: Token,
    pub user: User,
}

/// Validates a raw token string against the store and resolves its user.
pub fn validate_token(
    store: &dyn Store,
    raw_token: &str,
) -> Result<ValidatedToken, TokenValidationError> {
    let (lookup, _secret) = parse_token(raw_token).map_err(|_| TokenValidationError::InvalidToken)?;

    let token = store
        .get_token_by_lookup(&lookup)
        .map_err(|_| TokenValidationError::InternalError)?
        .ok_or(TokenValidationError::InvalidToken)?;

    let generator = TokenGenerator::new();
    if !generator
        .verify(raw_token, &token.token_hash)
        .map_err(|_| TokenValidationError::InternalError)?
    {
        return Err(TokenValidationError::InvalidToken);
    }

    if let Some(expires_at) = &token.expires_at {
        if expires_at < &Utc::now() {
            return Err(TokenValidationError::TokenExpired);
        }
    }

    let user = store
        .get_user(&token.user_id)
        .map_err(|_| TokenValidationError::InternalError)?
        .ok_or(TokenValidationError::UnknownUser)?;

    if let Err(e) = store.update_token_last_used(&token.id) {
        tracing::warn!("Failed to update token last_used_at: {e}");
    }

    Ok(ValidatedToken { token, user })
}

/// Extracts a bearer token from the Authorization header.
/// Returns None if no auth header is present.
/// Returns Err if the auth scheme is not Bearer.
pub fn extract_token_from_header(
    auth_header: Option<&str>,
) -> Result<Option<String>, TokenValidationError> {
    match auth_header {
        Some(header) => match header.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => Ok(Some(token.trim().to_string())),
            Some(_) => Err(TokenValidationError::InvalidToken),
            None => Err(TokenValidationError::InvalidScheme),
        },
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::issue_token;
    use crate::store::SqliteStore;
    use crate::types::Role;
    use tempfile::TempDir;

    #[test]
    fn test_extract_token_from_header() {
        assert!(matches!(extract_token_from_header(None), Ok(None)));
        assert_eq!(
            extract_token_from_header(Some("Bearer abc")).unwrap(),
            Some("abc".to_string())
        );
        assert!(matches!(
            extract_token_from_header(Some("Basic abc")),
            Err(TokenValidationError::InvalidScheme)
        ));
        assert!(matches!(
            extract_token_from_header(Some("Bearer   ")),
            Err(TokenValidationError::InvalidToken)
        ));
    }

    #[test]
    fn test_validate_token_resolves_user() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        store
            .create_user(&User {
                id: "u1".to_string(),
                role: Role::Unsa,
                display_name: "Ana".to_string(),
                created_at: Utc::now(),
            })
            .unwrap();

        let raw = issue_token(&store, "u1", None).unwrap();
        let validated = validate_token(&store, &raw).unwrap();
        assert_eq!(validated.user.id, "u1");
        assert_eq!(validated.user.role, Role::Unsa);

        let stored = store.get_token_by_lookup(&validated.token.token_lookup).unwrap().unwrap();
        assert!(stored.last_used_at.is_some());

        let replacement = if raw.ends_with('0') { '1' } else { '0' };
        let tampered = format!("{}{replacement}", &raw[..raw.len() - 1]);
        assert!(matches!(
            validate_token(&store, &tampered),
            Err(TokenValidationError::InvalidToken)
        ));
    }

    #[test]
    fn test_validate_token_expired() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        store
            .create_user(&User {
                id: "u1".to_string(),
                role: Role::Externo,
                display_name: "Luis".to_string(),
                created_at: Utc::now(),
            })
            .unwrap();

        let raw = issue_token(&store, "u1", Some(Utc::now() - chrono::Duration::seconds(60))).unwrap();
        assert!(matches!(
            validate_token(&store, &raw),
            Err(TokenValidationError::TokenExpired)
        ));
    }
}
