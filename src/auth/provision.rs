use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::TokenGenerator;
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Role, Token, User};

const MAX_TOKEN_RETRIES: u32 = 3;
const MAX_DISPLAY_NAME_LEN: usize = 200;

fn new_token(
    generator: &TokenGenerator,
    user_id: &str,
    expires_at: Option<DateTime<Utc>>,
) -> Result<(String, Token)> {
    let (raw_token, lookup, hash) = generator.generate()?;
    let token = Token {
        id: Uuid::new_v4().to_string(),
        token_hash: hash,
        token_lookup: lookup,
        user_id: user_id.to_string(),
        created_at: Utc::now(),
        expires_at,
        last_used_at: None,
    };
    Ok((raw_token, token))
}

/// Issues a new token for `user_id` and returns the raw value. The raw token
/// is never stored; only its argon2 hash is.
pub fn issue_token(
    store: &dyn Store,
    user_id: &str,
    expires_at: Option<DateTime<Utc>>,
) -> Result<String> {
    let generator = TokenGenerator::new();

    for _ in 0..MAX_TOKEN_RETRIES {
        let (raw_token, token) = new_token(&generator, user_id, expires_at)?;
        match store.create_token(&token) {
            Ok(()) => return Ok(raw_token),
            Err(Error::TokenLookupCollision) => continue,
            Err(e) => return Err(e),
        }
    }

    Err(Error::TokenLookupCollision)
}

/// Creates a user with a fresh id and a token bound to it. Either both rows
/// are written or neither is.
pub fn provision_user(store: &dyn Store, role: Role, display_name: &str) -> Result<(User, String)> {
    let display_name = display_name.trim();
    if display_name.is_empty() {
        return Err(Error::validation("display name is required"));
    }
    if display_name.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err(Error::validation(format!(
            "display name must be at most {MAX_DISPLAY_NAME_LEN} characters"
        )));
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        role,
        display_name: display_name.to_string(),
        created_at: Utc::now(),
    };
    let generator = TokenGenerator::new();

    for _ in 0..MAX_TOKEN_RETRIES {
        let (raw_token, token) = new_token(&generator, &user.id, None)?;
        match store.create_user_with_token(&user, &token) {
            Ok(()) => {
                tracing::info!("provisioned {} user {}", user.role, user.id);
                return Ok((user, raw_token));
            }
            Err(Error::TokenLookupCollision) => continue,
            Err(e) => return Err(e),
        }
    }

    Err(Error::TokenLookupCollision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::parse_token;
    use crate::store::SqliteStore;
    use tempfile::TempDir;

    #[test]
    fn test_provision_user_issues_usable_token() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();

        let (user, raw) = provision_user(&store, Role::Externo, "  Mina Sur  ").unwrap();
        assert_eq!(user.display_name, "Mina Sur");

        let (lookup, _) = parse_token(&raw).unwrap();
        let token = store.get_token_by_lookup(&lookup).unwrap().unwrap();
        assert_eq!(token.user_id, user.id);
        assert!(TokenGenerator::new().verify(&raw, &token.token_hash).unwrap());
    }

    #[test]
    fn test_provision_user_requires_name() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();

        assert!(matches!(
            provision_user(&store, Role::Unsa, "   "),
            Err(Error::Validation(_))
        ));
        assert!(store.list_users("", 10).unwrap().is_empty());
    }

    #[test]
    fn test_provision_user_rolls_back_when_token_insert_fails() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        store
            .connection()
            .execute_batch(
                "CREATE TRIGGER refuse_token BEFORE INSERT ON tokens
                 BEGIN SELECT RAISE(ABORT, 'token refused'); END;",
            )
            .unwrap();

        assert!(matches!(
            provision_user(&store, Role::Externo, "Mina Sur"),
            Err(Error::Database(_))
        ));
        assert!(store.list_users("", 10).unwrap().is_empty());
    }
}
