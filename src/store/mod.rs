pub mod keywords;
mod ranking;
mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
///
/// Every mutating method is all-or-nothing: it runs in a single transaction
/// (or a single atomic statement) and leaves no partial writes behind on error.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // User operations
    fn create_user(&self, user: &User) -> Result<()>;
    /// Inserts a user together with its first token, atomically.
    fn create_user_with_token(&self, user: &User, token: &Token) -> Result<()>;
    fn get_user(&self, id: &str) -> Result<Option<User>>;
    fn list_users(&self, cursor: &str, limit: i32) -> Result<Vec<User>>;
    fn has_admin_user(&self) -> Result<bool>;

    // Token operations
    fn create_token(&self, token: &Token) -> Result<()>;
    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>>;
    fn update_token_last_used(&self, id: &str) -> Result<()>;

    // Challenge operations (insert and keyword links share one transaction)
    fn create_challenge(&self, owner_user_id: &str, challenge: &NewChallenge) -> Result<Challenge>;
    fn get_challenge(&self, id: i64) -> Result<Option<Challenge>>;
    fn list_challenges(&self, owner_user_id: Option<&str>) -> Result<Vec<Challenge>>;
    fn challenge_owner(&self, id: i64) -> Result<Option<String>>;

    // Capacity operations
    fn create_capacity(&self, owner_user_id: &str, capacity: &NewCapacity) -> Result<Capacity>;
    fn get_capacity(&self, id: i64) -> Result<Option<Capacity>>;
    fn list_capacities(&self, owner_user_id: Option<&str>) -> Result<Vec<Capacity>>;
    fn capacity_owner(&self, id: i64) -> Result<Option<String>>;

    // Keyword operations
    fn link_keywords(
        &self,
        kind: EntityKind,
        entity_id: i64,
        raw: &str,
        increment_popularity: bool,
    ) -> Result<usize>;
    fn get_keyword(&self, text: &str) -> Result<Option<Keyword>>;
    fn keyword_stats(&self, limit: i32) -> Result<Vec<KeywordStat>>;
    fn rank_matches(&self, kind: EntityKind, entity_id: i64) -> Result<Vec<RankedMatch>>;

    // Match operations
    fn create_match(&self, new_match: &NewMatch) -> Result<MatchRequest>;
    fn get_match(&self, id: i64) -> Result<Option<MatchRequest>>;
    fn list_matches_for_user(&self, user_id: &str) -> Result<Vec<MatchWithContext>>;
    fn list_all_matches(&self) -> Result<Vec<MatchWithContext>>;
    /// Moves a match from `expected` to `next`. Returns the number of rows
    /// changed; zero means the match is gone or no longer in `expected`.
    fn update_match_state(&self, id: i64, expected: MatchState, next: MatchState) -> Result<usize>;

    // System toggle
    fn get_matches_enabled(&self) -> Result<bool>;
    fn set_matches_enabled(&self, enabled: bool) -> Result<()>;

    // Message operations
    fn create_message(&self, match_id: i64, sender_user_id: &str, content: &str) -> Result<MatchMessage>;
    fn list_messages(&self, match_id: i64) -> Result<Vec<MatchMessage>>;
    fn mark_messages_read(&self, match_id: i64, reader_user_id: &str) -> Result<usize>;
}
