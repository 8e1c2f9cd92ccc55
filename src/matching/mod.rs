//! Core operations of the matchmaking service.
//!
//! Every function takes the store and, where ownership matters, the calling
//! [`Actor`](crate::types::Actor) explicitly. The HTTP handlers and the CLI are
//! thin wrappers around these.

mod entities;
mod finder;
mod lifecycle;
mod messaging;

pub use entities::{
    DEFAULT_STATS_LIMIT, MAX_STATS_LIMIT, MAX_TITLE_LEN, create_capacity, create_challenge,
    get_capacity, get_challenge, keyword_stats, link_owned_keywords, list_capacities,
    list_challenges, resolve_and_link_keywords,
};
pub use finder::{rank_matches, rank_matches_for};
pub use lifecycle::{
    create_match, get_match, get_system_enabled, list_all_matches, list_matches_for_user,
    set_system_enabled, transition_match, transition_match_by_name,
};
pub use messaging::{MAX_MESSAGE_LEN, list_messages, mark_read, send_message};

use crate::error::{Error, Result};

/// Rejects non-positive ids before any query runs.
pub(crate) fn ensure_valid_id(id: i64, what: &str) -> Result<()> {
    if id <= 0 {
        return Err(Error::validation(format!("{what} id must be a positive integer")));
    }
    Ok(())
}
