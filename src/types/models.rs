use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MatchState, Party, Role};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub role: Role,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    #[serde(skip)]
    pub token_hash: String,
    #[serde(skip)]
    pub token_lookup: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

/// Which side of the platform an entity belongs to. Each side has its own
/// keyword link table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Challenge,
    Capacity,
}

impl EntityKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EntityKind::Challenge => "challenge",
            EntityKind::Capacity => "capacity",
        }
    }
}

/// Fields of a challenge being submitted. The owner comes from the caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewChallenge {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(default)]
    pub prior_attempts: Option<String>,
    #[serde(default)]
    pub imagined_solution: Option<String>,
    /// Free-form, comma-separated keywords.
    #[serde(default)]
    pub keywords: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub id: i64,
    pub owner_user_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prior_attempts: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imagined_solution: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Normalized keyword texts, alphabetical.
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCapacity {
    pub description: String,
    #[serde(default)]
    pub problems_addressed: Option<String>,
    #[serde(default)]
    pub project_types: Option<String>,
    #[serde(default)]
    pub equipment: Option<String>,
    #[serde(default)]
    pub internal_code: Option<String>,
    #[serde(default)]
    pub keywords: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capacity {
    pub id: i64,
    pub owner_user_id: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problems_addressed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_types: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub id: i64,
    pub text: String,
    pub challenge_popularity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordStat {
    pub text: String,
    pub challenge_popularity: i64,
}

/// One candidate from the opposite side, ranked by shared keywords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedMatch {
    pub other_id: i64,
    pub score: i64,
    /// Shared keyword texts, alphabetical, joined with ", ".
    pub matched_keywords: String,
    /// Challenge title or capacity description.
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewMatch {
    pub challenge_id: i64,
    pub capacity_id: i64,
    pub requester_user_id: String,
    pub recipient_user_id: String,
    pub state: MatchState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRequest {
    pub id: i64,
    pub challenge_id: i64,
    pub capacity_id: i64,
    pub requester_user_id: String,
    pub recipient_user_id: String,
    pub state: MatchState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MatchRequest {
    #[must_use]
    pub fn involves(&self, user_id: &str) -> bool {
        self.party_of(user_id).is_some()
    }

    /// Side of the request `user_id` is on, if any.
    #[must_use]
    pub fn party_of(&self, user_id: &str) -> Option<Party> {
        if self.requester_user_id == user_id {
            Some(Party::Requester)
        } else if self.recipient_user_id == user_id {
            Some(Party::Recipient)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchWithContext {
    #[serde(flatten)]
    pub request: MatchRequest,
    pub challenge_title: String,
    pub capacity_summary: String,
    pub requester_name: String,
    pub recipient_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchMessage {
    pub id: i64,
    pub match_id: i64,
    pub sender_user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    pub content: String,
    pub sent_at: DateTime<Utc>,
    pub read: bool,
}
