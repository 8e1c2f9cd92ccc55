use super::ensure_valid_id;
use super::lifecycle::ensure_enabled;
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{MatchMessage, MatchRequest, MatchState};

pub const MAX_MESSAGE_LEN: usize = 4000;

/// Gate shared by every chat operation: system on, caller is a party, and the
/// match has been accepted.
fn accepted_match_for(store: &dyn Store, match_id: i64, user_id: &str) -> Result<MatchRequest> {
    ensure_enabled(store)?;
    ensure_valid_id(match_id, "match")?;

    let found = store.get_match(match_id)?.ok_or(Error::NotFound("match"))?;
    if !found.involves(user_id) {
        return Err(Error::forbidden("you are not a party to this match"));
    }
    if found.state != MatchState::Accepted {
        return Err(Error::forbidden("chat is only available on accepted matches"));
    }
    Ok(found)
}

pub fn list_messages(store: &dyn Store, match_id: i64, user_id: &str) -> Result<Vec<MatchMessage>> {
    accepted_match_for(store, match_id, user_id)?;
    store.list_messages(match_id)
}

pub fn send_message(
    store: &dyn Store,
    match_id: i64,
    user_id: &str,
    content: &str,
) -> Result<MatchMessage> {
    accepted_match_for(store, match_id, user_id)?;

    let content = content.trim();
    if content.is_empty() {
        return Err(Error::validation("message content cannot be empty"));
    }
    if content.chars().count() > MAX_MESSAGE_LEN {
        return Err(Error::validation(format!(
            "message content must be at most {MAX_MESSAGE_LEN} characters"
        )));
    }

    let message = store.create_message(match_id, user_id, content)?;
    tracing::debug!("message {} posted to match {} by {}", message.id, match_id, user_id);
    Ok(message)
}

/// Marks the other party's unread messages as read. Returns how many changed.
pub fn mark_read(store: &dyn Store, match_id: i64, user_id: &str) -> Result<usize> {
    accepted_match_for(store, match_id, user_id)?;
    store.mark_messages_read(match_id, user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use crate::types::{NewCapacity, NewChallenge, NewMatch, Role, User};
    use chrono::Utc;
    use tempfile::TempDir;

    fn setup(state: MatchState) -> (TempDir, SqliteStore, i64) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        for (id, role) in [("ext", Role::Externo), ("res", Role::Unsa), ("other", Role::Unsa)] {
            store
                .create_user(&User {
                    id: id.to_string(),
                    role,
                    display_name: id.to_string(),
                    created_at: Utc::now(),
                })
                .unwrap();
        }
        let challenge = store
            .create_challenge(
                "ext",
                &NewChallenge {
                    title: "Water".to_string(),
                    ..Default::default()
                },
            )
            .unwrap();
        let capacity = store
            .create_capacity(
                "res",
                &NewCapacity {
                    description: "Lab".to_string(),
                    ..Default::default()
                },
            )
            .unwrap();
        let created = store
            .create_match(&NewMatch {
                challenge_id: challenge.id,
                capacity_id: capacity.id,
                requester_user_id: "ext".to_string(),
                recipient_user_id: "res".to_string(),
                state,
            })
            .unwrap();
        store.set_matches_enabled(true).unwrap();
        (temp, store, created.id)
    }

    #[test]
    fn test_chat_requires_accepted_state() {
        for state in [
            MatchState::PendingUnsa,
            MatchState::PendingExterno,
            MatchState::RejectedUnsa,
            MatchState::RejectedExterno,
            MatchState::Cancelled,
        ] {
            let (_temp, store, id) = setup(state);
            assert!(matches!(list_messages(&store, id, "ext"), Err(Error::Forbidden(_))));
            assert!(matches!(
                send_message(&store, id, "ext", "hola"),
                Err(Error::Forbidden(_))
            ));
            assert!(matches!(mark_read(&store, id, "res"), Err(Error::Forbidden(_))));
        }
    }

    #[test]
    fn test_send_and_list() {
        let (_temp, store, id) = setup(MatchState::Accepted);

        let sent = send_message(&store, id, "ext", "  hola  ").unwrap();
        assert_eq!(sent.content, "hola");
        assert!(!sent.read);

        send_message(&store, id, "res", "hello").unwrap();
        let thread = list_messages(&store, id, "res").unwrap();
        assert_eq!(thread.len(), 2);
        assert_eq!(thread[0].sender_user_id, "ext");
        assert_eq!(thread[1].sender_user_id, "res");
    }

    #[test]
    fn test_send_validates_content() {
        let (_temp, store, id) = setup(MatchState::Accepted);

        assert!(matches!(
            send_message(&store, id, "ext", "   "),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            send_message(&store, id, "ext", &"x".repeat(MAX_MESSAGE_LEN + 1)),
            Err(Error::Validation(_))
        ));
        assert!(send_message(&store, id, "ext", &"x".repeat(MAX_MESSAGE_LEN)).is_ok());
    }

    #[test]
    fn test_outsider_is_refused() {
        let (_temp, store, id) = setup(MatchState::Accepted);
        assert!(matches!(
            send_message(&store, id, "other", "hi"),
            Err(Error::Forbidden(_))
        ));
        assert!(matches!(
            list_messages(&store, 999, "ext"),
            Err(Error::NotFound("match"))
        ));
    }

    #[test]
    fn test_mark_read_is_idempotent() {
        let (_temp, store, id) = setup(MatchState::Accepted);
        send_message(&store, id, "ext", "one").unwrap();
        send_message(&store, id, "ext", "two").unwrap();

        assert_eq!(mark_read(&store, id, "ext").unwrap(), 0);
        assert_eq!(mark_read(&store, id, "res").unwrap(), 2);
        assert_eq!(mark_read(&store, id, "res").unwrap(), 0);
    }

    #[test]
    fn test_disabled_system_blocks_chat() {
        let (_temp, store, id) = setup(MatchState::Accepted);
        send_message(&store, id, "ext", "before").unwrap();
        store.set_matches_enabled(false).unwrap();

        assert!(matches!(list_messages(&store, id, "ext"), Err(Error::SystemDisabled)));
        assert!(matches!(
            send_message(&store, id, "ext", "after"),
            Err(Error::SystemDisabled)
        ));
        assert!(matches!(mark_read(&store, id, "res"), Err(Error::SystemDisabled)));
        assert_eq!(store.list_messages(id).unwrap().len(), 1);
    }
}
