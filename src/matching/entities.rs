use super::ensure_valid_id;
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{
    Actor, Capacity, Challenge, EntityKind, KeywordStat, NewCapacity, NewChallenge, Role,
};

pub const MAX_TITLE_LEN: usize = 200;
pub const DEFAULT_STATS_LIMIT: i32 = 10;
pub const MAX_STATS_LIMIT: i32 = 100;

/// Trims an optional free-text field, treating blank input as absent.
fn clean(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn require_role(actor: &Actor, role: Role, action: &str) -> Result<()> {
    if actor.role != role {
        return Err(Error::forbidden(format!(
            "only {role} users can {action}"
        )));
    }
    Ok(())
}

/// Owners and admins may read an entity; everyone else is refused.
fn ensure_can_view(actor: &Actor, owner_user_id: &str, kind: EntityKind) -> Result<()> {
    if actor.is_admin() || actor.user_id == owner_user_id {
        return Ok(());
    }
    Err(Error::forbidden(format!("you do not own this {}", kind.as_str())))
}

pub(super) fn owner_of(store: &dyn Store, kind: EntityKind, id: i64) -> Result<String> {
    let owner = match kind {
        EntityKind::Challenge => store.challenge_owner(id)?,
        EntityKind::Capacity => store.capacity_owner(id)?,
    };
    owner.ok_or(Error::NotFound(kind.as_str()))
}

pub fn create_challenge(store: &dyn Store, actor: &Actor, input: NewChallenge) -> Result<Challenge> {
    require_role(actor, Role::Externo, "submit challenges")?;

    let title = input.title.trim().to_string();
    if title.is_empty() {
        return Err(Error::validation("title is required"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(Error::validation(format!(
            "title must be at most {MAX_TITLE_LEN} characters"
        )));
    }

    let input = NewChallenge {
        title,
        description: clean(input.description),
        impact: clean(input.impact),
        prior_attempts: clean(input.prior_attempts),
        imagined_solution: clean(input.imagined_solution),
        keywords: input.keywords,
    };

    let challenge = store.create_challenge(&actor.user_id, &input)?;
    tracing::info!(
        "challenge {} created by {} with {} keyword(s)",
        challenge.id,
        actor.user_id,
        challenge.keywords.len()
    );
    Ok(challenge)
}

pub fn create_capacity(store: &dyn Store, actor: &Actor, input: NewCapacity) -> Result<Capacity> {
    require_role(actor, Role::Unsa, "register capacities")?;

    let description = input.description.trim().to_string();
    if description.is_empty() {
        return Err(Error::validation("description is required"));
    }

    let input = NewCapacity {
        description,
        problems_addressed: clean(input.problems_addressed),
        project_types: clean(input.project_types),
        equipment: clean(input.equipment),
        internal_code: clean(input.internal_code),
        keywords: input.keywords,
    };

    let capacity = store.create_capacity(&actor.user_id, &input)?;
    tracing::info!(
        "capacity {} created by {} with {} keyword(s)",
        capacity.id,
        actor.user_id,
        capacity.keywords.len()
    );
    Ok(capacity)
}

pub fn get_challenge(store: &dyn Store, actor: &Actor, id: i64) -> Result<Challenge> {
    ensure_valid_id(id, "challenge")?;
    let challenge = store
        .get_challenge(id)?
        .ok_or(Error::NotFound("challenge"))?;
    ensure_can_view(actor, &challenge.owner_user_id, EntityKind::Challenge)?;
    Ok(challenge)
}

pub fn get_capacity(store: &dyn Store, actor: &Actor, id: i64) -> Result<Capacity> {
    ensure_valid_id(id, "capacity")?;
    let capacity = store.get_capacity(id)?.ok_or(Error::NotFound("capacity"))?;
    ensure_can_view(actor, &capacity.owner_user_id, EntityKind::Capacity)?;
    Ok(capacity)
}

/// Admins see every challenge, external participants see their own.
pub fn list_challenges(store: &dyn Store, actor: &Actor) -> Result<Vec<Challenge>> {
    match actor.role {
        Role::Admin => store.list_challenges(None),
        Role::Externo => store.list_challenges(Some(&actor.user_id)),
        Role::Unsa => Err(Error::forbidden("only externo users own challenges")),
    }
}

/// Admins see every capacity, researchers see their own.
pub fn list_capacities(store: &dyn Store, actor: &Actor) -> Result<Vec<Capacity>> {
    match actor.role {
        Role::Admin => store.list_capacities(None),
        Role::Unsa => store.list_capacities(Some(&actor.user_id)),
        Role::Externo => Err(Error::forbidden("only unsa users own capacities")),
    }
}

/// Attaches a comma-separated keyword string to an existing entity in its own
/// transaction. Returns the number of new links.
pub fn resolve_and_link_keywords(
    store: &dyn Store,
    kind: EntityKind,
    entity_id: i64,
    raw: &str,
    increment_popularity: bool,
) -> Result<usize> {
    ensure_valid_id(entity_id, kind.as_str())?;
    store.link_keywords(kind, entity_id, raw, increment_popularity)
}

/// Owner-only keyword linking. Popularity moves only on the challenge side.
pub fn link_owned_keywords(
    store: &dyn Store,
    actor: &Actor,
    kind: EntityKind,
    entity_id: i64,
    raw: &str,
) -> Result<usize> {
    ensure_valid_id(entity_id, kind.as_str())?;
    let owner = owner_of(store, kind, entity_id)?;
    if owner != actor.user_id {
        return Err(Error::forbidden(format!("you do not own this {}", kind.as_str())));
    }

    let increment = kind == EntityKind::Challenge;
    resolve_and_link_keywords(store, kind, entity_id, raw, increment)
}

/// Most popular challenge keywords. `limit` defaults to
/// [`DEFAULT_STATS_LIMIT`] and is clamped to `1..=MAX_STATS_LIMIT`.
pub fn keyword_stats(store: &dyn Store, limit: Option<i32>) -> Result<Vec<KeywordStat>> {
    let limit = limit
        .unwrap_or(DEFAULT_STATS_LIMIT)
        .clamp(1, MAX_STATS_LIMIT);
    store.keyword_stats(limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use crate::types::User;
    use chrono::Utc;
    use tempfile::TempDir;

    fn setup() -> (TempDir, SqliteStore) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        for (id, role) in [
            ("ext", Role::Externo),
            ("ext-2", Role::Externo),
            ("res", Role::Unsa),
            ("root", Role::Admin),
        ] {
            store
                .create_user(&User {
                    id: id.to_string(),
                    role,
                    display_name: id.to_string(),
                    created_at: Utc::now(),
                })
                .unwrap();
        }
        (temp, store)
    }

    fn challenge(title: &str) -> NewChallenge {
        NewChallenge {
            title: title.to_string(),
            keywords: "agua, sensores".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_challenge_requires_externo() {
        let (_temp, store) = setup();
        let result = create_challenge(&store, &Actor::new("res", Role::Unsa), challenge("Water"));
        assert!(matches!(result, Err(Error::Forbidden(_))));
    }

    #[test]
    fn test_create_challenge_validates_title() {
        let (_temp, store) = setup();
        let ext = Actor::new("ext", Role::Externo);

        assert!(matches!(
            create_challenge(&store, &ext, challenge("   ")),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            create_challenge(&store, &ext, challenge(&"t".repeat(201))),
            Err(Error::Validation(_))
        ));
        let created = create_challenge(&store, &ext, challenge(&"t".repeat(200))).unwrap();
        assert_eq!(created.keywords, vec!["agua", "sensores"]);
    }

    #[test]
    fn test_blank_optional_fields_are_dropped() {
        let (_temp, store) = setup();
        let input = NewCapacity {
            description: "  Remote sensing lab ".to_string(),
            equipment: Some("   ".to_string()),
            internal_code: Some(" LAB-7 ".to_string()),
            ..Default::default()
        };

        let created = create_capacity(&store, &Actor::new("res", Role::Unsa), input).unwrap();
        assert_eq!(created.description, "Remote sensing lab");
        assert_eq!(created.equipment, None);
        assert_eq!(created.internal_code.as_deref(), Some("LAB-7"));
    }

    #[test]
    fn test_get_challenge_visibility() {
        let (_temp, store) = setup();
        let created =
            create_challenge(&store, &Actor::new("ext", Role::Externo), challenge("Water")).unwrap();

        assert!(get_challenge(&store, &Actor::new("ext", Role::Externo), created.id).is_ok());
        assert!(get_challenge(&store, &Actor::new("root", Role::Admin), created.id).is_ok());
        assert!(matches!(
            get_challenge(&store, &Actor::new("ext-2", Role::Externo), created.id),
            Err(Error::Forbidden(_))
        ));
        assert!(matches!(
            get_challenge(&store, &Actor::new("ext", Role::Externo), 0),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            get_challenge(&store, &Actor::new("ext", Role::Externo), 99),
            Err(Error::NotFound("challenge"))
        ));
    }

    #[test]
    fn test_list_challenges_scoped_by_role() {
        let (_temp, store) = setup();
        create_challenge(&store, &Actor::new("ext", Role::Externo), challenge("A")).unwrap();
        create_challenge(&store, &Actor::new("ext-2", Role::Externo), challenge("B")).unwrap();

        let own = list_challenges(&store, &Actor::new("ext", Role::Externo)).unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].title, "A");

        let all = list_challenges(&store, &Actor::new("root", Role::Admin)).unwrap();
        assert_eq!(all.len(), 2);

        assert!(list_challenges(&store, &Actor::new("res", Role::Unsa)).is_err());
    }

    #[test]
    fn test_link_owned_keywords() {
        let (_temp, store) = setup();
        let created =
            create_challenge(&store, &Actor::new("ext", Role::Externo), challenge("A")).unwrap();

        let linked = link_owned_keywords(
            &store,
            &Actor::new("ext", Role::Externo),
            EntityKind::Challenge,
            created.id,
            "agua, riego",
        )
        .unwrap();
        assert_eq!(linked, 1);

        let denied = link_owned_keywords(
            &store,
            &Actor::new("ext-2", Role::Externo),
            EntityKind::Challenge,
            created.id,
            "robots",
        );
        assert!(matches!(denied, Err(Error::Forbidden(_))));

        let missing = link_owned_keywords(
            &store,
            &Actor::new("res", Role::Unsa),
            EntityKind::Capacity,
            7,
            "robots",
        );
        assert!(matches!(missing, Err(Error::NotFound("capacity"))));
    }

    #[test]
    fn test_keyword_stats_limit_is_clamped() {
        let (_temp, store) = setup();
        let ext = Actor::new("ext", Role::Externo);
        create_challenge(&store, &ext, challenge("A")).unwrap();
        create_challenge(
            &store,
            &ext,
            NewChallenge {
                title: "B".to_string(),
                keywords: "agua".to_string(),
                ..Default::default()
            },
        )
        .unwrap();

        let stats = keyword_stats(&store, Some(0)).unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].text, "agua");
        assert_eq!(stats[0].challenge_popularity, 2);

        assert_eq!(keyword_stats(&store, None).unwrap().len(), 2);
        assert_eq!(keyword_stats(&store, Some(5000)).unwrap().len(), 2);
    }
}
