use super::ensure_valid_id;
use super::entities::owner_of;
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Actor, EntityKind, RankedMatch};

/// Ranks the opposite side against `entity_id` by shared keyword count.
///
/// Read-only. Works whether or not the match system is enabled, and returns an
/// empty list for an entity without overlap. Unknown entities are `NotFound`.
pub fn rank_matches(store: &dyn Store, kind: EntityKind, entity_id: i64) -> Result<Vec<RankedMatch>> {
    ensure_valid_id(entity_id, kind.as_str())?;
    owner_of(store, kind, entity_id)?;
    store.rank_matches(kind, entity_id)
}

/// [`rank_matches`] for the entity's owner or an admin.
pub fn rank_matches_for(
    store: &dyn Store,
    actor: &Actor,
    kind: EntityKind,
    entity_id: i64,
) -> Result<Vec<RankedMatch>> {
    ensure_valid_id(entity_id, kind.as_str())?;
    let owner = owner_of(store, kind, entity_id)?;
    if !actor.is_admin() && owner != actor.user_id {
        return Err(Error::forbidden(format!("you do not own this {}", kind.as_str())));
    }
    store.rank_matches(kind, entity_id)
}
