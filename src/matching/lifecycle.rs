//! Match request lifecycle.
//!
//! Creation and every transition read the `matches_enabled` toggle from the
//! store on each call. Admins may look at matches while the system is off but
//! can never open or answer one.

use super::ensure_valid_id;
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{
    Actor, MatchAction, MatchRequest, MatchState, MatchWithContext, NewMatch, Role,
};

pub(super) fn ensure_enabled(store: &dyn Store) -> Result<()> {
    if store.get_matches_enabled()? {
        Ok(())
    } else {
        Err(Error::SystemDisabled)
    }
}

pub fn get_system_enabled(store: &dyn Store) -> Result<bool> {
    store.get_matches_enabled()
}

pub fn set_system_enabled(store: &dyn Store, enabled: bool) -> Result<()> {
    store.set_matches_enabled(enabled)?;
    tracing::info!(
        "match system {}",
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

/// Opens a match request between a challenge and a capacity.
///
/// External participants request from their own challenge and researchers
/// from their own capacity; the owner of the other entity becomes the
/// recipient.
pub fn create_match(
    store: &dyn Store,
    actor: &Actor,
    challenge_id: i64,
    capacity_id: i64,
) -> Result<MatchRequest> {
    ensure_enabled(store)?;
    ensure_valid_id(challenge_id, "challenge")?;
    ensure_valid_id(capacity_id, "capacity")?;

    let challenge_owner = store
        .challenge_owner(challenge_id)?
        .ok_or(Error::NotFound("challenge"))?;
    let capacity_owner = store
        .capacity_owner(capacity_id)?
        .ok_or(Error::NotFound("capacity"))?;

    let recipient_user_id = match actor.role {
        Role::Externo if challenge_owner == actor.user_id => capacity_owner,
        Role::Externo => {
            return Err(Error::forbidden(
                "you can only request a match from a challenge you own",
            ));
        }
        Role::Unsa if capacity_owner == actor.user_id => challenge_owner,
        Role::Unsa => {
            return Err(Error::forbidden(
                "you can only request a match from a capacity you own",
            ));
        }
        Role::Admin => return Err(Error::forbidden("admins cannot open match requests")),
    };

    let state = MatchState::initial_for(actor.role)
        .ok_or_else(|| Error::forbidden("this role cannot open match requests"))?;

    let created = store.create_match(&NewMatch {
        challenge_id,
        capacity_id,
        requester_user_id: actor.user_id.clone(),
        recipient_user_id,
        state,
    })?;

    tracing::info!(
        "match {} opened by {} (challenge {}, capacity {}, {})",
        created.id,
        actor.user_id,
        challenge_id,
        capacity_id,
        created.state
    );
    Ok(created)
}

/// [`transition_match`] for an action given by its wire name.
///
/// The toggle is checked before the name is parsed, so a disabled system
/// reports itself even for a malformed action.
pub fn transition_match_by_name(
    store: &dyn Store,
    actor: &Actor,
    match_id: i64,
    action: &str,
) -> Result<MatchState> {
    ensure_enabled(store)?;
    let action = action.parse::<MatchAction>().map_err(Error::Validation)?;
    transition_match(store, actor, match_id, action)
}

/// Applies `action` to a pending match and returns the new state.
///
/// The update is conditional on the state read here, so a concurrent
/// transition makes this call fail with a conflict instead of overwriting.
pub fn transition_match(
    store: &dyn Store,
    actor: &Actor,
    match_id: i64,
    action: MatchAction,
) -> Result<MatchState> {
    ensure_enabled(store)?;
    ensure_valid_id(match_id, "match")?;

    let current = store.get_match(match_id)?.ok_or(Error::NotFound("match"))?;
    let party = current
        .party_of(&actor.user_id)
        .ok_or_else(|| Error::forbidden("you are not a party to this match"))?;

    let Some(next) = current.state.apply(action, party, actor.role) else {
        tracing::warn!(
            "denied {} on match {} by {} ({:?}, {}) in state {}",
            action,
            match_id,
            actor.user_id,
            party,
            actor.role,
            current.state
        );
        return Err(Error::forbidden(format!(
            "cannot {} a match in state {}",
            action, current.state
        )));
    };

    if store.update_match_state(match_id, current.state, next)? == 0 {
        return match store.get_match(match_id)? {
            None => Err(Error::NotFound("match")),
            Some(_) => Err(Error::conflict("the match was updated concurrently")),
        };
    }

    tracing::info!(
        "match {} moved {} -> {} by {}",
        match_id,
        current.state,
        next,
        actor.user_id
    );
    Ok(next)
}

/// Reads a single match. Admins bypass both the toggle and the party check.
pub fn get_match(store: &dyn Store, actor: &Actor, match_id: i64) -> Result<MatchRequest> {
    ensure_valid_id(match_id, "match")?;

    if actor.is_admin() {
        return store.get_match(match_id)?.ok_or(Error::NotFound("match"));
    }

    ensure_enabled(store)?;
    let found = store.get_match(match_id)?.ok_or(Error::NotFound("match"))?;
    if !found.involves(&actor.user_id) {
        return Err(Error::forbidden("you are not a party to this match"));
    }
    Ok(found)
}

/// Matches where the caller is requester or recipient, newest first.
pub fn list_matches_for_user(store: &dyn Store, actor: &Actor) -> Result<Vec<MatchWithContext>> {
    if !actor.is_admin() {
        ensure_enabled(store)?;
    }
    store.list_matches_for_user(&actor.user_id)
}

pub fn list_all_matches(store: &dyn Store, actor: &Actor) -> Result<Vec<MatchWithContext>> {
    if !actor.is_admin() {
        return Err(Error::forbidden("admin access required"));
    }
    store.list_all_matches()
}
