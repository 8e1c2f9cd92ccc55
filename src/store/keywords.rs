//! Keyword normalization and linking.
//!
//! Everything here runs on a connection handed in by the caller, which is
//! normally an open transaction. Nothing in this module commits or rolls
//! back; an error aborts the caller's whole unit of work.

use std::collections::HashSet;

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::Result;
use crate::types::{EntityKind, Keyword};

pub const MAX_KEYWORD_LEN: usize = 100;

/// Trims and lower-cases a keyword. Returns `None` for tokens that are empty
/// or longer than [`MAX_KEYWORD_LEN`] characters; those are dropped, not
/// reported.
pub fn normalize_keyword(raw: &str) -> Option<String> {
    let text = raw.trim().to_lowercase();
    let len = text.chars().count();
    if len == 0 || len > MAX_KEYWORD_LEN {
        return None;
    }
    Some(text)
}

/// Splits a comma-separated keyword string into unique normalized keywords,
/// keeping first-seen order.
pub fn split_keywords(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split(',')
        .filter_map(normalize_keyword)
        .filter(|k| seen.insert(k.clone()))
        .collect()
}

/// Looks up a normalized keyword, inserting it with a zero counter if absent.
pub(super) fn resolve_keyword(conn: &Connection, text: &str) -> Result<i64> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM keywords WHERE text = ?1",
            params![text],
            |row| row.get(0),
        )
        .optional()?;

    if let Some(id) = existing {
        return Ok(id);
    }

    conn.execute(
        "INSERT INTO keywords (text, challenge_popularity) VALUES (?1, 0)",
        params![text],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(super) fn bump_popularity(conn: &Connection, keyword_id: i64) -> Result<()> {
    conn.execute(
        "UPDATE keywords SET challenge_popularity = challenge_popularity + 1 WHERE id = ?1",
        params![keyword_id],
    )?;
    Ok(())
}

/// Links every keyword in `raw` to the entity. Returns how many new links
/// were written.
///
/// The popularity counter only moves when a new link row is written, so
/// linking the same text to the same entity twice counts once.
pub(super) fn attach_keywords(
    conn: &Connection,
    kind: EntityKind,
    entity_id: i64,
    raw: &str,
    increment_popularity: bool,
) -> Result<usize> {
    let insert_link = match kind {
        EntityKind::Challenge => {
            "INSERT OR IGNORE INTO challenge_keywords (challenge_id, keyword_id) VALUES (?1, ?2)"
        }
        EntityKind::Capacity => {
            "INSERT OR IGNORE INTO capacity_keywords (capacity_id, keyword_id) VALUES (?1, ?2)"
        }
    };

    let mut linked = 0;
    for text in split_keywords(raw) {
        let keyword_id = resolve_keyword(conn, &text)?;
        let inserted = conn.execute(insert_link, params![entity_id, keyword_id])?;
        if inserted == 0 {
            continue;
        }
        linked += 1;
        if increment_popularity {
            bump_popularity(conn, keyword_id)?;
        }
    }

    tracing::debug!(
        "linked {linked} new keyword(s) to {} {entity_id}",
        kind.as_str()
    );
    Ok(linked)
}

/// Keyword texts linked to an entity, alphabetical.
pub(super) fn load_keywords(conn: &Connection, kind: EntityKind, entity_id: i64) -> Result<Vec<String>> {
    let sql = match kind {
        EntityKind::Challenge => {
            "SELECT k.text FROM keywords k
             JOIN challenge_keywords ck ON ck.keyword_id = k.id
             WHERE ck.challenge_id = ?1
             ORDER BY k.text"
        }
        EntityKind::Capacity => {
            "SELECT k.text FROM keywords k
             JOIN capacity_keywords ck ON ck.keyword_id = k.id
             WHERE ck.capacity_id = ?1
             ORDER BY k.text"
        }
    };

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![entity_id], |row| row.get(0))?;
    Ok(rows.collect::<std::result::Result<Vec<String>, _>>()?)
}

pub(super) fn get_keyword(conn: &Connection, text: &str) -> Result<Option<Keyword>> {
    let Some(text) = normalize_keyword(text) else {
        return Ok(None);
    };
    Ok(conn
        .query_row(
            "SELECT id, text, challenge_popularity FROM keywords WHERE text = ?1",
            params![text],
            |row| {
                Ok(Keyword {
                    id: row.get(0)?,
                    text: row.get(1)?,
                    challenge_popularity: row.get(2)?,
                })
            },
        )
        .optional()?)
}
