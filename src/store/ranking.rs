//! Keyword-overlap ranking between challenges and capacities.

use std::collections::BTreeMap;

use rusqlite::{Connection, params};

use crate::error::Result;
use crate::types::{EntityKind, RankedMatch};

/// One shared keyword between the source entity and a candidate.
struct OverlapRow {
    other_id: i64,
    keyword: String,
    summary: String,
    owner_name: Option<String>,
}

const CAPACITIES_FOR_CHALLENGE: &str = "
    SELECT c.id, k.text, c.description, u.display_name
    FROM challenge_keywords src
    JOIN capacity_keywords other ON other.keyword_id = src.keyword_id
    JOIN keywords k ON k.id = src.keyword_id
    JOIN capacities c ON c.id = other.capacity_id
    LEFT JOIN users u ON u.id = c.owner_user_id
    WHERE src.challenge_id = ?1";

const CHALLENGES_FOR_CAPACITY: &str = "
    SELECT d.id, k.text, d.title, u.display_name
    FROM capacity_keywords src
    JOIN challenge_keywords other ON other.keyword_id = src.keyword_id
    JOIN keywords k ON k.id = src.keyword_id
    JOIN challenges d ON d.id = other.challenge_id
    LEFT JOIN users u ON u.id = d.owner_user_id
    WHERE src.capacity_id = ?1";

/// Ranks the entities of the opposite kind by how many distinct keywords they
/// share with `entity_id`.
///
/// Ordered by score descending, then id ascending. An entity with no keywords
/// or no overlap yields an empty list.
pub(super) fn rank(conn: &Connection, kind: EntityKind, entity_id: i64) -> Result<Vec<RankedMatch>> {
    let sql = match kind {
        EntityKind::Challenge => CAPACITIES_FOR_CHALLENGE,
        EntityKind::Capacity => CHALLENGES_FOR_CAPACITY,
    };

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![entity_id], |row| {
        Ok(OverlapRow {
            other_id: row.get(0)?,
            keyword: row.get(1)?,
            summary: row.get(2)?,
            owner_name: row.get(3)?,
        })
    })?;
    let rows = rows.collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(aggregate(rows))
}

fn aggregate(rows: Vec<OverlapRow>) -> Vec<RankedMatch> {
    struct Candidate {
        keywords: Vec<String>,
        summary: String,
        owner_name: Option<String>,
    }

    let mut by_id: BTreeMap<i64, Candidate> = BTreeMap::new();
    for row in rows {
        let entry = by_id.entry(row.other_id).or_insert_with(|| Candidate {
            keywords: Vec::new(),
            summary: row.summary,
            owner_name: row.owner_name,
        });
        entry.keywords.push(row.keyword);
    }

    let mut ranked: Vec<RankedMatch> = by_id
        .into_iter()
        .map(|(other_id, mut candidate)| {
            candidate.keywords.sort();
            candidate.keywords.dedup();
            RankedMatch {
                other_id,
                score: candidate.keywords.len() as i64,
                matched_keywords: candidate.keywords.join(", "),
                summary: candidate.summary,
                owner_name: candidate.owner_name,
            }
        })
        .collect();

    // BTreeMap iteration already yields ascending ids, and the sort is stable.
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
}
