use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::Store;
use super::keywords;
use super::ranking;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

const MATCHES_ENABLED_KEY: &str = "matches_enabled";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

/// Fixed-width UTC timestamps so that text ordering matches time ordering.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn role_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Role> {
    let value: String = row.get(idx)?;
    Role::parse(&value).ok_or_else(|| conversion_error(idx, format!("unknown role '{value}'")))
}

fn state_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<MatchState> {
    let value: String = row.get(idx)?;
    MatchState::parse(&value)
        .ok_or_else(|| conversion_error(idx, format!("unknown match state '{value}'")))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}

const USER_COLUMNS: &str = "id, role, display_name, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        role: role_column(row, 1)?,
        display_name: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
    })
}

const TOKEN_COLUMNS: &str =
    "id, token_hash, token_lookup, user_id, created_at, expires_at, last_used_at";

fn token_from_row(row: &Row<'_>) -> rusqlite::Result<Token> {
    Ok(Token {
        id: row.get(0)?,
        token_hash: row.get(1)?,
        token_lookup: row.get(2)?,
        user_id: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
        expires_at: row.get::<_, Option<String>>(5)?.map(|s| parse_datetime(&s)),
        last_used_at: row.get::<_, Option<String>>(6)?.map(|s| parse_datetime(&s)),
    })
}

const CHALLENGE_COLUMNS: &str =
    "id, owner_user_id, title, description, impact, prior_attempts, imagined_solution, created_at";

fn challenge_from_row(row: &Row<'_>) -> rusqlite::Result<Challenge> {
    Ok(Challenge {
        id: row.get(0)?,
        owner_user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        impact: row.get(4)?,
        prior_attempts: row.get(5)?,
        imagined_solution: row.get(6)?,
        created_at: parse_datetime(&row.get::<_, String>(7)?),
        keywords: Vec::new(),
    })
}

const CAPACITY_COLUMNS: &str = "id, owner_user_id, description, problems_addressed, project_types, equipment, internal_code, created_at";

fn capacity_from_row(row: &Row<'_>) -> rusqlite::Result<Capacity> {
    Ok(Capacity {
        id: row.get(0)?,
        owner_user_id: row.get(1)?,
        description: row.get(2)?,
        problems_addressed: row.get(3)?,
        project_types: row.get(4)?,
        equipment: row.get(5)?,
        internal_code: row.get(6)?,
        created_at: parse_datetime(&row.get::<_, String>(7)?),
        keywords: Vec::new(),
    })
}

const MATCH_COLUMNS: &str = "m.id, m.challenge_id, m.capacity_id, m.requester_user_id, m.recipient_user_id, m.state, m.created_at, m.updated_at";

fn match_from_row(row: &Row<'_>) -> rusqlite::Result<MatchRequest> {
    Ok(MatchRequest {
        id: row.get(0)?,
        challenge_id: row.get(1)?,
        capacity_id: row.get(2)?,
        requester_user_id: row.get(3)?,
        recipient_user_id: row.get(4)?,
        state: state_column(row, 5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
        updated_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}

fn match_with_context_from_row(row: &Row<'_>) -> rusqlite::Result<MatchWithContext> {
    Ok(MatchWithContext {
        request: match_from_row(row)?,
        challenge_title: row.get(8)?,
        capacity_summary: row.get(9)?,
        requester_name: row.get(10)?,
        recipient_name: row.get(11)?,
    })
}

const MESSAGE_SELECT: &str = "
    SELECT msg.id, msg.match_id, msg.sender_user_id, u.display_name, msg.content, msg.sent_at, msg.read
    FROM match_messages msg
    LEFT JOIN users u ON u.id = msg.sender_user_id";

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MatchMessage> {
    Ok(MatchMessage {
        id: row.get(0)?,
        match_id: row.get(1)?,
        sender_user_id: row.get(2)?,
        sender_name: row.get(3)?,
        content: row.get(4)?,
        sent_at: parse_datetime(&row.get::<_, String>(5)?),
        read: row.get(6)?,
    })
}

fn load_challenge(conn: &Connection, id: i64) -> Result<Option<Challenge>> {
    let challenge = conn
        .query_row(
            &format!("SELECT {CHALLENGE_COLUMNS} FROM challenges WHERE id = ?1"),
            params![id],
            challenge_from_row,
        )
        .optional()?;

    match challenge {
        Some(mut challenge) => {
            challenge.keywords = keywords::load_keywords(conn, EntityKind::Challenge, id)?;
            Ok(Some(challenge))
        }
        None => Ok(None),
    }
}

fn load_capacity(conn: &Connection, id: i64) -> Result<Option<Capacity>> {
    let capacity = conn
        .query_row(
            &format!("SELECT {CAPACITY_COLUMNS} FROM capacities WHERE id = ?1"),
            params![id],
            capacity_from_row,
        )
        .optional()?;

    match capacity {
        Some(mut capacity) => {
            capacity.keywords = keywords::load_keywords(conn, EntityKind::Capacity, id)?;
            Ok(Some(capacity))
        }
        None => Ok(None),
    }
}

fn load_match(conn: &Connection, id: i64) -> Result<Option<MatchRequest>> {
    conn.query_row(
        &format!("SELECT {MATCH_COLUMNS} FROM matches m WHERE m.id = ?1"),
        params![id],
        match_from_row,
    )
    .optional()
    .map_err(Error::from)
}

fn entity_exists(conn: &Connection, kind: EntityKind, id: i64) -> Result<bool> {
    let sql = match kind {
        EntityKind::Challenge => "SELECT COUNT(*) FROM challenges WHERE id = ?1",
        EntityKind::Capacity => "SELECT COUNT(*) FROM capacities WHERE id = ?1",
    };
    let count: i64 = conn.query_row(sql, params![id], |row| row.get(0))?;
    Ok(count > 0)
}

fn insert_user(conn: &Connection, user: &User) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, role, display_name, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            user.id,
            user.role.as_str(),
            user.display_name,
            format_datetime(&user.created_at),
        ],
    )?;
    Ok(())
}

fn insert_token(conn: &Connection, token: &Token) -> Result<()> {
    let result = conn.execute(
        "INSERT INTO tokens (id, token_hash, token_lookup, user_id, created_at, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            token.id,
            token.token_hash,
            token.token_lookup,
            token.user_id,
            format_datetime(&token.created_at),
            token.expires_at.as_ref().map(format_datetime),
        ],
    );

    match result {
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e) => Err(Error::TokenLookupCollision),
        Err(e) => Err(Error::from(e)),
    }
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // User operations

    fn create_user(&self, user: &User) -> Result<()> {
        insert_user(&self.conn(), user)
    }

    fn create_user_with_token(&self, user: &User, token: &Token) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        insert_user(&tx, user)?;
        insert_token(&tx, token)?;
        tx.commit()?;
        Ok(())
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_users(&self, cursor: &str, limit: i32) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id > ?1 ORDER BY id LIMIT ?2"
        ))?;

        let rows = stmt.query_map(params![cursor, limit], user_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn has_admin_user(&self) -> Result<bool> {
        let conn = self.conn();
        let count: i32 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE role = 'admin'",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // Token operations

    fn create_token(&self, token: &Token) -> Result<()> {
        insert_token(&self.conn(), token)
    }

    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {TOKEN_COLUMNS} FROM tokens WHERE token_lookup = ?1"),
            params![lookup],
            token_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn update_token_last_used(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE tokens SET last_used_at = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(())
    }

    // Challenge operations

    fn create_challenge(&self, owner_user_id: &str, challenge: &NewChallenge) -> Result<Challenge> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO challenges (owner_user_id, title, description, impact, prior_attempts, imagined_solution, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                owner_user_id,
                challenge.title,
                challenge.description,
                challenge.impact,
                challenge.prior_attempts,
                challenge.imagined_solution,
                format_datetime(&Utc::now()),
            ],
        )?;
        let id = tx.last_insert_rowid();

        keywords::attach_keywords(&tx, EntityKind::Challenge, id, &challenge.keywords, true)?;

        let created = load_challenge(&tx, id)?.ok_or(Error::NotFound("challenge"))?;
        tx.commit()?;
        Ok(created)
    }

    fn get_challenge(&self, id: i64) -> Result<Option<Challenge>> {
        load_challenge(&self.conn(), id)
    }

    fn list_challenges(&self, owner_user_id: Option<&str>) -> Result<Vec<Challenge>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {CHALLENGE_COLUMNS} FROM challenges
             WHERE ?1 IS NULL OR owner_user_id = ?1
             ORDER BY created_at DESC, id DESC"
        ))?;

        let mut challenges = stmt
            .query_map(params![owner_user_id], challenge_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for challenge in &mut challenges {
            challenge.keywords =
                keywords::load_keywords(&conn, EntityKind::Challenge, challenge.id)?;
        }
        Ok(challenges)
    }

    fn challenge_owner(&self, id: i64) -> Result<Option<String>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT owner_user_id FROM challenges WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()
        .map_err(Error::from)
    }

    // Capacity operations

    fn create_capacity(&self, owner_user_id: &str, capacity: &NewCapacity) -> Result<Capacity> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO capacities (owner_user_id, description, problems_addressed, project_types, equipment, internal_code, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                owner_user_id,
                capacity.description,
                capacity.problems_addressed,
                capacity.project_types,
                capacity.equipment,
                capacity.internal_code,
                format_datetime(&Utc::now()),
            ],
        )?;
        let id = tx.last_insert_rowid();

        keywords::attach_keywords(&tx, EntityKind::Capacity, id, &capacity.keywords, false)?;

        let created = load_capacity(&tx, id)?.ok_or(Error::NotFound("capacity"))?;
        tx.commit()?;
        Ok(created)
    }

    fn get_capacity(&self, id: i64) -> Result<Option<Capacity>> {
        load_capacity(&self.conn(), id)
    }

    fn list_capacities(&self, owner_user_id: Option<&str>) -> Result<Vec<Capacity>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {CAPACITY_COLUMNS} FROM capacities
             WHERE ?1 IS NULL OR owner_user_id = ?1
             ORDER BY created_at DESC, id DESC"
        ))?;

        let mut capacities = stmt
            .query_map(params![owner_user_id], capacity_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for capacity in &mut capacities {
            capacity.keywords = keywords::load_keywords(&conn, EntityKind::Capacity, capacity.id)?;
        }
        Ok(capacities)
    }

    fn capacity_owner(&self, id: i64) -> Result<Option<String>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT owner_user_id FROM capacities WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()
        .map_err(Error::from)
    }

    // Keyword operations

    fn link_keywords(
        &self,
        kind: EntityKind,
        entity_id: i64,
        raw: &str,
        increment_popularity: bool,
    ) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        if !entity_exists(&tx, kind, entity_id)? {
            return Err(Error::NotFound(kind.as_str()));
        }

        let linked = keywords::attach_keywords(&tx, kind, entity_id, raw, increment_popularity)?;
        tx.commit()?;
        Ok(linked)
    }

    fn get_keyword(&self, text: &str) -> Result<Option<Keyword>> {
        keywords::get_keyword(&self.conn(), text)
    }

    fn keyword_stats(&self, limit: i32) -> Result<Vec<KeywordStat>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT text, challenge_popularity FROM keywords
             WHERE challenge_popularity > 0
             ORDER BY challenge_popularity DESC, text ASC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit], |row| {
            Ok(KeywordStat {
                text: row.get(0)?,
                challenge_popularity: row.get(1)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn rank_matches(&self, kind: EntityKind, entity_id: i64) -> Result<Vec<RankedMatch>> {
        ranking::rank(&self.conn(), kind, entity_id)
    }

    // Match operations

    fn create_match(&self, new_match: &NewMatch) -> Result<MatchRequest> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let now = format_datetime(&Utc::now());

        let result = tx.execute(
            "INSERT INTO matches (challenge_id, capacity_id, requester_user_id, recipient_user_id, state, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                new_match.challenge_id,
                new_match.capacity_id,
                new_match.requester_user_id,
                new_match.recipient_user_id,
                new_match.state.as_str(),
                now,
            ],
        );

        match result {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(Error::conflict(
                    "a match request already exists for this challenge and capacity",
                ));
            }
            Err(e) if is_foreign_key_violation(&e) => {
                return Err(Error::NotFound("challenge, capacity or user"));
            }
            Err(e) => return Err(Error::from(e)),
        }

        let id = tx.last_insert_rowid();
        let created = load_match(&tx, id)?.ok_or(Error::NotFound("match"))?;
        tx.commit()?;
        Ok(created)
    }

    fn get_match(&self, id: i64) -> Result<Option<MatchRequest>> {
        load_match(&self.conn(), id)
    }

    fn list_matches_for_user(&self, user_id: &str) -> Result<Vec<MatchWithContext>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {MATCH_COLUMNS}, d.title, substr(c.description, 1, 100), req.display_name, rec.display_name
             FROM matches m
             JOIN challenges d ON d.id = m.challenge_id
             JOIN capacities c ON c.id = m.capacity_id
             JOIN users req ON req.id = m.requester_user_id
             JOIN users rec ON rec.id = m.recipient_user_id
             WHERE m.requester_user_id = ?1 OR m.recipient_user_id = ?1
             ORDER BY m.updated_at DESC, m.id DESC"
        ))?;

        let rows = stmt.query_map(params![user_id], match_with_context_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_all_matches(&self) -> Result<Vec<MatchWithContext>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {MATCH_COLUMNS}, d.title, substr(c.description, 1, 100), req.display_name, rec.display_name
             FROM matches m
             JOIN challenges d ON d.id = m.challenge_id
             JOIN capacities c ON c.id = m.capacity_id
             JOIN users req ON req.id = m.requester_user_id
             JOIN users rec ON rec.id = m.recipient_user_id
             ORDER BY m.updated_at DESC, m.id DESC"
        ))?;

        let rows = stmt.query_map([], match_with_context_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_match_state(&self, id: i64, expected: MatchState, next: MatchState) -> Result<usize> {
        let rows = self.conn().execute(
            "UPDATE matches SET state = ?1, updated_at = ?2 WHERE id = ?3 AND state = ?4",
            params![
                next.as_str(),
                format_datetime(&Utc::now()),
                id,
                expected.as_str()
            ],
        )?;
        Ok(rows)
    }

    // System toggle

    fn get_matches_enabled(&self) -> Result<bool> {
        let conn = self.conn();
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM system_settings WHERE key = ?1",
                params![MATCHES_ENABLED_KEY],
                |row| row.get(0),
            )
            .optional()?;

        Ok(matches!(value.as_deref(), Some("1") | Some("true")))
    }

    fn set_matches_enabled(&self, enabled: bool) -> Result<()> {
        self.conn().execute(
            "INSERT INTO system_settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![MATCHES_ENABLED_KEY, if enabled { "1" } else { "0" }],
        )?;
        Ok(())
    }

    // Message operations

    fn create_message(&self, match_id: i64, sender_user_id: &str, content: &str) -> Result<MatchMessage> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO match_messages (match_id, sender_user_id, content, sent_at, read)
             VALUES (?1, ?2, ?3, ?4, 0)",
            params![
                match_id,
                sender_user_id,
                content,
                format_datetime(&Utc::now())
            ],
        )?;
        let id = tx.last_insert_rowid();

        let message = tx
            .query_row(
                &format!("{MESSAGE_SELECT} WHERE msg.id = ?1"),
                params![id],
                message_from_row,
            )
            .optional()?
            .ok_or(Error::NotFound("message"))?;
        tx.commit()?;
        Ok(message)
    }

    fn list_messages(&self, match_id: i64) -> Result<Vec<MatchMessage>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "{MESSAGE_SELECT} WHERE msg.match_id = ?1 ORDER BY msg.sent_at ASC, msg.id ASC"
        ))?;

        let rows = stmt.query_map(params![match_id], message_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn mark_messages_read(&self, match_id: i64, reader_user_id: &str) -> Result<usize> {
        let rows = self.conn().execute(
            "UPDATE match_messages SET read = 1
             WHERE match_id = ?1 AND sender_user_id <> ?2 AND read = 0",
            params![match_id, reader_user_id],
        )?;
        Ok(rows)
    }
}
