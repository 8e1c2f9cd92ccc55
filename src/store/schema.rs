pub const SCHEMA: &str = r#"
-- Users are provisioned by an admin; registration lives outside this service
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    role TEXT NOT NULL CHECK (role IN ('externo', 'unsa', 'admin')),
    display_name TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Tokens are auth credentials bound to a user
CREATE TABLE IF NOT EXISTS tokens (
    id TEXT PRIMARY KEY,
    token_hash TEXT NOT NULL,          -- argon2id hash with embedded salt
    token_lookup TEXT NOT NULL,        -- first 8 chars of ID for fast lookup
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,

    -- Lifecycle
    created_at TEXT DEFAULT (datetime('now')),
    expires_at TEXT,            -- NULL = never
    last_used_at TEXT
);

-- Problems submitted by external participants
CREATE TABLE IF NOT EXISTS challenges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_user_id TEXT NOT NULL REFERENCES users(id),
    title TEXT NOT NULL,
    description TEXT,
    impact TEXT,
    prior_attempts TEXT,
    imagined_solution TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Research capabilities submitted by university researchers
CREATE TABLE IF NOT EXISTS capacities (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_user_id TEXT NOT NULL REFERENCES users(id),
    description TEXT NOT NULL,
    problems_addressed TEXT,
    project_types TEXT,
    equipment TEXT,
    internal_code TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Keywords are shared by both sides; popularity only counts challenge links
CREATE TABLE IF NOT EXISTS keywords (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    text TEXT NOT NULL UNIQUE CHECK (length(text) BETWEEN 1 AND 100),
    challenge_popularity INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS challenge_keywords (
    challenge_id INTEGER NOT NULL REFERENCES challenges(id) ON DELETE CASCADE,
    keyword_id INTEGER NOT NULL REFERENCES keywords(id),
    PRIMARY KEY (challenge_id, keyword_id)
);

CREATE TABLE IF NOT EXISTS capacity_keywords (
    capacity_id INTEGER NOT NULL REFERENCES capacities(id) ON DELETE CASCADE,
    keyword_id INTEGER NOT NULL REFERENCES keywords(id),
    PRIMARY KEY (capacity_id, keyword_id)
);

-- Match requests; a (challenge, capacity) pair can only ever be requested once
CREATE TABLE IF NOT EXISTS matches (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    challenge_id INTEGER NOT NULL REFERENCES challenges(id),
    capacity_id INTEGER NOT NULL REFERENCES capacities(id),
    requester_user_id TEXT NOT NULL REFERENCES users(id),
    recipient_user_id TEXT NOT NULL REFERENCES users(id),
    state TEXT NOT NULL CHECK (state IN (
        'pendiente_unsa', 'pendiente_externo', 'aceptado',
        'rechazado_unsa', 'rechazado_externo', 'cancelado'
    )),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,

    UNIQUE(challenge_id, capacity_id)
);

-- Chat messages, append-only apart from the read flag
CREATE TABLE IF NOT EXISTS match_messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    match_id INTEGER NOT NULL REFERENCES matches(id),
    sender_user_id TEXT NOT NULL REFERENCES users(id),
    content TEXT NOT NULL,
    sent_at TEXT NOT NULL,
    read INTEGER NOT NULL DEFAULT 0
);

-- Key/value system settings (matches_enabled, ...)
CREATE TABLE IF NOT EXISTS system_settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Create indexes
CREATE UNIQUE INDEX IF NOT EXISTS idx_tokens_lookup ON tokens(token_lookup);
CREATE INDEX IF NOT EXISTS idx_tokens_user ON tokens(user_id);
CREATE INDEX IF NOT EXISTS idx_challenges_owner ON challenges(owner_user_id);
CREATE INDEX IF NOT EXISTS idx_capacities_owner ON capacities(owner_user_id);
CREATE INDEX IF NOT EXISTS idx_challenge_keywords_keyword ON challenge_keywords(keyword_id);
CREATE INDEX IF NOT EXISTS idx_capacity_keywords_keyword ON capacity_keywords(keyword_id);
CREATE INDEX IF NOT EXISTS idx_matches_requester ON matches(requester_user_id);
CREATE INDEX IF NOT EXISTS idx_matches_recipient ON matches(recipient_user_id);
CREATE INDEX IF NOT EXISTS idx_match_messages_match ON match_messages(match_id, sent_at);
"#;
