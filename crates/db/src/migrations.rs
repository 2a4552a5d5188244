/// Inline SQL migrations for the plexpulse database schema.
///
/// We use simple inline migrations rather than sqlx migration files
/// because the schema is small and self-contained.

pub const MIGRATIONS: &[&str] = &[
    // Migration 1: session_history — one row per playback session
    r#"
CREATE TABLE IF NOT EXISTS session_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    reference_id INTEGER,
    user_id INTEGER NOT NULL,
    started INTEGER NOT NULL,
    stopped INTEGER,
    rating_key INTEGER NOT NULL,
    parent_rating_key INTEGER,
    grandparent_rating_key INTEGER,
    media_type TEXT NOT NULL,
    title TEXT NOT NULL DEFAULT '',
    platform TEXT NOT NULL DEFAULT '',
    player TEXT NOT NULL DEFAULT '',
    ip_address TEXT,
    section_id INTEGER,
    paused_counter INTEGER NOT NULL DEFAULT 0,
    view_offset INTEGER NOT NULL DEFAULT 0,
    duration INTEGER NOT NULL DEFAULT 0
);
"#,
    // Migration 2: session_history indexes
    r#"CREATE INDEX IF NOT EXISTS idx_history_user ON session_history(user_id);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_history_started ON session_history(started DESC);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_history_reference ON session_history(reference_id);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_history_rating_key ON session_history(rating_key);"#,
    // Migration 3: session_history_metadata — per-rating-key media metadata
    r#"
CREATE TABLE IF NOT EXISTS session_history_metadata (
    rating_key INTEGER PRIMARY KEY,
    full_title TEXT NOT NULL DEFAULT '',
    media_type TEXT NOT NULL DEFAULT '',
    year INTEGER,
    thumb TEXT,
    added_at INTEGER
);
"#,
    // Migration 4: users
    r#"
CREATE TABLE IF NOT EXISTS users (
    user_id INTEGER PRIMARY KEY,
    username TEXT NOT NULL,
    friendly_name TEXT,
    email TEXT,
    thumb TEXT,
    is_active INTEGER NOT NULL DEFAULT 1
);
"#,
    // Migration 5: library_sections
    r#"
CREATE TABLE IF NOT EXISTS library_sections (
    section_id INTEGER PRIMARY KEY,
    section_name TEXT NOT NULL,
    section_type TEXT NOT NULL,
    count INTEGER NOT NULL DEFAULT 0,
    is_active INTEGER NOT NULL DEFAULT 1
);
"#,
    // Migration 6: add transcode decision to history
    r#"ALTER TABLE session_history ADD COLUMN transcode_decision TEXT;"#,
];
