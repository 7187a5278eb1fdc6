//! SQL DDL for initializing the vocabulary storage.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema:
/// - `translation` is the explicit (vocable, language) -> text/level mapping;
///   a missing row means "not yet translated into this language"
/// - `practice` is the append-only attempt ledger, indexed by
///   (vocable_id, language_id, timestamp) for the due-selection query
/// - `session` holds the per-user practice cursor, one row per user
/// - timestamps are RFC3339 text in UTC
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS user (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    about_me TEXT NULL,
    last_seen TEXT NULL
);

CREATE TABLE IF NOT EXISTS language (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    iso TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS user_language (
    user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
    language_id INTEGER NOT NULL REFERENCES language(id) ON DELETE CASCADE,
    PRIMARY KEY (user_id, language_id)
);

CREATE TABLE IF NOT EXISTS vocable (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS translation (
    vocable_id INTEGER NOT NULL REFERENCES vocable(id) ON DELETE CASCADE,
    language_id INTEGER NOT NULL REFERENCES language(id),
    text TEXT NOT NULL,
    level INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (vocable_id, language_id)
);

CREATE TABLE IF NOT EXISTS practice (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    vocable_id INTEGER NOT NULL REFERENCES vocable(id) ON DELETE CASCADE,
    language_id INTEGER NOT NULL REFERENCES language(id),
    correct INTEGER NOT NULL,
    timestamp TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_practice_vocable_language_timestamp
    ON practice(vocable_id, language_id, timestamp);

CREATE TABLE IF NOT EXISTS session (
    user_id INTEGER PRIMARY KEY REFERENCES user(id) ON DELETE CASCADE,
    source_language_id INTEGER NULL,
    target_language_id INTEGER NULL,
    vocable_id INTEGER NULL,
    vocable_level INTEGER NULL
);

CREATE TABLE IF NOT EXISTS post (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
    body TEXT NOT NULL,
    timestamp TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_post_timestamp ON post(timestamp);
"#;
