use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DbUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub about_me: Option<String>,
    pub last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DbLanguage {
    pub id: i64,
    pub iso: String,
    pub name: String,
}

/// One translation of a vocable: the text in a given language and the
/// per-language mastery level (0 = never practiced, 1..=6 otherwise).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Translation {
    pub text: String,
    pub level: i64,
}

/// A vocabulary entry with its translations keyed by ISO code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DbVocable {
    pub id: i64,
    pub user_id: i64,
    pub translations: BTreeMap<String, Translation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DbPost {
    pub id: i64,
    pub body: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
}

/// The per-user practice cursor. All four payload fields are null when the
/// cursor is cleared; languages are stored by catalog id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DbCursor {
    pub source_language_id: Option<i64>,
    pub target_language_id: Option<i64>,
    pub vocable_id: Option<i64>,
    pub vocable_level: Option<i64>,
}

/// One row of the append-only practice ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DbPractice {
    pub id: i64,
    pub vocable_id: i64,
    pub language_id: i64,
    pub correct: bool,
    pub timestamp: DateTime<Utc>,
}
