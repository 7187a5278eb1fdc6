use crate::db::models::{DbCursor, DbLanguage, DbPost, DbPractice, DbUser, DbVocable, Translation};
use crate::db::schema::SQLITE_INIT;
use crate::error::PivotError;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::collections::BTreeMap;
use std::str::FromStr;

pub type SqlitePool = Pool<Sqlite>;

#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the SQLite database behind `database_url`.
    /// Foreign keys are enabled so vocable deletion cascades its
    /// translations and practice records.
    pub async fn connect(database_url: &str) -> Result<Self, PivotError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), PivotError> {
        // execute multiple statements safely (SQLite supports multi-commands but sqlx::query doesn't)
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Idempotently insert the language catalog. Returns how many rows
    /// were actually created.
    pub async fn seed_languages(&self, catalog: &[(&str, &str)]) -> Result<u64, PivotError> {
        let mut created = 0;
        for &(iso, name) in catalog {
            let res = sqlx::query("INSERT OR IGNORE INTO language (iso, name) VALUES (?, ?)")
                .bind(iso)
                .bind(name)
                .execute(&self.pool)
                .await?;
            created += res.rows_affected();
        }
        Ok(created)
    }

    // ---- users ----

    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<i64, PivotError> {
        let res = sqlx::query("INSERT INTO user (username, email, password_hash) VALUES (?, ?, ?)")
            .bind(username)
            .bind(email)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(res.last_insert_rowid())
    }

    pub async fn user_by_id(&self, id: i64) -> Result<Option<DbUser>, PivotError> {
        let row = sqlx::query(
            "SELECT id, username, email, password_hash, about_me, last_seen FROM user WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_user).transpose()
    }

    pub async fn user_by_username(&self, username: &str) -> Result<Option<DbUser>, PivotError> {
        let row = sqlx::query(
            "SELECT id, username, email, password_hash, about_me, last_seen FROM user WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_user).transpose()
    }

    pub async fn touch_last_seen(&self, id: i64) -> Result<(), PivotError> {
        sqlx::query("UPDATE user SET last_seen = ? WHERE id = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Update the profile fields and, when given, replace the set of
    /// studied languages. One transaction: a failure leaves neither the
    /// rename nor a half-replaced language set behind.
    pub async fn update_profile(
        &self,
        id: i64,
        username: &str,
        about_me: Option<&str>,
        language_ids: Option<&[i64]>,
    ) -> Result<(), PivotError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE user SET username = ?, about_me = ? WHERE id = ?")
            .bind(username)
            .bind(about_me)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if let Some(language_ids) = language_ids {
            sqlx::query("DELETE FROM user_language WHERE user_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            for lang_id in language_ids {
                sqlx::query("INSERT INTO user_language (user_id, language_id) VALUES (?, ?)")
                    .bind(id)
                    .bind(lang_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn user_languages(&self, user_id: i64) -> Result<Vec<DbLanguage>, PivotError> {
        let rows = sqlx::query(
            r#"SELECT l.id, l.iso, l.name FROM language l
               JOIN user_language ul ON ul.language_id = l.id
               WHERE ul.user_id = ? ORDER BY l.iso"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_language).collect()
    }

    // ---- languages ----

    pub async fn list_languages(&self) -> Result<Vec<DbLanguage>, PivotError> {
        let rows = sqlx::query("SELECT id, iso, name FROM language ORDER BY iso")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Self::row_to_language).collect()
    }

    pub async fn language_by_iso(&self, iso: &str) -> Result<Option<DbLanguage>, PivotError> {
        let row = sqlx::query("SELECT id, iso, name FROM language WHERE iso = ?")
            .bind(iso)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_language).transpose()
    }

    pub async fn language_by_id(&self, id: i64) -> Result<Option<DbLanguage>, PivotError> {
        let row = sqlx::query("SELECT id, iso, name FROM language WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_language).transpose()
    }

    // ---- vocables ----

    /// Insert a vocable plus one translation row (level 0) per entry.
    /// Returns the new vocable id.
    pub async fn insert_vocable(
        &self,
        user_id: i64,
        entries: &[(i64, String)],
    ) -> Result<i64, PivotError> {
        let mut tx = self.pool.begin().await?;
        let res = sqlx::query("INSERT INTO vocable (user_id) VALUES (?)")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        let vocable_id = res.last_insert_rowid();
        for (language_id, text) in entries {
            sqlx::query("INSERT INTO translation (vocable_id, language_id, text) VALUES (?, ?, ?)")
                .bind(vocable_id)
                .bind(language_id)
                .bind(text)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(vocable_id)
    }

    /// Upsert translation texts for a vocable. Levels of existing rows are
    /// preserved; an empty text removes the translation.
    pub async fn upsert_translations(
        &self,
        vocable_id: i64,
        entries: &[(i64, String)],
    ) -> Result<(), PivotError> {
        let mut tx = self.pool.begin().await?;
        for (language_id, text) in entries {
            if text.is_empty() {
                sqlx::query("DELETE FROM translation WHERE vocable_id = ? AND language_id = ?")
                    .bind(vocable_id)
                    .bind(language_id)
                    .execute(&mut *tx)
                    .await?;
            } else {
                sqlx::query(
                    r#"INSERT INTO translation (vocable_id, language_id, text)
                       VALUES (?, ?, ?)
                       ON CONFLICT(vocable_id, language_id) DO UPDATE SET text = excluded.text"#,
                )
                .bind(vocable_id)
                .bind(language_id)
                .bind(text)
                .execute(&mut *tx)
                .await?;
            }
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn delete_vocable(&self, vocable_id: i64) -> Result<(), PivotError> {
        sqlx::query("DELETE FROM vocable WHERE id = ?")
            .bind(vocable_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn vocable(&self, vocable_id: i64) -> Result<Option<DbVocable>, PivotError> {
        let row = sqlx::query("SELECT user_id FROM vocable WHERE id = ?")
            .bind(vocable_id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let user_id: i64 = row.try_get("user_id")?;
        let translations = self.translations_of(vocable_id).await?;
        Ok(Some(DbVocable {
            id: vocable_id,
            user_id,
            translations,
        }))
    }

    async fn translations_of(
        &self,
        vocable_id: i64,
    ) -> Result<BTreeMap<String, Translation>, PivotError> {
        let rows = sqlx::query(
            r#"SELECT l.iso, t.text, t.level FROM translation t
               JOIN language l ON l.id = t.language_id
               WHERE t.vocable_id = ?"#,
        )
        .bind(vocable_id)
        .fetch_all(&self.pool)
        .await?;
        let mut translations = BTreeMap::new();
        for row in rows {
            let iso: String = row.try_get("iso")?;
            let text: String = row.try_get("text")?;
            let level: i64 = row.try_get("level")?;
            translations.insert(iso, Translation { text, level });
        }
        Ok(translations)
    }

    pub async fn vocables_page(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DbVocable>, PivotError> {
        let rows = sqlx::query("SELECT id FROM vocable WHERE user_id = ? ORDER BY id LIMIT ? OFFSET ?")
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        let mut vocables = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.try_get("id")?;
            let translations = self.translations_of(id).await?;
            vocables.push(DbVocable {
                id,
                user_id,
                translations,
            });
        }
        Ok(vocables)
    }

    pub async fn count_vocables(&self, user_id: i64) -> Result<i64, PivotError> {
        let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM vocable WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(rec.0)
    }

    // ---- practice ----

    /// The due-selection query: among the user's vocables translated in both
    /// languages, pick the one least recently practiced in the target
    /// language. Never-practiced vocables sort first (SQLite orders NULLs
    /// first on ASC); ties break by vocable id.
    pub async fn pick_due_vocable(
        &self,
        user_id: i64,
        source_language_id: i64,
        target_language_id: i64,
    ) -> Result<Option<i64>, PivotError> {
        let row = sqlx::query(
            r#"SELECT v.id
               FROM vocable v
               JOIN translation src ON src.vocable_id = v.id
                    AND src.language_id = ? AND src.text <> ''
               JOIN translation tgt ON tgt.vocable_id = v.id
                    AND tgt.language_id = ? AND tgt.text <> ''
               LEFT JOIN (
                    SELECT vocable_id, MAX(timestamp) AS last_practiced
                    FROM practice
                    WHERE language_id = ?
                    GROUP BY vocable_id
               ) seen ON seen.vocable_id = v.id
               WHERE v.user_id = ?
               ORDER BY seen.last_practiced ASC, v.id ASC
               LIMIT 1"#,
        )
        .bind(source_language_id)
        .bind(target_language_id)
        .bind(target_language_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| r.try_get::<i64, _>("id").map_err(PivotError::from))
            .transpose()
    }

    /// Persist one graded attempt: the translation's new level and the
    /// ledger row commit in a single transaction, so no partial state is
    /// observable after a crash.
    pub async fn apply_grade(
        &self,
        vocable_id: i64,
        language_id: i64,
        new_level: i64,
        correct: bool,
    ) -> Result<(), PivotError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE translation SET level = ? WHERE vocable_id = ? AND language_id = ?")
            .bind(new_level)
            .bind(vocable_id)
            .bind(language_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "INSERT INTO practice (vocable_id, language_id, correct, timestamp) VALUES (?, ?, ?, ?)",
        )
        .bind(vocable_id)
        .bind(language_id)
        .bind(if correct { 1 } else { 0 })
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn practice_log(&self, vocable_id: i64) -> Result<Vec<DbPractice>, PivotError> {
        let rows = sqlx::query(
            r#"SELECT id, vocable_id, language_id, correct, timestamp
               FROM practice WHERE vocable_id = ? ORDER BY id"#,
        )
        .bind(vocable_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_practice).collect()
    }

    /// Vocable counts per level for one language of one user. Levels with
    /// no vocables are absent from the result; the service layer zero-fills.
    pub async fn level_histogram(
        &self,
        user_id: i64,
        language_id: i64,
    ) -> Result<Vec<(i64, i64)>, PivotError> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            r#"SELECT t.level, COUNT(*) FROM translation t
               JOIN vocable v ON v.id = t.vocable_id
               WHERE v.user_id = ? AND t.language_id = ?
               GROUP BY t.level"#,
        )
        .bind(user_id)
        .bind(language_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ---- session cursor ----

    /// Create the cursor row for a new user, all fields empty.
    pub async fn ensure_cursor(&self, user_id: i64) -> Result<(), PivotError> {
        sqlx::query("INSERT OR IGNORE INTO session (user_id) VALUES (?)")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn cursor(&self, user_id: i64) -> Result<DbCursor, PivotError> {
        let row = sqlx::query(
            r#"SELECT source_language_id, target_language_id, vocable_id, vocable_level
               FROM session WHERE user_id = ?"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(DbCursor {
                source_language_id: row.try_get("source_language_id")?,
                target_language_id: row.try_get("target_language_id")?,
                vocable_id: row.try_get("vocable_id")?,
                vocable_level: row.try_get("vocable_level")?,
            }),
            None => Ok(DbCursor::default()),
        }
    }

    /// Configure the language pair; also resets the vocable-in-progress.
    /// Upserts so the configure takes effect even if the registration-time
    /// cursor row is missing.
    pub async fn set_cursor_languages(
        &self,
        user_id: i64,
        source_language_id: i64,
        target_language_id: i64,
    ) -> Result<(), PivotError> {
        sqlx::query(
            r#"INSERT INTO session (user_id, source_language_id, target_language_id, vocable_id, vocable_level)
               VALUES (?, ?, ?, NULL, NULL)
               ON CONFLICT(user_id) DO UPDATE SET
                   source_language_id = excluded.source_language_id,
                   target_language_id = excluded.target_language_id,
                   vocable_id = NULL,
                   vocable_level = NULL"#,
        )
        .bind(user_id)
        .bind(source_language_id)
        .bind(target_language_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_cursor_vocable(
        &self,
        user_id: i64,
        vocable_id: i64,
        vocable_level: i64,
    ) -> Result<(), PivotError> {
        sqlx::query("UPDATE session SET vocable_id = ?, vocable_level = ? WHERE user_id = ?")
            .bind(vocable_id)
            .bind(vocable_level)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn clear_cursor(&self, user_id: i64) -> Result<(), PivotError> {
        sqlx::query(
            r#"UPDATE session SET source_language_id = NULL, target_language_id = NULL,
               vocable_id = NULL, vocable_level = NULL WHERE user_id = ?"#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ---- posts ----

    pub async fn insert_post(&self, user_id: i64, body: &str) -> Result<i64, PivotError> {
        let res = sqlx::query("INSERT INTO post (user_id, body, timestamp) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(body)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(res.last_insert_rowid())
    }

    pub async fn posts_page(&self, limit: i64, offset: i64) -> Result<Vec<DbPost>, PivotError> {
        let rows = sqlx::query(
            r#"SELECT p.id, p.body, p.timestamp, u.username FROM post p
               JOIN user u ON u.id = p.user_id
               ORDER BY p.timestamp DESC, p.id DESC LIMIT ? OFFSET ?"#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_post).collect()
    }

    pub async fn posts_of_user(&self, user_id: i64) -> Result<Vec<DbPost>, PivotError> {
        let rows = sqlx::query(
            r#"SELECT p.id, p.body, p.timestamp, u.username FROM post p
               JOIN user u ON u.id = p.user_id
               WHERE p.user_id = ? ORDER BY p.timestamp DESC, p.id DESC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_post).collect()
    }

    pub async fn count_posts(&self) -> Result<i64, PivotError> {
        let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM post")
            .fetch_one(&self.pool)
            .await?;
        Ok(rec.0)
    }

    // ---- row mapping ----

    fn row_to_user(row: SqliteRow) -> Result<DbUser, PivotError> {
        let last_seen: Option<String> = row.try_get("last_seen")?;
        Ok(DbUser {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            about_me: row.try_get("about_me")?,
            last_seen: last_seen.map(|s| Self::parse_ts(&s)).transpose()?,
        })
    }

    fn row_to_language(row: SqliteRow) -> Result<DbLanguage, PivotError> {
        Ok(DbLanguage {
            id: row.try_get("id")?,
            iso: row.try_get("iso")?,
            name: row.try_get("name")?,
        })
    }

    fn row_to_post(row: SqliteRow) -> Result<DbPost, PivotError> {
        let ts: String = row.try_get("timestamp")?;
        Ok(DbPost {
            id: row.try_get("id")?,
            body: row.try_get("body")?,
            author: row.try_get("username")?,
            timestamp: Self::parse_ts(&ts)?,
        })
    }

    fn row_to_practice(row: SqliteRow) -> Result<DbPractice, PivotError> {
        let ts: String = row.try_get("timestamp")?;
        let correct: i64 = row.try_get("correct")?;
        Ok(DbPractice {
            id: row.try_get("id")?,
            vocable_id: row.try_get("vocable_id")?,
            language_id: row.try_get("language_id")?,
            correct: correct != 0,
            timestamp: Self::parse_ts(&ts)?,
        })
    }

    fn parse_ts(s: &str) -> Result<DateTime<Utc>, PivotError> {
        Ok(DateTime::parse_from_rfc3339(s)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?
            .with_timezone(&Utc))
    }
}
