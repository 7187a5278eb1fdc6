//! The session cursor: the minimal per-user state driving the practice
//! loop across stateless requests (language pair + vocable in progress).

use crate::db::sqlite::Storage;
use crate::error::PivotError;
use crate::service::practice;
use serde::Serialize;
use tracing::debug;

/// What the client needs to render one practice prompt.
#[derive(Debug, Clone, Serialize)]
pub struct DueCard {
    pub vocable_id: i64,
    /// The vocable's text in the source language.
    pub prompt: String,
    pub source: String,
    pub target: String,
    /// Current mastery level in the target language.
    pub level: i64,
}

/// Persist the language pair for the practice loop. The target must differ
/// from the source; configuring also drops any vocable in progress.
pub async fn configure(
    storage: &Storage,
    user_id: i64,
    source_iso: &str,
    target_iso: &str,
) -> Result<(), PivotError> {
    if source_iso == target_iso {
        return Err(PivotError::Validation(
            "target language cannot equal source language".to_string(),
        ));
    }
    let source = storage
        .language_by_iso(source_iso)
        .await?
        .ok_or(PivotError::NotFound("language"))?;
    let target = storage
        .language_by_iso(target_iso)
        .await?
        .ok_or(PivotError::NotFound("language"))?;
    storage
        .set_cursor_languages(user_id, source.id, target.id)
        .await?;
    debug!(user_id, source = %source.iso, target = %target.iso, "practice configured");
    Ok(())
}

/// Run due-selection for the configured pair and store the winner as the
/// vocable in progress.
pub async fn advance(storage: &Storage, user_id: i64) -> Result<DueCard, PivotError> {
    let cursor = storage.cursor(user_id).await?;
    let (Some(source_id), Some(target_id)) = (cursor.source_language_id, cursor.target_language_id)
    else {
        return Err(PivotError::Validation(
            "practice is not configured".to_string(),
        ));
    };
    let source = storage
        .language_by_id(source_id)
        .await?
        .ok_or(PivotError::NotFound("language"))?;
    let target = storage
        .language_by_id(target_id)
        .await?
        .ok_or(PivotError::NotFound("language"))?;

    let vocable = practice::pick_due(storage, user_id, &source, &target).await?;
    let prompt = vocable
        .translations
        .get(&source.iso)
        .map(|t| t.text.clone())
        .ok_or(PivotError::NotFound("translation"))?;
    let level = vocable
        .translations
        .get(&target.iso)
        .map(|t| t.level)
        .unwrap_or(0);

    storage
        .set_cursor_vocable(user_id, vocable.id, level)
        .await?;
    Ok(DueCard {
        vocable_id: vocable.id,
        prompt,
        source: source.iso,
        target: target.iso,
        level,
    })
}

/// Reset all four cursor fields. Called at logout and exposed as an
/// explicit reset action.
pub async fn clear(storage: &Storage, user_id: i64) -> Result<(), PivotError> {
    storage.clear_cursor(user_id).await
}
