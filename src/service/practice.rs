//! Leveling state machine and due-selection.
//!
//! Each (vocable, language) pair carries a bounded integer mastery level.
//! Grading walks that level up or down by one: correct answers cap at
//! [`MAX_LVL`], wrong answers floor at [`MIN_LVL`]. Level 0 means "never
//! practiced" and is only produced by initialization; a wrong answer at 0
//! leaves it at 0.

use crate::db::models::{DbLanguage, DbVocable};
use crate::db::sqlite::Storage;
use crate::error::PivotError;
use serde::Serialize;
use tracing::debug;

pub const MIN_LVL: i64 = 1;
pub const MAX_LVL: i64 = 6;

/// One step of the bounded walk.
pub fn next_level(current: i64, correct: bool) -> i64 {
    if correct {
        (current + 1).min(MAX_LVL)
    } else if current > MIN_LVL {
        current - 1
    } else {
        current
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GradeOutcome {
    pub correct: bool,
    /// The expected answer, returned for caller display regardless of
    /// the outcome.
    pub expected: String,
    /// The vocable's level in the target language after grading.
    pub level: i64,
}

/// Grade the answer for the cursor's current vocable against its text in
/// the cursor's target language. Comparison is case-sensitive and
/// untrimmed. The level update and the ledger append commit atomically.
pub async fn grade(
    storage: &Storage,
    user_id: i64,
    answer: &str,
) -> Result<GradeOutcome, PivotError> {
    let cursor = storage.cursor(user_id).await?;
    let target_language_id = cursor
        .target_language_id
        .ok_or_else(|| PivotError::Validation("practice is not configured".to_string()))?;
    let vocable_id = cursor.vocable_id.ok_or_else(|| {
        PivotError::Validation("no vocable selected; request the next one first".to_string())
    })?;

    let vocable = storage
        .vocable(vocable_id)
        .await?
        .ok_or(PivotError::NotFound("vocable"))?;
    if vocable.user_id != user_id {
        return Err(PivotError::PermissionDenied);
    }
    let target = storage
        .language_by_id(target_language_id)
        .await?
        .ok_or(PivotError::NotFound("language"))?;
    let translation = vocable
        .translations
        .get(&target.iso)
        .ok_or(PivotError::NotFound("translation"))?;

    let correct = answer == translation.text;
    let level = next_level(translation.level, correct);
    storage
        .apply_grade(vocable_id, target_language_id, level, correct)
        .await?;

    debug!(vocable_id, target = %target.iso, correct, level, "graded attempt");
    Ok(GradeOutcome {
        correct,
        expected: translation.text.clone(),
        level,
    })
}

/// Pick the vocable most overdue for practice in the target language among
/// those translated in both languages. `NothingDue` is recoverable: the
/// caller should send the user to add vocabulary.
pub async fn pick_due(
    storage: &Storage,
    user_id: i64,
    source: &DbLanguage,
    target: &DbLanguage,
) -> Result<DbVocable, PivotError> {
    let vocable_id = storage
        .pick_due_vocable(user_id, source.id, target.id)
        .await?
        .ok_or(PivotError::NothingDue)?;
    storage
        .vocable(vocable_id)
        .await?
        .ok_or(PivotError::NotFound("vocable"))
}

/// Vocable counts per level (0..=MAX_LVL, zero-filled) for one language.
pub async fn level_histogram(
    storage: &Storage,
    user_id: i64,
    language: &DbLanguage,
) -> Result<Vec<(i64, i64)>, PivotError> {
    let raw = storage.level_histogram(user_id, language.id).await?;
    let mut filled: Vec<(i64, i64)> = (0..=MAX_LVL).map(|lvl| (lvl, 0)).collect();
    for (level, count) in raw {
        if (0..=MAX_LVL).contains(&level) {
            filled[level as usize].1 = count;
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_answers_climb_to_the_cap() {
        assert_eq!(next_level(0, true), 1);
        assert_eq!(next_level(1, true), 2);
        assert_eq!(next_level(5, true), 6);
        assert_eq!(next_level(MAX_LVL, true), MAX_LVL);
    }

    #[test]
    fn wrong_answers_floor_at_one() {
        assert_eq!(next_level(6, false), 5);
        assert_eq!(next_level(2, false), 1);
        assert_eq!(next_level(1, false), 1);
        // level 0 is pre-practice state; a wrong answer does not move it
        assert_eq!(next_level(0, false), 0);
    }

    #[test]
    fn level_stays_in_bounds_over_any_walk() {
        let mut level = 0;
        for (i, correct) in [true, false, true, true, false, true, true, true, true, true]
            .into_iter()
            .cycle()
            .take(100)
            .enumerate()
        {
            level = next_level(level, correct);
            assert!((0..=MAX_LVL).contains(&level), "step {i} left bounds: {level}");
        }
    }
}
