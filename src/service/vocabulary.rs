//! The vocable store: create, update, delete and list vocabulary entries.
//! Every mutation checks ownership against the requesting user.

use crate::db::models::DbVocable;
use crate::db::sqlite::Storage;
use crate::error::PivotError;
use std::collections::BTreeMap;

/// Resolve a `{iso: text}` map against the language catalog. Unknown codes
/// are a validation error; empty texts are kept so `update` can remove a
/// translation.
async fn resolve_entries(
    storage: &Storage,
    translations: &BTreeMap<String, String>,
) -> Result<Vec<(i64, String)>, PivotError> {
    let mut entries = Vec::with_capacity(translations.len());
    for (iso, text) in translations {
        let language = storage
            .language_by_iso(iso)
            .await?
            .ok_or_else(|| PivotError::Validation(format!("unknown language code `{iso}`")))?;
        entries.push((language.id, text.clone()));
    }
    Ok(entries)
}

/// Create a vocable from a `{iso: text}` map. Each non-empty text becomes
/// a translation row starting at level 0.
pub async fn create(
    storage: &Storage,
    user_id: i64,
    translations: &BTreeMap<String, String>,
) -> Result<DbVocable, PivotError> {
    let entries: Vec<(i64, String)> = resolve_entries(storage, translations)
        .await?
        .into_iter()
        .filter(|(_, text)| !text.is_empty())
        .collect();
    if entries.is_empty() {
        return Err(PivotError::Validation(
            "a vocable needs at least one non-empty translation".to_string(),
        ));
    }
    let vocable_id = storage.insert_vocable(user_id, &entries).await?;
    storage
        .vocable(vocable_id)
        .await?
        .ok_or(PivotError::NotFound("vocable"))
}

/// Update translation texts. Mastery levels of kept translations are
/// preserved; an empty text removes that language's translation.
pub async fn update(
    storage: &Storage,
    user_id: i64,
    vocable_id: i64,
    translations: &BTreeMap<String, String>,
) -> Result<DbVocable, PivotError> {
    let vocable = fetch_owned(storage, user_id, vocable_id).await?;
    let entries = resolve_entries(storage, translations).await?;

    // the update must not strip the last translation
    let mut remaining: std::collections::BTreeSet<&str> =
        vocable.translations.keys().map(String::as_str).collect();
    for (iso, text) in translations {
        if text.is_empty() {
            remaining.remove(iso.as_str());
        } else {
            remaining.insert(iso.as_str());
        }
    }
    if remaining.is_empty() {
        return Err(PivotError::Validation(
            "a vocable needs at least one non-empty translation".to_string(),
        ));
    }
    storage.upsert_translations(vocable_id, &entries).await?;
    storage
        .vocable(vocable_id)
        .await?
        .ok_or(PivotError::NotFound("vocable"))
}

/// Delete a vocable; its translations and practice records cascade.
pub async fn remove(storage: &Storage, user_id: i64, vocable_id: i64) -> Result<(), PivotError> {
    let _ = fetch_owned(storage, user_id, vocable_id).await?;
    storage.delete_vocable(vocable_id).await
}

/// Fetch a vocable, rejecting access to another user's entry.
pub async fn fetch_owned(
    storage: &Storage,
    user_id: i64,
    vocable_id: i64,
) -> Result<DbVocable, PivotError> {
    let vocable = storage
        .vocable(vocable_id)
        .await?
        .ok_or(PivotError::NotFound("vocable"))?;
    if vocable.user_id != user_id {
        return Err(PivotError::PermissionDenied);
    }
    Ok(vocable)
}

pub async fn page(
    storage: &Storage,
    user_id: i64,
    page: u32,
    per_page: u32,
) -> Result<(Vec<DbVocable>, i64), PivotError> {
    let page = page.max(1);
    let offset = i64::from(page - 1) * i64::from(per_page);
    let items = storage
        .vocables_page(user_id, i64::from(per_page), offset)
        .await?;
    let total = storage.count_vocables(user_id).await?;
    Ok((items, total))
}
