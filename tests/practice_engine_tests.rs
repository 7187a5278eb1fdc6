use polypivot::config::{CONFIG, LANGUAGES};
use polypivot::error::PivotError;
use polypivot::service::{accounts, practice, session, vocabulary};
use polypivot::Storage;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use std::fs;

async fn open_storage(tag: &str) -> (Storage, PathBuf) {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();

    let mut temp_path = std::env::temp_dir();
    temp_path.push(format!(
        "polypivot-{tag}-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));

    let storage = Storage::connect(&format!("sqlite:{}", temp_path.display()))
        .await
        .expect("failed to open database");
    storage.init_schema().await.expect("failed to init schema");
    storage
        .seed_languages(LANGUAGES)
        .await
        .expect("failed to seed languages");
    (storage, temp_path)
}

async fn create_user(storage: &Storage, username: &str) -> i64 {
    let user_id = storage
        .create_user(username, &format!("{username}@example.com"), "hash")
        .await
        .expect("failed to create user");
    storage
        .ensure_cursor(user_id)
        .await
        .expect("failed to create cursor");
    user_id
}

async fn add_vocable(storage: &Storage, user_id: i64, pairs: &[(&str, &str)]) -> i64 {
    let translations: BTreeMap<String, String> = pairs
        .iter()
        .map(|(iso, text)| (iso.to_string(), text.to_string()))
        .collect();
    vocabulary::create(storage, user_id, &translations)
        .await
        .expect("failed to create vocable")
        .id
}

#[tokio::test]
async fn grading_walks_the_level_between_floor_and_cap() {
    let (storage, path) = open_storage("leveling").await;
    let user_id = create_user(&storage, "tester").await;
    let vocable_id = add_vocable(&storage, user_id, &[("en", "hello"), ("de", "hallo")]).await;

    session::configure(&storage, user_id, "en", "de")
        .await
        .expect("configure failed");
    let card = session::advance(&storage, user_id).await.expect("advance failed");
    assert_eq!(card.vocable_id, vocable_id);
    assert_eq!(card.prompt, "hello");
    assert_eq!(card.level, 0);

    // correct answer: 0 -> 1
    let outcome = practice::grade(&storage, user_id, "hallo").await.expect("grade failed");
    assert!(outcome.correct);
    assert_eq!(outcome.level, 1);
    assert_eq!(outcome.expected, "hallo");

    // wrong answer at level 1 stays at the floor
    let outcome = practice::grade(&storage, user_id, "xxx").await.expect("grade failed");
    assert!(!outcome.correct);
    assert_eq!(outcome.level, 1);

    // correct again: 1 -> 2
    let outcome = practice::grade(&storage, user_id, "hallo").await.expect("grade failed");
    assert!(outcome.correct);
    assert_eq!(outcome.level, 2);

    // ten consecutive correct answers cap at 6
    let mut level = outcome.level;
    for _ in 0..10 {
        level = practice::grade(&storage, user_id, "hallo")
            .await
            .expect("grade failed")
            .level;
    }
    assert_eq!(level, 6);

    // one ledger row per graded attempt, first one correct
    let log = storage.practice_log(vocable_id).await.expect("ledger read failed");
    assert_eq!(log.len(), 13);
    assert!(log[0].correct);
    assert!(!log[1].correct);

    let _ = fs::remove_file(&path);
}

#[tokio::test]
async fn comparison_is_case_sensitive() {
    let (storage, path) = open_storage("case").await;
    let user_id = create_user(&storage, "tester").await;
    add_vocable(&storage, user_id, &[("en", "hello"), ("de", "Hallo")]).await;

    session::configure(&storage, user_id, "en", "de")
        .await
        .expect("configure failed");
    session::advance(&storage, user_id).await.expect("advance failed");

    let outcome = practice::grade(&storage, user_id, "hallo").await.expect("grade failed");
    assert!(!outcome.correct);
    let outcome = practice::grade(&storage, user_id, "Hallo").await.expect("grade failed");
    assert!(outcome.correct);

    let _ = fs::remove_file(&path);
}

#[tokio::test]
async fn never_practiced_vocable_is_selected_first() {
    let (storage, path) = open_storage("due-order").await;
    let user_id = create_user(&storage, "tester").await;

    // insert the practiced vocable first so insertion order cannot explain
    // the outcome
    let practiced = add_vocable(&storage, user_id, &[("en", "dog"), ("fr", "chien")]).await;
    let fresh = add_vocable(&storage, user_id, &[("en", "cat"), ("fr", "chat")]).await;

    session::configure(&storage, user_id, "en", "fr")
        .await
        .expect("configure failed");
    let card = session::advance(&storage, user_id).await.expect("advance failed");
    assert_eq!(card.vocable_id, practiced);
    practice::grade(&storage, user_id, "chien").await.expect("grade failed");

    let card = session::advance(&storage, user_id).await.expect("advance failed");
    assert_eq!(card.vocable_id, fresh);

    // once both have history, the least recently practiced wins
    practice::grade(&storage, user_id, "chat").await.expect("grade failed");
    let card = session::advance(&storage, user_id).await.expect("advance failed");
    assert_eq!(card.vocable_id, practiced);

    let _ = fs::remove_file(&path);
}

#[tokio::test]
async fn due_selection_needs_text_in_both_languages() {
    let (storage, path) = open_storage("due-filter").await;
    let user_id = create_user(&storage, "tester").await;

    add_vocable(&storage, user_id, &[("en", "house")]).await;
    let complete = add_vocable(&storage, user_id, &[("en", "tree"), ("de", "Baum")]).await;
    add_vocable(&storage, user_id, &[("de", "Tisch")]).await;

    session::configure(&storage, user_id, "en", "de")
        .await
        .expect("configure failed");
    let card = session::advance(&storage, user_id).await.expect("advance failed");
    assert_eq!(card.vocable_id, complete);

    vocabulary::remove(&storage, user_id, complete)
        .await
        .expect("delete failed");
    let err = session::advance(&storage, user_id).await.unwrap_err();
    assert!(matches!(err, PivotError::NothingDue));

    let _ = fs::remove_file(&path);
}

#[tokio::test]
async fn configure_rejects_equal_languages_and_leaves_cursor_unchanged() {
    let (storage, path) = open_storage("config").await;
    let user_id = create_user(&storage, "tester").await;

    let err = session::configure(&storage, user_id, "en", "en")
        .await
        .unwrap_err();
    assert!(matches!(err, PivotError::Validation(_)));

    let cursor = storage.cursor(user_id).await.expect("cursor read failed");
    assert_eq!(cursor.source_language_id, None);
    assert_eq!(cursor.target_language_id, None);

    let err = session::configure(&storage, user_id, "en", "xx")
        .await
        .unwrap_err();
    assert!(matches!(err, PivotError::NotFound("language")));

    let _ = fs::remove_file(&path);
}

#[tokio::test]
async fn clear_resets_all_cursor_fields() {
    let (storage, path) = open_storage("clear").await;
    let user_id = create_user(&storage, "tester").await;
    add_vocable(&storage, user_id, &[("en", "hello"), ("de", "hallo")]).await;

    session::configure(&storage, user_id, "en", "de")
        .await
        .expect("configure failed");
    session::advance(&storage, user_id).await.expect("advance failed");
    let cursor = storage.cursor(user_id).await.expect("cursor read failed");
    assert!(cursor.vocable_id.is_some());

    session::clear(&storage, user_id).await.expect("clear failed");
    let cursor = storage.cursor(user_id).await.expect("cursor read failed");
    assert_eq!(cursor.source_language_id, None);
    assert_eq!(cursor.target_language_id, None);
    assert_eq!(cursor.vocable_id, None);
    assert_eq!(cursor.vocable_level, None);

    let _ = fs::remove_file(&path);
}

#[tokio::test]
async fn foreign_vocables_are_rejected() {
    let (storage, path) = open_storage("ownership").await;
    let owner = create_user(&storage, "owner").await;
    let intruder = create_user(&storage, "intruder").await;
    let vocable_id = add_vocable(&storage, owner, &[("en", "hello"), ("de", "hallo")]).await;

    let err = vocabulary::fetch_owned(&storage, intruder, vocable_id)
        .await
        .unwrap_err();
    assert!(matches!(err, PivotError::PermissionDenied));

    let err = vocabulary::remove(&storage, intruder, vocable_id)
        .await
        .unwrap_err();
    assert!(matches!(err, PivotError::PermissionDenied));

    // a cursor pointed at someone else's vocable must not grade it
    session::configure(&storage, intruder, "en", "de")
        .await
        .expect("configure failed");
    storage
        .set_cursor_vocable(intruder, vocable_id, 0)
        .await
        .expect("cursor write failed");
    let err = practice::grade(&storage, intruder, "hallo").await.unwrap_err();
    assert!(matches!(err, PivotError::PermissionDenied));
    assert!(storage
        .practice_log(vocable_id)
        .await
        .expect("ledger read failed")
        .is_empty());

    let _ = fs::remove_file(&path);
}

#[tokio::test]
async fn updating_text_preserves_level_and_delete_cascades_the_ledger() {
    let (storage, path) = open_storage("update").await;
    let user_id = create_user(&storage, "tester").await;
    let vocable_id = add_vocable(&storage, user_id, &[("en", "hello"), ("de", "hallo")]).await;

    session::configure(&storage, user_id, "en", "de")
        .await
        .expect("configure failed");
    session::advance(&storage, user_id).await.expect("advance failed");
    practice::grade(&storage, user_id, "hallo").await.expect("grade failed");

    let mut changes = BTreeMap::new();
    changes.insert("de".to_string(), "hallo!".to_string());
    let vocable = vocabulary::update(&storage, user_id, vocable_id, &changes)
        .await
        .expect("update failed");
    let de = vocable.translations.get("de").expect("missing translation");
    assert_eq!(de.text, "hallo!");
    assert_eq!(de.level, 1);

    // empty text removes the translation; other languages stay
    changes.insert("de".to_string(), String::new());
    let vocable = vocabulary::update(&storage, user_id, vocable_id, &changes)
        .await
        .expect("update failed");
    assert!(!vocable.translations.contains_key("de"));
    assert!(vocable.translations.contains_key("en"));

    vocabulary::remove(&storage, user_id, vocable_id)
        .await
        .expect("delete failed");
    assert!(storage
        .practice_log(vocable_id)
        .await
        .expect("ledger read failed")
        .is_empty());

    let _ = fs::remove_file(&path);
}

#[tokio::test]
async fn rejected_profile_update_is_not_partially_applied() {
    let (storage, path) = open_storage("profile-atomic").await;
    let user_id = create_user(&storage, "alice").await;
    let user = storage
        .user_by_id(user_id)
        .await
        .expect("lookup failed")
        .expect("user missing");

    // an unknown language code must fail the whole request, including the
    // rename that rode along with it
    let err = accounts::update_profile(
        &storage,
        &user,
        Some("alice_renamed"),
        None,
        Some(&["zz".to_string()]),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PivotError::Validation(_)));

    let user = storage
        .user_by_id(user_id)
        .await
        .expect("lookup failed")
        .expect("user missing");
    assert_eq!(user.username, "alice");
    assert!(storage
        .user_languages(user_id)
        .await
        .expect("languages read failed")
        .is_empty());

    let _ = fs::remove_file(&path);
}

#[tokio::test]
async fn about_me_can_be_set_kept_and_cleared() {
    let (storage, path) = open_storage("about-me").await;
    let user_id = create_user(&storage, "alice").await;
    let user = storage
        .user_by_id(user_id)
        .await
        .expect("lookup failed")
        .expect("user missing");

    accounts::update_profile(&storage, &user, None, Some("polyglot in training"), None)
        .await
        .expect("update failed");
    let user = storage
        .user_by_id(user_id)
        .await
        .expect("lookup failed")
        .expect("user missing");
    assert_eq!(user.about_me.as_deref(), Some("polyglot in training"));

    // None keeps the text, an empty string clears it
    accounts::update_profile(&storage, &user, Some("alice2"), None, None)
        .await
        .expect("update failed");
    let user = storage
        .user_by_id(user_id)
        .await
        .expect("lookup failed")
        .expect("user missing");
    assert_eq!(user.about_me.as_deref(), Some("polyglot in training"));

    accounts::update_profile(&storage, &user, None, Some(""), None)
        .await
        .expect("update failed");
    let user = storage
        .user_by_id(user_id)
        .await
        .expect("lookup failed")
        .expect("user missing");
    assert_eq!(user.about_me, None);

    let _ = fs::remove_file(&path);
}

#[tokio::test]
async fn update_cannot_strip_the_last_translation() {
    let (storage, path) = open_storage("last-translation").await;
    let user_id = create_user(&storage, "tester").await;
    let vocable_id = add_vocable(&storage, user_id, &[("en", "hello")]).await;

    let mut changes = BTreeMap::new();
    changes.insert("en".to_string(), String::new());
    let err = vocabulary::update(&storage, user_id, vocable_id, &changes)
        .await
        .unwrap_err();
    assert!(matches!(err, PivotError::Validation(_)));
    let vocable = vocabulary::fetch_owned(&storage, user_id, vocable_id)
        .await
        .expect("fetch failed");
    assert_eq!(
        vocable.translations.get("en").map(|t| t.text.as_str()),
        Some("hello")
    );

    // swapping the only translation for another language is fine
    changes.insert("de".to_string(), "hallo".to_string());
    let vocable = vocabulary::update(&storage, user_id, vocable_id, &changes)
        .await
        .expect("update failed");
    assert!(!vocable.translations.contains_key("en"));
    assert_eq!(
        vocable.translations.get("de").map(|t| t.text.as_str()),
        Some("hallo")
    );

    let _ = fs::remove_file(&path);
}

#[tokio::test]
async fn configure_creates_the_cursor_row_when_missing() {
    let (storage, path) = open_storage("cursor-upsert").await;
    // bypass the register path, so no cursor row exists yet
    let user_id = storage
        .create_user("loner", "loner@example.com", "hash")
        .await
        .expect("failed to create user");

    session::configure(&storage, user_id, "en", "de")
        .await
        .expect("configure failed");
    let cursor = storage.cursor(user_id).await.expect("cursor read failed");
    assert!(cursor.source_language_id.is_some());
    assert!(cursor.target_language_id.is_some());
    assert_eq!(cursor.vocable_id, None);

    let _ = fs::remove_file(&path);
}

#[tokio::test]
async fn vocabulary_pages_never_exceed_the_configured_size() {
    let (storage, path) = open_storage("vocab-pages").await;
    let user_id = create_user(&storage, "tester").await;
    let per_page = CONFIG.vocables_per_page;

    for i in 0..=per_page {
        add_vocable(&storage, user_id, &[("en", &format!("word {i}"))]).await;
    }

    let (items, total) = vocabulary::page(&storage, user_id, 1, per_page)
        .await
        .expect("page read failed");
    assert_eq!(items.len(), per_page as usize);
    assert_eq!(total, i64::from(per_page) + 1);

    let (items, _) = vocabulary::page(&storage, user_id, 2, per_page)
        .await
        .expect("page read failed");
    assert_eq!(items.len(), 1);

    let _ = fs::remove_file(&path);
}

#[tokio::test]
async fn histogram_zero_fills_all_levels() {
    let (storage, path) = open_storage("stats").await;
    let user_id = create_user(&storage, "tester").await;
    add_vocable(&storage, user_id, &[("en", "hello"), ("de", "hallo")]).await;
    add_vocable(&storage, user_id, &[("en", "tree"), ("de", "Baum")]).await;

    let language = storage
        .language_by_iso("de")
        .await
        .expect("lookup failed")
        .expect("language missing");
    let levels = practice::level_histogram(&storage, user_id, &language)
        .await
        .expect("histogram failed");
    assert_eq!(levels.len(), 7);
    assert_eq!(levels[0], (0, 2));
    for lvl in 1..=6 {
        assert_eq!(levels[lvl as usize], (lvl, 0));
    }

    let _ = fs::remove_file(&path);
}
