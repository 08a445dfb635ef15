//! Integration tests for the file-backed task store.
//! Each test gets its own temp data dir; the durable file is plain JSON we can
//! inspect and corrupt directly.

use taskd::store::{StoreError, TaskStore};
use taskd::tasks::TaskPatch;
use tempfile::TempDir;

fn make_store() -> (TaskStore, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = TaskStore::new(dir.path());
    (store, dir)
}

#[tokio::test]
async fn create_then_list_contains_exactly_the_new_task() {
    let (store, _dir) = make_store();

    let task = store.create("  Buy milk  ", None).await.unwrap();
    assert_eq!(task.title, "Buy milk", "title is trimmed");
    assert!(!task.completed, "completed defaults to false");
    assert!(!task.id.is_empty());

    let tasks = store.list().await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0], task);
}

#[tokio::test]
async fn ids_are_unique_and_insertion_order_is_preserved() {
    let (store, _dir) = make_store();

    let a = store.create("first", None).await.unwrap();
    let b = store.create("second", None).await.unwrap();
    assert_ne!(a.id, b.id);

    let tasks = store.list().await.unwrap();
    let titles: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["first", "second"]);
}

#[tokio::test]
async fn create_with_blank_title_fails_validation_and_appends_nothing() {
    let (store, _dir) = make_store();
    store.create("anchor", None).await.unwrap();
    let before = store.list().await.unwrap();

    for bad in ["", "   "] {
        let err = store.create(bad, None).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)), "got {err:?}");
    }

    let after = store.list().await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn patch_and_delete_with_unknown_id_fail_not_found() {
    let (store, _dir) = make_store();
    store.create("anchor", None).await.unwrap();
    let before = store.list().await.unwrap();

    let err = store
        .patch("no-such-id", &TaskPatch::completed(true))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound));

    let err = store.delete("no-such-id").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound));

    assert_eq!(store.list().await.unwrap(), before);
}

#[tokio::test]
async fn invalid_title_rejects_the_whole_patch() {
    let (store, _dir) = make_store();
    let task = store.create("Buy milk", None).await.unwrap();

    // Both fields present, title invalid — completed must not be applied.
    let patch = TaskPatch {
        title: Some("   ".to_string()),
        completed: Some(true),
    };
    let err = store.patch(&task.id, &patch).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    let tasks = store.list().await.unwrap();
    assert_eq!(tasks[0].title, "Buy milk");
    assert!(!tasks[0].completed, "no partial apply");
}

#[tokio::test]
async fn list_is_idempotent() {
    let (store, _dir) = make_store();
    store.create("one", None).await.unwrap();
    store.create("two", None).await.unwrap();

    let first = store.list().await.unwrap();
    let second = store.list().await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn create_patch_list_round_trip() {
    let (store, _dir) = make_store();
    let task = store.create("Buy milk", None).await.unwrap();

    let updated = store
        .patch(&task.id, &TaskPatch::completed(true))
        .await
        .unwrap();
    assert!(updated.completed);
    assert_eq!(updated.title, "Buy milk");

    let tasks = store.list().await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert!(tasks[0].completed);
    assert_eq!(tasks[0].title, "Buy milk");
}

#[tokio::test]
async fn patch_can_retitle() {
    let (store, _dir) = make_store();
    let task = store.create("Buy milk", None).await.unwrap();

    let updated = store
        .patch(&task.id, &TaskPatch::title("  Buy oat milk  "))
        .await
        .unwrap();
    assert_eq!(updated.title, "Buy oat milk", "patched title is trimmed");
    assert!(!updated.completed);
}

#[tokio::test]
async fn delete_returns_the_removed_task() {
    let (store, _dir) = make_store();
    let task = store.create("Buy milk", None).await.unwrap();

    let removed = store.delete(&task.id).await.unwrap();
    assert_eq!(removed, task);
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn corrupt_file_heals_to_empty_and_stays_readable() {
    let (store, _dir) = make_store();
    tokio::fs::write(store.path(), "{not json at all").await.unwrap();

    assert!(store.list().await.unwrap().is_empty());

    // The repair write happened: the raw document now parses as [].
    let raw = tokio::fs::read_to_string(store.path()).await.unwrap();
    let parsed: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
    assert!(parsed.is_empty());

    // Normal operation resumes.
    store.create("after repair", None).await.unwrap();
    assert_eq!(store.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn empty_and_whitespace_files_read_as_empty() {
    let (store, _dir) = make_store();
    tokio::fs::write(store.path(), "   \n").await.unwrap();
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn bom_prefixed_file_parses() {
    let (store, _dir) = make_store();
    let doc = "\u{feff}[{\"id\":\"x1\",\"title\":\"Buy milk\",\"completed\":true}]";
    tokio::fs::write(store.path(), doc).await.unwrap();

    let tasks = store.list().await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, "x1");
    assert!(tasks[0].completed);
}

#[tokio::test]
async fn collection_survives_store_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let task = {
        let store = TaskStore::new(dir.path());
        store.create("durable", None).await.unwrap()
    };

    let reopened = TaskStore::new(dir.path());
    let tasks = reopened.list().await.unwrap();
    assert_eq!(tasks, vec![task]);
}
