//! Tasks page behavior against reachable, failing and absent backends

mod support;

use std::{sync::Arc, time::Duration};

use chrono::NaiveDate;
use common::{BackendConfig, ChangeEvent, OfflineClient};
use planner::{
    AppState, ServiceError,
    models::{TaskCategory, TaskDraft},
    pages::SyncState,
};
use serde_json::json;
use support::{FakeBackend, app};
use tokio_test::assert_ok;

fn new_year() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn draft(title: &str, start: &str) -> TaskDraft {
    TaskDraft::new(title, start, "23:00", new_year(), TaskCategory::Work)
}

fn seed_task(backend: &FakeBackend, id: &str, user_id: &str, date: &str, start: &str) {
    backend.seed(
        "tasks",
        json!({
            "id": id,
            "user_id": user_id,
            "title": format!("Seeded {}", id),
            "start_time": start,
            "end_time": "23:00",
            "date": date,
            "category": "Study",
            "is_reminder_on": false,
            "is_completed": false,
            "sub_tasks": []
        }),
    );
}

async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

#[tokio::test]
async fn test_created_task_shows_before_backend_answers() {
    let backend = FakeBackend::signed_in("u-1");
    let gate = backend.hold_inserts();
    let state = app(backend.clone()).await;
    let page = state.tasks_page(new_year());

    page.open_creator();
    let (temp_id, sync) = assert_ok!(page.spawn_create_task(draft("Write spec", "09:00")));

    let tasks = page.tasks();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, temp_id);
    assert_eq!(tasks[0].user_id, "u-1");
    assert_eq!(page.entries()[0].state, SyncState::Pending);
    assert!(!page.is_creator_open());
    assert_eq!(backend.count_calls("insert"), 0);

    gate.notify_one();
    assert_ok!(sync.await);

    let entries = page.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].task.id, "srv-1");
    assert_eq!(entries[0].state, SyncState::Synced);
}

#[tokio::test]
async fn test_optimistic_inserts_are_sorted_by_start_time() {
    let backend = FakeBackend::signed_in("u-1");
    let _gate = backend.hold_inserts();
    let state = app(backend).await;
    let page = state.tasks_page(new_year());

    let (_, first) = assert_ok!(page.spawn_create_task(draft("Lunch date", "14:00")));
    let (_, second) = assert_ok!(page.spawn_create_task(draft("Gym", "09:00")));

    let titles: Vec<String> = page.tasks().into_iter().map(|t| t.title).collect();
    assert_eq!(titles, vec!["Gym", "Lunch date"]);

    first.abort();
    second.abort();
}

#[tokio::test]
async fn test_synced_tasks_are_listed_by_start_time() {
    let backend = FakeBackend::signed_in("u-1");
    let state = app(backend).await;
    let page = state.tasks_page(new_year());

    assert_ok!(page.create_task(draft("Lunch date", "14:00")).await);
    assert_ok!(page.create_task(draft("Gym", "09:00")).await);
    assert_ok!(page.create_task(draft("Standup", "09:30")).await);

    let tasks = page.tasks();
    let starts: Vec<&str> = tasks.iter().map(|t| t.start_time.as_str()).collect();
    assert_eq!(starts, vec!["09:00", "09:30", "14:00"]);
    assert!(tasks.iter().all(|t| t.id.starts_with("srv-")));
}

#[tokio::test]
async fn test_failed_insert_keeps_optimistic_task() {
    let backend = FakeBackend::signed_in("u-1");
    backend.fail_inserts();
    let state = app(backend.clone()).await;
    let page = state.tasks_page(new_year());

    let temp_id = assert_ok!(
        page.create_task(TaskDraft::new(
            "Write spec",
            "09:00",
            "10:00",
            new_year(),
            TaskCategory::Work,
        ))
        .await
    );

    let entries = page.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].task.title, "Write spec");
    assert_eq!(entries[0].task.id, temp_id);
    assert!(!temp_id.is_empty());
    assert!(!entries[0].task.is_completed);
    assert_eq!(entries[0].state, SyncState::LocalOnly);
    assert_eq!(backend.count_calls("insert tasks"), 1);

    // A later refetch does not roll the task back.
    page.refresh().await;
    assert_eq!(page.tasks().len(), 1);
}

#[tokio::test]
async fn test_completion_is_local_first_and_survives_failed_update() {
    let backend = FakeBackend::signed_in("u-1");
    seed_task(&backend, "t-1", "u-1", "2024-01-01", "08:00");
    backend.fail_updates();
    let state = app(backend.clone()).await;
    let page = state.tasks_page(new_year());
    page.refresh().await;

    let sync = page.spawn_complete_task("t-1");
    assert!(page.tasks()[0].is_completed);

    assert_ok!(sync.await);
    assert!(page.tasks()[0].is_completed);
    assert_eq!(backend.count_calls("update tasks id=t-1 user_id=u-1"), 1);
}

#[tokio::test]
async fn test_completion_reaches_backend() {
    let backend = FakeBackend::signed_in("u-1");
    seed_task(&backend, "t-1", "u-1", "2024-01-01", "08:00");
    let state = app(backend.clone()).await;
    let page = state.tasks_page(new_year());
    page.refresh().await;

    page.complete_task("t-1").await;

    assert_eq!(backend.rows("tasks")[0]["is_completed"], json!(true));
    page.refresh().await;
    assert!(page.tasks()[0].is_completed);
}

#[tokio::test]
async fn test_completion_of_pending_task_follows_its_insert() {
    let backend = FakeBackend::signed_in("u-1");
    let gate = backend.hold_inserts();
    let state = app(backend.clone()).await;
    let page = state.tasks_page(new_year());

    let (temp_id, sync) = assert_ok!(page.spawn_create_task(draft("Write spec", "09:00")));
    page.complete_task(&temp_id).await;

    assert!(page.tasks()[0].is_completed);
    assert_eq!(backend.count_calls("update"), 0);

    gate.notify_one();
    assert_ok!(sync.await);

    assert_eq!(backend.count_calls("update tasks id=srv-1 user_id=u-1"), 1);
    assert_eq!(backend.rows("tasks")[0]["is_completed"], json!(true));

    let tasks = page.tasks();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, "srv-1");
    assert!(tasks[0].is_completed);
}

#[tokio::test]
async fn test_held_completion_survives_failed_update() {
    let backend = FakeBackend::signed_in("u-1");
    let gate = backend.hold_inserts();
    backend.fail_updates();
    let state = app(backend.clone()).await;
    let page = state.tasks_page(new_year());

    let (temp_id, sync) = assert_ok!(page.spawn_create_task(draft("Write spec", "09:00")));
    page.complete_task(&temp_id).await;

    gate.notify_one();
    assert_ok!(sync.await);

    assert_eq!(backend.count_calls("update tasks id=srv-1 user_id=u-1"), 1);
    assert_eq!(backend.rows("tasks")[0]["is_completed"], json!(false));
    let tasks = page.tasks();
    assert_eq!(tasks[0].id, "srv-1");
    assert!(tasks[0].is_completed);

    // Later listings still carry the local completion.
    page.refresh().await;
    assert!(page.tasks()[0].is_completed);
}

#[tokio::test]
async fn test_failed_completion_outlives_later_refetch() {
    let backend = FakeBackend::signed_in("u-1");
    seed_task(&backend, "t-1", "u-1", "2024-01-01", "08:00");
    backend.fail_updates();
    let state = app(backend).await;
    let page = state.tasks_page(new_year());
    page.refresh().await;

    page.complete_task("t-1").await;
    page.refresh().await;

    assert!(page.tasks()[0].is_completed);
}

#[tokio::test]
async fn test_offline_backend_keeps_created_task() {
    let state =
        AppState::with_backend(BackendConfig::default(), Arc::new(OfflineClient::new())).await;
    let page = state.tasks_page(new_year());

    let temp_id = assert_ok!(page.create_task(draft("Write spec", "09:00")).await);
    page.refresh().await;

    let entries = page.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].task.id, temp_id);
    assert_eq!(entries[0].task.user_id, common::GUEST_USER_ID);
    assert_eq!(entries[0].state, SyncState::LocalOnly);

    page.complete_task(&temp_id).await;
    assert!(page.tasks()[0].is_completed);
}

#[tokio::test]
async fn test_invalid_draft_is_rejected_before_apply() {
    let backend = FakeBackend::signed_in("u-1");
    let state = app(backend.clone()).await;
    let page = state.tasks_page(new_year());

    let result = page.create_task(draft("   ", "09:00")).await;

    assert!(matches!(result, Err(ServiceError::Validation(_))));
    assert!(page.tasks().is_empty());
    assert_eq!(backend.count_calls("insert"), 0);
}

#[tokio::test]
async fn test_select_date_lists_the_other_day() {
    let backend = FakeBackend::signed_in("u-1");
    seed_task(&backend, "t-1", "u-1", "2024-01-01", "08:00");
    seed_task(&backend, "t-2", "u-1", "2024-01-02", "10:00");
    seed_task(&backend, "t-3", "u-2", "2024-01-02", "11:00");
    let state = app(backend).await;
    let page = state.tasks_page(new_year());

    page.refresh().await;
    assert_eq!(page.tasks()[0].id, "t-1");

    let next_day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    page.select_date(next_day).await;

    let ids: Vec<String> = page.tasks().into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec!["t-2"]);
    assert_eq!(page.selected_date(), next_day);
}

#[tokio::test]
async fn test_listing_from_before_a_day_switch_is_discarded() {
    let backend = FakeBackend::signed_in("u-1");
    let state = app(backend.clone()).await;
    let page = state.tasks_page(new_year());

    let gate = backend.hold_selects();
    let stale = tokio::spawn({
        let page = page.clone();
        async move { page.refresh().await }
    });
    assert!(eventually(|| backend.count_calls("select") == 1).await);
    backend.release_selects();

    seed_task(&backend, "t-1", "u-1", "2024-01-01", "08:00");
    page.select_date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
        .await;
    page.select_date(new_year()).await;
    assert_eq!(page.tasks().len(), 1);

    gate.notify_one();
    assert_ok!(stale.await);

    let ids: Vec<String> = page.tasks().into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec!["t-1"]);
}

#[tokio::test]
async fn test_realtime_change_triggers_refetch() {
    let backend = FakeBackend::signed_in("u-1");
    let state = app(backend.clone()).await;
    let page = state.tasks_page(new_year());

    page.mount().await;
    assert!(page.is_live());
    assert_eq!(backend.open_channels(), 1);
    assert_eq!(backend.channel_names(), vec!["public:tasks:user:u-1"]);

    seed_task(&backend, "t-9", "u-1", "2024-01-01", "07:00");
    backend.emit_change("tasks", ChangeEvent::Insert);
    assert!(eventually(|| page.tasks().len() == 1).await);

    page.unmount();
    assert!(!page.is_live());
    assert_eq!(backend.open_channels(), 0);
}

#[tokio::test]
async fn test_session_change_moves_subscription() {
    let backend = FakeBackend::signed_in("u-1");
    let state = app(backend.clone()).await;
    let page = state.tasks_page(new_year());
    page.mount().await;

    backend.switch_user(Some("u-2"));
    assert!(
        eventually(|| backend
            .channel_names()
            .contains(&"public:tasks:user:u-2".to_string()))
        .await
    );
    assert!(eventually(|| backend.open_channels() == 1).await);

    backend.switch_user(None);
    assert!(eventually(|| backend.open_channels() == 0).await);

    page.unmount();
    state.teardown();
}

#[tokio::test]
async fn test_failed_subscription_leaves_page_usable() {
    let backend = FakeBackend::signed_in("u-1");
    seed_task(&backend, "t-1", "u-1", "2024-01-01", "08:00");
    backend.fail_subscribes();
    let state = app(backend).await;
    let page = state.tasks_page(new_year());

    page.mount().await;

    assert!(!page.is_live());
    assert_eq!(page.tasks().len(), 1);
    page.unmount();
}
