//! In-memory task list of the tasks page
//!
//! Every local mutation bumps a board-wide counter and stamps the touched
//! entry with it. A refetch remembers the counter value it started at;
//! when its result lands, entries touched after that point win over the
//! server copy, so a slow listing never rolls back a newer local change.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::models::{Task, TaskPatch};

/// Where a board entry stands relative to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Created locally, insert still in flight
    Pending,
    /// Backed by a server row
    Synced,
    /// Insert failed or kept no row; exists only on this board
    LocalOnly,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoardEntry {
    pub task: Task,
    pub state: SyncState,
    /// Counter value of the last local change
    pub version: u64,
}

/// What a completion needs to send to the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionTarget {
    /// Update the server row with this id
    Remote(String),
    /// Held until the pending insert returns the canonical id
    Deferred,
    /// Nothing to send
    LocalOnly,
}

/// Tasks of one day, kept in start-time order
#[derive(Debug, Default)]
pub struct TaskBoard {
    entries: Vec<BoardEntry>,
    clock: u64,
    deferred: HashMap<String, TaskPatch>,
    unsent: HashMap<String, TaskPatch>,
}

impl TaskBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current counter value; pass it to [`reconcile`](Self::reconcile)
    /// when starting a refetch
    pub fn version(&self) -> u64 {
        self.clock
    }

    pub fn entries(&self) -> &[BoardEntry] {
        &self.entries
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.entries
            .iter()
            .map(|entry| entry.task.clone())
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&BoardEntry> {
        self.entries.iter().find(|entry| entry.task.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry, e.g. when switching to another day
    ///
    /// Deferred patches survive so an insert still in flight can deliver
    /// them once it resolves.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Add a locally created task
    pub fn insert_pending(&mut self, task: Task) {
        let version = self.tick();
        self.entries.push(BoardEntry {
            task,
            state: SyncState::Pending,
            version,
        });
        self.sort();
    }

    /// Flip the completion flag of a task
    ///
    /// Returns `None` when the task is not on the board.
    pub fn mark_completed(&mut self, id: &str) -> Option<CompletionTarget> {
        let version = self.tick();
        let entry = self.entries.iter_mut().find(|entry| entry.task.id == id)?;
        entry.task.is_completed = true;
        entry.version = version;

        let target = match entry.state {
            SyncState::Synced => CompletionTarget::Remote(entry.task.id.clone()),
            SyncState::Pending => {
                self.deferred
                    .entry(id.to_string())
                    .or_default()
                    .merge(TaskPatch::completed());
                CompletionTarget::Deferred
            }
            SyncState::LocalOnly => CompletionTarget::LocalOnly,
        };
        Some(target)
    }

    /// Swap a pending task for the row the backend created
    ///
    /// Changes deferred against the temporary id are applied to the new
    /// row and returned so the caller can send them.
    pub fn resolve_created(&mut self, temp_id: &str, created: Task) -> Option<TaskPatch> {
        let deferred = self
            .deferred
            .remove(temp_id)
            .filter(|patch| !patch.is_empty());

        if self.get(temp_id).is_none() {
            debug!("Created task {} is no longer on the board", created.id);
            return deferred;
        }

        let mut task = created;
        if let Some(patch) = &deferred {
            patch.apply_to(&mut task);
        }

        // A refetch may already have brought the canonical row in.
        self.entries.retain(|entry| entry.task.id != task.id);

        let version = self.tick();
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|entry| entry.task.id == temp_id)
        {
            entry.task = task;
            entry.state = SyncState::Synced;
            entry.version = version;
        }
        self.sort();

        deferred
    }

    /// Keep a change the backend rejected
    ///
    /// The patch is applied to the entry now and laid over every later
    /// listing of the same row, so a refetch never shows the older server
    /// copy in its place.
    pub fn hold_unsent(&mut self, id: &str, patch: TaskPatch) {
        let version = self.tick();
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.task.id == id) {
            patch.apply_to(&mut entry.task);
            entry.version = version;
        }
        self.unsent.entry(id.to_string()).or_default().merge(patch);
    }

    /// Forget held changes of a row the backend has accepted an update for
    pub fn confirm_sent(&mut self, id: &str) {
        self.unsent.remove(id);
    }

    /// Keep a pending task on this board only
    pub fn mark_local_only(&mut self, temp_id: &str) {
        self.deferred.remove(temp_id);
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|entry| entry.task.id == temp_id)
        {
            entry.state = SyncState::LocalOnly;
        }
    }

    /// Replace the board with a server listing taken at `started_at`
    ///
    /// Entries changed after `started_at` keep their local copy. Entries
    /// the server does not know survive unless they were synced before
    /// the listing started. Held unsent changes are applied on top.
    pub fn reconcile(&mut self, server: Vec<Task>, started_at: u64) {
        let server_ids: HashSet<String> = server.iter().map(|task| task.id.clone()).collect();

        let mut known = HashMap::new();
        let mut leftovers = Vec::new();
        for entry in std::mem::take(&mut self.entries) {
            if server_ids.contains(&entry.task.id) {
                known.insert(entry.task.id.clone(), entry);
            } else if entry.state != SyncState::Synced || entry.version > started_at {
                leftovers.push(entry);
            } else {
                debug!("Dropping task {} missing from the server", entry.task.id);
            }
        }

        let mut entries = Vec::with_capacity(server.len() + leftovers.len());
        for mut task in server {
            if let Some(patch) = self.unsent.get(&task.id) {
                patch.apply_to(&mut task);
            }
            let entry = match known.remove(&task.id) {
                Some(local) if local.version > started_at => local,
                Some(local) => BoardEntry {
                    task,
                    state: SyncState::Synced,
                    version: local.version,
                },
                None => BoardEntry {
                    task,
                    state: SyncState::Synced,
                    version: 0,
                },
            };
            entries.push(entry);
        }
        entries.extend(leftovers);

        self.entries = entries;
        self.sort();
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn sort(&mut self) {
        self.entries
            .sort_by(|a, b| a.task.start_time.cmp(&b.task.start_time));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskCategory, TaskDraft};
    use chrono::NaiveDate;

    fn task(id: &str, start: &str) -> Task {
        TaskDraft::new(
            format!("Task {}", id),
            start,
            "23:00",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            TaskCategory::Work,
        )
        .into_task(id, "u-1")
    }

    fn starts(board: &TaskBoard) -> Vec<String> {
        board.tasks().into_iter().map(|t| t.start_time).collect()
    }

    #[test]
    fn test_insert_keeps_start_time_order() {
        let mut board = TaskBoard::new();
        board.insert_pending(task("a", "14:00"));
        board.insert_pending(task("b", "09:00"));
        board.insert_pending(task("c", "11:30"));

        assert_eq!(starts(&board), vec!["09:00", "11:30", "14:00"]);
        assert!(
            board
                .entries()
                .iter()
                .all(|e| e.state == SyncState::Pending)
        );
    }

    #[test]
    fn test_complete_synced_task_targets_server_row() {
        let mut board = TaskBoard::new();
        board.reconcile(vec![task("srv-1", "09:00")], 0);

        let target = board.mark_completed("srv-1");
        assert_eq!(target, Some(CompletionTarget::Remote("srv-1".to_string())));
        assert!(board.get("srv-1").unwrap().task.is_completed);
        assert_eq!(board.mark_completed("missing"), None);
    }

    #[test]
    fn test_completion_of_pending_task_is_deferred() {
        let mut board = TaskBoard::new();
        board.insert_pending(task("tmp", "09:00"));

        assert_eq!(
            board.mark_completed("tmp"),
            Some(CompletionTarget::Deferred)
        );

        let deferred = board.resolve_created("tmp", task("srv-1", "09:00"));
        assert_eq!(deferred, Some(TaskPatch::completed()));

        let entry = board.get("srv-1").unwrap();
        assert_eq!(entry.state, SyncState::Synced);
        assert!(entry.task.is_completed);
        assert!(board.get("tmp").is_none());
    }

    #[test]
    fn test_resolve_without_deferred_changes() {
        let mut board = TaskBoard::new();
        board.insert_pending(task("tmp", "09:00"));

        assert_eq!(board.resolve_created("tmp", task("srv-1", "09:00")), None);
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn test_resolve_replaces_row_already_fetched() {
        let mut board = TaskBoard::new();
        board.insert_pending(task("tmp", "09:00"));

        // The listing saw the new row before the insert call returned.
        let started = board.version();
        board.reconcile(vec![task("srv-1", "09:00")], started);
        assert_eq!(board.len(), 2);

        board.resolve_created("tmp", task("srv-1", "09:00"));
        assert_eq!(board.len(), 1);
        assert_eq!(board.entries()[0].task.id, "srv-1");
    }

    #[test]
    fn test_local_only_entries_survive_refetch() {
        let mut board = TaskBoard::new();
        board.insert_pending(task("tmp", "10:00"));
        board.mark_local_only("tmp");

        let started = board.version();
        board.reconcile(vec![task("srv-1", "08:00")], started);

        assert_eq!(board.len(), 2);
        assert_eq!(board.get("tmp").unwrap().state, SyncState::LocalOnly);
        assert_eq!(starts(&board), vec!["08:00", "10:00"]);
        assert_eq!(
            board.mark_completed("tmp"),
            Some(CompletionTarget::LocalOnly)
        );
    }

    #[test]
    fn test_refetch_drops_rows_deleted_on_server() {
        let mut board = TaskBoard::new();
        board.reconcile(vec![task("srv-1", "08:00"), task("srv-2", "09:00")], 0);

        let started = board.version();
        board.reconcile(vec![task("srv-2", "09:00")], started);

        assert_eq!(board.len(), 1);
        assert!(board.get("srv-1").is_none());
    }

    #[test]
    fn test_slow_refetch_does_not_undo_newer_completion() {
        let mut board = TaskBoard::new();
        board.reconcile(vec![task("srv-1", "09:00")], 0);

        let started = board.version();
        board.mark_completed("srv-1");

        // Listing taken before the completion reached the server.
        board.reconcile(vec![task("srv-1", "09:00")], started);
        assert!(board.get("srv-1").unwrap().task.is_completed);

        // A later listing is authoritative again.
        let started = board.version();
        board.reconcile(vec![task("srv-1", "09:00")], started);
        assert!(!board.get("srv-1").unwrap().task.is_completed);
    }

    #[test]
    fn test_slow_refetch_keeps_row_created_after_it_started() {
        let mut board = TaskBoard::new();
        board.insert_pending(task("tmp", "09:00"));

        let started = board.version();
        board.resolve_created("tmp", task("srv-1", "09:00"));

        board.reconcile(Vec::new(), started);
        assert_eq!(board.get("srv-1").map(|e| e.state), Some(SyncState::Synced));
    }

    #[test]
    fn test_rejected_change_outlives_later_refetch() {
        let mut board = TaskBoard::new();
        board.insert_pending(task("tmp", "09:00"));
        board.mark_completed("tmp");
        let deferred = board.resolve_created("tmp", task("srv-1", "09:00"));

        board.hold_unsent("srv-1", deferred.unwrap());

        let started = board.version();
        board.reconcile(vec![task("srv-1", "09:00")], started);
        assert!(board.get("srv-1").unwrap().task.is_completed);

        board.confirm_sent("srv-1");
        let started = board.version();
        board.reconcile(vec![task("srv-1", "09:00")], started);
        assert!(!board.get("srv-1").unwrap().task.is_completed);
    }

    #[test]
    fn test_clear_keeps_deferred_changes() {
        let mut board = TaskBoard::new();
        board.insert_pending(task("tmp", "09:00"));
        board.mark_completed("tmp");
        board.clear();

        assert!(board.is_empty());
        assert_eq!(
            board.resolve_created("tmp", task("srv-1", "09:00")),
            Some(TaskPatch::completed())
        );
        assert!(board.is_empty());
    }
}
