//! Tasks page controller
//!
//! User actions are applied to the board synchronously and then synced
//! with the backend. A successful write is followed by a refetch; a failed
//! one is logged and the local state is kept as is.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use auth::SessionContext;
use chrono::NaiveDate;
use common::{AuthUser, ChangeCallback, ChangePayload, Subscription};
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    error::ServiceResult,
    models::{Task, TaskDraft, TaskPatch},
    pages::board::{BoardEntry, CompletionTarget, TaskBoard},
    services::TaskService,
};

struct TasksView {
    board: TaskBoard,
    selected_date: NaiveDate,
    /// Bumped on every day switch
    selection: u64,
    creator_open: bool,
}

#[derive(Default)]
struct Live {
    subscription: Option<Subscription>,
    session_watcher: Option<JoinHandle<()>>,
}

struct TasksInner {
    service: TaskService,
    session: SessionContext,
    view: Mutex<TasksView>,
    live: Mutex<Live>,
}

/// Controller behind the daily tasks view
#[derive(Clone)]
pub struct TasksPage {
    inner: Arc<TasksInner>,
}

impl TasksPage {
    pub fn new(service: TaskService, session: SessionContext, date: NaiveDate) -> Self {
        Self {
            inner: Arc::new(TasksInner {
                service,
                session,
                view: Mutex::new(TasksView {
                    board: TaskBoard::new(),
                    selected_date: date,
                    selection: 0,
                    creator_open: false,
                }),
                live: Mutex::new(Live::default()),
            }),
        }
    }

    fn view(&self) -> MutexGuard<'_, TasksView> {
        self.inner
            .view
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn live(&self) -> MutexGuard<'_, Live> {
        self.inner
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Displayed tasks, earliest start first
    pub fn tasks(&self) -> Vec<Task> {
        self.view().board.tasks()
    }

    pub fn entries(&self) -> Vec<BoardEntry> {
        self.view().board.entries().to_vec()
    }

    pub fn selected_date(&self) -> NaiveDate {
        self.view().selected_date
    }

    pub fn is_creator_open(&self) -> bool {
        self.view().creator_open
    }

    pub fn open_creator(&self) {
        self.view().creator_open = true;
    }

    pub fn close_creator(&self) {
        self.view().creator_open = false;
    }

    /// Whether a realtime subscription is live
    pub fn is_live(&self) -> bool {
        self.live().subscription.is_some()
    }

    /// Re-list the selected day from the backend
    pub async fn refresh(&self) {
        let (date, selection, started_at) = {
            let view = self.view();
            (view.selected_date, view.selection, view.board.version())
        };

        match self.inner.service.get_tasks(date).await {
            Ok(tasks) => {
                let mut view = self.view();
                if view.selection == selection {
                    view.board.reconcile(tasks, started_at);
                } else {
                    debug!("Discarding tasks of {}, day changed while fetching", date);
                }
            }
            Err(e) => warn!("Error fetching tasks: {}", e),
        }
    }

    /// Switch to another day
    pub async fn select_date(&self, date: NaiveDate) {
        {
            let mut view = self.view();
            if view.selected_date == date {
                return;
            }
            view.selected_date = date;
            view.selection += 1;
            view.board.clear();
        }
        self.refresh().await;
    }

    /// Create a task and wait until it is synced
    ///
    /// Returns the temporary id the task was displayed under.
    pub async fn create_task(&self, draft: TaskDraft) -> ServiceResult<String> {
        let temp_id = self.apply_create(&draft)?;
        self.sync_create(&temp_id, draft).await;
        Ok(temp_id)
    }

    /// Create a task, syncing it in the background
    pub fn spawn_create_task(&self, draft: TaskDraft) -> ServiceResult<(String, JoinHandle<()>)> {
        let temp_id = self.apply_create(&draft)?;
        let page = self.clone();
        let id = temp_id.clone();
        let handle = tokio::spawn(async move { page.sync_create(&id, draft).await });
        Ok((temp_id, handle))
    }

    fn apply_create(&self, draft: &TaskDraft) -> ServiceResult<String> {
        draft.validate()?;

        let temp_id = Uuid::new_v4().to_string();
        let task = draft
            .clone()
            .into_task(temp_id.clone(), self.inner.session.owner_id());

        let mut view = self.view();
        view.board.insert_pending(task);
        view.creator_open = false;

        Ok(temp_id)
    }

    async fn sync_create(&self, temp_id: &str, draft: TaskDraft) {
        match self.inner.service.add_task(&draft).await {
            Ok(Some(created)) => {
                let created_id = created.id.clone();
                let deferred = self.view().board.resolve_created(temp_id, created);

                if let Some(patch) = deferred {
                    info!(
                        "Sending changes held for task {} as {}",
                        temp_id, created_id
                    );
                    match self.inner.service.update_task(&created_id, &patch).await {
                        Ok(_) => self.view().board.confirm_sent(&created_id),
                        Err(e) => {
                            error!("Error updating task {}, kept local: {}", created_id, e);
                            self.view().board.hold_unsent(&created_id, patch);
                        }
                    }
                }
                self.refresh().await;
            }
            Ok(None) => {
                info!("Backend kept no row for task {}, keeping it local", temp_id);
                self.view().board.mark_local_only(temp_id);
                self.refresh().await;
            }
            Err(e) => {
                error!("Save to DB failed, kept local: {}", e);
                self.view().board.mark_local_only(temp_id);
            }
        }
    }

    /// Mark a task done and wait for the backend update
    pub async fn complete_task(&self, id: &str) {
        let target = self.view().board.mark_completed(id);
        self.sync_complete(id, target).await;
    }

    /// Mark a task done, updating the backend in the background
    pub fn spawn_complete_task(&self, id: &str) -> JoinHandle<()> {
        let target = self.view().board.mark_completed(id);
        let page = self.clone();
        let id = id.to_string();
        tokio::spawn(async move { page.sync_complete(&id, target).await })
    }

    async fn sync_complete(&self, id: &str, target: Option<CompletionTarget>) {
        match target {
            Some(CompletionTarget::Remote(id)) => {
                match self.inner.service.complete_task(&id).await {
                    Ok(_) => self.view().board.confirm_sent(&id),
                    Err(e) => {
                        error!("Error completing task, kept local: {}", e);
                        self.view().board.hold_unsent(&id, TaskPatch::completed());
                    }
                }
            }
            Some(CompletionTarget::Deferred) => {
                debug!("Completion of task {} waits for its insert", id)
            }
            Some(CompletionTarget::LocalOnly) => debug!("Task {} is local only", id),
            None => warn!("Task {} is not on the board", id),
        }
    }

    /// Load the selected day and start following changes
    ///
    /// The realtime subscription follows the signed-in user: it is
    /// re-opened whenever the session changes.
    pub async fn mount(&self) {
        self.refresh().await;
        self.resubscribe(self.inner.session.current_user()).await;

        let mut changes = self.inner.session.watch();
        let page = Arc::downgrade(&self.inner);
        let watcher = tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let Some(inner) = page.upgrade() else {
                    break;
                };
                let page = TasksPage { inner };
                let user = changes.borrow_and_update().clone();

                page.refresh().await;
                page.resubscribe(user).await;
            }
        });

        if let Some(previous) = self.live().session_watcher.replace(watcher) {
            previous.abort();
        }
        info!("Tasks page mounted for {}", self.selected_date());
    }

    /// Stop following changes
    pub fn unmount(&self) {
        let (subscription, watcher) = {
            let mut live = self.live();
            (live.subscription.take(), live.session_watcher.take())
        };

        if let Some(watcher) = watcher {
            watcher.abort();
        }
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
        }
        info!("Tasks page unmounted");
    }

    async fn resubscribe(&self, user: Option<AuthUser>) {
        if let Some(previous) = self.live().subscription.take() {
            previous.unsubscribe();
        }

        let Some(user) = user else {
            return;
        };

        let on_change = refetch_on_change(Arc::downgrade(&self.inner), Handle::current());
        match self
            .inner
            .service
            .subscribe_to_tasks(&user.id, on_change)
            .await
        {
            Ok(subscription) => {
                if let Some(stale) = self.live().subscription.replace(subscription) {
                    stale.unsubscribe();
                }
            }
            Err(e) => warn!("Real-time subscription failed: {}", e),
        }
    }
}

fn refetch_on_change(page: Weak<TasksInner>, runtime: Handle) -> ChangeCallback {
    Arc::new(move |payload: ChangePayload| {
        debug!(
            "Real-time task change: {:?} on {}",
            payload.event, payload.table
        );
        if let Some(inner) = page.upgrade() {
            let page = TasksPage { inner };
            runtime.spawn(async move { page.refresh().await });
        }
    })
}
