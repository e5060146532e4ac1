//! Mutation Reconciler and read loaders.
//!
//! Writes go to the remote list API first; the Local State Store only changes
//! once the gateway confirms. Reads degrade to empty collections on any failure
//! so the aggregation engine always has well-typed input.
//!
//! Every mutation takes `&mut self`, so two mutations can never be in flight at
//! once through the same reconciler. A write reply is overlaid on the submitted
//! record, so fields the backend leaves out keep their submitted values.

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::{Config, TeamPalette};
use crate::error::{ReconcileError, Result};
use crate::fields::MutationState;
use crate::gateway::{endpoints, Gateway};
use crate::normalize;
use crate::store::LocalStore;
use crate::task::{check_actual_time, Employee, Module, NewTask, Recommendation, Task, TaskUpdate, Team};

/// What an initial load produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Tasks were shown from the cache before the remote fetch resolved.
    pub hydrated_from_cache: bool,
    /// The remote task list arrived and replaced the local one.
    pub tasks_refreshed: bool,
    pub tasks: usize,
    pub modules: usize,
    pub teams: usize,
    pub employees: usize,
}

/// Mediates between user intent and confirmed remote state.
pub struct Reconciler<G> {
    gateway: G,
    store: LocalStore,
    palette: TeamPalette,
    team_id: u64,
}

impl<G: Gateway> Reconciler<G> {
    pub fn new(gateway: G, store: LocalStore, config: &Config) -> Self {
        Self {
            gateway,
            store,
            palette: config.palette.clone(),
            team_id: config.team_id,
        }
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// GET an endpoint, logging and swallowing failures.
    async fn fetch(&self, endpoint: &str) -> Option<Value> {
        match self.gateway.get(endpoint).await {
            Ok(Value::Null) => {
                warn!(endpoint, "empty result");
                Some(Value::Null)
            }
            Ok(body) => Some(body),
            Err(e) => {
                warn!(endpoint, error = %e, "read failed, using empty collection");
                None
            }
        }
    }

    pub async fn fetch_modules(&self) -> Vec<Module> {
        self.fetch(endpoints::MODULES)
            .await
            .map(|v| normalize::normalize_modules(&v))
            .unwrap_or_default()
    }

    pub async fn fetch_tasks(&self) -> Vec<Task> {
        self.fetch(endpoints::TASKS)
            .await
            .map(|v| normalize::normalize_tasks(&v))
            .unwrap_or_default()
    }

    pub async fn fetch_teams(&self) -> Vec<Team> {
        self.fetch(endpoints::TEAMS)
            .await
            .map(|v| normalize::normalize_teams(&v, &self.palette))
            .unwrap_or_default()
    }

    pub async fn fetch_employees(&self) -> Vec<Employee> {
        self.fetch(&endpoints::employees(self.team_id))
            .await
            .map(|v| normalize::normalize_employees(&v))
            .unwrap_or_default()
    }

    /// The suggested next task, or `None` when there is none or the call failed.
    pub async fn fetch_recommendation(&self) -> Option<Recommendation> {
        let body = self.fetch(endpoints::RECOMMENDATION).await?;
        normalize::normalize_recommendation(&body)
    }

    /// Hydrate tasks from the cache, then load every collection from the API.
    ///
    /// If the task fetch fails outright the cached tasks stay in place; a
    /// successful fetch always overwrites them, even with an empty list.
    pub async fn load(&mut self) -> LoadReport {
        let hydrated_from_cache = self.store.hydrate_from_cache();

        let modules = self.fetch_modules().await;
        self.store.set_modules(modules);

        let tasks_refreshed = self.refresh_tasks().await;

        let teams = self.fetch_teams().await;
        self.store.set_teams(teams);

        let employees = self.fetch_employees().await;
        self.store.set_employees(employees);

        let report = LoadReport {
            hydrated_from_cache,
            tasks_refreshed,
            tasks: self.store.tasks().len(),
            modules: self.store.modules().len(),
            teams: self.store.teams().len(),
            employees: self.store.employees().len(),
        };
        debug!(?report, "load finished");
        report
    }

    /// Explicit reload of the task list. Returns whether the remote list arrived.
    pub async fn refresh_tasks(&mut self) -> bool {
        match self.fetch(endpoints::TASKS).await {
            Some(body) => {
                self.store.replace_tasks(normalize::normalize_tasks(&body));
                true
            }
            None => false,
        }
    }

    /// Create a task. Nothing is stored unless the backend returns it with an id.
    pub async fn create(&mut self, draft: NewTask) -> Result<Task> {
        let draft = draft.validated()?;
        debug!(
            description = %draft.description,
            from = ?MutationState::Draft,
            to = ?MutationState::Submitting,
            "submitting new task"
        );

        let body = self.gateway.post(endpoints::TASKS, &draft.to_body()).await.map_err(|e| {
            error!(error = %e, "create failed");
            ReconcileError::from(e)
        })?;
        let Some(id) = normalize::reply_id(&body) else {
            error!(%body, "create returned no task");
            return Err(ReconcileError::EmptyResult(endpoints::TASKS.to_string()));
        };

        let task = normalize::merge_task(draft.into_task(id), &body);
        info!(id, state = ?MutationState::Synced, "task created");
        self.store.upsert_task(task.clone());
        Ok(task)
    }

    /// Edit fields of a task. The store keeps the old values unless the PUT succeeds.
    pub async fn update(&mut self, id: u64, edit: &TaskUpdate) -> Result<Task> {
        let current = self.store.task(id).ok_or(ReconcileError::NotFound(id))?;
        let next = edit.apply(current)?;
        self.submit(next).await
    }

    /// Flip `done`. Going to done needs the hours actually spent; going back to
    /// pending leaves any recorded actual time in place.
    pub async fn toggle_done(&mut self, id: u64, actual_time: Option<f64>) -> Result<Task> {
        let mut next = self.store.task(id).ok_or(ReconcileError::NotFound(id))?.clone();
        if next.done {
            next.done = false;
        } else {
            let hours = actual_time.ok_or(ReconcileError::MissingActualTime(id))?;
            check_actual_time(hours)?;
            next.done = true;
            next.actual_time = Some(hours);
        }
        self.submit(next).await
    }

    /// Move a task to the given completion state, doing nothing if it is already there.
    pub async fn set_done(&mut self, id: u64, done: bool, actual_time: Option<f64>) -> Result<Task> {
        let current = self.store.task(id).ok_or(ReconcileError::NotFound(id))?;
        if current.done == done {
            return Ok(current.clone());
        }
        self.toggle_done(id, actual_time).await
    }

    async fn submit(&mut self, next: Task) -> Result<Task> {
        let id = next.id;
        debug!(id, state = ?MutationState::Submitting, "submitting task update");
        let body = self
            .gateway
            .put(&endpoints::task(id), &next.to_body())
            .await
            .map_err(|e| {
                error!(id, error = %e, "update failed, keeping previous values");
                ReconcileError::from(e)
            })?;

        let confirmed = match normalize::reply_id(&body) {
            Some(other) if other != id => {
                warn!(id, reply_id = other, "update reply names another task, keeping submitted values");
                next
            }
            _ => normalize::merge_task(next, &body),
        };
        info!(id, done = confirmed.done, state = ?MutationState::Synced, "task updated");
        self.store.upsert_task(confirmed.clone());
        Ok(confirmed)
    }

    /// Delete a task. It stays in the store unless the DELETE succeeds.
    pub async fn delete(&mut self, id: u64) -> Result<Task> {
        self.store.task(id).ok_or(ReconcileError::NotFound(id))?;
        debug!(id, state = ?MutationState::Deleting, "deleting task");

        if let Err(e) = self.gateway.delete(&endpoints::task(id)).await {
            error!(id, error = %e, state = ?MutationState::Synced, "delete failed, task kept");
            return Err(e.into());
        }
        info!(id, "task deleted");
        self.store.remove_task(id).ok_or(ReconcileError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GatewayError, ValidationGap};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory gateway that records every call.
    #[derive(Default)]
    struct FakeGateway {
        replies: Mutex<HashMap<String, Value>>,
        failing: Mutex<Vec<String>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeGateway {
        fn reply(self, key: &str, body: Value) -> Self {
            self.replies.lock().unwrap().insert(key.to_string(), body);
            self
        }

        fn fail(self, key: &str) -> Self {
            self.failing.lock().unwrap().push(key.to_string());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn answer(&self, key: String) -> std::result::Result<Value, GatewayError> {
            self.calls.lock().unwrap().push(key.clone());
            if self.failing.lock().unwrap().contains(&key) {
                return Err(GatewayError::Status {
                    endpoint: key,
                    status: 503,
                    body: "unavailable".into(),
                });
            }
            Ok(self.replies.lock().unwrap().get(&key).cloned().unwrap_or(Value::Null))
        }
    }

    #[async_trait]
    impl Gateway for FakeGateway {
        async fn get(&self, endpoint: &str) -> std::result::Result<Value, GatewayError> {
            self.answer(format!("GET {endpoint}"))
        }
        async fn post(&self, endpoint: &str, _body: &Value) -> std::result::Result<Value, GatewayError> {
            self.answer(format!("POST {endpoint}"))
        }
        async fn put(&self, endpoint: &str, body: &Value) -> std::result::Result<Value, GatewayError> {
            let key = format!("PUT {endpoint}");
            let reply = self.answer(key)?;
            // Echo the submitted body when no canned reply exists.
            Ok(if reply.is_null() { body.clone() } else { reply })
        }
        async fn delete(&self, endpoint: &str) -> std::result::Result<Value, GatewayError> {
            self.answer(format!("DELETE {endpoint}"))
        }
    }

    fn task(id: u64, done: bool) -> Task {
        Task {
            id,
            description: format!("task {id}"),
            module_id: Some(1),
            team_id: Some(1),
            responsible: None,
            done,
            story_points: 5,
            estimated_time: 2.0,
            actual_time: None,
            date_limit: None,
        }
    }

    fn reconciler(gateway: FakeGateway, tasks: Vec<Task>) -> Reconciler<FakeGateway> {
        let mut store = LocalStore::in_memory();
        store.replace_tasks(tasks);
        Reconciler::new(gateway, store, &Config::default())
    }

    #[tokio::test]
    async fn test_create_with_empty_description_never_calls_gateway() {
        let mut rec = reconciler(FakeGateway::default(), vec![task(1, false)]);
        let err = rec.create(NewTask::new("  ")).await.unwrap_err();
        assert!(matches!(err, ReconcileError::Validation(ValidationGap::MissingDescription)));
        assert!(rec.gateway().calls().is_empty());
        assert_eq!(rec.store().tasks(), &[task(1, false)]);
    }

    #[tokio::test]
    async fn test_create_uses_backend_id() {
        let gw = FakeGateway::default().reply("POST todolist", json!({"id": 42, "description": "Ship", "story_Points": 3}));
        let mut rec = reconciler(gw, vec![]);
        let created = rec.create(NewTask::new("Ship")).await.unwrap();
        assert_eq!(created.id, 42);
        assert_eq!(rec.store().task(42).unwrap().description, "Ship");
    }

    #[tokio::test]
    async fn test_create_reply_with_only_id_keeps_draft_fields() {
        let gw = FakeGateway::default().reply("POST todolist", json!({"id": 77}));
        let mut rec = reconciler(gw, vec![]);
        let mut draft = NewTask::new(" Audit log ");
        draft.module_id = Some(2);
        draft.story_points = 9;
        draft.estimated_time = 3.0;

        let created = rec.create(draft).await.unwrap();
        assert_eq!(created.id, 77);
        assert_eq!(created.description, "Audit log");
        assert_eq!(created.module_id, Some(2));
        assert_eq!(created.story_points, 9);
        assert_eq!(created.estimated_time, 3.0);
        assert!(!created.done);
        assert_eq!(rec.store().task(77), Some(&created));
    }

    #[tokio::test]
    async fn test_create_failure_appends_nothing() {
        let gw = FakeGateway::default().fail("POST todolist");
        let mut rec = reconciler(gw, vec![]);
        assert!(matches!(rec.create(NewTask::new("Ship")).await, Err(ReconcileError::Gateway(_))));
        assert!(rec.store().tasks().is_empty());
    }

    #[tokio::test]
    async fn test_create_without_id_in_reply_is_empty_result() {
        let gw = FakeGateway::default().reply("POST todolist", json!({"description": "Ship"}));
        let mut rec = reconciler(gw, vec![]);
        assert!(matches!(rec.create(NewTask::new("Ship")).await, Err(ReconcileError::EmptyResult(_))));
        assert!(rec.store().tasks().is_empty());
    }

    #[tokio::test]
    async fn test_mark_done_without_actual_time_rejected() {
        let mut rec = reconciler(FakeGateway::default(), vec![task(1, false)]);
        let err = rec.toggle_done(1, None).await.unwrap_err();
        assert!(matches!(err, ReconcileError::MissingActualTime(1)));
        assert!(rec.gateway().calls().is_empty());
        assert!(!rec.store().task(1).unwrap().done);
    }

    #[tokio::test]
    async fn test_mark_done_with_actual_time() {
        let mut rec = reconciler(FakeGateway::default(), vec![task(1, false)]);
        let done = rec.toggle_done(1, Some(1.5)).await.unwrap();
        assert!(done.done);
        assert_eq!(done.actual_time, Some(1.5));
        assert_eq!(rec.gateway().calls(), vec!["PUT todolist/1"]);
        assert!(rec.store().task(1).unwrap().done);
    }

    #[tokio::test]
    async fn test_partial_update_reply_keeps_submitted_fields() {
        let gw = FakeGateway::default().reply("PUT todolist/1", json!({"id": 1, "done": true}));
        let mut rec = reconciler(gw, vec![task(1, false)]);
        rec.toggle_done(1, Some(2.5)).await.unwrap();

        let stored = rec.store().task(1).unwrap();
        assert!(stored.done);
        assert_eq!(stored.actual_time, Some(2.5));
        assert_eq!(stored.description, "task 1");
        assert_eq!(stored.story_points, 5);
        assert_eq!(stored.module_id, Some(1));
    }

    #[tokio::test]
    async fn test_update_reply_fields_override_submitted() {
        let gw = FakeGateway::default().reply("PUT todolist/1", json!({"id": 1, "story_Points": 8, "estimatedTime": 3}));
        let mut rec = reconciler(gw, vec![task(1, false)]);
        let edit = TaskUpdate {
            description: Some("renamed".into()),
            ..Default::default()
        };
        let updated = rec.update(1, &edit).await.unwrap();
        assert_eq!(updated.description, "renamed");
        assert_eq!(updated.story_points, 8);
        assert_eq!(updated.estimated_time, 3.0);
    }

    #[tokio::test]
    async fn test_update_reply_for_another_task_is_ignored() {
        let gw = FakeGateway::default().reply("PUT todolist/1", json!({"id": 2, "description": "other"}));
        let mut rec = reconciler(gw, vec![task(1, false)]);
        let edit = TaskUpdate {
            description: Some("renamed".into()),
            ..Default::default()
        };
        rec.update(1, &edit).await.unwrap();
        assert_eq!(rec.store().task(1).unwrap().description, "renamed");
        assert!(rec.store().task(2).is_none());
    }

    #[tokio::test]
    async fn test_reopen_keeps_actual_time() {
        let mut finished = task(1, true);
        finished.actual_time = Some(3.0);
        let mut rec = reconciler(FakeGateway::default(), vec![finished]);
        let reopened = rec.toggle_done(1, None).await.unwrap();
        assert!(!reopened.done);
        assert_eq!(reopened.actual_time, Some(3.0));
    }

    #[tokio::test]
    async fn test_negative_actual_time_rejected() {
        let mut rec = reconciler(FakeGateway::default(), vec![task(1, false)]);
        let err = rec.toggle_done(1, Some(-1.0)).await.unwrap_err();
        assert!(matches!(err, ReconcileError::Validation(ValidationGap::InvalidActualTime(_))));
        assert!(rec.gateway().calls().is_empty());
    }

    #[tokio::test]
    async fn test_set_done_is_noop_when_already_there() {
        let mut rec = reconciler(FakeGateway::default(), vec![task(1, true)]);
        rec.set_done(1, true, None).await.unwrap();
        assert!(rec.gateway().calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_update_keeps_previous_values() {
        let gw = FakeGateway::default().fail("PUT todolist/1");
        let mut rec = reconciler(gw, vec![task(1, false)]);
        let edit = TaskUpdate {
            description: Some("renamed".into()),
            ..Default::default()
        };
        assert!(rec.update(1, &edit).await.is_err());
        assert_eq!(rec.store().task(1), Some(&task(1, false)));
    }

    #[tokio::test]
    async fn test_update_unknown_task() {
        let mut rec = reconciler(FakeGateway::default(), vec![]);
        let err = rec.update(5, &TaskUpdate::default()).await.unwrap_err();
        assert!(matches!(err, ReconcileError::NotFound(5)));
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_task() {
        let gw = FakeGateway::default().fail("DELETE todolist/1");
        let mut rec = reconciler(gw, vec![task(1, false)]);
        assert!(rec.delete(1).await.is_err());
        assert!(rec.store().task(1).is_some());
    }

    #[tokio::test]
    async fn test_delete_removes_after_confirmation() {
        let mut rec = reconciler(FakeGateway::default(), vec![task(1, false), task(2, false)]);
        let removed = rec.delete(1).await.unwrap();
        assert_eq!(removed.id, 1);
        assert_eq!(rec.store().tasks().len(), 1);
        assert!(rec.store().task(1).is_none());
    }

    #[tokio::test]
    async fn test_failed_reads_degrade_to_empty() {
        let gw = FakeGateway::default()
            .fail("GET modules")
            .fail("GET teams")
            .fail("GET employees/1/employees")
            .fail("GET recommendation");
        let rec = reconciler(gw, vec![]);
        assert!(rec.fetch_modules().await.is_empty());
        assert!(rec.fetch_teams().await.is_empty());
        assert!(rec.fetch_employees().await.is_empty());
        assert!(rec.fetch_recommendation().await.is_none());
    }

    #[tokio::test]
    async fn test_load_fills_every_collection() {
        let gw = FakeGateway::default()
            .reply("GET modules", json!([{"id": 1, "name": "Auth"}]))
            .reply("GET todolist", json!([{"id": 1, "description": "a", "moduleId": 1}]))
            .reply("GET teams", json!([{"id": 1, "name": "QA"}]))
            .reply("GET employees/1/employees", json!([{"id": 3, "user": {"username": "ana"}}]));
        let mut rec = reconciler(gw, vec![]);
        let report = rec.load().await;
        assert!(report.tasks_refreshed);
        assert_eq!((report.tasks, report.modules, report.teams, report.employees), (1, 1, 1, 1));
        assert_eq!(rec.store().modules()[0].title, "Auth");
        assert_eq!(rec.store().teams()[0].color, "#7D3C98");
    }

    #[tokio::test]
    async fn test_failed_task_fetch_keeps_existing_tasks() {
        let gw = FakeGateway::default().fail("GET todolist");
        let mut rec = reconciler(gw, vec![task(1, false)]);
        assert!(!rec.refresh_tasks().await);
        assert_eq!(rec.store().tasks().len(), 1);
    }
}
