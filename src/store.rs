//! Local State Store: the single in-memory copy of tasks, modules, teams and
//! employees, plus the durable mirror of the task collection.

use tracing::{debug, warn};

use crate::cache::TaskCache;
use crate::kpi::Dataset;
use crate::task::{Employee, Module, Task, Team};

/// In-memory collections read by every view.
#[derive(Debug, Default)]
pub struct LocalStore {
    tasks: Vec<Task>,
    modules: Vec<Module>,
    teams: Vec<Team>,
    employees: Vec<Employee>,
    cache: Option<TaskCache>,
}

impl LocalStore {
    /// Store mirrored to `cache` on every task change.
    pub fn with_cache(cache: TaskCache) -> Self {
        Self {
            cache: Some(cache),
            ..Default::default()
        }
    }

    /// Store with no durable mirror.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Replace the task list with the cached snapshot, if there is one.
    ///
    /// The remote fetch that follows overwrites whatever this loads.
    pub fn hydrate_from_cache(&mut self) -> bool {
        let Some(tasks) = self.cache.as_ref().and_then(TaskCache::load) else {
            return false;
        };
        debug!(count = tasks.len(), "hydrated tasks from cache");
        self.tasks = tasks;
        true
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    /// Consistent borrowed view for the aggregation engine.
    pub fn dataset(&self) -> Dataset<'_> {
        Dataset {
            tasks: &self.tasks,
            modules: &self.modules,
            teams: &self.teams,
            employees: &self.employees,
        }
    }

    pub fn task(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn module(&self, id: u64) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == id)
    }

    pub fn team(&self, id: u64) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    pub fn employee(&self, id: u64) -> Option<&Employee> {
        self.employees.iter().find(|e| e.id == id)
    }

    pub fn replace_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        self.persist();
    }

    pub fn set_modules(&mut self, modules: Vec<Module>) {
        self.modules = modules;
    }

    pub fn set_teams(&mut self, teams: Vec<Team>) {
        self.teams = teams;
    }

    pub fn set_employees(&mut self, employees: Vec<Employee>) {
        self.employees = employees;
    }

    /// Insert a confirmed task, replacing any task with the same id.
    pub fn upsert_task(&mut self, task: Task) {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task,
            None => self.tasks.push(task),
        }
        self.persist();
    }

    /// Remove a task by id, returning it if it was present.
    pub fn remove_task(&mut self, id: u64) -> Option<Task> {
        let idx = self.tasks.iter().position(|t| t.id == id)?;
        let removed = self.tasks.remove(idx);
        self.persist();
        Some(removed)
    }

    /// Write the task snapshot. Failures are logged and otherwise ignored.
    fn persist(&self) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.save(&self.tasks) {
                warn!(path = %cache.path().display(), error = %e, "failed to persist task snapshot");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: u64) -> Task {
        Task {
            id,
            description: format!("task {id}"),
            module_id: Some(1),
            team_id: Some(1),
            responsible: None,
            done: false,
            story_points: 3,
            estimated_time: 1.0,
            actual_time: None,
            date_limit: None,
        }
    }

    #[test]
    fn test_upsert_replaces_by_id() {
        let mut store = LocalStore::in_memory();
        store.upsert_task(task(1));
        store.upsert_task(task(2));
        let mut edited = task(1);
        edited.done = true;
        store.upsert_task(edited);
        assert_eq!(store.tasks().len(), 2);
        assert!(store.task(1).unwrap().done);
        assert_eq!(store.tasks()[1].id, 2);
    }

    #[test]
    fn test_remove_missing_is_none() {
        let mut store = LocalStore::in_memory();
        store.upsert_task(task(1));
        assert!(store.remove_task(9).is_none());
        assert_eq!(store.remove_task(1).unwrap().id, 1);
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn test_changes_are_mirrored_and_rehydrated() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::with_cache(TaskCache::in_dir(dir.path()));
        store.replace_tasks(vec![task(1), task(2)]);
        store.remove_task(1);

        let mut fresh = LocalStore::with_cache(TaskCache::in_dir(dir.path()));
        assert!(fresh.hydrate_from_cache());
        assert_eq!(fresh.tasks(), store.tasks());
    }

    #[test]
    fn test_persist_failure_does_not_block() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        // Cache dir is a regular file, so every save fails.
        let mut store = LocalStore::with_cache(TaskCache::in_dir(&blocker));
        store.upsert_task(task(1));
        assert_eq!(store.tasks().len(), 1);
    }
}
