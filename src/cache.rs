//! Durable snapshot of the task collection.
//!
//! One named slot (`tasks.json` under the cache directory) holds the last known
//! task list. It is read on startup, before the remote fetch resolves, and
//! rewritten after every change to the task collection.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::task::Task;

/// Name of the single cache slot.
pub const TASKS_SLOT: &str = "tasks";

/// On-disk layout of the slot.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    saved_at_utc: i64,
    tasks: Vec<Task>,
}

/// File-backed slot for the task snapshot.
#[derive(Debug, Clone)]
pub struct TaskCache {
    path: PathBuf,
}

impl TaskCache {
    /// Slot inside `dir`. The directory is created lazily on first save.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("{TASKS_SLOT}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot. A missing or unreadable slot yields `None`.
    pub fn load(&self) -> Option<Vec<Task>> {
        if !self.path.exists() {
            return None;
        }
        let mut buf = String::new();
        if let Err(e) = File::open(&self.path).and_then(|mut f| f.read_to_string(&mut buf)) {
            warn!(path = %self.path.display(), error = %e, "could not read task cache");
            return None;
        }
        match serde_json::from_str::<Snapshot>(&buf) {
            Ok(snapshot) => Some(snapshot.tasks),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "task cache is corrupt, ignoring");
                None
            }
        }
    }

    /// Write the snapshot using temp file + rename.
    pub fn save(&self, tasks: &[Task]) -> io::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let snapshot = Snapshot {
            saved_at_utc: Utc::now().timestamp(),
            tasks: tasks.to_vec(),
        };
        let data = serde_json::to_string_pretty(&snapshot).map_err(io::Error::other)?;
        let tmp = self.path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> Vec<Task> {
        vec![
            Task {
                id: 1,
                description: "Login form".into(),
                module_id: Some(1),
                team_id: Some(2),
                responsible: Some(5),
                done: true,
                story_points: 8,
                estimated_time: 3.0,
                actual_time: Some(2.5),
                date_limit: NaiveDate::from_ymd_opt(2025, 3, 10),
            },
            Task {
                id: 2,
                description: "Password reset".into(),
                module_id: None,
                team_id: None,
                responsible: None,
                done: false,
                story_points: 2,
                estimated_time: 0.5,
                actual_time: None,
                date_limit: None,
            },
        ]
    }

    #[test]
    fn test_round_trip_preserves_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TaskCache::in_dir(&dir.path().join("nested"));
        cache.save(&sample()).unwrap();
        assert_eq!(cache.load().unwrap(), sample());
        assert!(!cache.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_missing_slot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(TaskCache::in_dir(dir.path()).load().is_none());
    }

    #[test]
    fn test_corrupt_slot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TaskCache::in_dir(dir.path());
        fs::write(cache.path(), "{not json").unwrap();
        assert!(cache.load().is_none());
    }
}
