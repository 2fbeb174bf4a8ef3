//! WorkerOptions - ワーカーの設定
//!
//! 全フィールドにデフォルトがあるので、JSON では変えたいものだけ書けば良い。

use serde::{Deserialize, Serialize};

use crate::domain::template::{DEFAULT_CLEANUP_NOTE, DEFAULT_DESCRIPTION, DEFAULT_WORK_NOTE};

/// What to do when `do_work` (or `do_cleanup`) fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// End the run and surface the error.
    #[default]
    Stop,

    /// Log the error and ask `schedule_next_work` as usual.
    Continue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerOptions {
    /// Daemon workers do not hold up `WorkerGroup::shutdown`.
    pub daemon: bool,

    /// Template for the worker (and thread) name.
    pub description: String,

    /// Template for the work transaction note.
    pub work_note: String,

    /// Template for the cleanup transaction note.
    pub cleanup_note: String,

    pub on_failure: FailurePolicy,
}

impl WorkerOptions {
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            daemon: true,
            description: DEFAULT_DESCRIPTION.to_string(),
            work_note: DEFAULT_WORK_NOTE.to_string(),
            cleanup_note: DEFAULT_CLEANUP_NOTE.to_string(),
            on_failure: FailurePolicy::Stop,
        }
    }
}
