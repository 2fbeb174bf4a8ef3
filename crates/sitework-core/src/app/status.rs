//! Status - ワーカーの状態スナップショットと実行結果

use serde::{Deserialize, Serialize};

use crate::domain::{WorkerId, WorkerState};

/// Point-in-time view of one worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStatus {
    pub worker_id: WorkerId,
    pub name: String,
    pub daemon: bool,
    #[serde(flatten)]
    pub state: WorkerState,
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub worker_id: WorkerId,
    pub name: String,

    /// Number of `do_work` invocations.
    pub rounds: u64,

    /// Rounds whose work or cleanup failed (only non-zero with `FailurePolicy::Continue`).
    pub failed_rounds: u64,
}
