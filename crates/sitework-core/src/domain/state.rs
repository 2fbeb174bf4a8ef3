//! Worker lifecycle state.

use serde::{Deserialize, Serialize};

/// WorkerState はワーカーのライフサイクル
///
/// State transitions:
/// - Created -> Running -> Looping{1} -> Looping{2} -> ... -> Finished
/// - Created -> Running -> (Looping{n} ->) Failed
///
/// There is no Paused or Cancelled state: a worker runs until its own
/// `schedule_next_work` says stop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerState {
    /// Constructed on the caller's thread, not started yet.
    Created,

    /// Thread started; opening the connection and resolving the site/target.
    Running,

    /// Executing round `round` (1-indexed).
    Looping { round: u64 },

    /// `schedule_next_work` returned false after `rounds` rounds.
    Finished { rounds: u64 },

    /// The run routine ended with an error.
    Failed { reason: String },
}

impl WorkerState {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkerState::Finished { .. } | WorkerState::Failed { .. })
    }
}
