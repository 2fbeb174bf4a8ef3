//! WorkerGroup - プロセス終了時の daemon / non-daemon の扱い
//!
//! - `start()` で起動したワーカーを覚えておく
//! - `shutdown()` で non-daemon ワーカーの終了を待ち、daemon ワーカーは切り離す
//!
//! 実行中のワーカーを止める手段はありません（キャンセルは非対応）。

use tracing::{info, warn};

use super::handle::WorkerHandle;
use super::status::{RunReport, WorkerStatus};
use super::thread::WorkerThread;
use super::worker::BackgroundWorker;
use crate::domain::{WorkerError, WorkerId};

#[derive(Debug, Default)]
pub struct WorkerGroup {
    handles: Vec<WorkerHandle>,
}

/// Outcome of [`WorkerGroup::shutdown`].
#[derive(Debug, Default)]
pub struct ShutdownReport {
    /// Non-daemon workers, joined, with their results.
    pub joined: Vec<(WorkerId, Result<RunReport, WorkerError>)>,

    /// Daemon workers left running (or already done) without joining.
    pub detached: Vec<WorkerId>,
}

impl WorkerGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `thread` and keep its handle.
    pub fn start<W: BackgroundWorker + 'static>(
        &mut self,
        thread: WorkerThread<W>,
    ) -> Result<WorkerId, WorkerError> {
        let handle = thread.start()?;
        let id = handle.id();
        self.handles.push(handle);
        Ok(id)
    }

    /// Track a worker that was started elsewhere.
    pub fn add(&mut self, handle: WorkerHandle) {
        self.handles.push(handle);
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn statuses(&self) -> Vec<WorkerStatus> {
        self.handles.iter().map(WorkerHandle::status).collect()
    }

    /// Block until every non-daemon worker has exited; detach the rest.
    pub fn shutdown(self) -> ShutdownReport {
        let mut report = ShutdownReport::default();
        for handle in self.handles {
            let id = handle.id();
            if handle.is_daemon() {
                if !handle.is_finished() {
                    info!(worker_id = %id, name = handle.name(), "detaching daemon worker");
                }
                handle.detach();
                report.detached.push(id);
                continue;
            }

            let result = handle.join();
            if let Err(err) = &result {
                warn!(worker_id = %id, error = %err, "non-daemon worker ended with error");
            }
            report.joined.push((id, result));
        }
        report
    }
}
