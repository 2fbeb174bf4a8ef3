//! WorkerHandle - 起動済みワーカーへのハンドル
//!
//! - `join()` でスレッドの終了を待ち、結果（失敗も含む）を受け取る
//! - `wait()` で終了状態になるまで async に待つ
//! - join せずに drop するとスレッドは切り離される（daemon 相当）

use std::thread::JoinHandle;

use tokio::sync::watch;

use super::runner::panic_message;
use super::status::{RunReport, WorkerStatus};
use crate::domain::{WorkerError, WorkerId, WorkerState};

pub struct WorkerHandle {
    id: WorkerId,
    name: String,
    daemon: bool,
    thread: JoinHandle<Result<RunReport, WorkerError>>,
    state: watch::Receiver<WorkerState>,
}

impl WorkerHandle {
    pub(crate) fn new(
        id: WorkerId,
        name: String,
        daemon: bool,
        thread: JoinHandle<Result<RunReport, WorkerError>>,
        state: watch::Receiver<WorkerState>,
    ) -> Self {
        Self {
            id,
            name,
            daemon,
            thread,
            state,
        }
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_daemon(&self) -> bool {
        self.daemon
    }

    /// Latest published state.
    pub fn state(&self) -> WorkerState {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> WorkerStatus {
        WorkerStatus {
            worker_id: self.id,
            name: self.name.clone(),
            daemon: self.daemon,
            state: self.state(),
        }
    }

    /// Has the worker thread exited?
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait (without blocking the async runtime) until the worker reaches a
    /// terminal state.
    pub async fn wait(&self) -> WorkerState {
        let mut rx = self.state.clone();
        let waited = rx
            .wait_for(WorkerState::is_terminal)
            .await
            .map(|state| state.clone());
        match waited {
            Ok(state) => state,
            Err(_) => rx.borrow().clone(),
        }
    }

    /// Block the calling thread until the worker exits.
    pub fn join(self) -> Result<RunReport, WorkerError> {
        self.thread
            .join()
            .unwrap_or_else(|payload| {
                Err(WorkerError::Panicked(panic_message(payload.as_ref())))
            })
    }

    /// Let the thread run on without keeping a handle.
    pub fn detach(self) {}
}

impl std::fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("daemon", &self.daemon)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    fn handle_for(thread: JoinHandle<Result<RunReport, WorkerError>>) -> WorkerHandle {
        let (_state_tx, state_rx) = watch::channel(WorkerState::Created);
        WorkerHandle::new(
            WorkerId::from(Ulid::from_parts(1, 1)),
            "handle test".to_string(),
            false,
            thread,
            state_rx,
        )
    }

    #[test]
    fn join_keeps_the_panic_payload_of_the_thread() {
        let thread = std::thread::spawn(|| -> Result<RunReport, WorkerError> {
            panic!("thread went down: {}", 42);
        });

        match handle_for(thread).join() {
            Err(WorkerError::Panicked(msg)) => assert_eq!(msg, "thread went down: 42"),
            other => panic!("expected panic error, got {other:?}"),
        }
    }

    #[test]
    fn join_returns_the_run_report() {
        let id = WorkerId::from(Ulid::from_parts(1, 1));
        let thread = std::thread::spawn(move || {
            Ok(RunReport {
                worker_id: id,
                name: "handle test".to_string(),
                rounds: 2,
                failed_rounds: 0,
            })
        });

        let report = handle_for(thread).join().unwrap();
        assert_eq!(report.rounds, 2);
    }
}
