//! WorkerThread - 構築済み・未起動のワーカー
//!
//! 呼び出し元のスレッドで作る（安い）。`start()` で専用 OS スレッドに渡し、
//! すぐに戻る。

use tokio::sync::watch;
use tracing::info;

use super::handle::WorkerHandle;
use super::runner::{self, RunPlan, WorkerSpec};
use super::worker::BackgroundWorker;
use crate::domain::template::{TemplateVars, render};
use crate::domain::{SiteRef, TargetRef, UserIdentity, WorkerError, WorkerId, WorkerState};

/// A configured worker that has not been started yet.
pub struct WorkerThread<W> {
    id: WorkerId,
    name: String,
    class_name: String,
    worker: W,
    spec: WorkerSpec,
}

impl<W: BackgroundWorker> WorkerThread<W> {
    pub(crate) fn new(id: WorkerId, worker: W, spec: WorkerSpec) -> Self {
        let class_name = worker.kind().to_string();
        let name = render(
            &spec.options.description,
            &TemplateVars {
                thread_name: "",
                class_name: &class_name,
                site_name: &spec.site.name,
                user_name: spec.user.as_str(),
            },
        );
        Self {
            id,
            name,
            class_name,
            worker,
            spec,
        }
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// Rendered description; also the OS thread name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn is_daemon(&self) -> bool {
        self.spec.options.daemon
    }

    pub fn state(&self) -> WorkerState {
        WorkerState::Created
    }

    pub fn site(&self) -> &SiteRef {
        &self.spec.site
    }

    pub fn user(&self) -> &UserIdentity {
        &self.spec.user
    }

    pub fn target(&self) -> Option<TargetRef> {
        self.spec.target
    }

    pub fn worker(&self) -> &W {
        &self.worker
    }

    /// Note recorded on each work transaction.
    pub fn transaction_note(&self) -> String {
        render(&self.spec.options.work_note, &self.vars())
    }

    /// Note recorded on each cleanup transaction.
    pub fn cleanup_note(&self) -> String {
        render(&self.spec.options.cleanup_note, &self.vars())
    }

    fn vars(&self) -> TemplateVars<'_> {
        TemplateVars {
            thread_name: &self.name,
            class_name: &self.class_name,
            site_name: &self.spec.site.name,
            user_name: self.spec.user.as_str(),
        }
    }
}

impl<W: BackgroundWorker + 'static> WorkerThread<W> {
    /// Hand the worker to a new OS thread and return immediately.
    pub fn start(self) -> Result<WorkerHandle, WorkerError> {
        let work_note = self.transaction_note();
        let cleanup_note = self.cleanup_note();
        let Self {
            id,
            name,
            worker,
            spec,
            ..
        } = self;

        let daemon = spec.options.daemon;
        let (state_tx, state_rx) = watch::channel(WorkerState::Created);
        let plan = RunPlan {
            id,
            name: name.clone(),
            spec,
            work_note,
            cleanup_note,
        };

        let thread = std::thread::Builder::new()
            .name(name.replace('\0', ""))
            .spawn(move || runner::run_on_thread(worker, plan, state_tx))
            .map_err(WorkerError::Spawn)?;

        info!(worker_id = %id, name = %name, daemon, "worker thread started");
        Ok(WorkerHandle::new(id, name, daemon, thread, state_rx))
    }
}
