//! Runner - ワーカースレッド上で動く run ルーチン
//!
//! # フロー
//! 1. ストアから専用の接続を開く
//! 2. その接続で site を解決し、対象オブジェクトがあれば解決する
//! 3. `schedule_next_work()` が false を返すまで繰り返す
//!    - work トランザクションで `do_work()`（成功でコミット、失敗でアボート）
//!    - cleanup トランザクションで `do_cleanup()`（常に実行）
//! 4. 接続を閉じて終了
//!
//! 各スレッドは専用の current-thread runtime を持つので、`do_work()` が
//! ブロックしても止まるのはそのワーカーだけです。
//!
//! ワーカー側のコードが panic しても、接続は必ず閉じてから終了します。

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::watch;
use tracing::{Instrument, debug, error, info, info_span, warn};

use super::context::WorkContext;
use super::options::{FailurePolicy, WorkerOptions};
use super::status::RunReport;
use super::worker::BackgroundWorker;
use crate::domain::{
    ObjectId, Resolving, SiteRef, StoreError, TargetRef, TransactionMeta, UserIdentity, WorkError,
    WorkerError, WorkerId, WorkerState,
};
use crate::ports::{Connection, Site, SiteResolver, StoreHandle};

/// Everything the run routine needs, fixed at construction time.
pub(crate) struct WorkerSpec {
    pub store: StoreHandle,
    pub resolver: Arc<dyn SiteResolver>,
    pub site: SiteRef,
    pub user: UserIdentity,
    pub target: Option<TargetRef>,
    pub options: WorkerOptions,
}

/// A spec plus the names rendered when the worker was started.
pub(crate) struct RunPlan {
    pub id: WorkerId,
    pub name: String,
    pub spec: WorkerSpec,
    pub work_note: String,
    pub cleanup_note: String,
}

impl RunPlan {
    fn meta(&self, note: &str) -> TransactionMeta {
        TransactionMeta::new()
            .with_user(self.spec.user.as_str())
            .with_note(note)
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Work,
    Cleanup,
}

/// Body of the worker thread.
pub(crate) fn run_on_thread<W: BackgroundWorker>(
    mut worker: W,
    plan: RunPlan,
    state_tx: watch::Sender<WorkerState>,
) -> Result<RunReport, WorkerError> {
    state_tx.send_replace(WorkerState::Running);

    let span = info_span!(
        "worker",
        worker_id = %plan.id,
        name = %plan.name,
        site = %plan.spec.site.name,
        user = %plan.spec.user,
    );

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(WorkerError::Runtime)
        .and_then(|runtime| {
            let routine = run(&mut worker, &plan, &state_tx).instrument(span.clone());
            panic::catch_unwind(AssertUnwindSafe(|| runtime.block_on(routine))).unwrap_or_else(
                |payload| Err(WorkerError::Panicked(panic_message(payload.as_ref()))),
            )
        });

    let _entered = span.enter();
    match &result {
        Ok(report) => {
            info!(rounds = report.rounds, failed_rounds = report.failed_rounds, "worker finished");
            state_tx.send_replace(WorkerState::Finished {
                rounds: report.rounds,
            });
        }
        Err(err) => {
            error!(error = %err, "worker failed");
            state_tx.send_replace(WorkerState::Failed {
                reason: err.to_string(),
            });
        }
    }
    result
}

async fn run<W: BackgroundWorker>(
    worker: &mut W,
    plan: &RunPlan,
    state_tx: &watch::Sender<WorkerState>,
) -> Result<RunReport, WorkerError> {
    let spec = &plan.spec;
    let mut connection = spec.store.clone().open()?;
    debug!(connection = %connection.id(), "opened worker connection");

    let resolved = AssertUnwindSafe(resolve(spec, connection.as_mut()))
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| Err(panicked(payload)));
    let (site, target) = match resolved {
        Ok(resolved) => resolved,
        Err(err) => {
            close_quietly(connection.as_mut()).await;
            return Err(err);
        }
    };
    info!(site_oid = %site.oid(), target = ?target, "worker started");

    let mut ctx = WorkContext::new(
        plan.id,
        plan.name.clone(),
        connection,
        site,
        target,
        spec.user.clone(),
    );
    let result = AssertUnwindSafe(rounds(worker, plan, &mut ctx, state_tx))
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| {
            let err = panicked(payload);
            error!(error = %err, "Exception in {}, thread terminated", plan.name);
            Err(err)
        });

    if let Err(err) = ctx.close().await {
        warn!(error = %err, "failed to close worker connection");
    }
    result
}

/// Site first, then the target, both through the worker's own connection.
async fn resolve(
    spec: &WorkerSpec,
    connection: &mut dyn Connection,
) -> Result<(Site, Option<ObjectId>), WorkerError> {
    let site = spec
        .resolver
        .resolve(&mut *connection, &spec.site)
        .await
        .map_err(|source| WorkerError::Resolution {
            what: Resolving::Site,
            oid: spec.site.oid,
            source,
        })?;

    let target = match spec.target {
        Some(target) => {
            connection
                .get(target.oid)
                .await
                .map_err(|source| WorkerError::Resolution {
                    what: Resolving::Target,
                    oid: target.oid,
                    source,
                })?;
            Some(target.oid)
        }
        None => None,
    };

    Ok((site, target))
}

async fn rounds<W: BackgroundWorker>(
    worker: &mut W,
    plan: &RunPlan,
    ctx: &mut WorkContext,
    state_tx: &watch::Sender<WorkerState>,
) -> Result<RunReport, WorkerError> {
    let policy = plan.spec.options.on_failure;
    let mut round: u64 = 0;
    let mut failed_rounds: u64 = 0;

    loop {
        round += 1;
        ctx.set_round(round);
        state_tx.send_replace(WorkerState::Looping { round });
        debug!(round, "starting round");

        let work = transact(worker, ctx, Phase::Work, plan.meta(&plan.work_note)).await;
        let cleanup = transact(worker, ctx, Phase::Cleanup, plan.meta(&plan.cleanup_note)).await;

        if let Err(source) = &work {
            error!(round, error = %source, "Exception in {}", plan.name);
        }
        if let Err(source) = &cleanup {
            error!(round, error = %source, "Exception in {} cleanup", plan.name);
        }
        let failure = match (work, cleanup) {
            (Err(source), _) => Some(WorkerError::Work { round, source }),
            (Ok(()), Err(source)) => Some(WorkerError::Cleanup { round, source }),
            (Ok(()), Ok(())) => None,
        };
        if let Some(err) = failure {
            failed_rounds += 1;
            if policy == FailurePolicy::Stop {
                return Err(err);
            }
        }

        match worker.schedule_next_work(ctx).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(source) => {
                error!(error = %source, "Exception in {}, thread terminated", plan.name);
                return Err(WorkerError::Schedule(source));
            }
        }
    }

    Ok(RunReport {
        worker_id: plan.id,
        name: plan.name.clone(),
        rounds: round,
        failed_rounds,
    })
}

/// Run one phase in its own transaction: commit on success, abort on failure.
async fn transact<W: BackgroundWorker>(
    worker: &mut W,
    ctx: &mut WorkContext,
    phase: Phase,
    meta: TransactionMeta,
) -> Result<(), WorkError> {
    // begin は常にまっさらな状態から（前のラウンドの残骸は捨てる）
    ctx.connection().abort().await?;
    ctx.connection().begin(meta).await?;

    let outcome = match phase {
        Phase::Work => worker.do_work(ctx).await,
        Phase::Cleanup => worker.do_cleanup(ctx).await,
    };

    match outcome {
        Ok(()) => match ctx.connection().commit().await {
            Ok(Some(txn_id)) => {
                debug!(%txn_id, ?phase, "committed");
                Ok(())
            }
            // worker committed on its own
            Ok(None) | Err(StoreError::NoTransaction) => Ok(()),
            Err(err) => Err(err.into()),
        },
        Err(err) => {
            if let Err(abort_err) = ctx.connection().abort().await {
                warn!(error = %abort_err, ?phase, "abort failed");
            }
            Err(err)
        }
    }
}

async fn close_quietly(connection: &mut dyn Connection) {
    if let Err(err) = connection.close().await {
        warn!(error = %err, "failed to close worker connection");
    }
}

fn panicked(payload: Box<dyn Any + Send>) -> WorkerError {
    WorkerError::Panicked(panic_message(payload.as_ref()))
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
