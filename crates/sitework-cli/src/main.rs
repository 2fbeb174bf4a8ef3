use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sitework_core::domain::TransactionRecord;
use sitework_core::{
    BackgroundWorker, Connection, InMemoryStore, ObjectStore, OidSiteResolver, SiteRef,
    SiteResolver, UserIdentity, WorkContext, WorkError, WorkerBuilder, WorkerGroup, WorkerOptions,
    WorkerStatus,
};

/// DRAFT -> PUBLISHED のワークフロー遷移（時間のかかる処理のつもり）
struct PublishDocument {
    delay: Duration,
}

#[async_trait]
impl BackgroundWorker for PublishDocument {
    async fn do_work(&mut self, ctx: &mut WorkContext) -> Result<(), WorkError> {
        let mut doc = ctx.load_target().await?;
        if doc["state"] != "DRAFT" {
            return Err(WorkError::failed(format!(
                "cannot publish from state {}",
                doc["state"]
            )));
        }

        tokio::time::sleep(self.delay).await;

        doc["state"] = json!("PUBLISHED");
        doc["published_by"] = json!(ctx.user().as_str());
        ctx.store_target(doc).await
    }

    async fn schedule_next_work(&mut self, _ctx: &WorkContext) -> Result<bool, WorkError> {
        Ok(false)
    }
}

#[derive(Serialize)]
struct Summary {
    workers: Vec<WorkerStatus>,
    documents: Vec<serde_json::Value>,
    history: Vec<TransactionRecord>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // (A) 任意: 第1引数で WorkerOptions の JSON を受け取る
    let options = match std::env::args().nth(1) {
        Some(path) => WorkerOptions::from_json(&std::fs::read_to_string(path)?)?,
        None => WorkerOptions::default(),
    };

    // (B) ストアと site、ドキュメントを用意
    let store = Arc::new(InMemoryStore::new());
    let site_oid = store.insert(json!({ "title": "Demo Site" }));
    let report = store.insert(json!({ "title": "Quarterly report", "state": "DRAFT" }));
    let memo = store.insert(json!({ "title": "Memo", "state": "DRAFT" }));

    // (C) 呼び出し側は自分の接続で site を解決する（この接続はワーカーに渡さない）
    let mut conn = store.clone().open()?;
    let site = OidSiteResolver
        .resolve(conn.as_mut(), &SiteRef::new(site_oid, "demo"))
        .await?;
    let user = UserIdentity::new("admin");

    // (D) ワーカーを起動（report は non-daemon、memo は daemon）
    let mut group = WorkerGroup::new();
    group.start(
        WorkerBuilder::for_site(&site, user.clone())
            .options(options.clone())
            .target(report)
            .daemon(false)
            .build(PublishDocument {
                delay: Duration::from_millis(300),
            })?,
    )?;
    let memo_handle = WorkerBuilder::for_site(&site, user)
        .options(options)
        .target(memo)
        .daemon(true)
        .build(PublishDocument {
            delay: Duration::from_millis(100),
        })?
        .start()?;
    println!("started: {}", memo_handle.name());

    // (E) daemon は状態を待ち、non-daemon は shutdown で join する
    let memo_state = memo_handle.wait().await;
    println!("memo worker: {memo_state:?}");

    let mut workers = group.statuses();
    workers.push(memo_handle.status());
    let shutdown = tokio::task::spawn_blocking(move || group.shutdown()).await?;
    for (id, result) in &shutdown.joined {
        match result {
            Ok(run) => println!("{id}: {} round(s)", run.rounds),
            Err(err) => println!("{id}: {err}"),
        }
    }

    // (F) 新しい接続で結果を確認
    let summary = Summary {
        workers,
        documents: vec![conn.get(report).await?, conn.get(memo).await?],
        history: store.history(),
    };
    conn.close().await?;
    info!(
        joined = shutdown.joined.len(),
        detached = shutdown.detached.len(),
        "demo finished"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
