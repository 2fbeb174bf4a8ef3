//! WorkerBuilder - ワーカーの構築
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 構築時検証（Fail-fast 設計）
//! - 構築時は識別子を保存するだけ（ストアには触らない）

use std::sync::Arc;

use super::options::{FailurePolicy, WorkerOptions};
use super::runner::WorkerSpec;
use super::thread::WorkerThread;
use super::worker::BackgroundWorker;
use crate::domain::{SiteRef, TargetRef, UserIdentity};
use crate::impls::OidSiteResolver;
use crate::ports::{IdGenerator, Site, SiteResolver, StoreHandle, SystemClock, UlidGenerator};

/// WorkerBuilder はワーカーを構築
///
/// # 使用例
/// ```ignore
/// let thread = WorkerBuilder::for_site(&site, UserIdentity::new("admin"))
///     .target(document_oid)
///     .daemon(false)
///     .build(Publish)?;
/// let handle = thread.start()?;
/// ```
///
/// # Fail-fast 設計
/// - site 名・ユーザー名・description が空なら BuildError
/// - site や対象が実在するかは、ワーカースレッド内で初めて確認する
pub struct WorkerBuilder {
    store: StoreHandle,
    site: SiteRef,
    user: UserIdentity,
    target: Option<TargetRef>,
    resolver: Arc<dyn SiteResolver>,
    options: WorkerOptions,
    ids: Arc<dyn IdGenerator>,
}

/// BuildError はワーカー構築時のエラー
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("site name must not be empty")]
    EmptySiteName,

    #[error("user name must not be empty")]
    EmptyUserName,

    #[error("description template must not be empty")]
    EmptyDescription,
}

impl WorkerBuilder {
    pub fn new(store: StoreHandle, site: SiteRef, user: UserIdentity) -> Self {
        Self {
            store,
            site,
            user,
            target: None,
            resolver: Arc::new(OidSiteResolver::new()),
            options: WorkerOptions::default(),
            ids: Arc::new(UlidGenerator::new(SystemClock)),
        }
    }

    /// Builder for a site the caller already resolved in its own connection.
    ///
    /// Only the site's store handle and identity are kept; the caller's
    /// connection is never handed to the worker.
    pub fn for_site(site: &Site, user: UserIdentity) -> Self {
        Self::new(site.store(), site.site_ref(), user)
    }

    pub fn target(mut self, target: impl Into<TargetRef>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn daemon(mut self, daemon: bool) -> Self {
        self.options.daemon = daemon;
        self
    }

    pub fn description(mut self, template: impl Into<String>) -> Self {
        self.options.description = template.into();
        self
    }

    pub fn work_note(mut self, template: impl Into<String>) -> Self {
        self.options.work_note = template.into();
        self
    }

    pub fn cleanup_note(mut self, template: impl Into<String>) -> Self {
        self.options.cleanup_note = template.into();
        self
    }

    pub fn on_failure(mut self, policy: FailurePolicy) -> Self {
        self.options.on_failure = policy;
        self
    }

    /// Replace all options at once (e.g. loaded with `WorkerOptions::from_json`).
    pub fn options(mut self, options: WorkerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn resolver(mut self, resolver: Arc<dyn SiteResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Validate and pair the configuration with `worker`.
    pub fn build<W: BackgroundWorker>(self, worker: W) -> Result<WorkerThread<W>, BuildError> {
        if self.site.name.trim().is_empty() {
            return Err(BuildError::EmptySiteName);
        }
        if self.user.as_str().trim().is_empty() {
            return Err(BuildError::EmptyUserName);
        }
        if self.options.description.trim().is_empty() {
            return Err(BuildError::EmptyDescription);
        }

        let spec = WorkerSpec {
            store: self.store,
            resolver: self.resolver,
            site: self.site,
            user: self.user,
            target: self.target,
            options: self.options,
        };
        Ok(WorkerThread::new(self.ids.generate_worker_id(), worker, spec))
    }
}
