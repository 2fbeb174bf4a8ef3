//! sitework-core
//!
//! Background workers that reopen their own connection to a persistent object
//! store, re-resolve the application site there, and repeat a unit of work
//! until they decide to stop.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, refs, state, transaction, template, errors）
//! - **ports**: 抽象化レイヤー（ObjectStore, Connection, SiteResolver, Clock, IdGenerator）
//! - **impls**: 実装（InMemoryStore, OidSiteResolver）
//! - **app**: ワーカー本体（BackgroundWorker, WorkerBuilder, WorkerHandle, WorkerGroup）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{
    BackgroundWorker, BuildError, FailurePolicy, RunReport, WorkContext, WorkerBuilder,
    WorkerGroup, WorkerHandle, WorkerOptions, WorkerStatus, WorkerThread,
};
pub use domain::{
    ObjectId, SiteRef, StoreError, TargetRef, UserIdentity, WorkError, WorkerError, WorkerState,
};
pub use impls::{InMemoryStore, OidSiteResolver};
pub use ports::{Connection, ObjectStore, Site, SiteResolver, StoreHandle};
