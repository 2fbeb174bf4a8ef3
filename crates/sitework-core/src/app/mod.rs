//! App - アプリケーション層
//!
//! ports を組み合わせてバックグラウンドワーカーを動かします。
//!
//! # 主要コンポーネント
//! - **BackgroundWorker**: ワーカーが実装する trait（do_work / schedule_next_work）
//! - **WorkerBuilder**: 構築と検証
//! - **WorkerThread**: 未起動のワーカー（`start()` で OS スレッドへ）
//! - **WorkerHandle**: 起動済みワーカーの状態取得と join
//! - **WorkerGroup**: daemon / non-daemon を考慮した終了処理

pub mod builder;
pub mod context;
pub mod group;
pub mod handle;
pub mod options;
mod runner;
pub mod status;
pub mod thread;
pub mod worker;

pub use self::builder::{BuildError, WorkerBuilder};
pub use self::context::WorkContext;
pub use self::group::{ShutdownReport, WorkerGroup};
pub use self::handle::WorkerHandle;
pub use self::options::{FailurePolicy, WorkerOptions};
pub use self::status::{RunReport, WorkerStatus};
pub use self::thread::WorkerThread;
pub use self::worker::BackgroundWorker;
