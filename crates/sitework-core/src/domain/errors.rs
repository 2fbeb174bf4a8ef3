//! Errors - エラー型と分類
//!
//! - StoreError: 永続ストア（外部コラボレータ）のエラー
//! - WorkError: ワーカー実装（do_work など）が返すエラー
//! - WorkerError: run ルーチン全体の失敗。`WorkerHandle::join()` で観測できる

use thiserror::Error;

use super::ids::ObjectId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    #[error("write conflict on {0}")]
    Conflict(ObjectId),

    #[error("no transaction in progress")]
    NoTransaction,

    #[error("a transaction is already in progress")]
    TransactionInProgress,

    #[error("connection is closed")]
    Closed,
}

/// Error returned by worker code (`do_work`, `do_cleanup`, `schedule_next_work`).
#[derive(Debug, Error)]
pub enum WorkError {
    #[error("{0}")]
    Failed(String),

    #[error("worker has no target object")]
    NoTarget,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl WorkError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// What a resolution error was trying to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolving {
    Site,
    Target,
}

impl std::fmt::Display for Resolving {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolving::Site => f.write_str("site"),
            Resolving::Target => f.write_str("target"),
        }
    }
}

/// Failure of a worker's run routine.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to resolve {what} {oid}: {source}")]
    Resolution {
        what: Resolving,
        oid: ObjectId,
        #[source]
        source: StoreError,
    },

    #[error("work failed in round {round}: {source}")]
    Work {
        round: u64,
        #[source]
        source: WorkError,
    },

    #[error("cleanup failed in round {round}: {source}")]
    Cleanup {
        round: u64,
        #[source]
        source: WorkError,
    },

    #[error("scheduling failed: {0}")]
    Schedule(#[source] WorkError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("failed to build worker runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("worker panicked: {0}")]
    Panicked(String),
}

impl WorkerError {
    pub fn is_resolution(&self) -> bool {
        matches!(self, WorkerError::Resolution { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    #[test]
    fn resolution_error_names_what_failed() {
        let oid = ObjectId::from_ulid(Ulid::new());
        let err = WorkerError::Resolution {
            what: Resolving::Target,
            oid,
            source: StoreError::NotFound(oid),
        };

        let msg = err.to_string();
        assert!(msg.starts_with("failed to resolve target oid-"));
        assert!(msg.contains("object not found"));
        assert!(err.is_resolution());
    }

    #[test]
    fn store_errors_convert_into_work_errors() {
        let err: WorkError = StoreError::NoTransaction.into();
        assert!(matches!(err, WorkError::Store(StoreError::NoTransaction)));
        assert_eq!(err.to_string(), "no transaction in progress");
    }
}
