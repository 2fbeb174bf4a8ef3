//! ObjectStore port - 永続オブジェクトストア（ZODB 相当）
//!
//! ストア本体（`ObjectStore`）は複数スレッドで共有し、接続（`Connection`）は
//! 1 スレッドが専有します。接続を共有すると整合性が壊れるため、
//! ワーカーは必ず自分で `open()` します。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{ConnectionId, ObjectId, StoreError, TransactionMeta, TxnId};

/// Shared handle from which independent connections are opened.
pub type StoreHandle = Arc<dyn ObjectStore>;

/// ObjectStore は接続を払い出す
///
/// # 設計原則
/// - `open()` のたびに独立した接続を返す
/// - コミット時の競合検出はストアの責務（ワーカーは関知しない）
pub trait ObjectStore: Send + Sync {
    fn open(self: Arc<Self>) -> Result<Box<dyn Connection>, StoreError>;
}

/// One connection to the store, owned by a single thread of execution.
///
/// Reads outside a transaction see the latest committed state. Writes need a
/// transaction. After `commit` returns, the transaction is over whatever the
/// result was.
#[async_trait]
pub trait Connection: Send + Sync {
    fn id(&self) -> ConnectionId;

    /// The store this connection was opened from.
    fn store(&self) -> StoreHandle;

    async fn get(&mut self, oid: ObjectId) -> Result<Value, StoreError>;

    async fn put(&mut self, oid: ObjectId, value: Value) -> Result<(), StoreError>;

    async fn begin(&mut self, meta: TransactionMeta) -> Result<(), StoreError>;

    /// Commit the current transaction. Returns `None` when nothing was written.
    async fn commit(&mut self) -> Result<Option<TxnId>, StoreError>;

    /// Discard the current transaction, if any.
    async fn abort(&mut self) -> Result<(), StoreError>;

    /// Close the connection. Pending changes are discarded. Idempotent.
    async fn close(&mut self) -> Result<(), StoreError>;
}
