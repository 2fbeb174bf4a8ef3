//! InMemoryStore - 開発・テスト用のオブジェクトストア
//!
//! # 学習ポイント
//! - `self: Arc<Self>` レシーバで接続にストアのハンドルを持たせる
//! - 楽観的並行制御（serial 番号によるコミット時の競合検出）
//! - Mutex は await を跨がずに短く持つ

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{
    ConnectionId, ObjectId, StoreError, TransactionMeta, TransactionRecord, TxnId,
};
use crate::ports::{
    Clock, Connection, IdGenerator, ObjectStore, StoreHandle, SystemClock, UlidGenerator,
};

/// Committed object plus its serial (bumped on every committed write).
#[derive(Debug, Clone)]
struct Slot {
    value: Value,
    serial: u64,
}

#[derive(Debug, Default)]
struct StoreState {
    objects: HashMap<ObjectId, Slot>,
    history: Vec<TransactionRecord>,
    opened: usize,
    closed: usize,
}

/// InMemoryStore は ZODB 風のインメモリストア
///
/// # 実装詳細
/// - コミット済みの状態は `StoreState` が唯一の正本
/// - 接続はトランザクション中に読んだ/書いた serial を覚えておく
/// - コミット時、書き込み対象の serial が変わっていれば `StoreError::Conflict`
///
/// # 使用例
/// ```ignore
/// let store = Arc::new(InMemoryStore::new());
/// let oid = store.insert(json!({ "state": "DRAFT" }));
/// let mut conn = store.clone().open()?;
/// ```
pub struct InMemoryStore {
    state: Mutex<StoreState>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Store whose history timestamps and ids come from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let ids = Arc::new(UlidGenerator::new(ClockRef(clock.clone())));
        Self {
            state: Mutex::new(StoreState::default()),
            clock,
            ids,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a committed object outside any transaction.
    pub fn insert(&self, value: Value) -> ObjectId {
        let oid = self.ids.generate_object_id();
        self.lock().objects.insert(oid, Slot { value, serial: 1 });
        oid
    }

    /// Committed transactions, oldest first.
    pub fn history(&self) -> Vec<TransactionRecord> {
        self.lock().history.clone()
    }

    /// Number of connections opened so far.
    pub fn opened(&self) -> usize {
        self.lock().opened
    }

    /// Number of connections closed so far.
    pub fn closed(&self) -> usize {
        self.lock().closed
    }

    fn serial_of(&self, oid: ObjectId) -> u64 {
        self.lock().objects.get(&oid).map_or(0, |slot| slot.serial)
    }

    fn load(&self, oid: ObjectId) -> Result<Slot, StoreError> {
        self.lock()
            .objects
            .get(&oid)
            .cloned()
            .ok_or(StoreError::NotFound(oid))
    }

    fn apply(&self, txn: PendingTxn) -> Result<Option<TxnId>, StoreError> {
        if txn.writes.is_empty() {
            return Ok(None);
        }

        let mut state = self.lock();
        for oid in txn.writes.keys() {
            let current = state.objects.get(oid).map_or(0, |slot| slot.serial);
            let seen = txn.seen.get(oid).copied().unwrap_or(0);
            if current != seen {
                return Err(StoreError::Conflict(*oid));
            }
        }

        let oids: Vec<ObjectId> = txn.writes.keys().copied().collect();
        for (oid, value) in txn.writes {
            let slot = state.objects.entry(oid).or_insert(Slot {
                value: Value::Null,
                serial: 0,
            });
            slot.value = value;
            slot.serial += 1;
        }

        let txn_id = self.ids.generate_txn_id();
        state.history.push(TransactionRecord {
            txn_id,
            meta: txn.meta,
            committed_at: self.clock.now(),
            oids,
        });
        Ok(Some(txn_id))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryStore {
    fn open(self: Arc<Self>) -> Result<Box<dyn Connection>, StoreError> {
        let id = self.ids.generate_connection_id();
        self.lock().opened += 1;
        Ok(Box::new(InMemoryConnection {
            id,
            store: self,
            txn: None,
            closed: false,
        }))
    }
}

/// `UlidGenerator` wants an owned clock; share the store's one.
struct ClockRef(Arc<dyn Clock>);

impl Clock for ClockRef {
    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.0.now()
    }
}

/// Uncommitted transaction state of one connection.
#[derive(Debug)]
struct PendingTxn {
    meta: TransactionMeta,
    /// Serial of each object when this transaction first touched it.
    seen: HashMap<ObjectId, u64>,
    writes: BTreeMap<ObjectId, Value>,
}

/// Connection handed out by [`InMemoryStore::open`].
pub struct InMemoryConnection {
    id: ConnectionId,
    store: Arc<InMemoryStore>,
    txn: Option<PendingTxn>,
    closed: bool,
}

impl InMemoryConnection {
    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    pub fn in_transaction(&self) -> bool {
        self.txn.is_some()
    }
}

#[async_trait]
impl Connection for InMemoryConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn store(&self) -> StoreHandle {
        self.store.clone()
    }

    async fn get(&mut self, oid: ObjectId) -> Result<Value, StoreError> {
        self.ensure_open()?;

        if let Some(txn) = &self.txn
            && let Some(value) = txn.writes.get(&oid)
        {
            return Ok(value.clone());
        }

        let slot = self.store.load(oid)?;
        if let Some(txn) = &mut self.txn {
            txn.seen.entry(oid).or_insert(slot.serial);
        }
        Ok(slot.value)
    }

    async fn put(&mut self, oid: ObjectId, value: Value) -> Result<(), StoreError> {
        self.ensure_open()?;
        let Some(txn) = &mut self.txn else {
            return Err(StoreError::NoTransaction);
        };

        if !txn.seen.contains_key(&oid) {
            let serial = self.store.serial_of(oid);
            txn.seen.insert(oid, serial);
        }
        txn.writes.insert(oid, value);
        Ok(())
    }

    async fn begin(&mut self, meta: TransactionMeta) -> Result<(), StoreError> {
        self.ensure_open()?;
        if self.txn.is_some() {
            return Err(StoreError::TransactionInProgress);
        }
        self.txn = Some(PendingTxn {
            meta,
            seen: HashMap::new(),
            writes: BTreeMap::new(),
        });
        Ok(())
    }

    async fn commit(&mut self) -> Result<Option<TxnId>, StoreError> {
        self.ensure_open()?;
        let txn = self.txn.take().ok_or(StoreError::NoTransaction)?;
        self.store.apply(txn)
    }

    async fn abort(&mut self) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.txn = None;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        if self.closed {
            return Ok(());
        }
        self.txn = None;
        self.closed = true;
        self.store.lock().closed += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::FixedClock;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn store() -> Arc<InMemoryStore> {
        Arc::new(InMemoryStore::new())
    }

    #[tokio::test]
    async fn open_and_close_are_counted() {
        let store = store();
        let mut conn = store.clone().open().unwrap();
        assert_eq!((store.opened(), store.closed()), (1, 0));

        conn.close().await.unwrap();
        conn.close().await.unwrap();
        assert_eq!((store.opened(), store.closed()), (1, 1));
    }

    #[tokio::test]
    async fn connections_are_distinct() {
        let store = store();
        let a = store.clone().open().unwrap();
        let b = store.clone().open().unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn commit_publishes_writes_to_other_connections() {
        let store = store();
        let oid = store.insert(json!({ "state": "DRAFT" }));

        let mut writer = store.clone().open().unwrap();
        writer
            .begin(TransactionMeta::new().with_user("admin").with_note("publish"))
            .await
            .unwrap();
        writer.put(oid, json!({ "state": "PUBLISHED" })).await.unwrap();

        let mut reader = store.clone().open().unwrap();
        assert_eq!(reader.get(oid).await.unwrap()["state"], "DRAFT");

        let txn_id = writer.commit().await.unwrap();
        assert!(txn_id.is_some());
        assert_eq!(reader.get(oid).await.unwrap()["state"], "PUBLISHED");
    }

    #[tokio::test]
    async fn writes_are_visible_inside_own_transaction() {
        let store = store();
        let oid = store.insert(json!(1));
        let mut conn = store.clone().open().unwrap();

        conn.begin(TransactionMeta::new()).await.unwrap();
        conn.put(oid, json!(2)).await.unwrap();
        assert_eq!(conn.get(oid).await.unwrap(), json!(2));
    }

    #[tokio::test]
    async fn abort_discards_writes() {
        let store = store();
        let oid = store.insert(json!(1));
        let mut conn = store.clone().open().unwrap();

        conn.begin(TransactionMeta::new()).await.unwrap();
        conn.put(oid, json!(2)).await.unwrap();
        conn.abort().await.unwrap();

        assert_eq!(conn.get(oid).await.unwrap(), json!(1));
        assert!(store.history().is_empty());
    }

    #[tokio::test]
    async fn put_without_transaction_fails() {
        let store = store();
        let oid = store.insert(json!(1));
        let mut conn = store.clone().open().unwrap();

        let err = conn.put(oid, json!(2)).await.unwrap_err();
        assert_eq!(err, StoreError::NoTransaction);
    }

    #[tokio::test]
    async fn nested_begin_is_rejected() {
        let store = store();
        let mut conn = store.clone().open().unwrap();

        conn.begin(TransactionMeta::new()).await.unwrap();
        let err = conn.begin(TransactionMeta::new()).await.unwrap_err();
        assert_eq!(err, StoreError::TransactionInProgress);
    }

    #[tokio::test]
    async fn concurrent_writes_to_same_object_conflict() {
        let store = store();
        let oid = store.insert(json!({ "count": 0 }));

        let mut a = store.clone().open().unwrap();
        let mut b = store.clone().open().unwrap();
        a.begin(TransactionMeta::new()).await.unwrap();
        b.begin(TransactionMeta::new()).await.unwrap();

        a.get(oid).await.unwrap();
        b.get(oid).await.unwrap();
        a.put(oid, json!({ "count": 1 })).await.unwrap();
        b.put(oid, json!({ "count": 2 })).await.unwrap();

        a.commit().await.unwrap();
        let err = b.commit().await.unwrap_err();
        assert_eq!(err, StoreError::Conflict(oid));

        // 失敗したコミットでもトランザクションは終わっている
        assert!(matches!(
            b.commit().await.unwrap_err(),
            StoreError::NoTransaction
        ));
        assert_eq!(b.get(oid).await.unwrap()["count"], 1);
    }

    #[tokio::test]
    async fn empty_commit_records_nothing() {
        let store = store();
        let mut conn = store.clone().open().unwrap();

        conn.begin(TransactionMeta::new().with_note("noop")).await.unwrap();
        assert_eq!(conn.commit().await.unwrap(), None);
        assert!(store.history().is_empty());
    }

    #[tokio::test]
    async fn history_keeps_meta_and_time() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let store = Arc::new(InMemoryStore::with_clock(Arc::new(FixedClock::new(at))));
        let oid = store.insert(json!({}));
        let mut conn = store.clone().open().unwrap();

        conn.begin(TransactionMeta::new().with_user("bob").with_note("doing stuff"))
            .await
            .unwrap();
        conn.put(oid, json!({ "touched": true })).await.unwrap();
        let txn_id = conn.commit().await.unwrap().unwrap();

        let history = store.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].txn_id, txn_id);
        assert_eq!(history[0].meta.user_label(), "/ bob");
        assert_eq!(history[0].meta.note.as_deref(), Some("doing stuff"));
        assert_eq!(history[0].committed_at, at);
        assert_eq!(history[0].oids, vec![oid]);
    }

    #[tokio::test]
    async fn closed_connection_rejects_use() {
        let store = store();
        let oid = store.insert(json!(1));
        let mut conn = store.clone().open().unwrap();
        conn.close().await.unwrap();

        assert_eq!(conn.get(oid).await.unwrap_err(), StoreError::Closed);
        assert_eq!(
            conn.begin(TransactionMeta::new()).await.unwrap_err(),
            StoreError::Closed
        );
    }
}
