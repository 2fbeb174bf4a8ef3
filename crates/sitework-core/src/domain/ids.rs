//! Domain identifiers (strongly-typed IDs).
//!
//! ULID ベースの ID を Phantom type パターンで型ごとに区別します。
//! ObjectId と ConnectionId は同じ表現ですが、混同するとコンパイルエラーになります。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"oid-", "txn-" など）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
///
/// `T` は PhantomData なので実行時のサイズは Ulid と同じです。
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// 永続オブジェクトのマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Object {}

impl IdMarker for Object {
    fn prefix() -> &'static str {
        "oid-"
    }
}

/// コミット済みトランザクションのマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Txn {}

impl IdMarker for Txn {
    fn prefix() -> &'static str {
        "txn-"
    }
}

/// ストア接続のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Conn {}

impl IdMarker for Conn {
    fn prefix() -> &'static str {
        "conn-"
    }
}

/// バックグラウンドワーカーのマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Worker {}

impl IdMarker for Worker {
    fn prefix() -> &'static str {
        "worker-"
    }
}

/// Identifier of an object in the persistent store.
pub type ObjectId = Id<Object>;

/// Identifier of a committed transaction.
pub type TxnId = Id<Txn>;

/// Identifier of one open connection to the store.
pub type ConnectionId = Id<Conn>;

/// Identifier of a started (or startable) background worker.
pub type WorkerId = Id<Worker>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_type_prefix() {
        let ulid = Ulid::new();

        assert!(ObjectId::from_ulid(ulid).to_string().starts_with("oid-"));
        assert!(TxnId::from_ulid(ulid).to_string().starts_with("txn-"));
        assert!(ConnectionId::from_ulid(ulid).to_string().starts_with("conn-"));
        assert!(WorkerId::from_ulid(ulid).to_string().starts_with("worker-"));

        // let _: ObjectId = ConnectionId::from_ulid(ulid); // <- does not compile
    }

    #[test]
    fn ids_can_be_serialized() {
        let oid = ObjectId::from_ulid(Ulid::new());

        let serialized = serde_json::to_string(&oid).unwrap();
        let deserialized: ObjectId = serde_json::from_str(&serialized).unwrap();

        assert_eq!(oid, deserialized);
    }

    #[test]
    fn phantom_data_does_not_consume_memory() {
        use std::mem::size_of;

        assert_eq!(size_of::<ObjectId>(), size_of::<Ulid>());
        assert_eq!(size_of::<WorkerId>(), 16);
    }
}
