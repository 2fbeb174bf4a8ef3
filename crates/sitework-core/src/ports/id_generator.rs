//! IdGenerator port - ID 生成の抽象化
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（本番用）

use crate::domain::ids::{ConnectionId, ObjectId, TxnId, WorkerId};
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator は ID を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（ストアは複数のワーカースレッドから共有される）
pub trait IdGenerator: Send + Sync {
    fn generate_object_id(&self) -> ObjectId;

    fn generate_txn_id(&self) -> TxnId;

    fn generate_connection_id(&self) -> ConnectionId;

    fn generate_worker_id(&self) -> WorkerId;
}

/// UlidGenerator は Clock の時刻 + 乱数で ULID を生成
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_object_id(&self) -> ObjectId {
        ObjectId::from(self.next())
    }

    fn generate_txn_id(&self) -> TxnId {
        TxnId::from(self.next())
    }

    fn generate_connection_id(&self) -> ConnectionId {
        ConnectionId::from(self.next())
    }

    fn generate_worker_id(&self) -> WorkerId {
        WorkerId::from(self.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FixedClock, SystemClock};
    use chrono::{TimeZone, Utc};

    #[test]
    fn ulid_generator_generates_unique_ids() {
        let id_gen = UlidGenerator::new(SystemClock);

        let id1 = id_gen.generate_object_id();
        let id2 = id_gen.generate_object_id();

        assert_ne!(id1, id2);
    }

    #[test]
    fn ulid_generator_with_fixed_clock_shares_timestamp() {
        let fixed_time = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let id_gen = UlidGenerator::new(FixedClock::new(fixed_time));

        let id1 = id_gen.generate_txn_id();
        let id2 = id_gen.generate_txn_id();

        // ランダム部分があるので ID は異なるが、timestamp 部分は同じ
        assert_ne!(id1, id2);
        assert_eq!(id1.as_ulid().timestamp_ms(), id2.as_ulid().timestamp_ms());
        assert_eq!(
            id1.as_ulid().timestamp_ms(),
            fixed_time.timestamp_millis() as u64
        );
    }
}
