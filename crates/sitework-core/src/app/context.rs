//! WorkContext - ワーカースレッド内で使う明示的なコンテキスト
//!
//! 「現在の site」をグローバルに置かず、接続・site・対象・ユーザーを
//! まとめてワーカーのメソッドに渡します。

use serde_json::Value;

use crate::domain::{ObjectId, StoreError, UserIdentity, WorkError, WorkerId};
use crate::ports::{Connection, Site};

/// Everything a worker may touch while running, all owned by its thread.
pub struct WorkContext {
    worker_id: WorkerId,
    worker_name: String,
    connection: Box<dyn Connection>,
    site: Site,
    target: Option<ObjectId>,
    user: UserIdentity,
    round: u64,
}

impl WorkContext {
    pub(crate) fn new(
        worker_id: WorkerId,
        worker_name: String,
        connection: Box<dyn Connection>,
        site: Site,
        target: Option<ObjectId>,
        user: UserIdentity,
    ) -> Self {
        Self {
            worker_id,
            worker_name,
            connection,
            site,
            target,
            user,
            round: 0,
        }
    }

    pub fn worker_id(&self) -> WorkerId {
        self.worker_id
    }

    pub fn worker_name(&self) -> &str {
        &self.worker_name
    }

    /// The worker's own connection. Never shared with the caller.
    pub fn connection(&mut self) -> &mut dyn Connection {
        self.connection.as_mut()
    }

    pub fn connection_ref(&self) -> &dyn Connection {
        self.connection.as_ref()
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    pub fn target(&self) -> Option<ObjectId> {
        self.target
    }

    pub fn user(&self) -> &UserIdentity {
        &self.user
    }

    /// Current round, 1-indexed. Zero before the first round starts.
    pub fn round(&self) -> u64 {
        self.round
    }

    pub(crate) fn set_round(&mut self, round: u64) {
        self.round = round;
    }

    /// Load the target object through the worker's connection.
    pub async fn load_target(&mut self) -> Result<Value, WorkError> {
        let oid = self.target.ok_or(WorkError::NoTarget)?;
        Ok(self.connection.get(oid).await?)
    }

    /// Stage a new value for the target object in the current transaction.
    pub async fn store_target(&mut self, value: Value) -> Result<(), WorkError> {
        let oid = self.target.ok_or(WorkError::NoTarget)?;
        Ok(self.connection.put(oid, value).await?)
    }

    pub(crate) async fn close(&mut self) -> Result<(), StoreError> {
        self.connection.close().await
    }
}
