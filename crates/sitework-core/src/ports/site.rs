//! SiteResolver port - site コンテキストの解決
//!
//! グローバルな「現在の site」は持たず、解決した `Site` を明示的に渡します。

use async_trait::async_trait;
use serde_json::Value;

use super::store::{Connection, StoreHandle};
use crate::domain::{ObjectId, SiteRef, StoreError};

/// Application site resolved inside one particular connection.
#[derive(Clone)]
pub struct Site {
    oid: ObjectId,
    name: String,
    data: Value,
    store: StoreHandle,
}

impl Site {
    pub fn new(oid: ObjectId, name: impl Into<String>, data: Value, store: StoreHandle) -> Self {
        Self {
            oid,
            name: name.into(),
            data,
            store,
        }
    }

    pub fn oid(&self) -> ObjectId {
        self.oid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Site object as it was when resolved.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Handle of the store the site lives in. Opening it yields new connections,
    /// never the one the site was resolved through.
    pub fn store(&self) -> StoreHandle {
        self.store.clone()
    }

    pub fn site_ref(&self) -> SiteRef {
        SiteRef::new(self.oid, self.name.clone())
    }
}

impl std::fmt::Debug for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Site")
            .field("oid", &self.oid)
            .field("name", &self.name)
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}

/// SiteResolver は SiteRef を接続内の Site に解決する
#[async_trait]
pub trait SiteResolver: Send + Sync {
    async fn resolve(
        &self,
        connection: &mut dyn Connection,
        site: &SiteRef,
    ) -> Result<Site, StoreError>;
}
