//! References - ワーカーが自分の接続で再解決する識別子
//!
//! どれも「識別子だけ」を持ち、オブジェクト本体は持ちません。
//! 本体の解決はワーカースレッド内で、ワーカー専用の接続を通して行います。

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::ObjectId;

/// SiteRef はアプリケーションの site（ルートコンテキスト）を指す
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiteRef {
    pub oid: ObjectId,
    pub name: String,
}

impl SiteRef {
    pub fn new(oid: ObjectId, name: impl Into<String>) -> Self {
        Self {
            oid,
            name: name.into(),
        }
    }
}

impl fmt::Display for SiteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.oid)
    }
}

/// The acting user's name.
///
/// There is no ambient request in the background, so the user travels with the
/// worker and ends up on every transaction it commits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserIdentity(String);

impl UserIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// TargetRef はワーカーが変更する対象オブジェクト（例: ドキュメント）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetRef {
    pub oid: ObjectId,
}

impl TargetRef {
    pub fn new(oid: ObjectId) -> Self {
        Self { oid }
    }
}

impl From<ObjectId> for TargetRef {
    fn from(oid: ObjectId) -> Self {
        Self::new(oid)
    }
}
