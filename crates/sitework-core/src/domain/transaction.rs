//! Transaction metadata and committed transaction records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ObjectId, TxnId};

/// Metadata attached to a transaction when it begins.
///
/// The store copies it onto the [`TransactionRecord`] at commit time, so
/// history browsers can tell who changed what and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default = "default_path")]
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

fn default_path() -> String {
    "/".to_string()
}

impl TransactionMeta {
    pub fn new() -> Self {
        Self {
            user: None,
            path: default_path(),
            note: None,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// User label as recorded in history: `"{path} {user}"`, or empty when
    /// there is no user.
    pub fn user_label(&self) -> String {
        match &self.user {
            Some(user) => format!("{} {}", self.path, user),
            None => String::new(),
        }
    }
}

impl Default for TransactionMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// One committed transaction, as kept in store history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub txn_id: TxnId,
    pub meta: TransactionMeta,
    pub committed_at: DateTime<Utc>,

    /// Objects written by this transaction, in oid order.
    pub oids: Vec<ObjectId>,
}
