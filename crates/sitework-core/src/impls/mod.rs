//! Impls - ports の実装（開発用・テスト用）
//!
//! # 含まれる実装
//! - **InMemoryStore**: トランザクション + 楽観的競合検出つきのインメモリストア
//! - **OidSiteResolver**: oid で site を解決するデフォルト実装

pub mod inmem_store;
pub mod oid_site;

pub use self::inmem_store::{InMemoryConnection, InMemoryStore};
pub use self::oid_site::OidSiteResolver;
