//! Ports - 抽象化レイヤー
//!
//! ワーカーが利用する外部コラボレータのインターフェースです。
//! コミット・競合検出のセマンティクスは実装側（ストア）の責務です。

pub mod clock;
pub mod id_generator;
pub mod site;
pub mod store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::site::{Site, SiteResolver};
pub use self::store::{Connection, ObjectStore, StoreHandle};
