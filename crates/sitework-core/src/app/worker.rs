//! BackgroundWorker trait - バックグラウンドで実行する処理の定義
//!
//! # 学習ポイント
//! - 継承の代わりに trait（必須メソッド 2 つ + デフォルト実装）
//! - async_trait による async メソッド

use async_trait::async_trait;

use super::context::WorkContext;
use crate::domain::WorkError;

/// BackgroundWorker は 1 ラウンド分の処理と「次をやるか」の判断を提供する
///
/// # 使用例
/// ```ignore
/// struct Publish;
///
/// #[async_trait]
/// impl BackgroundWorker for Publish {
///     async fn do_work(&mut self, ctx: &mut WorkContext) -> Result<(), WorkError> {
///         let mut doc = ctx.load_target().await?;
///         doc["state"] = "PUBLISHED".into();
///         ctx.store_target(doc).await
///     }
///
///     async fn schedule_next_work(&mut self, _ctx: &WorkContext) -> Result<bool, WorkError> {
///         Ok(false)
///     }
/// }
/// ```
///
/// # 呼び出し順
/// 1. `do_work`（work トランザクション内。成功でコミット、失敗でアボート）
/// 2. `do_cleanup`（別の cleanup トランザクション内。`do_work` が失敗しても呼ばれる）
/// 3. `schedule_next_work`（false で終了）
#[async_trait]
pub trait BackgroundWorker: Send {
    /// Perform one unit of work. May block; only this worker's thread waits.
    async fn do_work(&mut self, ctx: &mut WorkContext) -> Result<(), WorkError>;

    /// Decide whether to run another round. May wait until work is available.
    async fn schedule_next_work(&mut self, ctx: &WorkContext) -> Result<bool, WorkError>;

    /// Clean up after a round. Does nothing by default.
    async fn do_cleanup(&mut self, _ctx: &mut WorkContext) -> Result<(), WorkError> {
        Ok(())
    }

    /// Name used as `{class_name}` in descriptions and notes.
    fn kind(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }
}

/// `"my_crate::jobs::Publish<T>"` -> `"Publish"`
fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Idle;

    #[async_trait]
    impl BackgroundWorker for Idle {
        async fn do_work(&mut self, _ctx: &mut WorkContext) -> Result<(), WorkError> {
            Ok(())
        }

        async fn schedule_next_work(&mut self, _ctx: &WorkContext) -> Result<bool, WorkError> {
            Ok(false)
        }
    }

    #[test]
    fn kind_defaults_to_short_type_name() {
        assert_eq!(Idle.kind(), "Idle");
    }

    #[test]
    fn short_type_name_strips_path_and_generics() {
        assert_eq!(short_type_name("a::b::Publish"), "Publish");
        assert_eq!(short_type_name("a::Wrap<b::Inner>"), "Wrap");
        assert_eq!(short_type_name("Plain"), "Plain");
    }
}
