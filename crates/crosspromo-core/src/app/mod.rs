//! App - アプリケーション層
//!
//! ports を組み合わせて販促ライフサイクルを実装します。
//!
//! # 主要コンポーネント
//! - **PromoAppBuilder**: ワイヤリングと起動時検証
//! - **PromoDispatcher**: キャンペーンの展開（配信先ごとに独立）
//! - **ExpiryWorker**: 期限切れの回収ループ（キャンセル可能）
//! - **ManualDelete**: promo_id 指定の削除
//! - **retire**: 上 2 つが共有する delete → purge
//! - **PromoListing**: 一覧・詳細・統計
//! - **CampaignSessions**: 管理者ごとの作成中状態

pub mod builder;
pub mod config;
pub mod dispatcher;
pub mod expiry_worker;
pub mod factory;
pub mod listing;
pub mod manual_delete;
pub mod retire;
pub mod sessions;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, PromoApp, PromoAppBuilder};
pub use self::config::AutoDeleteConfig;
pub use self::dispatcher::{Campaign, PromoDispatcher};
pub use self::expiry_worker::{ExpiryWorker, ExpiryWorkerHandle, start_reconciliation};
pub use self::factory::PromoFactory;
pub use self::listing::{PAGE_SIZE, PromoListing, PromoStats};
pub use self::manual_delete::ManualDelete;
pub use self::retire::retire;
pub use self::sessions::CampaignSessions;
