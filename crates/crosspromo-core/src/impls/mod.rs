//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryPromoStore**: 開発用・フォールバック用のストア
//! - **JsonFilePromoStore**: 単一 JSON ファイルへの永続化
//! - **RecordingTransport**: テスト・ドライラン用の Transport
//! - **NoopEventSink / CollectingEventSink**
//!
//! Telegram 向けの Transport は bot クレート側に置く。

pub mod event_sink;
pub mod inmem_store;
pub mod json_store;
pub mod recording_transport;
mod table;

// 主要な型を再エクスポート
pub use self::event_sink::{CollectingEventSink, NoopEventSink};
pub use self::inmem_store::InMemoryPromoStore;
pub use self::json_store::JsonFilePromoStore;
pub use self::recording_transport::{DeleteBehavior, Delivered, DeliveredPayload, RecordingTransport, SendFailure};
