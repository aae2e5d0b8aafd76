//! crosspromo-core
//!
//! Promo lifecycle core for the cross-promotion bot: time-boxed posts
//! fanned out to many channels, and a reconciliation worker that removes
//! them once they expire.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, promo, content, campaign, template, outcome, events, errors）
//! - **ports**: 抽象化レイヤー（PromoStore, Transport, Clock, IdGenerator, EventSink）
//! - **impls**: 実装（InMemoryPromoStore, JsonFilePromoStore, RecordingTransport など）
//! - **app**: アプリケーションロジック（builder, dispatcher, expiry_worker, manual_delete, listing, sessions）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;
