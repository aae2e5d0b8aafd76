//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」。各 trait は外部システム
//! （永続化、メッセージ配信、時刻、通知）へのインターフェース。
//!
//! # 設計原則
//! - PromoStore が source of truth（正本）
//! - Transport は 1 呼び出し単位で失敗し得る外部能力
//! - Clock / IdGenerator はテストで差し替える

pub mod clock;
pub mod event_sink;
pub mod id_generator;
pub mod promo_store;
pub mod transport;

// 主要な trait を再エクスポート
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::event_sink::EventSink;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::promo_store::PromoStore;
pub use self::transport::Transport;
