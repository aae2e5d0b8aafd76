//! IdGenerator port - ID 生成の抽象化
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（本番用）

use crate::domain::ids::PromoId;
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator は promo_id を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（worker とリクエスト処理の両方から使う）
pub trait IdGenerator: Send + Sync {
    fn generate_promo_id(&self) -> PromoId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// timestamp 部分は Clock から取るので、FixedClock を渡せば
/// テストでも時刻部分が決定的になる。乱数部分は 80-bit。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_promo_id(&self) -> PromoId {
        let timestamp_ms = self.clock.now().timestamp_millis().max(0) as u64;
        let ulid = Ulid::from_parts(timestamp_ms, rand::random());
        PromoId::from(ulid)
    }
}
