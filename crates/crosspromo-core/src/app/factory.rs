//! PromoFactory - PromoRecord の組み立て
//!
//! ID と created_at はここで一度だけ決まる。以後 duration_seconds を
//! 含めてレコードは変更されない。

use std::sync::Arc;

use crate::domain::{MessageRef, PromoId, PromoRecord, Target};
use crate::ports::{Clock, IdGenerator};

#[derive(Clone)]
pub struct PromoFactory {
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl PromoFactory {
    pub fn new(ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self { ids, clock }
    }

    pub fn new_id(&self) -> PromoId {
        self.ids.generate_promo_id()
    }

    /// Record for a message that has just been delivered.
    pub fn build(&self, target: Target, message_ref: MessageRef, duration_seconds: u64) -> PromoRecord {
        PromoRecord {
            promo_id: self.new_id(),
            target,
            message_ref,
            duration_seconds,
            created_at: self.clock.now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FixedClock, UlidGenerator};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn build_stamps_clock_time_and_fresh_id() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap();
        let clock = Arc::new(FixedClock::new(now));
        let factory = PromoFactory::new(Arc::new(UlidGenerator::new(clock.clone())), clock);

        let a = factory.build(Target::Handle("news".into()), MessageRef(10), 60);
        let b = factory.build(Target::Handle("news".into()), MessageRef(11), 60);

        assert_ne!(a.promo_id, b.promo_id);
        assert_eq!(a.created_at, now);
        assert_eq!(a.expires_at(), now + Duration::seconds(60));
        assert_eq!(a.promo_id.timestamp_ms(), now.timestamp_millis() as u64);
    }
}
