//! Domain model (ids, promo records, content, campaigns, outcomes, ...).

pub mod campaign;
pub mod content;
pub mod errors;
pub mod events;
pub mod ids;
pub mod outcome;
pub mod promo;
pub mod template;

pub use campaign::{AdminId, AdminList, CampaignSelection, CampaignTarget, Category, SubscriberRange, UnknownKey};
pub use content::{
    ButtonGrid, DeliveryStep, LinkButton, MediaKind, MediaRef, MessageBody, PromoContent, SourceRef,
};
pub use errors::{PromoError, StoreError, TransportError};
pub use events::PromoEvent;
pub use ids::{IdParseError, PromoId};
pub use outcome::{
    CycleReport, DeleteStatus, DispatchSummary, ManualDeleteOutcome, PromoPage, PromoView, RetireOutcome,
    TransportDeletion,
};
pub use promo::{MessageRef, PromoRecord, Target, TargetParseError};
pub use template::PromoTemplate;
