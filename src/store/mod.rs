pub mod module;
pub mod records;
pub mod state;

pub use module::{Module, ModuleStatus, ModuleUpdate};
pub use records::{
    AbandonRequest, AbandonStatus, Assignment, AttachmentRef, Delivery, DeliveryStatus,
    ReleaseReason, Review, ReviewDecision, ScoreInput, ScoreShare,
};
pub use state::WorkStore;
