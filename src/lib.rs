pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod notify;
pub mod shutdown;
pub mod store;
pub mod sweeper;

pub use config::{ClaimPolicy, EngineConfig, SweepConfig};
pub use engine::{Engine, ModuleView};
pub use error::{NexusError, Result};
pub use ledger::{Ledger, ReputationEntry, Role, UserAccount};
pub use notify::{ChannelSink, Notification, NotificationKind, NotificationSink, NullSink};
pub use store::{
    AbandonRequest, AbandonStatus, Assignment, AttachmentRef, Delivery, DeliveryStatus, Module,
    ModuleStatus, ModuleUpdate, ReleaseReason, Review, ReviewDecision, ScoreInput, ScoreShare,
};
pub use sweeper::TimeoutSweeper;
