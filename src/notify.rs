use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    ModulePublished,
    ModuleClaimed,
    DeliverySubmitted,
    ReviewResult,
    ModuleClosed,
    ModuleTimedOut,
    AbandonRequested,
    AbandonResolved,
    ReputationChanged,
}

/// One message for one recipient. Rendering and read-state tracking belong
/// to the delivery service behind the sink, not the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub recipient_id: u64,
    pub kind: NotificationKind,
    pub title: String,
    pub content: String,
    pub related_module_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        recipient_id: u64,
        kind: NotificationKind,
        title: impl Into<String>,
        content: impl Into<String>,
        related_module_id: Option<Uuid>,
    ) -> Self {
        Self {
            recipient_id,
            kind,
            title: title.into(),
            content: content.into(),
            related_module_id,
            created_at: Utc::now(),
        }
    }
}

/// Fire-and-forget delivery boundary. A failed delivery must never abort
/// the state transition that produced the notification, so implementations
/// log and swallow their own errors.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, notification: Notification);
}

/// Sink backed by an unbounded channel, drained by an out-of-process
/// delivery worker (or a test collecting what the engine emitted).
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelSink {
    fn deliver(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            // Receiver dropped; nothing to deliver to.
            tracing::debug!("Notification receiver dropped, message discarded");
        }
    }
}

/// Sink that discards everything. Default for embedders that bring no
/// delivery service.
pub struct NullSink;

impl NotificationSink for NullSink {
    fn deliver(&self, _notification: Notification) {}
}
