use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A worker's active claim on a module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Uuid,
    pub module_id: Uuid,
    pub worker_id: u64,
    /// Score granted by the reviewing commander; `None` until a PASS review.
    pub allocated_score: Option<f64>,
    pub claimed_at: DateTime<Utc>,
}

impl Assignment {
    pub fn new(module_id: Uuid, worker_id: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            module_id,
            worker_id,
            allocated_score: None,
            claimed_at: Utc::now(),
        }
    }
}

/// Why an assignment was released. Recorded in logs and notification text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseReason {
    ReviewPassed,
    ReviewClosed,
    AbandonApproved,
    ModuleClosed,
}

impl std::fmt::Display for ReleaseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReleaseReason::ReviewPassed => write!(f, "review passed"),
            ReleaseReason::ReviewClosed => write!(f, "review closed"),
            ReleaseReason::AbandonApproved => write!(f, "abandon approved"),
            ReleaseReason::ModuleClosed => write!(f, "module closed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    Pending,
    Accepted,
    Rejected,
    Closed,
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryStatus::Pending => write!(f, "pending"),
            DeliveryStatus::Accepted => write!(f, "accepted"),
            DeliveryStatus::Rejected => write!(f, "rejected"),
            DeliveryStatus::Closed => write!(f, "closed"),
        }
    }
}

/// Reference to an uploaded file, as returned by the storage collaborator.
/// The engine never sees raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub name: String,
    pub url: String,
}

/// One submission of work for a module by one assignee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    pub id: Uuid,
    pub module_id: Uuid,
    pub assignee_id: u64,
    pub content: String,
    pub attachments: Vec<AttachmentRef>,
    pub status: DeliveryStatus,
    pub submitted_at: DateTime<Utc>,
}

impl Delivery {
    pub fn new(
        module_id: Uuid,
        assignee_id: u64,
        content: String,
        attachments: Vec<AttachmentRef>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            module_id,
            assignee_id,
            content,
            attachments,
            status: DeliveryStatus::Pending,
            submitted_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewDecision {
    Pass,
    Reject,
    Close,
}

impl std::fmt::Display for ReviewDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewDecision::Pass => write!(f, "pass"),
            ReviewDecision::Reject => write!(f, "reject"),
            ReviewDecision::Close => write!(f, "close"),
        }
    }
}

/// Score awarded to one assignee by a splitting PASS review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreShare {
    pub worker_id: u64,
    pub score: f64,
}

/// Reputation input attached to a PASS review.
///
/// `Single` scores the delivering assignee alone; `Split` distributes across
/// the module's assignees. Entries naming a worker who is not an assignee of
/// the module are ignored, not errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScoreInput {
    Single(f64),
    Split(Vec<ScoreShare>),
}

/// A commander's decision on a delivery. Write-once: the engine refuses a
/// second review for the same delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub delivery_id: Uuid,
    pub reviewer_id: u64,
    pub decision: ReviewDecision,
    pub feedback: Option<String>,
    /// Total reputation applied across assignees (zero for Reject/Close).
    pub total_allocated: f64,
    pub reviewed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbandonStatus {
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for AbandonStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbandonStatus::Pending => write!(f, "pending"),
            AbandonStatus::Approved => write!(f, "approved"),
            AbandonStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// A worker's request to relinquish a claim before delivery, resolved by a
/// commander.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbandonRequest {
    pub id: Uuid,
    pub module_id: Uuid,
    pub requester_id: u64,
    pub reason: String,
    pub status: AbandonStatus,
    pub reviewer_comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl AbandonRequest {
    pub fn new(module_id: Uuid, requester_id: u64, reason: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            module_id,
            requester_id,
            reason,
            status: AbandonStatus::Pending,
            reviewer_comment: None,
            created_at: Utc::now(),
            reviewed_at: None,
        }
    }
}
