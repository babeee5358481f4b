use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum NexusError {
    #[error("Module not found: {0}")]
    ModuleNotFound(Uuid),

    #[error("Delivery not found: {0}")]
    DeliveryNotFound(Uuid),

    #[error("Assignment not found: {0}")]
    AssignmentNotFound(Uuid),

    #[error("Abandon request not found: {0}")]
    AbandonRequestNotFound(Uuid),

    #[error("User not found: {0}")]
    UserNotFound(u64),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Worker {worker_id} is at the concurrent claim limit ({cap})")]
    CapacityExceeded { worker_id: u64, cap: u32 },

    #[error("Module {module_id} already has the maximum number of assignees ({cap})")]
    ModuleFull { module_id: Uuid, cap: u32 },

    #[error("Worker {worker_id} already holds a claim on module {module_id}")]
    AlreadyAssigned { module_id: Uuid, worker_id: u64 },

    #[error("Delivery {0} has already been reviewed")]
    AlreadyReviewed(Uuid),

    #[error("Worker {worker_id} already has an unresolved delivery for module {module_id}")]
    DuplicateDelivery { module_id: Uuid, worker_id: u64 },

    #[error("Abandon request {0} has already been resolved")]
    AlreadyResolved(Uuid),

    #[error("Worker {worker_id} already has a pending abandon request for module {module_id}")]
    DuplicatePending { module_id: Uuid, worker_id: u64 },

    #[error("Invalid module transition: {0}")]
    InvalidTransition(String),

    #[error("Lost a concurrent update race, retry the operation: {0}")]
    Conflict(String),
}

pub type Result<T> = std::result::Result<T, NexusError>;
