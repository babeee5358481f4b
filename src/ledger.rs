use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{NexusError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Commander,
    Node,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Commander => write!(f, "commander"),
            Role::Node => write!(f, "node"),
        }
    }
}

const STARTING_REPUTATION: f64 = 100.0;

/// One registered user. Claim counting only applies to the `Node` role;
/// commanders never hold claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: u64,
    pub name: String,
    pub role: Role,
    pub reputation_score: f64,
    pub active_claims: u32,
    pub registered_at: DateTime<Utc>,
}

/// Append-only audit record of a reputation delta.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReputationEntry {
    pub id: Uuid,
    pub worker_id: u64,
    pub delta: f64,
    pub reason: String,
    pub module_id: Option<Uuid>,
    pub reviewer_id: Option<u64>,
    pub changed_at: DateTime<Utc>,
}

/// Identity & capacity ledger: the user roster, each worker's concurrent
/// claim count against the per-worker cap, and the reputation audit trail.
///
/// The ledger itself is not synchronized; the engine serializes access
/// through its ledger lock, always acquired after the store lock.
#[derive(Debug)]
pub struct Ledger {
    users: HashMap<u64, UserAccount>,
    history: Vec<ReputationEntry>,
    cap_per_worker: u32,
}

impl Ledger {
    pub fn new(cap_per_worker: u32) -> Self {
        Self {
            users: HashMap::new(),
            history: Vec::new(),
            cap_per_worker,
        }
    }

    pub fn register(&mut self, id: u64, name: impl Into<String>, role: Role) {
        let name = name.into();
        tracing::info!(user_id = id, %role, name = %name, "User registered");
        self.users.insert(
            id,
            UserAccount {
                id,
                name,
                role,
                reputation_score: STARTING_REPUTATION,
                active_claims: 0,
                registered_at: Utc::now(),
            },
        );
    }

    pub fn user(&self, id: u64) -> Option<&UserAccount> {
        self.users.get(&id)
    }

    pub fn role_of(&self, id: u64) -> Option<Role> {
        self.users.get(&id).map(|u| u.role)
    }

    /// Ids of every registered commander, for notification fan-out.
    pub fn commanders(&self) -> Vec<u64> {
        self.users
            .values()
            .filter(|u| u.role == Role::Commander)
            .map(|u| u.id)
            .collect()
    }

    /// Ids of every registered node worker.
    pub fn nodes(&self) -> Vec<u64> {
        self.users
            .values()
            .filter(|u| u.role == Role::Node)
            .map(|u| u.id)
            .collect()
    }

    /// Reserve one claim slot for the worker. Fails with `CapacityExceeded`
    /// when the worker is already at the per-worker cap.
    pub fn try_reserve(&mut self, worker_id: u64) -> Result<()> {
        let user = self
            .users
            .get_mut(&worker_id)
            .ok_or(NexusError::UserNotFound(worker_id))?;

        if user.active_claims >= self.cap_per_worker {
            return Err(NexusError::CapacityExceeded {
                worker_id,
                cap: self.cap_per_worker,
            });
        }
        user.active_claims += 1;
        Ok(())
    }

    /// Return one claim slot. Floored at zero so a double release from a
    /// retried caller cannot drive the count negative.
    pub fn release_slot(&mut self, worker_id: u64) {
        if let Some(user) = self.users.get_mut(&worker_id) {
            if user.active_claims == 0 {
                tracing::warn!(worker_id, "Slot release on a worker with no active claims");
            }
            user.active_claims = user.active_claims.saturating_sub(1);
        }
    }

    /// Apply a reputation delta and append the audit entry in one step.
    /// Returns the new score.
    pub fn adjust_reputation(
        &mut self,
        worker_id: u64,
        delta: f64,
        reason: impl Into<String>,
        module_id: Option<Uuid>,
        reviewer_id: Option<u64>,
    ) -> Result<f64> {
        let user = self
            .users
            .get_mut(&worker_id)
            .ok_or(NexusError::UserNotFound(worker_id))?;

        user.reputation_score += delta;
        let new_score = user.reputation_score;
        self.history.push(ReputationEntry {
            id: Uuid::new_v4(),
            worker_id,
            delta,
            reason: reason.into(),
            module_id,
            reviewer_id,
            changed_at: Utc::now(),
        });
        tracing::info!(worker_id, delta, new_score, "Reputation adjusted");
        Ok(new_score)
    }

    /// Audit entries for one worker, in application order.
    pub fn history_for(&self, worker_id: u64) -> Vec<&ReputationEntry> {
        self.history
            .iter()
            .filter(|e| e.worker_id == worker_id)
            .collect()
    }
}
