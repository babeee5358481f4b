use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::store::module::{Module, ModuleStatus};
use crate::store::records::{AbandonRequest, AbandonStatus, Assignment, Delivery, Review};

/// In-memory tables for every module-scoped row: modules, assignments,
/// deliveries, reviews and abandon requests.
///
/// Pure data layer. Capacity decisions, transition validation and
/// notifications all live in the engine; the store only answers queries and
/// applies mutations it is handed. Callers serialize access through the
/// engine's store lock.
#[derive(Debug, Default)]
pub struct WorkStore {
    modules: HashMap<Uuid, Module>,
    assignments: HashMap<Uuid, Assignment>,
    deliveries: HashMap<Uuid, Delivery>,
    reviews: HashMap<Uuid, Review>,
    abandon_requests: HashMap<Uuid, AbandonRequest>,
}

impl WorkStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- modules ---

    pub fn insert_module(&mut self, module: Module) {
        self.modules.insert(module.id, module);
    }

    pub fn module(&self, id: &Uuid) -> Option<&Module> {
        self.modules.get(id)
    }

    pub fn module_mut(&mut self, id: &Uuid) -> Option<&mut Module> {
        self.modules.get_mut(id)
    }

    /// All modules, optionally filtered by status, oldest first.
    pub fn list_modules(&self, status: Option<ModuleStatus>) -> Vec<&Module> {
        let mut modules: Vec<&Module> = self
            .modules
            .values()
            .filter(|m| status.is_none_or(|s| m.status == s))
            .collect();
        modules.sort_by_key(|m| m.created_at);
        modules
    }

    /// Modules whose deadline has elapsed and which are neither resolved nor
    /// already flagged. The sweeper re-checks each candidate before commit.
    pub fn timeout_candidates(&self, now: DateTime<Utc>) -> Vec<Uuid> {
        self.modules
            .values()
            .filter(|m| m.is_timeout_candidate(now))
            .map(|m| m.id)
            .collect()
    }

    // --- assignments ---

    pub fn insert_assignment(&mut self, assignment: Assignment) {
        self.assignments.insert(assignment.id, assignment);
    }

    pub fn remove_assignment(&mut self, id: &Uuid) -> Option<Assignment> {
        self.assignments.remove(id)
    }

    pub fn assignment_of(&self, module_id: &Uuid, worker_id: u64) -> Option<&Assignment> {
        self.assignments
            .values()
            .find(|a| a.module_id == *module_id && a.worker_id == worker_id)
    }

    pub fn assignments_for_module(&self, module_id: &Uuid) -> Vec<&Assignment> {
        self.assignments
            .values()
            .filter(|a| a.module_id == *module_id)
            .collect()
    }

    pub fn assignment_count(&self, module_id: &Uuid) -> usize {
        self.assignments
            .values()
            .filter(|a| a.module_id == *module_id)
            .count()
    }

    pub fn assignments_for_worker(&self, worker_id: u64) -> Vec<&Assignment> {
        self.assignments
            .values()
            .filter(|a| a.worker_id == worker_id)
            .collect()
    }

    pub fn set_allocated_score(&mut self, module_id: &Uuid, worker_id: u64, score: f64) {
        if let Some(assignment) = self
            .assignments
            .values_mut()
            .find(|a| a.module_id == *module_id && a.worker_id == worker_id)
        {
            assignment.allocated_score = Some(score);
        }
    }

    // --- deliveries ---

    pub fn insert_delivery(&mut self, delivery: Delivery) {
        self.deliveries.insert(delivery.id, delivery);
    }

    pub fn delivery(&self, id: &Uuid) -> Option<&Delivery> {
        self.deliveries.get(id)
    }

    pub fn delivery_mut(&mut self, id: &Uuid) -> Option<&mut Delivery> {
        self.deliveries.get_mut(id)
    }

    /// All deliveries for a module, oldest first.
    pub fn deliveries_for_module(&self, module_id: &Uuid) -> Vec<&Delivery> {
        let mut deliveries: Vec<&Delivery> = self
            .deliveries
            .values()
            .filter(|d| d.module_id == *module_id)
            .collect();
        deliveries.sort_by_key(|d| d.submitted_at);
        deliveries
    }

    pub fn deliveries_of(&self, module_id: &Uuid, worker_id: u64) -> Vec<&Delivery> {
        self.deliveries
            .values()
            .filter(|d| d.module_id == *module_id && d.assignee_id == worker_id)
            .collect()
    }

    // --- reviews ---

    pub fn insert_review(&mut self, review: Review) {
        self.reviews.insert(review.id, review);
    }

    pub fn review_for_delivery(&self, delivery_id: &Uuid) -> Option<&Review> {
        self.reviews
            .values()
            .find(|r| r.delivery_id == *delivery_id)
    }

    // --- abandon requests ---

    pub fn insert_abandon_request(&mut self, request: AbandonRequest) {
        self.abandon_requests.insert(request.id, request);
    }

    pub fn abandon_request(&self, id: &Uuid) -> Option<&AbandonRequest> {
        self.abandon_requests.get(id)
    }

    pub fn abandon_request_mut(&mut self, id: &Uuid) -> Option<&mut AbandonRequest> {
        self.abandon_requests.get_mut(id)
    }

    pub fn pending_abandon_of(&self, module_id: &Uuid, worker_id: u64) -> Option<&AbandonRequest> {
        self.abandon_requests.values().find(|r| {
            r.module_id == *module_id
                && r.requester_id == worker_id
                && r.status == AbandonStatus::Pending
        })
    }

    /// Abandon requests, optionally filtered by status, newest first.
    pub fn list_abandon_requests(&self, status: Option<AbandonStatus>) -> Vec<&AbandonRequest> {
        let mut requests: Vec<&AbandonRequest> = self
            .abandon_requests
            .values()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .collect();
        requests.sort_by_key(|r| std::cmp::Reverse(r.created_at));
        requests
    }
}
