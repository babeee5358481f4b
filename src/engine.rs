use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::{ClaimPolicy, EngineConfig};
use crate::error::{NexusError, Result};
use crate::ledger::{Ledger, ReputationEntry, Role, UserAccount};
use crate::notify::{Notification, NotificationKind, NotificationSink, NullSink};
use crate::store::{
    AbandonRequest, AbandonStatus, Assignment, AttachmentRef, Delivery, DeliveryStatus, Module,
    ModuleStatus, ModuleUpdate, ReleaseReason, Review, ReviewDecision, ScoreInput, WorkStore,
};

/// A module together with its current assignee ids, read under one lock so
/// the assignee list can never be stale relative to the module row.
#[derive(Debug, Clone)]
pub struct ModuleView {
    pub module: Module,
    pub assignee_ids: Vec<u64>,
}

/// The assignment engine.
///
/// All module-scoped rows live behind `store`, all worker-scoped rows behind
/// `ledger`. Every compound operation acquires the store lock before the
/// ledger lock and holds both across its whole check-then-act sequence, so
/// capacity races always have a single winner. Notifications are collected
/// under the locks and handed to the sink after both are dropped.
pub struct Engine {
    config: EngineConfig,
    store: Arc<RwLock<WorkStore>>,
    ledger: Arc<RwLock<Ledger>>,
    sink: Arc<dyn NotificationSink>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_sink(config, Arc::new(NullSink))
    }

    pub fn with_sink(config: EngineConfig, sink: Arc<dyn NotificationSink>) -> Self {
        let ledger = Ledger::new(config.cap_per_worker);
        Self {
            config,
            store: Arc::new(RwLock::new(WorkStore::new())),
            ledger: Arc::new(RwLock::new(ledger)),
            sink,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Record an authenticated user in the roster. Identity itself (passwords,
    /// tokens) belongs to the auth collaborator; the engine only needs the id,
    /// display name and role it was told.
    pub async fn register_user(&self, id: u64, name: impl Into<String>, role: Role) {
        self.ledger.write().await.register(id, name, role);
    }

    // ------------------------------------------------------------------
    // Modules
    // ------------------------------------------------------------------

    pub async fn create_module(
        &self,
        commander_id: u64,
        title: String,
        description: String,
        deadline: Option<chrono::DateTime<Utc>>,
        bounty: Option<f64>,
    ) -> Result<Module> {
        let mut store = self.store.write().await;
        let ledger = self.ledger.read().await;
        require_commander(&ledger, commander_id)?;

        let module = Module::new(title, description, commander_id, deadline, bounty);
        tracing::info!(module_id = %module.id, commander_id, title = %module.title, "Module published");

        let notifications: Vec<Notification> = ledger
            .nodes()
            .into_iter()
            .map(|worker_id| {
                Notification::new(
                    worker_id,
                    NotificationKind::ModulePublished,
                    "New module available",
                    format!("Module \"{}\" is open for claiming.", module.title),
                    Some(module.id),
                )
            })
            .collect();

        store.insert_module(module.clone());
        drop(ledger);
        drop(store);

        self.emit(notifications);
        Ok(module)
    }

    /// Commander edit of module metadata. A requested status change must be a
    /// legal transition and is refused outright while any assignment is
    /// active; the workflow paths are the only writers of status in that
    /// window.
    pub async fn update_module(
        &self,
        commander_id: u64,
        module_id: Uuid,
        update: ModuleUpdate,
    ) -> Result<Module> {
        let mut store = self.store.write().await;
        let ledger = self.ledger.read().await;
        require_commander(&ledger, commander_id)?;

        let active = store.assignment_count(&module_id);
        let module = store
            .module_mut(&module_id)
            .ok_or(NexusError::ModuleNotFound(module_id))?;

        if let Some(to) = update.status {
            if to != module.status {
                if active > 0 {
                    return Err(NexusError::InvalidTransition(format!(
                        "module {} has {} active assignment(s); status is owned by the claim/review workflows",
                        module_id, active
                    )));
                }
                if to == ModuleStatus::Completed {
                    return Err(NexusError::InvalidTransition(
                        "completed is only reachable through a passing review".into(),
                    ));
                }
                if !module.status.can_transition(to) {
                    return Err(NexusError::InvalidTransition(format!(
                        "{} -> {} is not a legal module transition",
                        module.status, to
                    )));
                }
                module.status = to;
            }
        }
        if let Some(title) = update.title {
            module.title = title;
        }
        if let Some(description) = update.description {
            module.description = description;
        }
        if let Some(deadline) = update.deadline {
            module.deadline = Some(deadline);
        }
        if let Some(bounty) = update.bounty {
            module.bounty = Some(bounty);
        }
        module.updated_at = Some(Utc::now());

        Ok(module.clone())
    }

    /// Commander-initiated close: the module goes to `Closed` and every
    /// active assignment is released with no reputation change.
    pub async fn close_module(&self, commander_id: u64, module_id: Uuid) -> Result<Module> {
        let mut store = self.store.write().await;
        let mut ledger = self.ledger.write().await;
        require_commander(&ledger, commander_id)?;

        let module = store
            .module(&module_id)
            .ok_or(NexusError::ModuleNotFound(module_id))?;
        if module.status.is_terminal() {
            return Err(NexusError::InvalidTransition(format!(
                "module {} is already {}",
                module_id, module.status
            )));
        }
        let title = module.title.clone();

        let released = release_all_assignments(
            &mut store,
            &mut ledger,
            &module_id,
            ReleaseReason::ModuleClosed,
        );

        let module = store
            .module_mut(&module_id)
            .ok_or(NexusError::ModuleNotFound(module_id))?;
        module.status = ModuleStatus::Closed;
        module.updated_at = Some(Utc::now());
        let module = module.clone();
        tracing::info!(module_id = %module_id, commander_id, "Module closed");

        let notifications: Vec<Notification> = released
            .iter()
            .map(|worker_id| {
                Notification::new(
                    *worker_id,
                    NotificationKind::ModuleClosed,
                    "Module closed",
                    format!("Module \"{}\" was closed by a commander; your claim has been released.", title),
                    Some(module_id),
                )
            })
            .collect();
        drop(ledger);
        drop(store);

        self.emit(notifications);
        Ok(module)
    }

    pub async fn module_view(&self, module_id: Uuid) -> Result<ModuleView> {
        let store = self.store.read().await;
        let module = store
            .module(&module_id)
            .ok_or(NexusError::ModuleNotFound(module_id))?
            .clone();
        let assignee_ids = store
            .assignments_for_module(&module_id)
            .iter()
            .map(|a| a.worker_id)
            .collect();
        Ok(ModuleView {
            module,
            assignee_ids,
        })
    }

    pub async fn list_modules(&self, status: Option<ModuleStatus>) -> Vec<Module> {
        let store = self.store.read().await;
        store.list_modules(status).into_iter().cloned().collect()
    }

    // ------------------------------------------------------------------
    // Claims
    // ------------------------------------------------------------------

    /// A worker claims a module slot.
    ///
    /// Checks run in a fixed order against one consistent snapshot: module
    /// claimable, worker below its cap, no duplicate claim, module below its
    /// cap. Only then is the slot reserved and the assignment row created.
    pub async fn claim(&self, module_id: Uuid, worker_id: u64) -> Result<Assignment> {
        let mut store = self.store.write().await;
        let mut ledger = self.ledger.write().await;

        let user = ledger
            .user(worker_id)
            .ok_or(NexusError::UserNotFound(worker_id))?;
        if user.role != Role::Node {
            return Err(NexusError::Forbidden(
                "only node workers can claim modules".into(),
            ));
        }
        let worker_name = user.name.clone();

        let module = store
            .module(&module_id)
            .ok_or(NexusError::ModuleNotFound(module_id))?;
        if module.status != ModuleStatus::Open {
            return Err(NexusError::InvalidTransition(format!(
                "module {} is not claimable (status {})",
                module_id, module.status
            )));
        }
        let title = module.title.clone();

        if user.active_claims >= self.config.cap_per_worker {
            return Err(NexusError::CapacityExceeded {
                worker_id,
                cap: self.config.cap_per_worker,
            });
        }
        if store.assignment_of(&module_id, worker_id).is_some() {
            return Err(NexusError::AlreadyAssigned {
                module_id,
                worker_id,
            });
        }
        if store.assignment_count(&module_id) >= self.config.cap_per_module as usize {
            return Err(NexusError::ModuleFull {
                module_id,
                cap: self.config.cap_per_module,
            });
        }

        // Commit: the pre-checks above ran under the same locks, so neither
        // reservation can fail here.
        ledger.try_reserve(worker_id)?;
        let assignment = Assignment::new(module_id, worker_id);
        store.insert_assignment(assignment.clone());

        if self.config.claim_policy == ClaimPolicy::FlipInProgress {
            if let Some(module) = store.module_mut(&module_id) {
                module.status = ModuleStatus::InProgress;
            }
        }
        tracing::info!(module_id = %module_id, worker_id, "Module claimed");

        let notifications: Vec<Notification> = ledger
            .commanders()
            .into_iter()
            .map(|commander_id| {
                Notification::new(
                    commander_id,
                    NotificationKind::ModuleClaimed,
                    "Module claimed",
                    format!("{} claimed module \"{}\".", worker_name, title),
                    Some(module_id),
                )
            })
            .collect();
        drop(ledger);
        drop(store);

        self.emit(notifications);
        Ok(assignment)
    }

    /// Release a single assignment. Used by operators behind the routing
    /// layer; the review and abandon workflows release through the same
    /// internal path.
    pub async fn release(&self, assignment_id: Uuid, reason: ReleaseReason) -> Result<()> {
        let mut store = self.store.write().await;
        let mut ledger = self.ledger.write().await;
        release_assignment(&mut store, &mut ledger, &assignment_id, reason)
            .map(|_| ())
            .ok_or(NexusError::AssignmentNotFound(assignment_id))
    }

    pub async fn assignments_for_worker(&self, worker_id: u64) -> Vec<Assignment> {
        let store = self.store.read().await;
        store
            .assignments_for_worker(worker_id)
            .into_iter()
            .cloned()
            .collect()
    }

    // ------------------------------------------------------------------
    // Deliveries & reviews
    // ------------------------------------------------------------------

    /// An assignee submits work for a module. Resubmission is allowed only
    /// while every prior delivery of theirs for this module is `Rejected`.
    pub async fn submit_delivery(
        &self,
        module_id: Uuid,
        worker_id: u64,
        content: String,
        attachments: Vec<AttachmentRef>,
    ) -> Result<Delivery> {
        let mut store = self.store.write().await;
        let ledger = self.ledger.read().await;

        let module = store
            .module(&module_id)
            .ok_or(NexusError::ModuleNotFound(module_id))?;
        let title = module.title.clone();

        if store.assignment_of(&module_id, worker_id).is_none() {
            return Err(NexusError::Forbidden(format!(
                "worker {} holds no claim on module {}",
                worker_id, module_id
            )));
        }
        let unresolved = store
            .deliveries_of(&module_id, worker_id)
            .iter()
            .any(|d| d.status != DeliveryStatus::Rejected);
        if unresolved {
            return Err(NexusError::DuplicateDelivery {
                module_id,
                worker_id,
            });
        }

        let delivery = Delivery::new(module_id, worker_id, content, attachments);
        store.insert_delivery(delivery.clone());
        tracing::info!(delivery_id = %delivery.id, module_id = %module_id, worker_id, "Delivery submitted");

        let notifications: Vec<Notification> = ledger
            .commanders()
            .into_iter()
            .map(|commander_id| {
                Notification::new(
                    commander_id,
                    NotificationKind::DeliverySubmitted,
                    "Delivery awaiting review",
                    format!("A delivery for module \"{}\" is awaiting review.", title),
                    Some(module_id),
                )
            })
            .collect();
        drop(ledger);
        drop(store);

        self.emit(notifications);
        Ok(delivery)
    }

    /// A commander reviews a delivery. Exactly one review per delivery.
    ///
    /// PASS accepts the delivery, applies the score input to the module's
    /// actual assignees (unknown ids in a split are ignored), completes the
    /// module and releases every assignment. REJECT leaves claims in place so
    /// the worker can remediate and resubmit. CLOSE abandons the module:
    /// claims are released with no reputation change.
    pub async fn review_delivery(
        &self,
        delivery_id: Uuid,
        reviewer_id: u64,
        decision: ReviewDecision,
        feedback: Option<String>,
        score: Option<ScoreInput>,
    ) -> Result<Review> {
        let mut store = self.store.write().await;
        let mut ledger = self.ledger.write().await;
        require_commander(&ledger, reviewer_id)?;

        let delivery = store
            .delivery(&delivery_id)
            .ok_or(NexusError::DeliveryNotFound(delivery_id))?;
        if store.review_for_delivery(&delivery_id).is_some() {
            return Err(NexusError::AlreadyReviewed(delivery_id));
        }
        let module_id = delivery.module_id;
        let submitter_id = delivery.assignee_id;
        let module = store
            .module(&module_id)
            .ok_or(NexusError::ModuleNotFound(module_id))?;
        let title = module.title.clone();

        let mut notifications = Vec::new();
        let mut total_allocated = 0.0;

        match decision {
            ReviewDecision::Pass => {
                let assignee_ids: Vec<u64> = store
                    .assignments_for_module(&module_id)
                    .iter()
                    .map(|a| a.worker_id)
                    .collect();

                let shares: Vec<(u64, f64)> = match score {
                    Some(ScoreInput::Single(delta)) => vec![(submitter_id, delta)],
                    Some(ScoreInput::Split(shares)) => shares
                        .into_iter()
                        .map(|s| (s.worker_id, s.score))
                        .collect(),
                    None => Vec::new(),
                };
                for (worker_id, delta) in shares {
                    // Entries naming a non-assignee are ignored, not errors.
                    if !assignee_ids.contains(&worker_id) {
                        tracing::warn!(
                            module_id = %module_id,
                            worker_id,
                            "Score allocation for a non-assignee ignored"
                        );
                        continue;
                    }
                    store.set_allocated_score(&module_id, worker_id, delta);
                    let new_score = ledger.adjust_reputation(
                        worker_id,
                        delta,
                        format!("Module completed: {}", title),
                        Some(module_id),
                        Some(reviewer_id),
                    )?;
                    total_allocated += delta;
                    notifications.push(Notification::new(
                        worker_id,
                        NotificationKind::ReputationChanged,
                        "Reputation updated",
                        format!(
                            "Your reputation changed by {:+.1} (now {:.1}) for module \"{}\".",
                            delta, new_score, title
                        ),
                        Some(module_id),
                    ));
                }

                if let Some(delivery) = store.delivery_mut(&delivery_id) {
                    delivery.status = DeliveryStatus::Accepted;
                }
                if let Some(module) = store.module_mut(&module_id) {
                    if module.status.can_transition(ModuleStatus::Completed) {
                        module.status = ModuleStatus::Completed;
                        module.updated_at = Some(Utc::now());
                    }
                }
                let released = release_all_assignments(
                    &mut store,
                    &mut ledger,
                    &module_id,
                    ReleaseReason::ReviewPassed,
                );
                for worker_id in released {
                    notifications.push(Notification::new(
                        worker_id,
                        NotificationKind::ReviewResult,
                        "Delivery accepted",
                        format!("The delivery for module \"{}\" passed review.", title),
                        Some(module_id),
                    ));
                }
            }
            ReviewDecision::Reject => {
                if let Some(delivery) = store.delivery_mut(&delivery_id) {
                    delivery.status = DeliveryStatus::Rejected;
                }
                // The claim stays: the worker remediates and resubmits.
                notifications.push(Notification::new(
                    submitter_id,
                    NotificationKind::ReviewResult,
                    "Delivery rejected",
                    match &feedback {
                        Some(text) => format!(
                            "Your delivery for module \"{}\" was rejected: {}",
                            title, text
                        ),
                        None => format!("Your delivery for module \"{}\" was rejected.", title),
                    },
                    Some(module_id),
                ));
            }
            ReviewDecision::Close => {
                if let Some(delivery) = store.delivery_mut(&delivery_id) {
                    delivery.status = DeliveryStatus::Closed;
                }
                if let Some(module) = store.module_mut(&module_id) {
                    if !module.status.is_terminal() {
                        module.status = ModuleStatus::Closed;
                        module.updated_at = Some(Utc::now());
                    }
                }
                let released = release_all_assignments(
                    &mut store,
                    &mut ledger,
                    &module_id,
                    ReleaseReason::ReviewClosed,
                );
                for worker_id in released {
                    notifications.push(Notification::new(
                        worker_id,
                        NotificationKind::ReviewResult,
                        "Module closed at review",
                        format!(
                            "Module \"{}\" was closed at review; your claim has been released.",
                            title
                        ),
                        Some(module_id),
                    ));
                }
            }
        }

        let review = Review {
            id: Uuid::new_v4(),
            delivery_id,
            reviewer_id,
            decision,
            feedback,
            total_allocated,
            reviewed_at: Utc::now(),
        };
        store.insert_review(review.clone());
        tracing::info!(
            delivery_id = %delivery_id,
            module_id = %module_id,
            reviewer_id,
            decision = %decision,
            total_allocated,
            "Delivery reviewed"
        );
        drop(ledger);
        drop(store);

        self.emit(notifications);
        Ok(review)
    }

    pub async fn deliveries_for_module(&self, module_id: Uuid) -> Result<Vec<Delivery>> {
        let store = self.store.read().await;
        store
            .module(&module_id)
            .ok_or(NexusError::ModuleNotFound(module_id))?;
        Ok(store
            .deliveries_for_module(&module_id)
            .into_iter()
            .cloned()
            .collect())
    }

    // ------------------------------------------------------------------
    // Abandon requests
    // ------------------------------------------------------------------

    pub async fn create_abandon_request(
        &self,
        module_id: Uuid,
        worker_id: u64,
        reason: String,
    ) -> Result<AbandonRequest> {
        let mut store = self.store.write().await;
        let ledger = self.ledger.read().await;

        let module = store
            .module(&module_id)
            .ok_or(NexusError::ModuleNotFound(module_id))?;
        let title = module.title.clone();

        if store.assignment_of(&module_id, worker_id).is_none() {
            return Err(NexusError::Forbidden(format!(
                "worker {} holds no claim on module {}",
                worker_id, module_id
            )));
        }
        if store.pending_abandon_of(&module_id, worker_id).is_some() {
            return Err(NexusError::DuplicatePending {
                module_id,
                worker_id,
            });
        }

        let request = AbandonRequest::new(module_id, worker_id, reason);
        store.insert_abandon_request(request.clone());
        tracing::info!(request_id = %request.id, module_id = %module_id, worker_id, "Abandon requested");

        let notifications: Vec<Notification> = ledger
            .commanders()
            .into_iter()
            .map(|commander_id| {
                Notification::new(
                    commander_id,
                    NotificationKind::AbandonRequested,
                    "Abandon request awaiting review",
                    format!("A worker asked to abandon module \"{}\".", title),
                    Some(module_id),
                )
            })
            .collect();
        drop(ledger);
        drop(store);

        self.emit(notifications);
        Ok(request)
    }

    /// A commander resolves a pending abandon request. Approval releases the
    /// requester's claim; the module reverts to `Open` when no assignment
    /// remains. Reputation is untouched on both paths.
    pub async fn review_abandon_request(
        &self,
        request_id: Uuid,
        commander_id: u64,
        approve: bool,
        comment: Option<String>,
    ) -> Result<AbandonRequest> {
        let mut store = self.store.write().await;
        let mut ledger = self.ledger.write().await;
        require_commander(&ledger, commander_id)?;

        let request = store
            .abandon_request(&request_id)
            .ok_or(NexusError::AbandonRequestNotFound(request_id))?;
        if request.status != AbandonStatus::Pending {
            return Err(NexusError::AlreadyResolved(request_id));
        }
        let module_id = request.module_id;
        let requester_id = request.requester_id;
        let title = store
            .module(&module_id)
            .map(|m| m.title.clone())
            .unwrap_or_else(|| module_id.to_string());

        if approve {
            // The claim can already be gone if the module was closed in the
            // meantime; approval is then just the status update.
            let assignment_id = store.assignment_of(&module_id, requester_id).map(|a| a.id);
            if let Some(assignment_id) = assignment_id {
                release_assignment(
                    &mut store,
                    &mut ledger,
                    &assignment_id,
                    ReleaseReason::AbandonApproved,
                );
            }
        }

        let request = store
            .abandon_request_mut(&request_id)
            .ok_or(NexusError::AbandonRequestNotFound(request_id))?;
        request.status = if approve {
            AbandonStatus::Approved
        } else {
            AbandonStatus::Rejected
        };
        request.reviewer_comment = comment.clone();
        request.reviewed_at = Some(Utc::now());
        let request = request.clone();
        tracing::info!(
            request_id = %request_id,
            module_id = %module_id,
            requester_id,
            approve,
            "Abandon request resolved"
        );

        let outcome = if approve { "approved" } else { "rejected" };
        let content = match &comment {
            Some(text) => format!(
                "Your abandon request for module \"{}\" was {}: {}",
                title, outcome, text
            ),
            None => format!(
                "Your abandon request for module \"{}\" was {}.",
                title, outcome
            ),
        };
        let notification = Notification::new(
            requester_id,
            NotificationKind::AbandonResolved,
            format!("Abandon request {}", outcome),
            content,
            Some(module_id),
        );
        drop(ledger);
        drop(store);

        self.emit(vec![notification]);
        Ok(request)
    }

    pub async fn abandon_requests(&self, status: Option<AbandonStatus>) -> Vec<AbandonRequest> {
        let store = self.store.read().await;
        store
            .list_abandon_requests(status)
            .into_iter()
            .cloned()
            .collect()
    }

    // ------------------------------------------------------------------
    // Timeout sweep
    // ------------------------------------------------------------------

    /// One sweep pass: flag every deadline-passed, unresolved, not-yet-flagged
    /// module and notify its assignees and all commanders. Idempotent — a
    /// flagged module is never selected again. Returns the number flagged.
    pub async fn sweep_timeouts(&self) -> usize {
        let mut store = self.store.write().await;
        let ledger = self.ledger.read().await;

        let now = Utc::now();
        let candidates = store.timeout_candidates(now);
        if candidates.is_empty() {
            tracing::debug!("No timed-out modules found");
            return 0;
        }

        let commanders = ledger.commanders();
        let mut notifications = Vec::new();
        let mut flagged = 0usize;

        for module_id in candidates {
            // Re-check right before commit: the module may have been resolved
            // by a review between selection and this point.
            let Some(module) = store.module_mut(&module_id) else {
                continue;
            };
            if !module.is_timeout_candidate(now) {
                continue;
            }
            module.timed_out = true;
            let title = module.title.clone();
            flagged += 1;
            tracing::info!(module_id = %module_id, title = %title, "Module timed out");

            let assignee_ids: Vec<u64> = store
                .assignments_for_module(&module_id)
                .iter()
                .map(|a| a.worker_id)
                .collect();
            for worker_id in &assignee_ids {
                notifications.push(Notification::new(
                    *worker_id,
                    NotificationKind::ModuleTimedOut,
                    "Module deadline passed",
                    format!(
                        "Module \"{}\" has passed its deadline. Finish it or request abandonment.",
                        title
                    ),
                    Some(module_id),
                ));
            }
            for commander_id in &commanders {
                notifications.push(Notification::new(
                    *commander_id,
                    NotificationKind::ModuleTimedOut,
                    "Module deadline passed",
                    format!(
                        "Module \"{}\" timed out with {} assignee(s).",
                        title,
                        assignee_ids.len()
                    ),
                    Some(module_id),
                ));
            }
        }
        drop(ledger);
        drop(store);

        self.emit(notifications);
        flagged
    }

    // ------------------------------------------------------------------
    // Ledger reads
    // ------------------------------------------------------------------

    pub async fn user(&self, id: u64) -> Result<UserAccount> {
        let ledger = self.ledger.read().await;
        ledger
            .user(id)
            .cloned()
            .ok_or(NexusError::UserNotFound(id))
    }

    pub async fn reputation_history(&self, worker_id: u64) -> Vec<ReputationEntry> {
        let ledger = self.ledger.read().await;
        ledger
            .history_for(worker_id)
            .into_iter()
            .cloned()
            .collect()
    }

    fn emit(&self, notifications: Vec<Notification>) {
        for notification in notifications {
            self.sink.deliver(notification);
        }
    }
}

fn require_commander(ledger: &Ledger, user_id: u64) -> Result<()> {
    match ledger.role_of(user_id) {
        Some(Role::Commander) => Ok(()),
        Some(_) => Err(NexusError::Forbidden(format!(
            "user {} is not a commander",
            user_id
        ))),
        None => Err(NexusError::UserNotFound(user_id)),
    }
}

/// Remove one assignment and return its slot to the ledger. When the module
/// is left with no assignments and is not terminal, it reverts to `Open`.
/// Returns the released assignment's worker id.
fn release_assignment(
    store: &mut WorkStore,
    ledger: &mut Ledger,
    assignment_id: &Uuid,
    reason: ReleaseReason,
) -> Option<u64> {
    let assignment = store.remove_assignment(assignment_id)?;
    ledger.release_slot(assignment.worker_id);
    tracing::info!(
        assignment_id = %assignment.id,
        module_id = %assignment.module_id,
        worker_id = assignment.worker_id,
        %reason,
        "Assignment released"
    );

    if store.assignment_count(&assignment.module_id) == 0 {
        if let Some(module) = store.module_mut(&assignment.module_id) {
            if !module.status.is_terminal() && module.status != ModuleStatus::Open {
                module.status = ModuleStatus::Open;
                module.updated_at = Some(Utc::now());
            }
        }
    }
    Some(assignment.worker_id)
}

/// Release every assignment on a module. Returns the released worker ids.
fn release_all_assignments(
    store: &mut WorkStore,
    ledger: &mut Ledger,
    module_id: &Uuid,
    reason: ReleaseReason,
) -> Vec<u64> {
    let ids: Vec<Uuid> = store
        .assignments_for_module(module_id)
        .iter()
        .map(|a| a.id)
        .collect();
    ids.iter()
        .filter_map(|id| release_assignment(store, ledger, id, reason))
        .collect()
}
