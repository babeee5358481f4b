//! Claim-path tests: capacity caps, duplicate rejection, claim policy and
//! the notifications a successful claim produces.


use nexus_lite::{
    ClaimPolicy, EngineConfig, ModuleStatus, NexusError, NotificationKind,
};
use test_harness::{engine_with_roster, COMMANDER, WORKERS};

#[tokio::test]
async fn claim_creates_assignment_and_reserves_slot() {
    let t = engine_with_roster(EngineConfig::default()).await;
    let module = t.publish("audit").await;

    let assignment = t.engine.claim(module.id, WORKERS[0]).await.unwrap();
    assert_eq!(assignment.module_id, module.id);
    assert_eq!(assignment.worker_id, WORKERS[0]);
    assert!(assignment.allocated_score.is_none());

    let account = t.engine.user(WORKERS[0]).await.unwrap();
    assert_eq!(account.active_claims, 1);

    let view = t.engine.module_view(module.id).await.unwrap();
    assert_eq!(view.assignee_ids, vec![WORKERS[0]]);
}

#[tokio::test]
async fn claim_on_unknown_module_fails() {
    let t = engine_with_roster(EngineConfig::default()).await;
    let err = t
        .engine
        .claim(uuid::Uuid::new_v4(), WORKERS[0])
        .await
        .unwrap_err();
    assert!(matches!(err, NexusError::ModuleNotFound(_)));
}

#[tokio::test]
async fn duplicate_claim_is_rejected() {
    let t = engine_with_roster(EngineConfig::default()).await;
    let module = t.publish("audit").await;

    t.engine.claim(module.id, WORKERS[0]).await.unwrap();
    let err = t.engine.claim(module.id, WORKERS[0]).await.unwrap_err();
    assert!(matches!(err, NexusError::AlreadyAssigned { .. }));

    // The failed claim reserved nothing.
    let account = t.engine.user(WORKERS[0]).await.unwrap();
    assert_eq!(account.active_claims, 1);
}

#[tokio::test]
async fn worker_at_cap_gets_capacity_exceeded() {
    let t = engine_with_roster(EngineConfig::default()).await;
    let worker = WORKERS[0];

    for i in 0..3 {
        let module = t.publish(&format!("module-{i}")).await;
        t.engine.claim(module.id, worker).await.unwrap();
    }

    let fourth = t.publish("module-overflow").await;
    let err = t.engine.claim(fourth.id, worker).await.unwrap_err();
    assert!(matches!(
        err,
        NexusError::CapacityExceeded { cap: 3, .. }
    ));

    // No assignment row was created by the failed claim.
    assert_eq!(t.engine.assignments_for_worker(worker).await.len(), 3);
    let view = t.engine.module_view(fourth.id).await.unwrap();
    assert!(view.assignee_ids.is_empty());
}

#[tokio::test]
async fn module_full_after_cap_assignees() {
    let t = engine_with_roster(EngineConfig::default()).await;
    let module = t.publish("popular").await;

    for worker_id in &WORKERS[..5] {
        t.engine.claim(module.id, *worker_id).await.unwrap();
    }
    let err = t.engine.claim(module.id, WORKERS[5]).await.unwrap_err();
    assert!(matches!(err, NexusError::ModuleFull { cap: 5, .. }));

    let view = t.engine.module_view(module.id).await.unwrap();
    assert_eq!(view.assignee_ids.len(), 5);
    let account = t.engine.user(WORKERS[5]).await.unwrap();
    assert_eq!(account.active_claims, 0);
}

#[tokio::test]
async fn commander_cannot_claim() {
    let t = engine_with_roster(EngineConfig::default()).await;
    let module = t.publish("audit").await;
    let err = t.engine.claim(module.id, COMMANDER).await.unwrap_err();
    assert!(matches!(err, NexusError::Forbidden(_)));
}

#[tokio::test]
async fn stay_open_policy_keeps_module_claimable() {
    let t = engine_with_roster(EngineConfig::default()).await;
    let module = t.publish("shared").await;

    t.engine.claim(module.id, WORKERS[0]).await.unwrap();
    let view = t.engine.module_view(module.id).await.unwrap();
    assert_eq!(view.module.status, ModuleStatus::Open);

    // A second worker can still claim.
    t.engine.claim(module.id, WORKERS[1]).await.unwrap();
}

#[tokio::test]
async fn flip_in_progress_policy_blocks_further_claims() {
    let config = EngineConfig::default().with_claim_policy(ClaimPolicy::FlipInProgress);
    let t = engine_with_roster(config).await;
    let module = t.publish("exclusive").await;

    t.engine.claim(module.id, WORKERS[0]).await.unwrap();
    let view = t.engine.module_view(module.id).await.unwrap();
    assert_eq!(view.module.status, ModuleStatus::InProgress);

    let err = t.engine.claim(module.id, WORKERS[1]).await.unwrap_err();
    assert!(matches!(err, NexusError::InvalidTransition(_)));
}

#[tokio::test]
async fn claim_notifies_every_commander() {
    let mut t = engine_with_roster(EngineConfig::default()).await;
    let module = t.publish("audit").await;
    t.drain_notifications();

    t.engine.claim(module.id, WORKERS[0]).await.unwrap();

    let claimed = t.drain_of_kind(NotificationKind::ModuleClaimed);
    let mut recipients: Vec<u64> = claimed.iter().map(|n| n.recipient_id).collect();
    recipients.sort_unstable();
    assert_eq!(recipients, vec![1, 2]);
    assert!(claimed
        .iter()
        .all(|n| n.related_module_id == Some(module.id)));
}

#[tokio::test]
async fn publish_notifies_workers() {
    let mut t = engine_with_roster(EngineConfig::default()).await;
    let module = t.publish("fresh").await;

    let published = t.drain_of_kind(NotificationKind::ModulePublished);
    assert_eq!(published.len(), WORKERS.len());
    assert!(published
        .iter()
        .all(|n| n.related_module_id == Some(module.id)));
}
