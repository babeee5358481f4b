//! Races on the capacity caps and the one-review rule: every check-then-act
//! sequence must have exactly one winner.


use nexus_lite::{EngineConfig, NexusError, ReviewDecision, ScoreInput};
use test_harness::{engine_with_roster, COMMANDER, COMMANDER_2, WORKERS};

#[tokio::test]
async fn race_for_the_last_module_slot_has_one_winner() {
    let config = EngineConfig::default().with_caps(3, 1);
    let t = engine_with_roster(config).await;
    let module = t.publish("single slot").await;

    let first = {
        let engine = t.engine.clone();
        let module_id = module.id;
        tokio::spawn(async move { engine.claim(module_id, WORKERS[0]).await })
    };
    let second = {
        let engine = t.engine.clone();
        let module_id = module.id;
        tokio::spawn(async move { engine.claim(module_id, WORKERS[1]).await })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];
    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(NexusError::ModuleFull { .. }))));

    let view = t.engine.module_view(module.id).await.unwrap();
    assert_eq!(view.assignee_ids.len(), 1);
}

#[tokio::test]
async fn race_for_the_last_worker_slot_has_one_winner() {
    let config = EngineConfig::default().with_caps(1, 5);
    let t = engine_with_roster(config).await;
    let module_a = t.publish("a").await;
    let module_b = t.publish("b").await;

    let first = {
        let engine = t.engine.clone();
        let module_id = module_a.id;
        tokio::spawn(async move { engine.claim(module_id, WORKERS[0]).await })
    };
    let second = {
        let engine = t.engine.clone();
        let module_id = module_b.id;
        tokio::spawn(async move { engine.claim(module_id, WORKERS[0]).await })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];
    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(NexusError::CapacityExceeded { .. }))));

    let account = t.engine.user(WORKERS[0]).await.unwrap();
    assert_eq!(account.active_claims, 1);
}

#[tokio::test]
async fn concurrent_claims_never_exceed_the_module_cap() {
    let t = engine_with_roster(EngineConfig::default()).await;
    let module = t.publish("crowded").await;

    let mut handles = Vec::new();
    for worker_id in WORKERS {
        let engine = t.engine.clone();
        let module_id = module.id;
        handles.push(tokio::spawn(
            async move { engine.claim(module_id, worker_id).await },
        ));
    }

    let mut wins = 0;
    let mut full = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => wins += 1,
            Err(NexusError::ModuleFull { .. }) => full += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(wins, 5);
    assert_eq!(full, 1);

    let view = t.engine.module_view(module.id).await.unwrap();
    assert_eq!(view.assignee_ids.len(), 5);
}

#[tokio::test]
async fn concurrent_reviews_of_one_delivery_have_one_winner() {
    let t = engine_with_roster(EngineConfig::default()).await;
    let module = t.publish("contested").await;
    t.engine.claim(module.id, WORKERS[0]).await.unwrap();
    let delivery = t
        .engine
        .submit_delivery(module.id, WORKERS[0], "done".into(), Vec::new())
        .await
        .unwrap();

    let pass = {
        let engine = t.engine.clone();
        let delivery_id = delivery.id;
        tokio::spawn(async move {
            engine
                .review_delivery(
                    delivery_id,
                    COMMANDER,
                    ReviewDecision::Pass,
                    None,
                    Some(ScoreInput::Single(5.0)),
                )
                .await
        })
    };
    let reject = {
        let engine = t.engine.clone();
        let delivery_id = delivery.id;
        tokio::spawn(async move {
            engine
                .review_delivery(delivery_id, COMMANDER_2, ReviewDecision::Reject, None, None)
                .await
        })
    };

    let results = [pass.await.unwrap(), reject.await.unwrap()];
    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(NexusError::AlreadyReviewed(_)))));
}

#[tokio::test]
async fn claim_storm_respects_both_caps() {
    // Every worker hammers every module; whatever interleaving the runtime
    // picks, no module can exceed 5 assignees and no worker can exceed 3
    // claims.
    let t = engine_with_roster(EngineConfig::default()).await;
    let mut modules = Vec::new();
    for i in 0..4 {
        modules.push(t.publish(&format!("storm-{i}")).await);
    }

    let mut handles = Vec::new();
    for module in &modules {
        for worker_id in WORKERS {
            let engine = t.engine.clone();
            let module_id = module.id;
            handles.push(tokio::spawn(async move {
                engine.claim(module_id, worker_id).await
            }));
        }
    }
    for handle in handles {
        let _ = handle.await.unwrap();
    }

    for module in &modules {
        let view = t.engine.module_view(module.id).await.unwrap();
        assert!(view.assignee_ids.len() <= 5);
    }
    for worker_id in WORKERS {
        let account = t.engine.user(worker_id).await.unwrap();
        assert!(account.active_claims <= 3);
        assert_eq!(
            account.active_claims as usize,
            t.engine.assignments_for_worker(worker_id).await.len()
        );
    }
}
