//! Unit tests for goal progress tracking.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::alerts::{AlertKind, AlertService};
use crate::errors::Error;
use crate::events::{DomainEvent, MockDomainEventSink};
use crate::goals::{GoalRepositoryTrait, GoalService, GoalServiceTrait, NewGoal};
use crate::settings::EvaluationSettings;
use crate::testing::{date, InMemoryStore};
use crate::transactions::{NewTransaction, Transaction, TransactionRepositoryTrait};
use crate::utils::FixedClock;

struct Fixture {
    store: Arc<InMemoryStore>,
    clock: Arc<FixedClock>,
    service: GoalService,
    sink: MockDomainEventSink,
}

fn fixture() -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let sink = MockDomainEventSink::new();
    let clock = Arc::new(FixedClock::new(date(2025, 1, 1)));
    let alerts = Arc::new(AlertService::new(store.clone(), Arc::new(sink.clone())));
    let service = GoalService::new(
        store.clone(),
        store.clone(),
        alerts,
        Arc::new(sink.clone()),
        clock.clone(),
        EvaluationSettings::default(),
    );
    Fixture {
        store,
        clock,
        service,
        sink,
    }
}

fn new_goal(id: &str, category: Option<&str>, target: Decimal, due: NaiveDate) -> NewGoal {
    NewGoal {
        id: Some(id.to_string()),
        owner_id: "u1".to_string(),
        name: format!("Goal {}", id),
        category_id: category.map(str::to_string),
        target_amount: target,
        target_date: due,
        currency: "USD".to_string(),
    }
}

async fn deposit(
    store: &InMemoryStore,
    category: &str,
    amount: Decimal,
    currency: &str,
) -> Transaction {
    store
        .insert_transaction(NewTransaction {
            id: None,
            owner_id: "u1".to_string(),
            category_id: Some(category.to_string()),
            date: date(2025, 1, 1),
            amount,
            currency: currency.to_string(),
            description: None,
        })
        .await
        .unwrap()
}

fn alerts_of(store: &InMemoryStore, kind: AlertKind) -> usize {
    store.all_alerts().iter().filter(|a| a.kind == kind).count()
}

#[tokio::test]
async fn test_completion_alerts_exactly_once() {
    let f = fixture();
    f.service
        .create_goal(new_goal("g1", None, dec!(1000), date(2025, 12, 31)))
        .await
        .unwrap();

    let goal = f
        .service
        .update_goal_progress("g1", "u1", dec!(900))
        .await
        .unwrap();
    assert!(!goal.completed);

    let goal = f
        .service
        .update_goal_progress("g1", "u1", dec!(100))
        .await
        .unwrap();
    assert!(goal.completed);
    assert_eq!(goal.current_amount, dec!(1000));

    let goal = f
        .service
        .update_goal_progress("g1", "u1", dec!(0))
        .await
        .unwrap();
    assert!(goal.completed);

    assert_eq!(alerts_of(&f.store, AlertKind::GoalCompleted), 1);
    assert!(f
        .sink
        .events()
        .contains(&DomainEvent::goal_completed("g1".to_string(), "u1".to_string())));
}

#[tokio::test]
async fn test_overshoot_keeps_accumulating() {
    let f = fixture();
    f.service
        .create_goal(new_goal("g1", None, dec!(100), date(2025, 12, 31)))
        .await
        .unwrap();

    f.service.update_goal_progress("g1", "u1", dec!(150)).await.unwrap();
    let goal = f
        .service
        .update_goal_progress("g1", "u1", dec!(25))
        .await
        .unwrap();

    assert_eq!(goal.current_amount, dec!(175));
    assert_eq!(alerts_of(&f.store, AlertKind::GoalCompleted), 1);
}

#[tokio::test]
async fn test_progress_validation_and_ownership() {
    let f = fixture();
    f.service
        .create_goal(new_goal("g1", None, dec!(100), date(2025, 12, 31)))
        .await
        .unwrap();

    let negative = f
        .service
        .update_goal_progress("g1", "u1", dec!(-1))
        .await
        .unwrap_err();
    assert!(matches!(negative, Error::Validation(_)));

    let foreign = f
        .service
        .update_goal_progress("g1", "u2", dec!(1))
        .await
        .unwrap_err();
    assert!(foreign.is_not_found());

    let zero_target = f
        .service
        .create_goal(new_goal("g2", None, dec!(0), date(2025, 12, 31)))
        .await
        .unwrap_err();
    assert!(matches!(zero_target, Error::Validation(_)));
}

#[tokio::test]
async fn test_goal_near_deadline_is_at_risk() {
    let f = fixture();
    f.service
        .create_goal(new_goal("g1", None, dec!(1000), date(2025, 1, 21)))
        .await
        .unwrap();

    f.service
        .update_goal_progress("g1", "u1", dec!(100))
        .await
        .unwrap();

    let risk_alerts: Vec<_> = f
        .store
        .all_alerts()
        .into_iter()
        .filter(|a| a.kind == AlertKind::GoalAtRisk)
        .collect();
    assert_eq!(risk_alerts.len(), 1);
    assert_eq!(
        risk_alerts[0].message,
        "Goal 'Goal g1' is at risk: 20 days remaining, 10.00% complete, 900.00 USD still required."
    );

    // The unread risk alert suppresses repeats from the batch.
    assert_eq!(f.service.evaluate_goals_for_user("u1").await.unwrap(), 0);
}

#[tokio::test]
async fn test_risk_window_bounds() {
    let f = fixture();
    f.service
        .create_goal(new_goal("far", None, dec!(1000), date(2025, 3, 1)))
        .await
        .unwrap();
    f.service
        .create_goal(new_goal("due", None, dec!(1000), date(2025, 1, 1)))
        .await
        .unwrap();
    f.service
        .create_goal(new_goal("near", None, dec!(1000), date(2025, 1, 31)))
        .await
        .unwrap();

    assert_eq!(f.service.evaluate_goals_for_user("u1").await.unwrap(), 1);
    let alerts = f.store.all_alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].source_id, "near");

    f.clock.set(date(2025, 2, 1));
    assert_eq!(f.service.evaluate_all_goals().await.unwrap(), 1);
    assert_eq!(f.store.all_alerts().last().unwrap().source_id, "far");
}

#[tokio::test]
async fn test_transaction_matching_rules() {
    let f = fixture();
    f.service
        .create_goal(new_goal("g1", Some("savings"), dec!(500), date(2025, 12, 31)))
        .await
        .unwrap();
    f.service
        .create_goal(new_goal("g2", None, dec!(500), date(2025, 12, 31)))
        .await
        .unwrap();

    let matching = deposit(&f.store, "savings", dec!(50), "USD").await;
    let wrong_currency = deposit(&f.store, "savings", dec!(50), "EUR").await;
    let withdrawal = deposit(&f.store, "savings", dec!(-20), "USD").await;
    let other_category = deposit(&f.store, "dining", dec!(50), "USD").await;

    assert_eq!(
        f.service
            .process_transaction_for_goals(&matching)
            .await
            .unwrap()
            .len(),
        1
    );
    for transaction in [&wrong_currency, &withdrawal, &other_category] {
        assert!(f
            .service
            .process_transaction_for_goals(transaction)
            .await
            .unwrap()
            .is_empty());
    }

    assert_eq!(f.store.get_goal("g1").unwrap().current_amount, dec!(50));
    assert_eq!(f.store.get_goal("g2").unwrap().current_amount, dec!(0));
}

#[tokio::test]
async fn test_resync_matches_incremental_processing() {
    let f = fixture();
    f.service
        .create_goal(new_goal("g1", Some("savings"), dec!(120), date(2025, 12, 31)))
        .await
        .unwrap();
    f.service
        .create_goal(new_goal("g2", Some("travel"), dec!(1000), date(2025, 12, 31)))
        .await
        .unwrap();

    let ledger = [
        ("savings", dec!(40), "USD"),
        ("travel", dec!(300), "USD"),
        ("savings", dec!(-10), "USD"),
        ("savings", dec!(90), "USD"),
        ("travel", dec!(50), "EUR"),
    ];
    for (category, amount, currency) in ledger {
        let transaction = deposit(&f.store, category, amount, currency).await;
        f.service
            .process_transaction_for_goals(&transaction)
            .await
            .unwrap();
    }
    let incremental = f.service.get_goals("u1").unwrap();

    // Drift the stored progress, then resync from the ledger.
    f.service
        .update_goal_progress("g2", "u1", dec!(999))
        .await
        .unwrap();
    let resynced = f.service.sync_all_transactions_with_goals("u1").await.unwrap();

    assert_eq!(resynced, incremental);
    assert_eq!(resynced[0].current_amount, dec!(130));
    assert!(resynced[0].completed);
    assert_eq!(resynced[1].current_amount, dec!(300));
    assert!(!resynced[1].completed);
}

#[tokio::test]
async fn test_resync_dispatches_no_alerts() {
    let f = fixture();
    f.service
        .create_goal(new_goal("g1", Some("savings"), dec!(10), date(2025, 12, 31)))
        .await
        .unwrap();
    deposit(&f.store, "savings", dec!(25), "USD").await;

    let goals = f.service.sync_all_transactions_with_goals("u1").await.unwrap();

    assert!(goals[0].completed);
    assert!(f.store.all_alerts().is_empty());
}

#[tokio::test]
async fn test_delete_goal_checks_owner() {
    let f = fixture();
    f.service
        .create_goal(new_goal("g1", None, dec!(10), date(2025, 12, 31)))
        .await
        .unwrap();

    assert!(f.service.delete_goal("g1", "u2").await.unwrap_err().is_not_found());
    f.service.delete_goal("g1", "u1").await.unwrap();
    assert!(f.service.get_goals("u1").unwrap().is_empty());
}
