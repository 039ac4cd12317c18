//! Integration tests for the order store, live feed and reconciliation loop.
//!
//! These run the engine against the in-memory document store end to end:
//! creation defaults, enforced lifecycle transitions, fine resolution rules,
//! the display/persistence decoupling, and background reconciliation.

use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use vestra::prelude::*;

fn draft_for(user_id: &str, end_date: Option<&str>) -> OrderDraft {
    OrderDraft {
        user_id: user_id.into(),
        customer: "Ayesha Malik".into(),
        email: "ayesha@example.com".into(),
        mobile: "0321-5550123".into(),
        city: "Karachi".into(),
        postal: "74200".into(),
        address: "House 8, Clifton Block 5".into(),
        product_title: "Ivory Bridal Lehenga".into(),
        product_price: 45000,
        product_image: None,
        duration: "4 Days".into(),
        rental_start_date: Some("2020-01-01".into()),
        rental_end_date: end_date.map(str::to_owned),
        payment_method: "Card".into(),
        payment_screenshot: Some("uploads/txn-1189.png".into()),
    }
}

fn engine() -> (InMemoryDocumentStore, OrderStore) {
    let backend = InMemoryDocumentStore::new();
    let store = OrderStore::new(Arc::new(backend.clone()), FinePolicy::default());
    (backend, store)
}

/// Poll the backend until `pred` holds for the order, or panic.
async fn wait_for(
    backend: &InMemoryDocumentStore,
    id: OrderId,
    pred: impl Fn(&Order) -> bool,
) -> Order {
    for _ in 0..200 {
        if let Some(order) = backend.get(id).await.unwrap()
            && pred(&order)
        {
            return order;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition never reached for order {id}");
}

#[tokio::test]
async fn test_creation_defaults() {
    let (backend, store) = engine();
    let id = store.create_order(draft_for("uid-1", None)).await.unwrap();

    let stored = backend.get(id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Pending);
    assert_eq!(stored.fine_amount, 0);
    assert_eq!(stored.fine_status, FineStatus::None);
    assert!(stored.created_at > 0);
    assert_eq!(stored.customer, "Ayesha Malik");
}

#[tokio::test]
async fn test_invalid_draft_writes_nothing() {
    let (backend, store) = engine();
    let mut draft = draft_for("uid-1", Some("2019-12-25"));
    draft.rental_start_date = Some("2020-01-01".into());

    let result = store.create_order(draft).await;
    assert!(matches!(result, Err(EngineError::InvalidDraft(_))));
    assert!(backend.watch().borrow().is_empty());
}

#[tokio::test]
async fn test_rental_lifecycle_happy_path() {
    let (_backend, store) = engine();
    let id = store.create_order(draft_for("uid-1", None)).await.unwrap();

    assert_eq!(
        store.update_status(id, OrderCommand::Accept).await.unwrap(),
        OrderStatus::Accepted
    );
    assert_eq!(
        store
            .update_status(id, OrderCommand::RequestReturn)
            .await
            .unwrap(),
        OrderStatus::ReturnPending
    );
    assert_eq!(
        store
            .update_status(id, OrderCommand::ConfirmReturn)
            .await
            .unwrap(),
        OrderStatus::ReturnAccepted
    );

    // Terminal: nothing further applies.
    assert_err!(store.update_status(id, OrderCommand::Ship).await);
}

#[tokio::test]
async fn test_invalid_transition_rejected_and_state_unchanged() {
    let (backend, store) = engine();
    let id = store.create_order(draft_for("uid-1", None)).await.unwrap();

    let result = store.update_status(id, OrderCommand::ConfirmReturn).await;
    match result {
        Err(EngineError::InvalidTransition { from, command }) => {
            assert_eq!(from, OrderStatus::Pending);
            assert_eq!(command, OrderCommand::ConfirmReturn);
        }
        other => panic!("expected InvalidTransition, got {other:?}"),
    }

    let stored = backend.get(id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_unknown_order_is_reported() {
    let (_backend, store) = engine();
    let missing = OrderId::new();

    assert!(matches!(
        store.update_status(missing, OrderCommand::Accept).await,
        Err(EngineError::OrderNotFound(id)) if id == missing
    ));
    assert!(matches!(
        store.get_order(missing).await,
        Err(EngineError::OrderNotFound(_))
    ));
}

#[tokio::test]
async fn test_fine_paid_requires_proof() {
    let (backend, store) = engine();
    let id = store.create_order(draft_for("uid-1", None)).await.unwrap();

    let result = store.update_fine(id, FineStatus::Paid, None).await;
    assert!(matches!(result, Err(EngineError::MissingFineProof)));

    assert_ok!(
        store
            .update_fine(id, FineStatus::Paid, Some("uploads/fine-receipt.png".into()))
            .await
    );
    let stored = backend.get(id).await.unwrap().unwrap();
    assert_eq!(stored.fine_status, FineStatus::Paid);
    assert_eq!(stored.fine_proof.as_deref(), Some("uploads/fine-receipt.png"));
}

#[tokio::test]
async fn test_fine_paid_accepts_previously_stored_proof() {
    let (backend, store) = engine();
    let id = store.create_order(draft_for("uid-1", None)).await.unwrap();

    // Renter submits proof; the fine sits in the pending state.
    store
        .update_fine(id, FineStatus::Pending, Some("uploads/receipt-2.png".into()))
        .await
        .unwrap();
    // Admin settles it without re-supplying the proof.
    assert_ok!(store.update_fine(id, FineStatus::Paid, None).await);

    let stored = backend.get(id).await.unwrap().unwrap();
    assert_eq!(stored.fine_status, FineStatus::Paid);
    assert_eq!(stored.fine_proof.as_deref(), Some("uploads/receipt-2.png"));
}

#[tokio::test]
async fn test_subscribe_delivers_current_snapshot_immediately() {
    let (_backend, store) = engine();
    store.create_order(draft_for("uid-1", None)).await.unwrap();
    store.create_order(draft_for("uid-2", None)).await.unwrap();

    // Subscribing after the writes still sees both orders, newest first.
    let mut feed = store.subscribe();
    let snapshot = feed.next().await.unwrap();
    assert_eq!(snapshot.len(), 2);
    let stamps: Vec<i64> = snapshot.iter().map(|o| o.created_at).collect();
    let mut sorted = stamps.clone();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(stamps, sorted);
}

#[tokio::test]
async fn test_feed_shows_fresh_fine_before_persistence() {
    // The display path is correct even with no reconciler running.
    let (backend, store) = engine();
    let id = store
        .create_order(draft_for("uid-1", Some("2020-01-05")))
        .await
        .unwrap();
    store.update_status(id, OrderCommand::Accept).await.unwrap();

    let mut feed = store.subscribe();
    let snapshot = feed.next().await.unwrap();
    let shown = snapshot.order(id).unwrap();
    // Years overdue: the feed shows the forfeited price...
    assert_eq!(shown.fine_amount, 45000);
    assert_eq!(shown.fine_status, FineStatus::Unpaid);

    // ...while the persisted document still says no fine.
    let stored = backend.get(id).await.unwrap().unwrap();
    assert_eq!(stored.fine_amount, 0);
    assert_eq!(stored.fine_status, FineStatus::None);

    // get_order reads through the same overlay.
    let fetched = store.get_order(id).await.unwrap();
    assert_eq!(fetched.fine_amount, 45000);
}

#[tokio::test]
async fn test_reconciler_persists_fine_without_user_action() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("vestra=debug")
        .with_test_writer()
        .try_init();

    let (backend, store) = engine();
    let handle = Reconciler::new(Arc::new(backend.clone()), FinePolicy::default()).spawn();

    let id = store
        .create_order(draft_for("uid-1", Some("2020-01-05")))
        .await
        .unwrap();
    store.update_status(id, OrderCommand::Accept).await.unwrap();

    // The accept write lands a snapshot; the loop re-assesses and persists.
    let stored = wait_for(&backend, id, |o| o.fine_amount > 0).await;
    assert_eq!(stored.fine_amount, 45000);
    assert_eq!(stored.fine_status, FineStatus::Unpaid);

    handle.abort();
}

#[tokio::test]
async fn test_reconciler_converges_after_own_write() {
    let (backend, store) = engine();
    let handle = Reconciler::new(Arc::new(backend.clone()), FinePolicy::default()).spawn();

    let id = store
        .create_order(draft_for("uid-1", Some("2020-01-05")))
        .await
        .unwrap();
    store.update_status(id, OrderCommand::Accept).await.unwrap();

    let first = wait_for(&backend, id, |o| o.fine_amount > 0).await;
    // Give the loop time to observe its own write; nothing should change.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let second = backend.get(id).await.unwrap().unwrap();
    assert_eq!(first, second);

    handle.abort();
}

#[tokio::test]
async fn test_snapshot_scoped_to_explicit_user() {
    let (_backend, store) = engine();
    store.create_order(draft_for("uid-a", None)).await.unwrap();
    store.create_order(draft_for("uid-b", None)).await.unwrap();
    store.create_order(draft_for("uid-a", None)).await.unwrap();

    let mut feed = store.subscribe();
    let snapshot = feed.next().await.unwrap();
    let mine = snapshot.for_user("uid-a");
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|o| o.user_id == "uid-a"));
}
