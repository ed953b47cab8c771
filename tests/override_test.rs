//! Integration tests for manual override operations.

mod common;

use common::{march, receipt, spawn_app, transaction};
use reconciliation_engine::error::EngineError;
use reconciliation_engine::models::{StatementType, TransactionStatus};
use reconciliation_engine::storage::FolderStore;
use rust_decimal_macros::dec;
use uuid::Uuid;

#[tokio::test]
async fn link_forces_matched_below_threshold() {
    let app = spawn_app(Some(StatementType::Card)).await;

    // Nothing about this pair would score anywhere near 70.
    let t = transaction(app.folder_id, 0, "Mystery", march(1), Some(dec!(-5.00)));
    let r = receipt(app.folder_id, "Completely Unrelated", march(28), Some(dec!(900.00)));
    app.store().insert_transaction(t.clone()).await;
    app.store().insert_receipt(r.clone()).await;

    let score = app
        .reconciler
        .link(t.transaction_id, r.receipt_id, "receipt")
        .await
        .unwrap();
    assert_eq!(score, 100);

    let stored = app
        .store()
        .load_transaction(t.transaction_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, TransactionStatus::Matched);
    assert_eq!(stored.receipt_id, Some(r.receipt_id));

    let folder = app
        .store()
        .load_folder(app.folder_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(folder.compliance_score, 100);
}

#[tokio::test]
async fn link_rejects_unknown_document_type() {
    let app = spawn_app(Some(StatementType::Card)).await;

    let t = transaction(app.folder_id, 0, "Mystery", march(1), Some(dec!(-5.00)));
    app.store().insert_transaction(t.clone()).await;

    let result = app
        .reconciler
        .link(t.transaction_id, Uuid::new_v4(), "statement")
        .await;
    assert!(matches!(result, Err(EngineError::Validation(_))));
}

#[tokio::test]
async fn link_missing_transaction_is_not_found() {
    let app = spawn_app(Some(StatementType::Card)).await;

    let result = app
        .reconciler
        .link(Uuid::new_v4(), Uuid::new_v4(), "receipt")
        .await;
    assert!(matches!(result, Err(EngineError::NotFound(_))));
}

#[tokio::test]
async fn link_missing_document_is_not_found() {
    let app = spawn_app(Some(StatementType::Card)).await;

    let t = transaction(app.folder_id, 0, "Mystery", march(1), Some(dec!(-5.00)));
    app.store().insert_transaction(t.clone()).await;

    let result = app
        .reconciler
        .link(t.transaction_id, Uuid::new_v4(), "receipt")
        .await;
    assert!(matches!(result, Err(EngineError::NotFound(_))));
}

#[tokio::test]
async fn unlink_missing_transaction_is_not_found() {
    let app = spawn_app(Some(StatementType::Card)).await;

    let result = app.reconciler.unlink(Uuid::new_v4()).await;
    assert!(matches!(result, Err(EngineError::NotFound(_))));
}

#[tokio::test]
async fn unlink_forces_exception_and_updates_score() {
    let app = spawn_app(Some(StatementType::Card)).await;

    let t = transaction(app.folder_id, 0, "Starbucks", march(1), Some(dec!(-50.00)));
    let r = receipt(app.folder_id, "Starbucks", march(1), Some(dec!(50.00)));
    app.store().insert_transaction(t.clone()).await;
    app.store().insert_receipt(r.clone()).await;

    let summary = app.reconciler.reconcile(app.folder_id).await.unwrap();
    assert_eq!(summary.compliance_score, 100);

    let score = app.reconciler.unlink(t.transaction_id).await.unwrap();
    assert_eq!(score, 0);

    let stored = app
        .store()
        .load_transaction(t.transaction_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, TransactionStatus::Exception);
    assert_eq!(stored.receipt_id, None);
    assert_eq!(stored.invoice_id, None);
}

#[tokio::test]
async fn unlinked_document_returns_to_the_pool() {
    let app = spawn_app(Some(StatementType::Card)).await;

    let t1 = transaction(app.folder_id, 0, "Starbucks", march(1), Some(dec!(-50.00)));
    let t2 = transaction(app.folder_id, 1, "Starbucks", march(1), Some(dec!(-50.00)));
    let r = receipt(app.folder_id, "Starbucks", march(1), Some(dec!(50.00)));
    app.store().insert_transaction(t1.clone()).await;
    app.store().insert_transaction(t2.clone()).await;
    app.store().insert_receipt(r.clone()).await;

    app.reconciler.reconcile(app.folder_id).await.unwrap();
    assert_eq!(
        app.store()
            .load_transaction(t1.transaction_id)
            .await
            .unwrap()
            .unwrap()
            .receipt_id,
        Some(r.receipt_id)
    );

    // Free the document, then let the next pass hand it to t2... and back to
    // t1, which comes first in insertion order and fits equally well. So
    // unlink t1 and verify the document is re-consumed rather than stranded.
    app.reconciler.unlink(t1.transaction_id).await.unwrap();

    let summary = app.reconciler.reconcile(app.folder_id).await.unwrap();
    assert_eq!(summary.matched_count, 1);

    let s1 = app
        .store()
        .load_transaction(t1.transaction_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(s1.status, TransactionStatus::Matched);
    assert_eq!(s1.receipt_id, Some(r.receipt_id));
}

#[tokio::test]
async fn relink_after_unlink_via_manual_override() {
    let app = spawn_app(Some(StatementType::Card)).await;

    let t = transaction(app.folder_id, 0, "Starbucks", march(1), Some(dec!(-50.00)));
    let r = receipt(app.folder_id, "Starbucks", march(1), Some(dec!(50.00)));
    app.store().insert_transaction(t.clone()).await;
    app.store().insert_receipt(r.clone()).await;

    app.reconciler.reconcile(app.folder_id).await.unwrap();
    app.reconciler.unlink(t.transaction_id).await.unwrap();
    let score = app
        .reconciler
        .link(t.transaction_id, r.receipt_id, "receipt")
        .await
        .unwrap();
    assert_eq!(score, 100);
}
