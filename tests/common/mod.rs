//! Common test utilities for reconciliation-engine integration tests.

#![allow(dead_code)]

use chrono::{NaiveDate, TimeZone, Utc};
use reconciliation_engine::models::{
    Folder, Invoice, Receipt, StatementType, Transaction, TransactionStatus,
};
use reconciliation_engine::services::Reconciler;
use reconciliation_engine::storage::memory::MemoryStore;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::sync::Once;
use uuid::Uuid;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,reconciliation_engine=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub struct TestApp {
    pub reconciler: Reconciler<MemoryStore>,
    pub folder_id: Uuid,
}

impl TestApp {
    pub fn store(&self) -> &MemoryStore {
        self.reconciler.store()
    }
}

/// Spawn a reconciler over a fresh in-memory store with one folder of the
/// given statement type.
pub async fn spawn_app(statement_type: Option<StatementType>) -> TestApp {
    init_tracing();

    let store = Arc::new(MemoryStore::new());
    let folder_id = Uuid::new_v4();
    store
        .insert_folder(Folder {
            folder_id,
            name: "March statement".to_string(),
            statement_type,
            compliance_score: 0,
            created_utc: Utc::now(),
            updated_utc: Utc::now(),
        })
        .await;

    TestApp {
        reconciler: Reconciler::new(store),
        folder_id,
    }
}

/// Transactions must carry increasing creation times so the store reproduces
/// insertion order the way the Postgres backend's ORDER BY does.
pub fn transaction(
    folder_id: Uuid,
    seq: u32,
    description: &str,
    date: Option<NaiveDate>,
    value: Option<Decimal>,
) -> Transaction {
    Transaction {
        transaction_id: Uuid::new_v4(),
        folder_id,
        description: description.to_string(),
        transaction_date: date,
        value,
        category: None,
        status: TransactionStatus::Pending,
        flagged: false,
        receipt_id: None,
        invoice_id: None,
        notes: None,
        created_utc: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, seq).unwrap(),
    }
}

pub fn receipt(
    folder_id: Uuid,
    merchant: &str,
    date: Option<NaiveDate>,
    total: Option<Decimal>,
) -> Receipt {
    Receipt {
        receipt_id: Uuid::new_v4(),
        folder_id,
        merchant: Some(merchant.to_string()),
        total,
        document_date: date,
        uploaded_by: Uuid::new_v4(),
        created_utc: Utc::now(),
    }
}

pub fn invoice(
    folder_id: Uuid,
    vendor: &str,
    date: Option<NaiveDate>,
    net_amount: Option<Decimal>,
) -> Invoice {
    Invoice {
        invoice_id: Uuid::new_v4(),
        folder_id,
        vendor: Some(vendor.to_string()),
        net_amount,
        document_date: date,
        uploaded_by: Uuid::new_v4(),
        created_utc: Utc::now(),
    }
}

pub fn march(day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(2024, 3, day)
}
