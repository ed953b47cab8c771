//! In-memory [`FolderStore`] for tests and embedders that run without
//! PostgreSQL. Preserves insertion order, which the matching pass depends on.

use crate::error::EngineError;
use crate::models::{Folder, Invoice, Receipt, Transaction, TransactionStatus};
use crate::storage::{FolderStore, MatchCounts};
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    folders: Vec<Folder>,
    transactions: Vec<Transaction>,
    receipts: Vec<Receipt>,
    invoices: Vec<Invoice>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_folder(&self, folder: Folder) {
        self.inner.write().await.folders.push(folder);
    }

    pub async fn insert_transaction(&self, transaction: Transaction) {
        self.inner.write().await.transactions.push(transaction);
    }

    pub async fn insert_receipt(&self, receipt: Receipt) {
        self.inner.write().await.receipts.push(receipt);
    }

    pub async fn insert_invoice(&self, invoice: Invoice) {
        self.inner.write().await.invoices.push(invoice);
    }
}

#[async_trait]
impl FolderStore for MemoryStore {
    async fn load_folder(&self, folder_id: Uuid) -> Result<Option<Folder>, EngineError> {
        let inner = self.inner.read().await;
        Ok(inner.folders.iter().find(|f| f.folder_id == folder_id).cloned())
    }

    async fn load_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Option<Transaction>, EngineError> {
        let inner = self.inner.read().await;
        Ok(inner
            .transactions
            .iter()
            .find(|t| t.transaction_id == transaction_id)
            .cloned())
    }

    async fn load_eligible_transactions(
        &self,
        folder_id: Uuid,
    ) -> Result<Vec<Transaction>, EngineError> {
        let inner = self.inner.read().await;
        Ok(inner
            .transactions
            .iter()
            .filter(|t| t.folder_id == folder_id && t.status.is_eligible())
            .cloned()
            .collect())
    }

    async fn load_receipts(&self, folder_id: Uuid) -> Result<Vec<Receipt>, EngineError> {
        let inner = self.inner.read().await;
        Ok(inner
            .receipts
            .iter()
            .filter(|r| r.folder_id == folder_id)
            .cloned()
            .collect())
    }

    async fn load_invoices(&self, folder_id: Uuid) -> Result<Vec<Invoice>, EngineError> {
        let inner = self.inner.read().await;
        Ok(inner
            .invoices
            .iter()
            .filter(|i| i.folder_id == folder_id)
            .cloned()
            .collect())
    }

    async fn load_receipt(&self, receipt_id: Uuid) -> Result<Option<Receipt>, EngineError> {
        let inner = self.inner.read().await;
        Ok(inner
            .receipts
            .iter()
            .find(|r| r.receipt_id == receipt_id)
            .cloned())
    }

    async fn load_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, EngineError> {
        let inner = self.inner.read().await;
        Ok(inner
            .invoices
            .iter()
            .find(|i| i.invoice_id == invoice_id)
            .cloned())
    }

    async fn update_transaction_match(
        &self,
        transaction_id: Uuid,
        status: TransactionStatus,
        receipt_id: Option<Uuid>,
        invoice_id: Option<Uuid>,
    ) -> Result<(), EngineError> {
        let mut inner = self.inner.write().await;
        let transaction = inner
            .transactions
            .iter_mut()
            .find(|t| t.transaction_id == transaction_id)
            .ok_or_else(|| {
                EngineError::NotFound(anyhow::anyhow!("Transaction {} not found", transaction_id))
            })?;
        transaction.status = status;
        transaction.receipt_id = receipt_id;
        transaction.invoice_id = invoice_id;
        Ok(())
    }

    async fn count_match_statuses(&self, folder_id: Uuid) -> Result<MatchCounts, EngineError> {
        let inner = self.inner.read().await;
        let mut counts = MatchCounts {
            matched: 0,
            eligible: 0,
        };
        for t in inner.transactions.iter().filter(|t| t.folder_id == folder_id) {
            if t.status.is_eligible() {
                counts.eligible += 1;
            }
            if t.status == TransactionStatus::Matched {
                counts.matched += 1;
            }
        }
        Ok(counts)
    }

    async fn update_folder_score(&self, folder_id: Uuid, score: i32) -> Result<(), EngineError> {
        let mut inner = self.inner.write().await;
        let folder = inner
            .folders
            .iter_mut()
            .find(|f| f.folder_id == folder_id)
            .ok_or_else(|| {
                EngineError::NotFound(anyhow::anyhow!("Folder {} not found", folder_id))
            })?;
        folder.compliance_score = score;
        Ok(())
    }
}
