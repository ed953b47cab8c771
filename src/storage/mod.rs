//! Storage collaborator for the reconciliation engine.

pub mod memory;
pub mod postgres;

use crate::error::EngineError;
use crate::models::{Folder, Invoice, Receipt, Transaction, TransactionStatus};
use async_trait::async_trait;
use uuid::Uuid;

/// Matched and eligible transaction counts for one folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchCounts {
    pub matched: i64,
    pub eligible: i64,
}

/// Persistence operations the engine consumes. Implementations must be safe
/// to share across folders; the engine serializes calls per folder itself.
#[async_trait]
pub trait FolderStore: Send + Sync {
    async fn load_folder(&self, folder_id: Uuid) -> Result<Option<Folder>, EngineError>;

    async fn load_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Option<Transaction>, EngineError>;

    /// All non-fee transactions of a folder, in insertion order. Insertion
    /// order is what makes the greedy pass reproducible.
    async fn load_eligible_transactions(
        &self,
        folder_id: Uuid,
    ) -> Result<Vec<Transaction>, EngineError>;

    async fn load_receipts(&self, folder_id: Uuid) -> Result<Vec<Receipt>, EngineError>;

    async fn load_invoices(&self, folder_id: Uuid) -> Result<Vec<Invoice>, EngineError>;

    async fn load_receipt(&self, receipt_id: Uuid) -> Result<Option<Receipt>, EngineError>;

    async fn load_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, EngineError>;

    /// Persist one matching decision: status plus both link fields. At most
    /// one of `receipt_id`/`invoice_id` may be `Some`.
    async fn update_transaction_match(
        &self,
        transaction_id: Uuid,
        status: TransactionStatus,
        receipt_id: Option<Uuid>,
        invoice_id: Option<Uuid>,
    ) -> Result<(), EngineError>;

    async fn count_match_statuses(&self, folder_id: Uuid) -> Result<MatchCounts, EngineError>;

    async fn update_folder_score(&self, folder_id: Uuid, score: i32) -> Result<(), EngineError>;
}
