//! Reconciliation orchestrator and manual override operations.

use crate::error::EngineError;
use crate::matching::engine::{CandidatePool, MatchDecision, MatchOutcome, MatchingEngine};
use crate::models::{
    DocumentKind, ReconcileSummary, StatementType, Transaction, TransactionStatus,
};
use crate::services::metrics::{record_error, record_reconcile_operation, record_transaction_match};
use crate::storage::{FolderStore, MatchCounts};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Rounded percentage of matched over eligible transactions. Half cases
/// round up (`f64::round` is half-away-from-zero; the ratio is never
/// negative). Zero eligible transactions score zero, not a division error.
pub fn compliance_score(counts: MatchCounts) -> i32 {
    if counts.eligible == 0 {
        return 0;
    }
    (100.0 * counts.matched as f64 / counts.eligible as f64).round() as i32
}

/// Top-level entry point over a [`FolderStore`]. All work for one folder is
/// serialized through a keyed lock: the greedy consume-as-you-go pass is not
/// safe under interleaved writes to the same folder, and manual overrides
/// contend on the same transaction statuses and folder score. Different
/// folders proceed in parallel with no shared state.
pub struct Reconciler<S> {
    store: Arc<S>,
    folder_locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl<S: FolderStore> Reconciler<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            folder_locks: DashMap::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn folder_lock(&self, folder_id: Uuid) -> Arc<Mutex<()>> {
        self.folder_locks.entry(folder_id).or_default().clone()
    }

    /// Run one matching pass over the folder and refresh its compliance
    /// score. Safe to repeat: existing links are kept, unmatched
    /// transactions are re-evaluated against the current pool. Transaction
    /// updates are committed one by one, so a storage failure mid-pass
    /// keeps the progress made so far and a retry picks up from there.
    #[instrument(skip(self), fields(folder_id = %folder_id))]
    pub async fn reconcile(&self, folder_id: Uuid) -> Result<ReconcileSummary, EngineError> {
        let lock = self.folder_lock(folder_id);
        let _guard = lock.lock().await;

        let result = self.reconcile_locked(folder_id).await;
        match &result {
            Ok(summary) => {
                record_reconcile_operation("reconcile", "success");
                info!(
                    matched_count = summary.matched_count,
                    total_considered = summary.total_considered,
                    compliance_score = summary.compliance_score,
                    "Reconciliation pass completed"
                );
            }
            Err(e) => {
                record_reconcile_operation("reconcile", "error");
                record_error(e.kind());
            }
        }
        result
    }

    async fn reconcile_locked(&self, folder_id: Uuid) -> Result<ReconcileSummary, EngineError> {
        let folder = self
            .store
            .load_folder(folder_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(anyhow::anyhow!("Folder {} not found", folder_id)))?;

        let statement_type = folder.statement_type.ok_or_else(|| {
            EngineError::InvalidState(anyhow::anyhow!(
                "Folder {} has no statement type configured",
                folder_id
            ))
        })?;

        let transactions = self.store.load_eligible_transactions(folder_id).await?;

        let mut pool = match statement_type {
            StatementType::Card => {
                let receipts = self.store.load_receipts(folder_id).await?;
                CandidatePool::from_receipts(&receipts, &transactions)
            }
            StatementType::Bank => {
                let invoices = self.store.load_invoices(folder_id).await?;
                CandidatePool::from_invoices(&invoices, &transactions)
            }
        };

        info!(
            statement_type = statement_type.as_str(),
            transactions = transactions.len(),
            pool_size = pool.len(),
            "Starting matching pass"
        );

        let decisions = MatchingEngine::run(&transactions, &mut pool);
        let matched_count = self
            .commit_decisions(statement_type, &transactions, &decisions)
            .await?;

        let counts = self.store.count_match_statuses(folder_id).await?;
        let score = compliance_score(counts);
        self.store.update_folder_score(folder_id, score).await?;

        Ok(ReconcileSummary {
            matched_count,
            total_considered: transactions.len() as i64,
            compliance_score: score,
        })
    }

    /// Persist each decision as it stands. Returns the number of matched
    /// transactions (new links plus re-affirmed ones).
    async fn commit_decisions(
        &self,
        statement_type: StatementType,
        transactions: &[Transaction],
        decisions: &[MatchDecision],
    ) -> Result<i64, EngineError> {
        let mut matched_count = 0;

        for decision in decisions {
            match &decision.outcome {
                MatchOutcome::Matched { document_id, .. } => {
                    let (receipt_id, invoice_id) = match statement_type {
                        StatementType::Card => (Some(*document_id), None),
                        StatementType::Bank => (None, Some(*document_id)),
                    };
                    self.store
                        .update_transaction_match(
                            decision.transaction_id,
                            TransactionStatus::Matched,
                            receipt_id,
                            invoice_id,
                        )
                        .await?;
                    record_transaction_match("matched");
                    matched_count += 1;
                }
                MatchOutcome::AlreadyMatched { .. } => {
                    matched_count += 1;
                }
                MatchOutcome::Exception => {
                    // Already-exception transactions stay as they are; one
                    // write per actual status change.
                    let was_exception = transactions
                        .iter()
                        .find(|t| t.transaction_id == decision.transaction_id)
                        .map(|t| t.status == TransactionStatus::Exception)
                        .unwrap_or(false);
                    if !was_exception {
                        self.store
                            .update_transaction_match(
                                decision.transaction_id,
                                TransactionStatus::Exception,
                                None,
                                None,
                            )
                            .await?;
                    }
                    record_transaction_match("exception");
                }
            }
        }

        Ok(matched_count)
    }

    /// Force-link a transaction to a document, bypassing the scorer, then
    /// refresh the folder score. Returns the recomputed score.
    #[instrument(skip(self), fields(transaction_id = %transaction_id, document_id = %document_id))]
    pub async fn link(
        &self,
        transaction_id: Uuid,
        document_id: Uuid,
        document_type: &str,
    ) -> Result<i32, EngineError> {
        let kind = DocumentKind::parse(document_type)?;

        let transaction = self
            .store
            .load_transaction(transaction_id)
            .await?
            .ok_or_else(|| {
                EngineError::NotFound(anyhow::anyhow!("Transaction {} not found", transaction_id))
            })?;

        let document_folder = match kind {
            DocumentKind::Receipt => self
                .store
                .load_receipt(document_id)
                .await?
                .map(|r| r.folder_id)
                .ok_or_else(|| {
                    EngineError::NotFound(anyhow::anyhow!("Receipt {} not found", document_id))
                })?,
            DocumentKind::Invoice => self
                .store
                .load_invoice(document_id)
                .await?
                .map(|i| i.folder_id)
                .ok_or_else(|| {
                    EngineError::NotFound(anyhow::anyhow!("Invoice {} not found", document_id))
                })?,
        };

        if document_folder != transaction.folder_id {
            warn!(
                document_folder = %document_folder,
                transaction_folder = %transaction.folder_id,
                "Manual link crosses folders"
            );
        }

        let lock = self.folder_lock(transaction.folder_id);
        let _guard = lock.lock().await;

        let (receipt_id, invoice_id) = match kind {
            DocumentKind::Receipt => (Some(document_id), None),
            DocumentKind::Invoice => (None, Some(document_id)),
        };
        self.store
            .update_transaction_match(
                transaction_id,
                TransactionStatus::Matched,
                receipt_id,
                invoice_id,
            )
            .await?;

        record_transaction_match("manual_link");
        record_reconcile_operation("link", "success");
        info!(kind = kind.as_str(), "Transaction manually linked");

        self.refresh_score(transaction.folder_id).await
    }

    /// Clear a transaction's links, force it to `Exception`, and refresh the
    /// folder score. The document returns to the pool for future passes.
    #[instrument(skip(self), fields(transaction_id = %transaction_id))]
    pub async fn unlink(&self, transaction_id: Uuid) -> Result<i32, EngineError> {
        let transaction = self
            .store
            .load_transaction(transaction_id)
            .await?
            .ok_or_else(|| {
                EngineError::NotFound(anyhow::anyhow!("Transaction {} not found", transaction_id))
            })?;

        let lock = self.folder_lock(transaction.folder_id);
        let _guard = lock.lock().await;

        self.store
            .update_transaction_match(transaction_id, TransactionStatus::Exception, None, None)
            .await?;

        record_transaction_match("manual_unlink");
        record_reconcile_operation("unlink", "success");
        info!("Transaction manually unlinked");

        self.refresh_score(transaction.folder_id).await
    }

    async fn refresh_score(&self, folder_id: Uuid) -> Result<i32, EngineError> {
        let counts = self.store.count_match_statuses(folder_id).await?;
        let score = compliance_score(counts);
        self.store.update_folder_score(folder_id, score).await?;
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(matched: i64, eligible: i64) -> MatchCounts {
        MatchCounts { matched, eligible }
    }

    #[test]
    fn seven_of_ten_scores_seventy() {
        assert_eq!(compliance_score(counts(7, 10)), 70);
    }

    #[test]
    fn fee_lines_shrink_the_denominator() {
        // 5 transactions, 2 fee, 2 matched, 1 exception: 2 of 3 eligible.
        assert_eq!(compliance_score(counts(2, 3)), 67);
    }

    #[test]
    fn zero_eligible_scores_zero() {
        assert_eq!(compliance_score(counts(0, 0)), 0);
    }

    #[test]
    fn half_rounds_up() {
        assert_eq!(compliance_score(counts(1, 8)), 13);
    }

    #[test]
    fn full_match_scores_one_hundred() {
        assert_eq!(compliance_score(counts(12, 12)), 100);
    }

    #[test]
    fn score_stays_in_bounds() {
        for matched in 0..=20 {
            let s = compliance_score(counts(matched, 20));
            assert!((0..=100).contains(&s));
        }
    }
}
