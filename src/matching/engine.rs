//! Greedy matching engine over a pass-local candidate pool.
//!
//! Assignment is single-pass and order-dependent: transactions are processed
//! in folder insertion order and each consumes its best candidate
//! immediately, which can starve a later transaction of a better-fitting
//! document. That trade-off is deliberate and load-bearing for reproducible
//! outcomes; do not silently upgrade this to optimal bipartite assignment.

use crate::matching::scorer::{score_pair, Candidate, MATCH_THRESHOLD};
use crate::models::{Invoice, Receipt, Transaction, TransactionStatus};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Outcome of one transaction's evaluation within a pass.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// New link committed this pass.
    Matched { document_id: Uuid, score: f64 },
    /// Pre-existing link re-affirmed on a re-run; nothing to write.
    AlreadyMatched { document_id: Uuid },
    /// No eligible candidate scored at or above the threshold.
    Exception,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchDecision {
    pub transaction_id: Uuid,
    pub outcome: MatchOutcome,
}

/// Unconsumed source documents available to one reconciliation pass. Owned
/// entirely by that pass; never shared between invocations.
#[derive(Debug)]
pub struct CandidatePool {
    candidates: Vec<Candidate>,
    consumed: Vec<bool>,
}

impl CandidatePool {
    /// Pool for a card folder. `transactions` supplies the existing links so
    /// that documents consumed in an earlier pass stay excluded from other
    /// transactions' consideration.
    pub fn from_receipts(receipts: &[Receipt], transactions: &[Transaction]) -> Self {
        let links: HashMap<Uuid, Uuid> = transactions
            .iter()
            .filter_map(|t| t.receipt_id.map(|doc| (doc, t.transaction_id)))
            .collect();
        let candidates = receipts
            .iter()
            .map(|r| Candidate::from_receipt(r, links.get(&r.receipt_id).copied()))
            .collect();
        Self::new(candidates)
    }

    /// Pool for a bank folder.
    pub fn from_invoices(invoices: &[Invoice], transactions: &[Transaction]) -> Self {
        let links: HashMap<Uuid, Uuid> = transactions
            .iter()
            .filter_map(|t| t.invoice_id.map(|doc| (doc, t.transaction_id)))
            .collect();
        let candidates = invoices
            .iter()
            .map(|i| Candidate::from_invoice(i, links.get(&i.invoice_id).copied()))
            .collect();
        Self::new(candidates)
    }

    fn new(candidates: Vec<Candidate>) -> Self {
        let consumed = vec![false; candidates.len()];
        Self {
            candidates,
            consumed,
        }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// A candidate is open to a transaction unless it was consumed earlier in
    /// this pass or is linked to a different transaction. A transaction may
    /// always re-match its own document.
    fn available_for(&self, idx: usize, transaction_id: Uuid) -> bool {
        !self.consumed[idx]
            && self.candidates[idx]
                .linked_to
                .is_none_or(|owner| owner == transaction_id)
    }

    fn consume(&mut self, idx: usize) {
        self.consumed[idx] = true;
    }

    fn position_of(&self, document_id: Uuid) -> Option<usize> {
        self.candidates
            .iter()
            .position(|c| c.document_id == document_id)
    }
}

pub struct MatchingEngine;

impl MatchingEngine {
    /// Evaluate every eligible transaction against the pool, consuming
    /// candidates as links are committed. Fee lines are filtered out before
    /// the pool is ever consulted.
    pub fn run(transactions: &[Transaction], pool: &mut CandidatePool) -> Vec<MatchDecision> {
        transactions
            .iter()
            .filter(|t| t.status.is_eligible())
            .map(|t| Self::decide(t, pool))
            .collect()
    }

    fn decide(transaction: &Transaction, pool: &mut CandidatePool) -> MatchDecision {
        // A transaction that already holds a link keeps it: re-runs only
        // re-evaluate the ones that did not match before.
        if transaction.status == TransactionStatus::Matched {
            if let Some(document_id) = transaction.linked_document_id() {
                if let Some(idx) = pool.position_of(document_id) {
                    pool.consume(idx);
                }
                return MatchDecision {
                    transaction_id: transaction.transaction_id,
                    outcome: MatchOutcome::AlreadyMatched { document_id },
                };
            }
        }

        // Strict-max scan: ties go to the first candidate seen in pool
        // iteration order, which keeps re-runs deterministic.
        let mut best: Option<(usize, f64)> = None;
        for idx in 0..pool.len() {
            if !pool.available_for(idx, transaction.transaction_id) {
                continue;
            }
            let score = score_pair(transaction, &pool.candidates[idx]);
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((idx, score));
            }
        }

        match best {
            Some((idx, score)) if score >= MATCH_THRESHOLD => {
                let document_id = pool.candidates[idx].document_id;
                pool.consume(idx);
                debug!(
                    transaction_id = %transaction.transaction_id,
                    document_id = %document_id,
                    score = score,
                    "Transaction matched"
                );
                MatchDecision {
                    transaction_id: transaction.transaction_id,
                    outcome: MatchOutcome::Matched { document_id, score },
                }
            }
            _ => MatchDecision {
                transaction_id: transaction.transaction_id,
                outcome: MatchOutcome::Exception,
            },
        }
    }
}
