//! Combined match score for a (transaction, candidate) pair.
//!
//! Weights are fixed by design: exact amount agreement is the dominant signal
//! because OCR-derived amounts are the most reliable field, date proximity is
//! secondary, and merchant text is the least reliable and only disambiguates.

use crate::matching::similarity::similarity;
use crate::matching::tolerance::{amounts_match, dates_within_tolerance};
use crate::models::{Invoice, Receipt, Transaction};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Minimum combined score required to accept an automatic match.
pub const MATCH_THRESHOLD: f64 = 70.0;

/// Points awarded when the dates fall within [`DATE_TOLERANCE_DAYS`].
pub const DATE_WEIGHT: f64 = 30.0;
/// Points awarded when the amounts fall within [`AMOUNT_TOLERANCE_PERCENT`].
pub const AMOUNT_WEIGHT: f64 = 50.0;
/// Maximum points contributed by name similarity.
pub const NAME_WEIGHT: f64 = 20.0;

pub const DATE_TOLERANCE_DAYS: i64 = 1;
/// 0.01% - effectively exact-amount matching with room for rounding skew.
pub const AMOUNT_TOLERANCE_PERCENT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// One unconsumed source document viewed through the fields the scorer
/// cares about. Built per pass from the folder's receipt or invoice pool.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub document_id: Uuid,
    pub name: Option<String>,
    pub document_date: Option<NaiveDate>,
    pub amount: Option<Decimal>,
    /// Transaction this document is already linked to, if any. Documents
    /// linked elsewhere are excluded from other transactions' consideration.
    pub linked_to: Option<Uuid>,
}

impl Candidate {
    pub fn from_receipt(receipt: &Receipt, linked_to: Option<Uuid>) -> Self {
        Self {
            document_id: receipt.receipt_id,
            name: receipt.merchant.clone(),
            document_date: receipt.document_date,
            amount: receipt.total,
            linked_to,
        }
    }

    pub fn from_invoice(invoice: &Invoice, linked_to: Option<Uuid>) -> Self {
        Self {
            document_id: invoice.invoice_id,
            name: invoice.vendor.clone(),
            document_date: invoice.document_date,
            amount: invoice.net_amount,
            linked_to,
        }
    }
}

/// Score a pair in `[0.0, 100.0]`. Pure; never fails - a hopeless pair just
/// scores low.
pub fn score_pair(transaction: &Transaction, candidate: &Candidate) -> f64 {
    let mut score = 0.0;

    if dates_within_tolerance(
        transaction.transaction_date,
        candidate.document_date,
        DATE_TOLERANCE_DAYS,
    ) {
        score += DATE_WEIGHT;
    }

    if amounts_match(transaction.value, candidate.amount, AMOUNT_TOLERANCE_PERCENT) {
        score += AMOUNT_WEIGHT;
    }

    let name = candidate.name.as_deref().unwrap_or("");
    score += similarity(&transaction.description, name) * NAME_WEIGHT;

    score
}
