//! Domain models for the reconciliation engine.

#![allow(clippy::should_implement_trait)]

use crate::error::EngineError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

// ============================================================================
// Folder Models
// ============================================================================

/// Statement type configured on a folder. Drives which document pool the
/// matching pass draws from: receipts for card folders, invoices for bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StatementType {
    Bank,
    Card,
}

impl StatementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bank => "bank",
            Self::Card => "card",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "bank" => Some(Self::Bank),
            "card" => Some(Self::Card),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Folder {
    pub folder_id: Uuid,
    pub name: String,
    pub statement_type: Option<StatementType>,
    /// Rounded percentage of matched over eligible transactions as of the
    /// last scoring run. Not guaranteed fresh between runs.
    pub compliance_score: i32,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

// ============================================================================
// Transaction Models
// ============================================================================

/// Closed status set per transaction. `Fee` lines are excluded from matching
/// and from the compliance denominator; future excluded categories extend
/// `is_eligible` rather than scattering string comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Matched,
    Exception,
    Fee,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Matched => "matched",
            Self::Exception => "exception",
            Self::Fee => "fee",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "pending" => Self::Pending,
            "matched" => Self::Matched,
            "exception" => Self::Exception,
            "fee" => Self::Fee,
            _ => Self::Pending,
        }
    }

    /// Whether the transaction participates in matching and in the
    /// compliance denominator.
    pub fn is_eligible(&self) -> bool {
        !matches!(self, Self::Fee)
    }
}

/// One line item extracted from a bank/card statement. Date and value are
/// optional because OCR extraction may fail to produce them; such lines can
/// still end in `Exception` through the normal pass.
#[derive(Debug, Clone, FromRow)]
pub struct Transaction {
    pub transaction_id: Uuid,
    pub folder_id: Uuid,
    pub description: String,
    pub transaction_date: Option<NaiveDate>,
    pub value: Option<Decimal>,
    pub category: Option<String>,
    pub status: TransactionStatus,
    pub flagged: bool,
    pub receipt_id: Option<Uuid>,
    pub invoice_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_utc: DateTime<Utc>,
}

impl Transaction {
    /// The document currently linked, if any. At most one of the two link
    /// fields is ever set.
    pub fn linked_document_id(&self) -> Option<Uuid> {
        self.receipt_id.or(self.invoice_id)
    }
}

// ============================================================================
// Document Models
// ============================================================================

/// Kind of source document a manual override targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Receipt,
    Invoice,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Receipt => "receipt",
            Self::Invoice => "invoice",
        }
    }

    pub fn parse(s: &str) -> Result<Self, EngineError> {
        match s {
            "receipt" => Ok(Self::Receipt),
            "invoice" => Ok(Self::Invoice),
            other => Err(EngineError::Validation(anyhow::anyhow!(
                "Unknown document type '{}', expected 'receipt' or 'invoice'",
                other
            ))),
        }
    }
}

/// Source document corroborating a card transaction.
#[derive(Debug, Clone, FromRow)]
pub struct Receipt {
    pub receipt_id: Uuid,
    pub folder_id: Uuid,
    pub merchant: Option<String>,
    pub total: Option<Decimal>,
    pub document_date: Option<NaiveDate>,
    pub uploaded_by: Uuid,
    pub created_utc: DateTime<Utc>,
}

/// Source document corroborating a bank transaction.
#[derive(Debug, Clone, FromRow)]
pub struct Invoice {
    pub invoice_id: Uuid,
    pub folder_id: Uuid,
    pub vendor: Option<String>,
    pub net_amount: Option<Decimal>,
    pub document_date: Option<NaiveDate>,
    pub uploaded_by: Uuid,
    pub created_utc: DateTime<Utc>,
}

// ============================================================================
// Result Models
// ============================================================================

/// Summary returned by a reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub matched_count: i64,
    pub total_considered: i64,
    pub compliance_score: i32,
}
