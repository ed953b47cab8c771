//! Services module for the reconciliation engine.

pub mod metrics;
pub mod reconciler;

pub use metrics::{get_metrics, init_metrics, record_error, record_reconcile_operation,
    record_transaction_match};
pub use reconciler::{compliance_score, Reconciler};
