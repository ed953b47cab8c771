//! PostgreSQL-backed [`FolderStore`].

use crate::error::EngineError;
use crate::models::{Folder, Invoice, Receipt, Transaction, TransactionStatus};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::storage::{FolderStore, MatchCounts};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, EngineError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| EngineError::Database(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), EngineError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["health_check"])
            .start_timer();

        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| EngineError::Database(anyhow::anyhow!("Health check failed: {}", e)))?;

        timer.observe_duration();
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), EngineError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| EngineError::Database(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl FolderStore for Database {
    #[instrument(skip(self), fields(folder_id = %folder_id))]
    async fn load_folder(&self, folder_id: Uuid) -> Result<Option<Folder>, EngineError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["load_folder"])
            .start_timer();

        let folder = sqlx::query_as::<_, Folder>(
            r#"
            SELECT folder_id, name, statement_type, compliance_score, created_utc, updated_utc
            FROM folders
            WHERE folder_id = $1
            "#,
        )
        .bind(folder_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| EngineError::Database(anyhow::anyhow!("Failed to load folder: {}", e)))?;

        timer.observe_duration();
        Ok(folder)
    }

    #[instrument(skip(self), fields(transaction_id = %transaction_id))]
    async fn load_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Option<Transaction>, EngineError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["load_transaction"])
            .start_timer();

        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT transaction_id, folder_id, description, transaction_date, value,
                   category, status, flagged, receipt_id, invoice_id, notes, created_utc
            FROM transactions
            WHERE transaction_id = $1
            "#,
        )
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| EngineError::Database(anyhow::anyhow!("Failed to load transaction: {}", e)))?;

        timer.observe_duration();
        Ok(transaction)
    }

    #[instrument(skip(self), fields(folder_id = %folder_id))]
    async fn load_eligible_transactions(
        &self,
        folder_id: Uuid,
    ) -> Result<Vec<Transaction>, EngineError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["load_eligible_transactions"])
            .start_timer();

        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT transaction_id, folder_id, description, transaction_date, value,
                   category, status, flagged, receipt_id, invoice_id, notes, created_utc
            FROM transactions
            WHERE folder_id = $1 AND status <> 'fee'
            ORDER BY created_utc, transaction_id
            "#,
        )
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            EngineError::Database(anyhow::anyhow!("Failed to load transactions: {}", e))
        })?;

        timer.observe_duration();
        Ok(transactions)
    }

    #[instrument(skip(self), fields(folder_id = %folder_id))]
    async fn load_receipts(&self, folder_id: Uuid) -> Result<Vec<Receipt>, EngineError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["load_receipts"])
            .start_timer();

        let receipts = sqlx::query_as::<_, Receipt>(
            r#"
            SELECT receipt_id, folder_id, merchant, total, document_date, uploaded_by, created_utc
            FROM receipts
            WHERE folder_id = $1
            ORDER BY created_utc, receipt_id
            "#,
        )
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| EngineError::Database(anyhow::anyhow!("Failed to load receipts: {}", e)))?;

        timer.observe_duration();
        Ok(receipts)
    }

    #[instrument(skip(self), fields(folder_id = %folder_id))]
    async fn load_invoices(&self, folder_id: Uuid) -> Result<Vec<Invoice>, EngineError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["load_invoices"])
            .start_timer();

        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT invoice_id, folder_id, vendor, net_amount, document_date, uploaded_by, created_utc
            FROM invoices
            WHERE folder_id = $1
            ORDER BY created_utc, invoice_id
            "#,
        )
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| EngineError::Database(anyhow::anyhow!("Failed to load invoices: {}", e)))?;

        timer.observe_duration();
        Ok(invoices)
    }

    #[instrument(skip(self), fields(receipt_id = %receipt_id))]
    async fn load_receipt(&self, receipt_id: Uuid) -> Result<Option<Receipt>, EngineError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["load_receipt"])
            .start_timer();

        let receipt = sqlx::query_as::<_, Receipt>(
            r#"
            SELECT receipt_id, folder_id, merchant, total, document_date, uploaded_by, created_utc
            FROM receipts
            WHERE receipt_id = $1
            "#,
        )
        .bind(receipt_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| EngineError::Database(anyhow::anyhow!("Failed to load receipt: {}", e)))?;

        timer.observe_duration();
        Ok(receipt)
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn load_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, EngineError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["load_invoice"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT invoice_id, folder_id, vendor, net_amount, document_date, uploaded_by, created_utc
            FROM invoices
            WHERE invoice_id = $1
            "#,
        )
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| EngineError::Database(anyhow::anyhow!("Failed to load invoice: {}", e)))?;

        timer.observe_duration();
        Ok(invoice)
    }

    #[instrument(skip(self), fields(transaction_id = %transaction_id, status = status.as_str()))]
    async fn update_transaction_match(
        &self,
        transaction_id: Uuid,
        status: TransactionStatus,
        receipt_id: Option<Uuid>,
        invoice_id: Option<Uuid>,
    ) -> Result<(), EngineError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_transaction_match"])
            .start_timer();

        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET status = $2, receipt_id = $3, invoice_id = $4
            WHERE transaction_id = $1
            "#,
        )
        .bind(transaction_id)
        .bind(status)
        .bind(receipt_id)
        .bind(invoice_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            EngineError::Database(anyhow::anyhow!("Failed to update transaction: {}", e))
        })?;

        timer.observe_duration();

        if result.rows_affected() == 0 {
            return Err(EngineError::NotFound(anyhow::anyhow!(
                "Transaction {} not found",
                transaction_id
            )));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(folder_id = %folder_id))]
    async fn count_match_statuses(&self, folder_id: Uuid) -> Result<MatchCounts, EngineError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["count_match_statuses"])
            .start_timer();

        let (matched, eligible): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FILTER (WHERE status = 'matched'),
                   COUNT(*) FILTER (WHERE status <> 'fee')
            FROM transactions
            WHERE folder_id = $1
            "#,
        )
        .bind(folder_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| EngineError::Database(anyhow::anyhow!("Failed to count statuses: {}", e)))?;

        timer.observe_duration();
        Ok(MatchCounts { matched, eligible })
    }

    #[instrument(skip(self), fields(folder_id = %folder_id, score = score))]
    async fn update_folder_score(&self, folder_id: Uuid, score: i32) -> Result<(), EngineError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_folder_score"])
            .start_timer();

        let result = sqlx::query(
            r#"
            UPDATE folders
            SET compliance_score = $2, updated_utc = NOW()
            WHERE folder_id = $1
            "#,
        )
        .bind(folder_id)
        .bind(score)
        .execute(&self.pool)
        .await
        .map_err(|e| EngineError::Database(anyhow::anyhow!("Failed to update folder: {}", e)))?;

        timer.observe_duration();

        if result.rows_affected() == 0 {
            return Err(EngineError::NotFound(anyhow::anyhow!(
                "Folder {} not found",
                folder_id
            )));
        }
        Ok(())
    }
}
