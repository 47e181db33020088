//! Persistence side effects.
//!
//! Services depend on the [`Store`] trait; [`PgStore`] is the PostgreSQL
//! implementation used in production.

use async_trait::async_trait;
use serde_json::Value;

use crate::db::DbPool;
use crate::models::funds::FundTransaction;
use crate::models::profile::AccountFreeze;

#[async_trait]
pub trait Store: Send + Sync {
    /// Record a vendor-confirmed fund movement.
    async fn insert_fund_transaction(&self, transaction: &FundTransaction)
    -> Result<(), sqlx::Error>;

    /// All IPO metadata documents, untyped.
    async fn ipo_metadata_documents(&self) -> Result<Vec<Value>, sqlx::Error>;

    /// Insert or replace the client's freeze record.
    async fn upsert_account_freeze(&self, freeze: &AccountFreeze) -> Result<(), sqlx::Error>;

    async fn find_account_freeze(
        &self,
        client_id: &str,
    ) -> Result<Option<AccountFreeze>, sqlx::Error>;

    async fn ping(&self) -> Result<(), sqlx::Error>;
}

/// [`Store`] over a PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_fund_transaction(
        &self,
        transaction: &FundTransaction,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO fund_transactions (
                id,
                client_id,
                transaction_type,
                amount_paise,
                vendor_reference,
                status,
                tradelab_funds_updated,
                backoffice_funds_updated,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(transaction.id)
        .bind(&transaction.client_id)
        .bind(&transaction.transaction_type)
        .bind(transaction.amount_paise)
        .bind(&transaction.vendor_reference)
        .bind(&transaction.status)
        .bind(transaction.tradelab_funds_updated)
        .bind(transaction.backoffice_funds_updated)
        .bind(transaction.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn ipo_metadata_documents(&self) -> Result<Vec<Value>, sqlx::Error> {
        sqlx::query_scalar::<_, Value>("SELECT document FROM ipo_metadata")
            .fetch_all(&self.pool)
            .await
    }

    async fn upsert_account_freeze(&self, freeze: &AccountFreeze) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO account_freezes (client_id, reason, vendor_reference, is_frozen, frozen_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (client_id) DO UPDATE
            SET reason = EXCLUDED.reason,
                vendor_reference = EXCLUDED.vendor_reference,
                is_frozen = EXCLUDED.is_frozen,
                frozen_at = EXCLUDED.frozen_at
            "#,
        )
        .bind(&freeze.client_id)
        .bind(&freeze.reason)
        .bind(&freeze.vendor_reference)
        .bind(freeze.is_frozen)
        .bind(freeze.frozen_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_account_freeze(
        &self,
        client_id: &str,
    ) -> Result<Option<AccountFreeze>, sqlx::Error> {
        sqlx::query_as::<_, AccountFreeze>(
            r#"
            SELECT client_id, reason, vendor_reference, is_frozen, frozen_at
            FROM account_freezes
            WHERE client_id = $1
            "#,
        )
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
