//! Transactions repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::TransactionStore;
use crate::{
    error::AppResult,
    models::{
        enums::TransactionStatus,
        transaction::{NewTransaction, Transaction},
    },
};

#[derive(Clone)]
pub struct TransactionsRepository {
    pool: Pool<Postgres>,
}

impl TransactionsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionStore for TransactionsRepository {
    async fn list(&self) -> AppResult<Vec<Transaction>> {
        let transactions =
            sqlx::query_as::<_, Transaction>("SELECT * FROM transactions ORDER BY seq")
                .fetch_all(&self.pool)
                .await?;
        Ok(transactions)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Transaction>> {
        let transaction = sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(transaction)
    }

    async fn list_for_member(&self, member_id: Uuid) -> AppResult<Vec<Transaction>> {
        let transactions = sqlx::query_as::<_, Transaction>(
            "SELECT * FROM transactions WHERE member_id = $1 ORDER BY seq",
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(transactions)
    }

    async fn insert(&self, data: &NewTransaction) -> AppResult<Option<Transaction>> {
        let now = Utc::now();
        // FOR SHARE keeps the member row from being deleted until this commits
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions (
                id, book_id, member_id, issue_date, due_date, status, created_at, updated_at
            )
            SELECT $1, $2, $3, $4, $5, $6, $7, $7
            WHERE EXISTS (
                SELECT 1 FROM members WHERE id = $3 AND is_active FOR SHARE
            )
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.book_id)
        .bind(data.member_id)
        .bind(data.issue_date)
        .bind(data.due_date)
        .bind(TransactionStatus::Issued)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(transaction)
    }

    async fn mark_returned(
        &self,
        id: Uuid,
        fine: Option<Decimal>,
        returned_at: DateTime<Utc>,
    ) -> AppResult<Option<Transaction>> {
        let mut tx = self.pool.begin().await?;

        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            UPDATE transactions
            SET status = $2, return_date = $3, fine = $4, updated_at = $3
            WHERE id = $1 AND status <> $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(TransactionStatus::Returned)
        .bind(returned_at)
        .bind(fine)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(ref transaction) = transaction {
            sqlx::query(
                r#"
                UPDATE books
                SET available_copies = available_copies + 1, updated_at = $2
                WHERE id = $1 AND available_copies < total_copies
                "#,
            )
            .bind(transaction.book_id)
            .bind(returned_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(transaction)
    }

    async fn mark_overdue(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET status = $1, updated_at = $2
            WHERE status = $3 AND due_date < $2
            "#,
        )
        .bind(TransactionStatus::Overdue)
        .bind(now)
        .bind(TransactionStatus::Issued)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
