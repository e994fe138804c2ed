//! Members repository for database operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::{DeleteOutcome, MemberStore};
use crate::{
    error::AppResult,
    models::{
        enums::TransactionStatus,
        member::{CreateMember, Member, UpdateMember},
    },
};

#[derive(Clone)]
pub struct MembersRepository {
    pool: Pool<Postgres>,
}

impl MembersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemberStore for MembersRepository {
    async fn list(&self) -> AppResult<Vec<Member>> {
        let members = sqlx::query_as::<_, Member>("SELECT * FROM members ORDER BY seq")
            .fetch_all(&self.pool)
            .await?;
        Ok(members)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>("SELECT * FROM members WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(member)
    }

    async fn create(&self, data: &CreateMember) -> AppResult<Member> {
        let now = Utc::now();
        let member = sqlx::query_as::<_, Member>(
            r#"
            INSERT INTO members (
                id, name, email, phone, address, membership_type, join_date,
                is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.address)
        .bind(data.membership_type)
        .bind(data.join_date.unwrap_or_else(|| now.date_naive()))
        .bind(data.is_active.unwrap_or(true))
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(member)
    }

    async fn update(&self, id: Uuid, data: &UpdateMember) -> AppResult<Option<Member>> {
        let Some(mut member) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        data.apply_to(&mut member);

        let member = sqlx::query_as::<_, Member>(
            r#"
            UPDATE members
            SET name = $2, email = $3, phone = $4, address = $5, membership_type = $6,
                join_date = $7, is_active = $8, updated_at = $9
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&member.name)
        .bind(&member.email)
        .bind(&member.phone)
        .bind(&member.address)
        .bind(member.membership_type)
        .bind(member.join_date)
        .bind(member.is_active)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;
        Ok(member)
    }

    async fn delete(&self, id: Uuid) -> AppResult<DeleteOutcome> {
        let mut tx = self.pool.begin().await?;

        // Conflicts with the FOR SHARE taken by a concurrent transaction insert
        let found: Option<Uuid> = sqlx::query_scalar("SELECT id FROM members WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if found.is_none() {
            return Ok(DeleteOutcome::NotFound);
        }

        let active: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM transactions WHERE member_id = $1 AND status <> $2)",
        )
        .bind(id)
        .bind(TransactionStatus::Returned)
        .fetch_one(&mut *tx)
        .await?;
        if active {
            return Ok(DeleteOutcome::InUse);
        }

        sqlx::query("DELETE FROM members WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(DeleteOutcome::Deleted)
    }

    async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
