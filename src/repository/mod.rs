//! Repository layer: store interfaces and their backends

pub mod books;
pub mod members;
pub mod memory;
pub mod transactions;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        book::{Book, CreateBook, UpdateBook},
        member::{CreateMember, Member, UpdateMember},
        transaction::{NewTransaction, Transaction},
    },
};

/// Result of a guarded delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    /// The record still has copies out or transactions not returned
    InUse,
}

/// Catalog records and their copy counts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    /// All books in creation order
    async fn list(&self) -> AppResult<Vec<Book>>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Book>>;
    async fn create(&self, data: &CreateBook) -> AppResult<Book>;
    /// `Ok(None)` when the book does not exist
    async fn update(&self, id: Uuid, data: &UpdateBook) -> AppResult<Option<Book>>;
    /// Delete unless a copy is out or a transaction for the book is not
    /// returned. Checked and applied as one step.
    async fn delete(&self, id: Uuid) -> AppResult<DeleteOutcome>;
    async fn count(&self) -> AppResult<i64>;
    /// Take one copy off the shelf if any is available.
    /// Returns `false` when the book is missing or has no copy left.
    async fn reserve_copy(&self, id: Uuid) -> AppResult<bool>;
    /// Put one copy back if any is out.
    /// Returns `false` when the book is missing or every copy is on the shelf.
    async fn release_copy(&self, id: Uuid) -> AppResult<bool>;
}

/// Member records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MemberStore: Send + Sync {
    async fn list(&self) -> AppResult<Vec<Member>>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Member>>;
    async fn create(&self, data: &CreateMember) -> AppResult<Member>;
    async fn update(&self, id: Uuid, data: &UpdateMember) -> AppResult<Option<Member>>;
    /// Delete unless the member has a transaction not returned.
    /// Checked and applied as one step.
    async fn delete(&self, id: Uuid) -> AppResult<DeleteOutcome>;
    async fn count(&self) -> AppResult<i64>;
}

/// Checkout ledger. Entries are never deleted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// All transactions in insertion order
    async fn list(&self) -> AppResult<Vec<Transaction>>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Transaction>>;
    async fn list_for_member(&self, member_id: Uuid) -> AppResult<Vec<Transaction>>;
    /// Record a new checkout with status `issued`.
    /// Returns `None` when the member is missing or inactive at insert time.
    async fn insert(&self, data: &NewTransaction) -> AppResult<Option<Transaction>>;
    /// Mark a transaction returned unless it already is, putting its copy
    /// back on the shelf in the same step. The copy count is left alone when
    /// the book is gone or fully shelved.
    /// Returns `None` when it is missing or already returned.
    async fn mark_returned(
        &self,
        id: Uuid,
        fine: Option<Decimal>,
        returned_at: DateTime<Utc>,
    ) -> AppResult<Option<Transaction>>;
    /// Move every issued transaction due before `now` to overdue
    async fn mark_overdue(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

/// Main repository holding the injected stores
#[derive(Clone)]
pub struct Repository {
    pub pool: Option<Pool<Postgres>>,
    pub books: Arc<dyn BookStore>,
    pub members: Arc<dyn MemberStore>,
    pub transactions: Arc<dyn TransactionStore>,
}

impl Repository {
    /// Assemble a repository from arbitrary store implementations
    pub fn new(
        books: Arc<dyn BookStore>,
        members: Arc<dyn MemberStore>,
        transactions: Arc<dyn TransactionStore>,
    ) -> Self {
        Self {
            pool: None,
            books,
            members,
            transactions,
        }
    }

    /// Create a repository backed by PostgreSQL
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        Self {
            books: Arc::new(books::BooksRepository::new(pool.clone())),
            members: Arc::new(members::MembersRepository::new(pool.clone())),
            transactions: Arc::new(transactions::TransactionsRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Create a repository backed by process memory
    pub fn in_memory() -> Self {
        let store = memory::MemoryStore::default();
        Self::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store),
        )
    }

    /// Check that the backing store answers
    pub async fn ping(&self) -> AppResult<()> {
        if let Some(ref pool) = self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}
