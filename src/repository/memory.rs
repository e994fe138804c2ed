//! Process-local store
//!
//! Keeps every collection in an insertion-ordered map behind a single
//! lock. Each operation holds the lock for its whole read-modify-write, so
//! copy-count and status changes are atomic per call.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{BookStore, DeleteOutcome, MemberStore, TransactionStore};
use crate::{
    error::AppResult,
    models::{
        book::{Book, CreateBook, UpdateBook},
        enums::TransactionStatus,
        member::{CreateMember, Member, UpdateMember},
        transaction::{NewTransaction, Transaction},
    },
};

#[derive(Debug, Default)]
struct MemoryState {
    books: IndexMap<Uuid, Book>,
    members: IndexMap<Uuid, Member>,
    transactions: IndexMap<Uuid, Transaction>,
}

impl MemoryState {
    fn has_active(&self, held_by: impl Fn(&Transaction) -> bool) -> bool {
        self.transactions
            .values()
            .any(|t| t.status.is_active() && held_by(t))
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn list(&self) -> AppResult<Vec<Book>> {
        Ok(self.state.read().await.books.values().cloned().collect())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        Ok(self.state.read().await.books.get(&id).cloned())
    }

    async fn create(&self, data: &CreateBook) -> AppResult<Book> {
        let now = Utc::now();
        let book = Book {
            id: Uuid::new_v4(),
            title: data.title.clone(),
            author: data.author.clone(),
            isbn: data.isbn.clone(),
            category: data.category.clone(),
            published_year: data.published_year,
            description: data.description.clone(),
            cover_url: data.cover_url.clone(),
            total_copies: data.total_copies,
            available_copies: data.total_copies,
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn update(&self, id: Uuid, data: &UpdateBook) -> AppResult<Option<Book>> {
        let mut state = self.state.write().await;
        let Some(book) = state.books.get_mut(&id) else {
            return Ok(None);
        };
        data.apply_to(book)?;
        book.updated_at = Utc::now();
        Ok(Some(book.clone()))
    }

    async fn delete(&self, id: Uuid) -> AppResult<DeleteOutcome> {
        let mut state = self.state.write().await;
        let Some(book) = state.books.get(&id) else {
            return Ok(DeleteOutcome::NotFound);
        };
        if book.available_copies < book.total_copies || state.has_active(|t| t.book_id == id) {
            return Ok(DeleteOutcome::InUse);
        }
        state.books.shift_remove(&id);
        Ok(DeleteOutcome::Deleted)
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.state.read().await.books.len() as i64)
    }

    async fn reserve_copy(&self, id: Uuid) -> AppResult<bool> {
        let mut state = self.state.write().await;
        match state.books.get_mut(&id) {
            Some(book) if book.available_copies > 0 => {
                book.available_copies -= 1;
                book.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_copy(&self, id: Uuid) -> AppResult<bool> {
        let mut state = self.state.write().await;
        match state.books.get_mut(&id) {
            Some(book) if book.available_copies < book.total_copies => {
                book.available_copies += 1;
                book.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl MemberStore for MemoryStore {
    async fn list(&self) -> AppResult<Vec<Member>> {
        Ok(self.state.read().await.members.values().cloned().collect())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Member>> {
        Ok(self.state.read().await.members.get(&id).cloned())
    }

    async fn create(&self, data: &CreateMember) -> AppResult<Member> {
        let now = Utc::now();
        let member = Member {
            id: Uuid::new_v4(),
            name: data.name.clone(),
            email: data.email.clone(),
            phone: data.phone.clone(),
            address: data.address.clone(),
            membership_type: data.membership_type,
            join_date: data.join_date.unwrap_or_else(|| now.date_naive()),
            is_active: data.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.members.insert(member.id, member.clone());
        Ok(member)
    }

    async fn update(&self, id: Uuid, data: &UpdateMember) -> AppResult<Option<Member>> {
        let mut state = self.state.write().await;
        let Some(member) = state.members.get_mut(&id) else {
            return Ok(None);
        };
        data.apply_to(member);
        member.updated_at = Utc::now();
        Ok(Some(member.clone()))
    }

    async fn delete(&self, id: Uuid) -> AppResult<DeleteOutcome> {
        let mut state = self.state.write().await;
        if !state.members.contains_key(&id) {
            return Ok(DeleteOutcome::NotFound);
        }
        if state.has_active(|t| t.member_id == id) {
            return Ok(DeleteOutcome::InUse);
        }
        state.members.shift_remove(&id);
        Ok(DeleteOutcome::Deleted)
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.state.read().await.members.len() as i64)
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn list(&self) -> AppResult<Vec<Transaction>> {
        Ok(self.state.read().await.transactions.values().cloned().collect())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Transaction>> {
        Ok(self.state.read().await.transactions.get(&id).cloned())
    }

    async fn list_for_member(&self, member_id: Uuid) -> AppResult<Vec<Transaction>> {
        Ok(self
            .state
            .read()
            .await
            .transactions
            .values()
            .filter(|t| t.member_id == member_id)
            .cloned()
            .collect())
    }

    async fn insert(&self, data: &NewTransaction) -> AppResult<Option<Transaction>> {
        let mut state = self.state.write().await;
        if !state.members.get(&data.member_id).is_some_and(|m| m.is_active) {
            return Ok(None);
        }

        let now = Utc::now();
        let transaction = Transaction {
            id: Uuid::new_v4(),
            book_id: data.book_id,
            member_id: data.member_id,
            issue_date: data.issue_date,
            due_date: data.due_date,
            return_date: None,
            status: TransactionStatus::Issued,
            fine: None,
            created_at: now,
            updated_at: now,
        };
        state.transactions.insert(transaction.id, transaction.clone());
        Ok(Some(transaction))
    }

    async fn mark_returned(
        &self,
        id: Uuid,
        fine: Option<Decimal>,
        returned_at: DateTime<Utc>,
    ) -> AppResult<Option<Transaction>> {
        let mut state = self.state.write().await;
        let returned = match state.transactions.get_mut(&id) {
            Some(transaction) if transaction.status.is_active() => {
                transaction.status = TransactionStatus::Returned;
                transaction.return_date = Some(returned_at);
                transaction.fine = fine;
                transaction.updated_at = returned_at;
                transaction.clone()
            }
            _ => return Ok(None),
        };

        if let Some(book) = state.books.get_mut(&returned.book_id) {
            if book.available_copies < book.total_copies {
                book.available_copies += 1;
                book.updated_at = returned_at;
            }
        }
        Ok(Some(returned))
    }

    async fn mark_overdue(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.write().await;
        let mut swept = 0;
        for transaction in state.transactions.values_mut() {
            if transaction.status == TransactionStatus::Issued && transaction.due_date < now {
                transaction.status = TransactionStatus::Overdue;
                transaction.updated_at = now;
                swept += 1;
            }
        }
        Ok(swept)
    }
}
