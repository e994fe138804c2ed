//! Checkout lifecycle: issue, return, overdue sweep and fines

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult, ErrorCode},
    models::transaction::{
        join_transactions, FineQuote, IssueRequest, NewTransaction, ReturnRequest, Transaction,
        TransactionQuery, TransactionView,
    },
    repository::Repository,
};

use super::fines::FinePolicy;

#[derive(Clone)]
pub struct TransactionsService {
    repository: Repository,
    fines: FinePolicy,
}

impl TransactionsService {
    pub fn new(repository: Repository, fines: FinePolicy) -> Self {
        Self { repository, fines }
    }

    /// List transactions joined with their book and member, in ledger order
    pub async fn list(&self, query: &TransactionQuery) -> AppResult<Vec<TransactionView>> {
        let (transactions, books, members) = tokio::try_join!(
            self.repository.transactions.list(),
            self.repository.books.list(),
            self.repository.members.list(),
        )?;

        Ok(join_transactions(&transactions, &books, &members)
            .into_iter()
            .filter(|view| query.matches(view))
            .collect())
    }

    /// Get one transaction with its book and member
    pub async fn get(&self, id: Uuid) -> AppResult<TransactionView> {
        let transaction = self.find(id).await?;
        let (book, member) = tokio::try_join!(
            self.repository.books.find_by_id(transaction.book_id),
            self.repository.members.find_by_id(transaction.member_id),
        )?;
        Ok(TransactionView::new(&transaction, book.as_ref(), member.as_ref()))
    }

    /// Transactions of one member, in ledger order
    pub async fn list_for_member(&self, member_id: Uuid) -> AppResult<Vec<TransactionView>> {
        let member = self
            .repository
            .members
            .find_by_id(member_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member {} not found", member_id)))?;

        let (transactions, books) = tokio::try_join!(
            self.repository.transactions.list_for_member(member_id),
            self.repository.books.list(),
        )?;

        Ok(join_transactions(&transactions, &books, std::slice::from_ref(&member)))
    }

    /// Lend a copy of a book to a member
    pub async fn issue(&self, request: &IssueRequest) -> AppResult<Transaction> {
        let book = self
            .repository
            .books
            .find_by_id(request.book_id)
            .await?
            .ok_or_else(|| {
                AppError::BusinessRule(
                    ErrorCode::NoSuchBook,
                    format!("Book {} not found", request.book_id),
                )
            })?;

        let member = self
            .repository
            .members
            .find_by_id(request.member_id)
            .await?
            .ok_or_else(|| {
                AppError::BusinessRule(
                    ErrorCode::NoSuchMember,
                    format!("Member {} not found", request.member_id),
                )
            })?;

        if !member.is_active {
            return Err(AppError::BusinessRule(
                ErrorCode::MemberInactive,
                format!("Member {} is not active", member.id),
            ));
        }

        if book.available_copies <= 0 || !self.repository.books.reserve_copy(book.id).await? {
            tracing::warn!("Issue refused: no copy of book {} available", book.id);
            return Err(AppError::book_not_available());
        }

        let entry = NewTransaction {
            book_id: book.id,
            member_id: member.id,
            issue_date: Utc::now(),
            due_date: request.due_date,
        };

        let outcome = self.repository.transactions.insert(&entry).await;
        let transaction = match outcome {
            Ok(Some(transaction)) => transaction,
            outcome => {
                // Put the reserved copy back before surfacing the failure
                self.restock(book.id).await;
                return Err(outcome.err().unwrap_or_else(|| {
                    AppError::BusinessRule(
                        ErrorCode::MemberInactive,
                        format!("Member {} can no longer borrow", member.id),
                    )
                }));
            }
        };

        tracing::info!(
            "Issued book {} to member {} (transaction {}, due {})",
            book.id,
            member.id,
            transaction.id,
            transaction.due_date
        );
        Ok(transaction)
    }

    /// Take a copy back. Without a caller-supplied fine, the fine policy decides.
    pub async fn return_book(&self, request: &ReturnRequest) -> AppResult<Transaction> {
        let transaction = self
            .repository
            .transactions
            .find_by_id(request.id)
            .await?
            .ok_or_else(AppError::invalid_transaction)?;

        if !transaction.status.is_active() {
            tracing::warn!("Return refused: transaction {} already returned", transaction.id);
            return Err(AppError::invalid_transaction());
        }

        let now = Utc::now();
        let fine = request
            .fine
            .unwrap_or_else(|| self.fines.assess(transaction.due_date, now));

        // The store restocks the copy in the same step
        let returned = self
            .repository
            .transactions
            .mark_returned(transaction.id, Some(fine), now)
            .await?
            .ok_or_else(AppError::invalid_transaction)?;

        tracing::info!(
            "Returned transaction {} (book {}, fine {})",
            returned.id,
            returned.book_id,
            fine
        );
        Ok(returned)
    }

    /// Mark every issued transaction past its due date as overdue
    pub async fn sweep_overdue(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let swept = self.repository.transactions.mark_overdue(now).await?;
        if swept > 0 {
            tracing::info!("Marked {} transaction(s) overdue", swept);
        }
        Ok(swept)
    }

    /// Fine owed for a transaction as of `at`, or the recorded fine once returned
    pub async fn quote_fine(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<FineQuote> {
        let transaction = self.find(id).await?;
        let at = transaction.return_date.unwrap_or(at);
        let fine = transaction
            .fine
            .filter(|_| !transaction.status.is_active())
            .unwrap_or_else(|| self.fines.assess(transaction.due_date, at));

        Ok(FineQuote {
            transaction_id: transaction.id,
            days_overdue: FinePolicy::days_overdue(transaction.due_date, at),
            fine,
        })
    }

    /// Compensating release after a failed issue
    async fn restock(&self, book_id: Uuid) {
        if let Err(e) = self.repository.books.release_copy(book_id).await {
            tracing::error!("Could not release copy of book {} after failed issue: {}", book_id, e);
        }
    }

    async fn find(&self, id: Uuid) -> AppResult<Transaction> {
        self.repository
            .transactions
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", id)))
    }
}
