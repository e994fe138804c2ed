//! Dashboard statistics

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use uuid::Uuid;

use crate::{
    api::dashboard::{DashboardStats, PopularBook},
    error::AppResult,
    models::{transaction::join_transactions, Book, Member, Transaction, TransactionStatus},
    repository::Repository,
};

const RECENT_TRANSACTIONS: usize = 5;
const POPULAR_BOOKS: usize = 5;

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Sweep overdue transactions as of `now`, then compute the dashboard
    pub async fn dashboard(&self, now: DateTime<Utc>) -> AppResult<DashboardStats> {
        let swept = self.repository.transactions.mark_overdue(now).await?;
        if swept > 0 {
            tracing::debug!("Dashboard sweep marked {} transaction(s) overdue", swept);
        }

        let (books, members, transactions) = tokio::try_join!(
            self.repository.books.list(),
            self.repository.members.list(),
            self.repository.transactions.list(),
        )?;

        Ok(compute_dashboard_stats(&books, &members, &transactions))
    }
}

/// Dashboard counters over a snapshot of the three collections.
///
/// `transactions` must be in insertion order: ties on creation time and on
/// issue count are broken by it.
pub fn compute_dashboard_stats(
    books: &[Book],
    members: &[Member],
    transactions: &[Transaction],
) -> DashboardStats {
    let issued_books = transactions.iter().filter(|t| t.status.is_active()).count();
    let overdue_books = transactions
        .iter()
        .filter(|t| t.status == TransactionStatus::Overdue)
        .count();

    // Stable sort keeps insertion order among equal timestamps
    let mut recent: Vec<Transaction> = transactions.to_vec();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent.truncate(RECENT_TRANSACTIONS);
    let recent_transactions = join_transactions(&recent, books, members);

    let mut counts: IndexMap<Uuid, i64> = IndexMap::new();
    for transaction in transactions {
        *counts.entry(transaction.book_id).or_insert(0) += 1;
    }
    let mut ranked: Vec<(Uuid, i64)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let popular_books = ranked
        .into_iter()
        .take(POPULAR_BOOKS)
        .map(|(book_id, issue_count)| PopularBook {
            book_id,
            issue_count,
            title: books.iter().find(|b| b.id == book_id).map(|b| b.title.clone()),
        })
        .collect();

    DashboardStats {
        total_books: books.len() as i64,
        total_members: members.len() as i64,
        issued_books: issued_books as i64,
        overdue_books: overdue_books as i64,
        recent_transactions,
        popular_books,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::{
        book::{tests::book, CreateBook},
        member::{tests::member, CreateMember},
        transaction::{tests::transaction, IssueRequest, ReturnRequest},
    };
    use crate::services::{fines::FinePolicy, transactions::TransactionsService};

    #[test]
    fn empty_library_has_zeroed_stats() {
        let stats = compute_dashboard_stats(&[], &[], &[]);
        assert_eq!(stats.total_books, 0);
        assert_eq!(stats.issued_books, 0);
        assert!(stats.recent_transactions.is_empty());
        assert!(stats.popular_books.is_empty());
    }

    #[test]
    fn popular_books_rank_by_count_then_first_seen() {
        let x = book("Dune", "Frank Herbert", "Science Fiction", 5);
        let y = book("Emma", "Jane Austen", "Fiction", 5);
        let z = book("Ulysses", "James Joyce", "Fiction", 5);
        let reader = member("John Doe", "john.doe@email.com");

        let ledger = vec![
            transaction(&y, &reader, 7),
            transaction(&x, &reader, 7),
            transaction(&z, &reader, 7),
            transaction(&x, &reader, 7),
            transaction(&x, &reader, 7),
        ];
        let stats = compute_dashboard_stats(&[x.clone(), y.clone()], &[reader], &ledger);

        let ranking: Vec<_> = stats.popular_books.iter().map(|p| (p.book_id, p.issue_count)).collect();
        assert_eq!(ranking, vec![(x.id, 3), (y.id, 1), (z.id, 1)]);
        assert_eq!(stats.popular_books[0].title.as_deref(), Some("Dune"));
        assert_eq!(stats.popular_books[2].title, None);
    }

    #[test]
    fn recent_transactions_are_newest_first_and_capped() {
        let shelf = book("Dune", "Frank Herbert", "Science Fiction", 10);
        let reader = member("John Doe", "john.doe@email.com");
        let base = Utc::now();

        let mut ledger: Vec<_> = (0..7)
            .map(|i| {
                let mut t = transaction(&shelf, &reader, 7);
                t.created_at = base + Duration::minutes(i);
                t
            })
            .collect();
        // Same timestamp as the newest entry, inserted later
        let mut tie = transaction(&shelf, &reader, 7);
        tie.created_at = ledger[6].created_at;
        ledger.push(tie);

        let stats = compute_dashboard_stats(&[shelf], &[reader], &ledger);
        let ids: Vec<_> = stats.recent_transactions.iter().map(|v| v.id).collect();
        assert_eq!(
            ids,
            vec![ledger[6].id, ledger[7].id, ledger[5].id, ledger[4].id, ledger[3].id]
        );
    }

    #[tokio::test]
    async fn overdue_then_returned_scenario() {
        let repository = Repository::in_memory();
        let loans = TransactionsService::new(repository.clone(), FinePolicy::new(Decimal::from(2)));
        let stats = StatsService::new(repository.clone());

        let shelf = repository
            .books
            .create(&CreateBook {
                title: "1984".to_string(),
                author: "George Orwell".to_string(),
                isbn: "978-0-452-28423-4".to_string(),
                category: "Science Fiction".to_string(),
                published_year: Some(1949),
                description: None,
                cover_url: None,
                total_copies: 1,
            })
            .await
            .unwrap();
        let reader = repository
            .members
            .create(&CreateMember {
                name: "Jane Smith".to_string(),
                email: "jane.smith@email.com".to_string(),
                phone: None,
                address: None,
                membership_type: Default::default(),
                join_date: None,
                is_active: None,
            })
            .await
            .unwrap();

        let issued = loans
            .issue(&IssueRequest {
                book_id: shelf.id,
                member_id: reader.id,
                due_date: Utc::now() - Duration::days(1),
            })
            .await
            .unwrap();

        let before = compute_dashboard_stats(
            &repository.books.list().await.unwrap(),
            &repository.members.list().await.unwrap(),
            &repository.transactions.list().await.unwrap(),
        );
        assert_eq!((before.issued_books, before.overdue_books), (1, 0));

        let swept = stats.dashboard(Utc::now()).await.unwrap();
        assert_eq!((swept.issued_books, swept.overdue_books), (1, 1));

        loans
            .return_book(&ReturnRequest { id: issued.id, fine: Some(Decimal::from(2)) })
            .await
            .unwrap();
        let after = stats.dashboard(Utc::now()).await.unwrap();
        assert_eq!((after.issued_books, after.overdue_books), (0, 0));
        assert_eq!(repository.books.find_by_id(shelf.id).await.unwrap().unwrap().available_copies, 1);
        assert_eq!(after.popular_books[0].issue_count, 1);
        assert_eq!(after.recent_transactions[0].member_name.as_deref(), Some("Jane Smith"));
    }
}
