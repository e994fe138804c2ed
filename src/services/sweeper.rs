//! Periodic overdue sweep

use std::time::Duration;

use chrono::Utc;
use tokio::{task::JoinHandle, time::MissedTickBehavior};

use super::transactions::TransactionsService;

/// Run the overdue sweep every `period` until the returned handle is aborted.
/// The first sweep happens immediately.
pub fn spawn_overdue_sweeper(service: TransactionsService, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = service.sweep_overdue(Utc::now()).await {
                tracing::warn!("Overdue sweep failed: {}", e);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::*;
    use crate::{
        models::{member::CreateMember, transaction::NewTransaction, TransactionStatus},
        repository::Repository,
        services::fines::FinePolicy,
    };

    async fn late_entry(repository: &Repository, member_id: Uuid) -> Uuid {
        repository
            .transactions
            .insert(&NewTransaction {
                book_id: Uuid::new_v4(),
                member_id,
                issue_date: Utc::now() - ChronoDuration::days(20),
                due_date: Utc::now() - ChronoDuration::days(6),
            })
            .await
            .unwrap()
            .unwrap()
            .id
    }

    async fn status(repository: &Repository, id: Uuid) -> TransactionStatus {
        repository.transactions.find_by_id(id).await.unwrap().unwrap().status
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_runs_at_start_then_every_period() {
        let repository = Repository::in_memory();
        let member = repository
            .members
            .create(&CreateMember {
                name: "John Doe".to_string(),
                email: "john.doe@email.com".to_string(),
                phone: None,
                address: None,
                membership_type: Default::default(),
                join_date: None,
                is_active: None,
            })
            .await
            .unwrap();
        let first = late_entry(&repository, member.id).await;

        let service = TransactionsService::new(repository.clone(), FinePolicy::new(Decimal::from(2)));
        let period = Duration::from_secs(60);
        let handle = spawn_overdue_sweeper(service, period);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(status(&repository, first).await, TransactionStatus::Overdue);

        let second = late_entry(&repository, member.id).await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(status(&repository, second).await, TransactionStatus::Issued);

        tokio::time::advance(period).await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(status(&repository, second).await, TransactionStatus::Overdue);

        handle.abort();
    }
}
