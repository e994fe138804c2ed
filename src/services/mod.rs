//! Business logic services

pub mod catalog;
pub mod fines;
pub mod members;
pub mod seed;
pub mod stats;
pub mod sweeper;
pub mod transactions;

use crate::{config::LoansConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub members: members::MembersService,
    pub transactions: transactions::TransactionsService,
    pub stats: stats::StatsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, loans: &LoansConfig) -> Self {
        let fines = fines::FinePolicy::new(loans.fine_per_day);
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            members: members::MembersService::new(repository.clone()),
            transactions: transactions::TransactionsService::new(repository.clone(), fines),
            stats: stats::StatsService::new(repository),
        }
    }
}
