//! Dashboard endpoint

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{error::AppResult, models::TransactionView};

/// Dashboard counters
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_books: i64,
    pub total_members: i64,
    /// Transactions not yet returned (issued or overdue)
    pub issued_books: i64,
    pub overdue_books: i64,
    /// Five newest transactions
    pub recent_transactions: Vec<TransactionView>,
    /// Five most issued books
    pub popular_books: Vec<PopularBook>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PopularBook {
    pub book_id: Uuid,
    pub issue_count: i64,
    /// `None` once the book has been removed from the catalog
    pub title: Option<String>,
}

/// Get dashboard statistics. Runs the overdue sweep first.
#[utoipa::path(
    get,
    path = "/dashboard/stats",
    tag = "dashboard",
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardStats)
    )
)]
pub async fn get_stats(State(state): State<crate::AppState>) -> AppResult<Json<DashboardStats>> {
    let stats = state.services.stats.dashboard(Utc::now()).await?;
    Ok(Json(stats))
}
