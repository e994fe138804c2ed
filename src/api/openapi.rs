//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, dashboard, health, members, transactions};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Libris API",
        version = "1.0.0",
        description = "Library catalog, membership and lending REST API"
    ),
    servers(
        (url = "/api", description = "Libris API")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::list_categories,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Members
        members::list_members,
        members::get_member,
        members::create_member,
        members::update_member,
        members::delete_member,
        members::list_member_transactions,
        // Transactions
        transactions::list_transactions,
        transactions::get_transaction,
        transactions::get_fine,
        transactions::issue_book,
        transactions::return_book,
        transactions::sweep_overdue,
        // Dashboard
        dashboard::get_stats,
    ),
    components(
        schemas(
            // Books
            crate::models::book::Book,
            crate::models::book::BookQuery,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            // Members
            crate::models::member::Member,
            crate::models::member::MemberQuery,
            crate::models::member::CreateMember,
            crate::models::member::UpdateMember,
            crate::models::enums::MembershipType,
            crate::models::enums::MemberStatus,
            // Transactions
            crate::models::transaction::Transaction,
            crate::models::transaction::TransactionView,
            crate::models::transaction::TransactionQuery,
            crate::models::transaction::IssueRequest,
            crate::models::transaction::ReturnRequest,
            crate::models::transaction::FineQuote,
            crate::models::enums::TransactionStatus,
            transactions::SweepResponse,
            // Dashboard
            dashboard::DashboardStats,
            dashboard::PopularBook,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book catalog management"),
        (name = "members", description = "Member management"),
        (name = "transactions", description = "Issue, return and overdue tracking"),
        (name = "dashboard", description = "Dashboard statistics")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_lending_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/transactions/issue"));
        assert!(doc.paths.paths.contains_key("/books/{id}"));
        assert!(doc.paths.paths.contains_key("/dashboard/stats"));
    }
}
