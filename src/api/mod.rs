//! API handlers for Libris REST endpoints

pub mod books;
pub mod dashboard;
pub mod health;
pub mod members;
pub mod openapi;
pub mod transactions;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::HeaderValue,
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use validator::Validate;

use crate::{error::AppError, AppState};

/// JSON body extractor that runs `validator` rules after deserializing.
/// Malformed bodies and rule violations both reject with a 400.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;

        value
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        Ok(ValidatedJson(value))
    }
}

/// Build the application router with all routes and middleware
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route("/books/categories", get(books::list_categories))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        // Members
        .route("/members", get(members::list_members).post(members::create_member))
        .route(
            "/members/:id",
            get(members::get_member)
                .put(members::update_member)
                .delete(members::delete_member),
        )
        .route("/members/:id/transactions", get(members::list_member_transactions))
        // Transactions
        .route("/transactions", get(transactions::list_transactions))
        .route("/transactions/issue", post(transactions::issue_book))
        .route("/transactions/return", post(transactions::return_book))
        .route("/transactions/sweep-overdue", post(transactions::sweep_overdue))
        .route("/transactions/:id", get(transactions::get_transaction))
        .route("/transactions/:id/fine", get(transactions::get_fine))
        // Dashboard
        .route("/dashboard/stats", get(dashboard::get_stats))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}
