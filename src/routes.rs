use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::{self, AppState};
use crate::openapi::ApiDoc;

/// Customer and credit endpoints plus API documentation.
///
/// Returned without state so the caller can wrap it in rate limiting or body
/// limits before handing it to [`build_app`].
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route(
            "/api/customers",
            post(handlers::save_customer).patch(handlers::update_customer),
        )
        .route(
            "/api/customers/:id",
            get(handlers::find_customer).delete(handlers::delete_customer),
        )
        .route(
            "/api/credits",
            post(handlers::save_credit).get(handlers::find_all_credits_by_customer),
        )
        .route("/api/credits/:credit_code", get(handlers::find_credit_by_code))
}

/// Final application: health check (outside any layers applied to `api`),
/// shared state, request tracing and CORS.
pub fn build_app(state: Arc<AppState>, api: Router<Arc<AppState>>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .merge(api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
