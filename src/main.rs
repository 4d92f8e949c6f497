use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::limit::RequestBodyLimitLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rust_credit_api::config::{Config, StorageBackend};
use rust_credit_api::db::Database;
use rust_credit_api::db_storage::{PgCreditRepository, PgCustomerRepository};
use rust_credit_api::handlers::AppState;
use rust_credit_api::routes;

/// Main entry point for the application.
///
/// Initializes tracing, loads configuration, connects storage, wires the
/// customer and credit services, and starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_credit_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let app_state = match config.storage {
        StorageBackend::Postgres => {
            let url = config
                .database_url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL required for postgres storage"))?;
            let db = Database::new(&url, config.db_max_connections).await?;
            tracing::info!("Database connection pool established");

            if config.run_migrations {
                db.migrate().await?;
            }

            AppState::new(
                Arc::new(PgCustomerRepository::new(db.pool.clone())),
                Arc::new(PgCreditRepository::new(db.pool.clone())),
            )
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            AppState::in_memory()
        }
    };
    let app_state = Arc::new(app_state);

    // Rate limiter: per IP, one request replenished every N ms, with burst
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(config.rate_limit_replenish_ms)
            .burst_size(config.rate_limit_burst)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    let api = routes::api_routes().layer(
        ServiceBuilder::new()
            .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
            .layer(GovernorLayer {
                config: governor_conf,
            }),
    );

    // Health check bypasses rate limiting
    let app = routes::build_app(app_state, api);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
