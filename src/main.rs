use records_api::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    repository::{InMemoryRepository, RepositoryState},
    sink::{NoopSink, PostgresSink, SinkState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Initializes configuration, logging, the record store, the optional persistence sink
/// and the HTTP server, in that order.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail fast: a missing signing secret stops startup here).
    dotenv::dotenv().ok();
    let config = AppConfig::load().unwrap_or_else(|e| panic!("FATAL: invalid configuration: {e}"));

    // 2. Logging: RUST_LOG wins, otherwise sensible local defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "records_api=debug,tower_http=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Record store, seeded with the two starter records.
    let repo = Arc::new(InMemoryRepository::seeded()) as RepositoryState;

    // 4. Persistence sink: Postgres when DATABASE_URL is set, otherwise a no-op.
    let sink = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await
                .unwrap_or_else(|e| panic!("FATAL: failed to connect to Postgres: {e}"));
            tracing::info!("Persistence sink: postgres");
            Arc::new(PostgresSink::new(pool)) as SinkState
        }
        None => {
            tracing::info!("Persistence sink: disabled (DATABASE_URL not set)");
            Arc::new(NoopSink) as SinkState
        }
    };

    // 5. Router and server.
    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState::new(config, repo, sink));

    let listener = TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("FATAL: failed to bind {bind_addr}: {e}"));

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server terminated");
    }
}
