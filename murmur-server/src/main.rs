use anyhow::Context;
use murmur_server::{
    api,
    config::{Settings, StorageBackend},
    db::Database,
    identity::HeaderIdentityProvider,
    state::AppState,
    storage,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "murmur_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load settings
    let settings = Settings::new().context("Failed to load settings")?;

    // Initialize database
    let db = Database::new(&settings.database.path).context("Failed to create database")?;
    db.initialize()?;

    if settings.database.seed_demo_data {
        db.seed_demo_data()?;
        tracing::info!("Demo data seeded");
    }

    tracing::info!(path = %settings.database.path, "Database initialized successfully");

    let object_store = storage::from_settings(&settings.storage)?;
    let state = AppState::new(db, Arc::new(HeaderIdentityProvider), object_store);

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let base_path = settings.base_path();
    let mut app = api::router(state, &base_path);

    // Locally stored uploads are served by the API itself
    if settings.storage.backend == StorageBackend::Local {
        app = app.nest_service("/media", ServeDir::new(&settings.storage.local_dir));
    }

    let app = app.layer(TraceLayer::new_for_http()).layer(cors);

    // Start server
    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("Failed to parse server address")?;
    tracing::info!("Starting server on {} (API under {:?})", addr, base_path);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
