use borrowing_service::{
    adapters::{
        in_memory::{InMemoryEntityStore, Seed},
        postgres::PostgresEntityStore,
    },
    api::{handlers::AppState, router::create_router},
    application::borrowing::ServiceDependencies,
    config::{AppConfig, DEFAULT_LOG_FILTER, StoreBackend},
    ports::EntityStore,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env().expect("Invalid configuration");

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Initialize entity store
    let entity_store: Arc<dyn EntityStore> = match config.store_backend {
        StoreBackend::Postgres => {
            tracing::info!("Database URL: {}", config.database_url);

            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(&config.database_url)
                .await
                .expect("Failed to connect to database");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .expect("Failed to run migrations");

            Arc::new(PostgresEntityStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory entity store; data is lost on shutdown");
            let store = InMemoryEntityStore::new();

            match &config.memory_seed_file {
                Some(path) => {
                    let seed = Seed::load(path).expect("Failed to load seed file");
                    tracing::info!(
                        books = seed.books.len(),
                        borrowers = seed.borrowers.len(),
                        "Seeding in-memory entity store from {}",
                        path.display()
                    );
                    store.apply_seed(seed);
                }
                None => tracing::warn!(
                    "MEMORY_SEED_FILE not set; no books or borrowers exist, so creation always fails"
                ),
            }

            Arc::new(store)
        }
    };

    // Create application state
    let service_deps = ServiceDependencies { entity_store };
    let app_state = Arc::new(AppState { service_deps });

    // Create router
    let app = create_router(app_state);

    // Server configuration
    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", addr);

    // Start server
    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
