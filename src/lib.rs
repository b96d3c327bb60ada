pub mod api;
pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod seed;
pub mod store;

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::{AppConfig, StorageBackend};
use crate::logic::{HookRegistry, PageOperations, PostOperations, RoleAuthorizer, UrlBuilder};

// Export API types
pub use api::handlers;
pub use api::routes;

pub use error::ApiError;

// Export logic types
pub use logic::{Authorizer, ComposedPage, PageComposer, PathResolver};

// Export all model types
pub use model::*;

// Export store types
pub use store::{InMemoryStore, PostgresStore, Store};

/// Page operations wired with the default authorizer and the given hooks
pub fn page_operations<S: Store>(
    store: Arc<S>,
    config: &AppConfig,
    hooks: HookRegistry,
) -> PageOperations<S> {
    let posts = PostOperations::new(
        store,
        Arc::new(RoleAuthorizer),
        Arc::new(hooks),
        UrlBuilder::from_config(&config.api),
        PAGE_TYPE,
    );
    PageOperations::new(posts)
}

/// Router with state applied, ready to serve
pub fn build_router<S: Store + 'static>(store: Arc<S>, config: &AppConfig) -> Router {
    let pages = page_operations(store, config, HookRegistry::new());
    routes::create_router(&config.api.base_route).with_state(Arc::new(pages))
}

/// Serve the page API on the configured address using `store`
pub async fn serve_with_store<S: Store + 'static>(
    store: Arc<S>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    // Load seed data for demonstration (optional)
    if std::env::var("LOAD_SEED_DATA").unwrap_or_default() == "true" {
        log::info!("Loading seed data...");
        seed::load_seed_data(&*store).await?;
    }

    let app = build_router(store, config);

    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    log::info!(
        "Page API running on http://{}{}",
        bind_address,
        config.api.base_route
    );

    axum::serve(listener, app).await?;

    Ok(())
}

/// Pick the storage backend from configuration and serve
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    match config.storage.backend {
        StorageBackend::Memory => {
            log::info!("Using in-memory page store");
            serve_with_store(Arc::new(InMemoryStore::new()), &config).await
        }
        StorageBackend::Postgres => {
            log::info!("Connecting to PostgreSQL...");
            let database_url = config.database_url()?;
            let max_connections = config.database.max_connections.unwrap_or(20);
            let postgres_store = PostgresStore::new(&database_url, max_connections).await?;

            log::info!("Running database migrations...");
            postgres_store.migrate().await?;

            serve_with_store(Arc::new(postgres_store), &config).await
        }
    }
}
