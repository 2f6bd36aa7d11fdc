use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use catalog_api::config::Config;
use catalog_api::services::{CatalogClient, EpisodeResolver};
use catalog_api::AppState;

fn init_tracing() {
    // RUST_LOG controls log levels.
    // Default: debug for our crate, info for axum, warn for dependencies
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("catalog_api=debug,rtdb_protocol=debug,tower_http=debug,axum=info,warn")
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() {
    // Initialize tracing first so we can log configuration loading
    init_tracing();

    tracing::info!("Starting Catalog API v{}", env!("CARGO_PKG_VERSION"));

    let config = match Config::load() {
        Ok(cfg) => {
            tracing::info!("Configuration loaded successfully");
            tracing::debug!("Server: {}:{}", cfg.server.host, cfg.server.port);
            tracing::debug!("Upstream: {}", cfg.upstream.base_url);
            tracing::debug!("Realtime database: {}", cfg.rtdb.endpoint());
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let catalog = match CatalogClient::new_shared(
        config.upstream.base_url.clone(),
        config.upstream.timeout(),
    ) {
        Ok(client) => {
            tracing::info!("Catalog client initialized");
            client
        }
        Err(e) => {
            tracing::error!("Failed to create catalog client: {}", e);
            std::process::exit(1);
        }
    };

    let episode_resolver = EpisodeResolver::new_shared(&config.rtdb);

    let addr = config.server_addr();
    let app = catalog_api::router(AppState::new(config, catalog, episode_resolver));

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Catalog API listening on {}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
