use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use bus_server::config::{ServerConfig, StoreConfig};
use bus_server::search::SearchConfig;
use bus_server::stations::StationCacheConfig;
use bus_server::store::{Backend, MemoryStore, RestStore, RestStoreConfig, StoreError};
use bus_server::web::{AppState, create_router};

/// Log filter used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "bus_server=info,tower_http=info";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let store = match open_store(&config.store).await {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "failed to open store");
            std::process::exit(1);
        }
    };
    info!(backend = store.kind(), "store ready");

    let search = SearchConfig::new(config.enforce_direction);
    let station_cache = StationCacheConfig::new(config.station_cache_ttl);
    let state = AppState::new(store, search, &station_cache);

    let app = create_router(state, &config.static_dir);

    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, addr = %config.bind_addr, "failed to bind");
            std::process::exit(1);
        }
    };

    info!("Bus timings server listening on http://{}", config.bind_addr);
    info!("  GET  /search?from=&to=         - Trips between two stations");
    info!("  GET  /api/stations/search?q=   - Station name suggestions");
    info!("  GET  /routes                   - All routes");
    info!("  GET  /stations, /trips/new     - Contribution forms");

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server error");
        std::process::exit(1);
    }
}

async fn open_store(config: &StoreConfig) -> Result<Backend, StoreError> {
    match config {
        StoreConfig::Rest { url, api_key } => {
            info!(%url, "using hosted database");
            let store = RestStore::new(RestStoreConfig::new(url.as_str(), api_key.as_str()))?;
            Ok(Backend::Rest(store))
        }
        StoreConfig::Memory { seed_file: Some(path) } => {
            let store = MemoryStore::load(path)?;
            let (stations, routes, trips, timings) = store.counts().await;
            info!(
                path = %path.display(),
                stations, routes, trips, timings,
                "loaded seed data into memory store"
            );
            Ok(Backend::Memory(store))
        }
        StoreConfig::Memory { seed_file: None } => {
            info!("using empty memory store");
            Ok(Backend::Memory(MemoryStore::new()))
        }
    }
}
