use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marionette::config::{Config, StoreBackend};
use marionette::services::{
    BotManager, MemoryStore, RedisStore, SimulatedFeed, SqliteStore, Store,
};
use marionette::{api, websocket, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marionette=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env());
    info!(
        "Starting Marionette server on {}:{}",
        config.host, config.port
    );

    // Open the persistence backend
    let store: Arc<dyn Store> = match config.store_backend {
        StoreBackend::Memory => {
            warn!("Using in-memory store; bot state will not survive restarts");
            Arc::new(MemoryStore::default())
        }
        StoreBackend::Sqlite => Arc::new(SqliteStore::new(&config.sqlite_path)?),
        StoreBackend::Redis => Arc::new(RedisStore::new(&config.redis_url).await),
    };

    // Restore persisted bots
    let manager = Arc::new(BotManager::new(store));
    let restored = manager.load().await;
    info!("Restored {} bots from the store", restored);

    // Start the simulated price feed
    let feed = SimulatedFeed::new(&config.trading_pairs, config.feed_interval_ms);
    feed.clone().start();

    // Channel carrying serialized fleet stats to WebSocket clients
    let (stats_tx, _) = broadcast::channel::<String>(64);

    let state = AppState {
        config: config.clone(),
        manager: manager.clone(),
        stats_tx: stats_tx.clone(),
    };

    // Drive the bots from the feed
    {
        let manager = manager.clone();
        let stats_tx = stats_tx.clone();
        let mut price_rx = feed.subscribe();
        tokio::spawn(async move {
            loop {
                match price_rx.recv().await {
                    Ok(snapshot) => {
                        manager.tick(&snapshot).await;
                        // Only serialize stats when someone is listening
                        if stats_tx.receiver_count() > 0 {
                            match serde_json::to_string(&manager.get_all_stats()) {
                                Ok(json) => {
                                    let _ = stats_tx.send(json);
                                }
                                Err(e) => warn!("Failed to serialize fleet stats: {}", e),
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Tick loop lagged {} snapshots behind the feed", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    // Periodic persistence sweep
    {
        let manager = manager.clone();
        let interval = config.persist_interval_secs;
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(tokio::time::Duration::from_secs(interval)).await;
                manager.persist_all().await;
            }
        });
    }

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the router
    let app = Router::new()
        .merge(api::router())
        .route("/ws/stats", get(websocket::stats_ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start the server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Marionette server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Flush bot state before exiting
    manager.persist_all().await;
    info!("Marionette server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
