//! Marionette - scripted trading-bot simulation server
//!
//! Runs a fleet of simulated trading bots whose trade outcomes are drawn
//! from configured P&L bounds and steered so realized profit converges on
//! each bot's daily target. Bot state is served over HTTP and streamed
//! over WebSocket.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod types;
pub mod websocket;

use std::sync::Arc;

use tokio::sync::broadcast;

use config::Config;
use services::BotManager;

pub use error::{AppError, Result};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub manager: Arc<BotManager>,
    /// Serialized fleet stats, broadcast to WebSocket clients after each tick.
    pub stats_tx: broadcast::Sender<String>,
}
