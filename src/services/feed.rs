//! Simulated price feed.
//!
//! Publishes a full price snapshot for the configured pairs on a fixed
//! interval. Prices follow a bounded random walk around realistic anchor
//! levels; bots never see anything but the snapshots, so swapping in a
//! live feed later only has to produce the same shape.

use dashmap::DashMap;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// One tick's worth of prices, keyed by pair.
pub type PriceSnapshot = HashMap<String, f64>;

/// Per-step walk magnitude as a fraction of price. Kept well inside the
/// narrowest barrier distance a bot can configure, so scripted expiry
/// rather than feed noise decides when positions close.
const WALK_STEP_FRAC: f64 = 0.0001;

/// Anchor price for a pair; pairs without an anchor start at 100.
fn base_price(pair: &str) -> f64 {
    match pair {
        "BTC/USDT" => 64_250.0,
        "ETH/USDT" => 3_150.0,
        "SOL/USDT" => 144.0,
        "BNB/USDT" => 571.0,
        "XRP/USDT" => 0.52,
        "ADA/USDT" => 0.36,
        "DOGE/USDT" => 0.125,
        _ => 100.0,
    }
}

/// Random-walk price source for every configured pair.
pub struct SimulatedFeed {
    /// Latest price per pair.
    prices: DashMap<String, f64>,
    /// Broadcast channel for snapshots.
    tx: broadcast::Sender<PriceSnapshot>,
    /// Publish interval.
    interval_ms: u64,
}

impl SimulatedFeed {
    /// Create a feed for the given pairs.
    pub fn new(pairs: &[String], interval_ms: u64) -> Arc<Self> {
        let (tx, _) = broadcast::channel(256);
        let prices = DashMap::new();
        for pair in pairs {
            prices.insert(pair.clone(), base_price(pair));
        }

        Arc::new(Self {
            prices,
            tx,
            interval_ms,
        })
    }

    /// Subscribe to price snapshots.
    pub fn subscribe(&self) -> broadcast::Receiver<PriceSnapshot> {
        self.tx.subscribe()
    }

    /// Latest price for a pair.
    pub fn get_price(&self, pair: &str) -> Option<f64> {
        self.prices.get(pair).map(|entry| *entry.value())
    }

    /// Latest prices for every pair.
    pub fn get_all_prices(&self) -> PriceSnapshot {
        self.prices
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    /// Advance every pair one walk step and return the new snapshot.
    pub fn step(&self) -> PriceSnapshot {
        let mut rng = rand::thread_rng();
        let mut snapshot = PriceSnapshot::with_capacity(self.prices.len());

        for mut entry in self.prices.iter_mut() {
            let drift = rng.gen_range(-WALK_STEP_FRAC..=WALK_STEP_FRAC);
            let next = (*entry.value() * (1.0 + drift)).max(f64::MIN_POSITIVE);
            *entry.value_mut() = next;
            snapshot.insert(entry.key().clone(), next);
        }

        snapshot
    }

    /// Spawn the publish loop.
    pub fn start(self: Arc<Self>) {
        info!(
            "Starting simulated feed: {} pairs at {}ms intervals",
            self.prices.len(),
            self.interval_ms
        );

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(self.interval_ms));
            loop {
                interval.tick().await;
                let snapshot = self.step();
                // No receivers yet is fine
                if self.tx.send(snapshot).is_err() {
                    debug!("Feed tick with no subscribers");
                }
            }
        });
    }
}
