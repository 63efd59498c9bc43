//! Bot lifecycle and aggregation.
//!
//! `BotManager` owns every live `TradingBot`, fans ticks out to them, and
//! is the single gate between the API surface and bot state: every create
//! and config change passes the validator before it lands, and every
//! mutation is pushed to the store. Persistence failures are logged and
//! tolerated; the engine keeps running from memory.

use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::services::bot::TradingBot;
use crate::services::feed::PriceSnapshot;
use crate::services::preset::map_preset;
use crate::services::store::Store;
use crate::services::validator::validate;
use crate::types::{
    sanitize, BotConfig, BotConfigUpdate, BotRecord, BotStats, ManagerStats, PresetContext,
    PresetInput, Trade, ValidationResult,
};

/// Trades returned in the aggregate recent-trades feed.
const RECENT_TRADES_LIMIT: usize = 50;

/// Registry of live bots plus their persistence backend.
pub struct BotManager {
    bots: DashMap<String, TradingBot>,
    store: Arc<dyn Store>,
}

impl BotManager {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            bots: DashMap::new(),
            store,
        }
    }

    /// Load every persisted bot. Returns the number loaded.
    ///
    /// Stored configs are revalidated before they reach the engine: a
    /// hand-edited or corrupted row is skipped with a warning and left in
    /// the store untouched, so a bad record can never panic the tick task.
    pub async fn load(&self) -> usize {
        match self.store.load_all().await {
            Ok(records) => {
                let mut count = 0;
                for record in records {
                    let validation = validate(&record.config);
                    if !validation.valid {
                        warn!(
                            "Skipping stored bot {}: {}",
                            record.config.id,
                            validation.issues.join("; ")
                        );
                        continue;
                    }
                    let bot = TradingBot::from_record(record);
                    self.bots.insert(bot.config().id.clone(), bot);
                    count += 1;
                }
                info!("Loaded {} bots from store", count);
                count
            }
            Err(e) => {
                warn!("Failed to load bots from store: {}", e);
                0
            }
        }
    }

    /// Number of live bots.
    pub fn bot_count(&self) -> usize {
        self.bots.len()
    }

    /// Validate and register a new bot.
    pub async fn create_bot(&self, config: BotConfig) -> Result<(BotStats, ValidationResult)> {
        let validation = validate(&config);
        if !validation.valid {
            return Err(AppError::BadRequest(validation.issues.join("; ")));
        }
        if self.bots.contains_key(&config.id) {
            return Err(AppError::BadRequest(format!(
                "bot {} already exists",
                config.id
            )));
        }

        let bot = TradingBot::new(config);
        let record = bot.to_record();
        let stats = bot.stats();
        info!("Created bot {} ({})", stats.name, stats.id);
        self.bots.insert(stats.id.clone(), bot);
        self.persist_record(&record).await;
        Ok((stats, validation))
    }

    /// Expand a preset and register the resulting bot. The mapper leaves
    /// timestamps at zero; they are stamped here.
    pub async fn create_from_preset(
        &self,
        input: &PresetInput,
        ctx: &PresetContext,
    ) -> Result<(BotStats, ValidationResult)> {
        let mut config = map_preset(input, ctx);
        let now = chrono::Utc::now().timestamp_millis();
        config.created_at = now;
        config.updated_at = now;
        self.create_bot(config).await
    }

    /// Stats for one bot.
    pub fn get_bot(&self, id: &str) -> Option<BotStats> {
        self.bots.get(id).map(|entry| entry.stats())
    }

    /// Configuration of one bot.
    pub fn get_config(&self, id: &str) -> Option<BotConfig> {
        self.bots.get(id).map(|entry| entry.config().clone())
    }

    /// Merge a partial update into a bot's config. The merged result is
    /// validated before it replaces anything.
    pub async fn update_config(&self, id: &str, update: &BotConfigUpdate) -> Result<BotConfig> {
        let record = {
            let mut entry = self
                .bots
                .get_mut(id)
                .ok_or_else(|| AppError::NotFound(format!("Bot not found: {}", id)))?;
            let mut merged = entry.config().clone();
            update.apply_to(&mut merged);

            let validation = validate(&merged);
            if !validation.valid {
                return Err(AppError::BadRequest(validation.issues.join("; ")));
            }
            entry.set_config(merged);
            entry.to_record()
        };
        self.persist_record(&record).await;
        Ok(record.config)
    }

    /// Restore a bot's default trading parameters, keeping its identity
    /// and accumulated history.
    pub async fn reset_config(&self, id: &str) -> Result<BotConfig> {
        let record = {
            let mut entry = self
                .bots
                .get_mut(id)
                .ok_or_else(|| AppError::NotFound(format!("Bot not found: {}", id)))?;
            let reset = entry.config().reset_to_defaults();
            entry.set_config(reset);
            entry.to_record()
        };
        info!("Reset config for bot {}", id);
        self.persist_record(&record).await;
        Ok(record.config)
    }

    /// Drop a bot's positions and trade history, keeping its config.
    pub async fn clear_history(&self, id: &str) -> Result<()> {
        let record = {
            let mut entry = self
                .bots
                .get_mut(id)
                .ok_or_else(|| AppError::NotFound(format!("Bot not found: {}", id)))?;
            entry.clear_history();
            entry.to_record()
        };
        info!("Cleared history for bot {}", id);
        self.persist_record(&record).await;
        Ok(())
    }

    /// Remove a bot and its persisted state.
    pub async fn delete_bot(&self, id: &str) -> Result<()> {
        let (id, _bot) = self
            .bots
            .remove(id)
            .ok_or_else(|| AppError::NotFound(format!("Bot not found: {}", id)))?;
        if let Err(e) = self.store.delete(&id).await {
            warn!("Failed to delete bot {} from store: {}", id, e);
        }
        info!("Deleted bot {}", id);
        Ok(())
    }

    /// Advance every bot one tick. Bots whose positions opened or closed
    /// are persisted after the sweep.
    pub async fn tick(&self, prices: &PriceSnapshot) {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let mut dirty = Vec::new();
        for mut entry in self.bots.iter_mut() {
            if entry.value_mut().tick(now_ms, prices) {
                dirty.push(entry.value().to_record());
            }
        }
        for record in dirty {
            self.persist_record(&record).await;
        }
    }

    /// Persist every bot's current state.
    pub async fn persist_all(&self) {
        let records: Vec<BotRecord> = self
            .bots
            .iter()
            .map(|entry| entry.value().to_record())
            .collect();
        let count = records.len();
        for record in records {
            self.persist_record(&record).await;
        }
        debug!("Persisted {} bots", count);
    }

    /// Aggregate stats across every bot: totals, combined win rate, and
    /// the most recent trades, newest first.
    pub fn get_all_stats(&self) -> ManagerStats {
        let mut bots: Vec<BotStats> = Vec::with_capacity(self.bots.len());
        let mut total_invested = 0.0;
        for entry in self.bots.iter() {
            total_invested += entry.value().config().invested_capital;
            bots.push(entry.value().stats());
        }
        bots.sort_by(|a, b| a.name.cmp(&b.name));

        let combined_pnl = sanitize(bots.iter().map(|b| b.total_pnl).sum());
        let total_trades: usize = bots.iter().map(|b| b.trades_count).sum();
        let wins: usize = bots
            .iter()
            .map(|b| b.trades.iter().filter(|t| t.pnl > 0.0).count())
            .sum();
        let combined_win_rate = sanitize(wins as f64 / total_trades as f64);

        let mut recent_trades: Vec<Trade> = bots
            .iter()
            .flat_map(|b| b.trades.iter().cloned())
            .collect();
        recent_trades.sort_by(|a, b| b.closed_at.cmp(&a.closed_at));
        recent_trades.truncate(RECENT_TRADES_LIMIT);

        ManagerStats {
            total_invested: sanitize(total_invested),
            total_value: sanitize(total_invested + combined_pnl),
            combined_pnl,
            combined_win_rate,
            bots,
            recent_trades,
        }
    }

    async fn persist_record(&self, record: &BotRecord) {
        if let Err(e) = self.store.put(record).await {
            warn!("Failed to persist bot {}: {}", record.config.id, e);
        }
    }
}
