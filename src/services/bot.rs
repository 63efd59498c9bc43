//! Trading bot engine.
//!
//! One `TradingBot` simulates a leveraged trader whose aggregate results
//! converge on a configured daily P&L target. The trick is scripting:
//! every position draws its final P&L and lifetime at open time, and the
//! close path settles against that script no matter what the price feed
//! did in between. Feed prices drive only the visible state: valuation,
//! barrier crossings, and displayed entry/exit levels.
//!
//! Convergence is a closed loop over the intra-day ledger. Each open
//! compares realized P&L against the pro-rated target, spreads the gap
//! over the trades still expected today, and converts it into a win
//! probability nudge plus an outcome magnitude bias. Both are clamped to
//! the validator's correction cap and scaled by the convergence mode's
//! gain, so drift is steered back without the trade stream ever looking
//! mechanical.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;
use uuid::Uuid;

use crate::services::feed::PriceSnapshot;
use crate::services::validator::validate;
use crate::types::{AllowedSides, BotConfig, BotRecord, BotStats, Position, RealismMode, Side, Trade};

const DAY_MS: i64 = 86_400_000;

/// Effective win probability is kept strictly inside (0, 1) so neither
/// outcome is ever impossible.
const MIN_WIN_PROB: f64 = 0.02;
const MAX_WIN_PROB: f64 = 0.98;

/// Barriers sit this far beyond the extreme P&L bounds so the script, not
/// feed noise, usually decides when a position closes.
const BARRIER_PAD: f64 = 1.25;

/// Minimum barrier distance in multiples of max display slippage, so a
/// freshly opened position cannot sit across its own stop.
const BARRIER_SLIPPAGE_FLOOR: f64 = 4.0;

/// Per-trade convergence adjustment derived from the day ledger.
#[derive(Debug, Clone, Copy, Default)]
struct Correction {
    /// Added to the configured win rate before the outcome draw.
    win_prob_shift: f64,
    /// Shifts the outcome draw within its bounds (unit-range fraction).
    magnitude_bias: f64,
}

/// A single simulated trading bot.
pub struct TradingBot {
    config: BotConfig,
    positions: Vec<Position>,
    trades: Vec<Trade>,
    rng: StdRng,
    /// Clamp on the per-trade correction, from the validator.
    correction_cap: f64,
    /// Epoch day the ledger below tracks.
    day_stamp: i64,
    /// Realized P&L accumulated today, quote currency.
    realized_today: f64,
    /// Trades closed today.
    trades_today: u32,
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn correction_cap(config: &BotConfig) -> f64 {
    validate(config)
        .max_correction_percent
        .min(config.convergence_mode.correction_ceiling())
}

impl TradingBot {
    /// Create a bot from a configuration. The caller is expected to have
    /// validated the config.
    pub fn new(config: BotConfig) -> Self {
        let rng = make_rng(config.seed);
        let correction_cap = correction_cap(&config);
        Self {
            config,
            positions: Vec::new(),
            trades: Vec::new(),
            rng,
            correction_cap,
            day_stamp: 0,
            realized_today: 0.0,
            trades_today: 0,
        }
    }

    /// Rebuild a bot from its persisted record.
    pub fn from_record(record: BotRecord) -> Self {
        let rng = make_rng(record.config.seed);
        let correction_cap = correction_cap(&record.config);
        Self {
            config: record.config,
            positions: record.positions,
            trades: record.trades,
            rng,
            correction_cap,
            day_stamp: record.day_stamp,
            realized_today: record.realized_today,
            trades_today: record.trades_today,
        }
    }

    /// Snapshot the bot's durable state.
    pub fn to_record(&self) -> BotRecord {
        BotRecord {
            config: self.config.clone(),
            positions: self.positions.clone(),
            trades: self.trades.clone(),
            day_stamp: self.day_stamp,
            realized_today: self.realized_today,
            trades_today: self.trades_today,
        }
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    /// Current derived statistics.
    pub fn stats(&self) -> BotStats {
        BotStats::compute(
            &self.config.id,
            &self.config.name,
            &self.positions,
            &self.trades,
        )
    }

    /// Replace the configuration. Open positions keep their scripts; the
    /// correction cap is re-derived, and a changed seed re-seeds the RNG.
    pub fn set_config(&mut self, config: BotConfig) {
        if config.seed != self.config.seed {
            self.rng = make_rng(config.seed);
        }
        self.correction_cap = correction_cap(&config);
        self.config = config;
    }

    /// Drop all positions and history, keeping the configuration.
    pub fn clear_history(&mut self) {
        self.positions.clear();
        self.trades.clear();
        self.realized_today = 0.0;
        self.trades_today = 0;
    }

    /// Advance the bot one tick: refresh valuations, close due positions,
    /// maybe open a new one. Returns whether positions opened or closed.
    ///
    /// A tick carrying no price for any of the bot's pairs is a no-op.
    pub fn tick(&mut self, now_ms: i64, prices: &PriceSnapshot) -> bool {
        let has_price = self
            .config
            .trading_pairs
            .iter()
            .any(|pair| prices.contains_key(pair));
        if !has_price {
            return false;
        }

        self.roll_day(now_ms);

        for position in self.positions.iter_mut() {
            if let Some(&price) = prices.get(&position.pair) {
                position.update_price(price);
            }
        }

        let closed = self.close_due(now_ms);

        let mut opened = false;
        if self.positions.len() < self.config.max_concurrent_positions
            && self.rng.gen::<f64>() < self.config.open_frequency
        {
            opened = self.try_open(now_ms, prices);
        }

        closed > 0 || opened
    }

    /// Reset the intra-day ledger when the UTC day changes.
    fn roll_day(&mut self, now_ms: i64) {
        let day = now_ms.div_euclid(DAY_MS);
        if day != self.day_stamp {
            if self.trades_today > 0 {
                debug!(
                    "Bot {} day rollover: {:+.2} realized over {} trades",
                    self.config.name, self.realized_today, self.trades_today
                );
            }
            self.day_stamp = day;
            self.realized_today = 0.0;
            self.trades_today = 0;
        }
    }

    /// Close every position whose script has expired or whose barriers
    /// were crossed. Returns the number closed.
    fn close_due(&mut self, now_ms: i64) -> usize {
        let mut closed = 0;
        let mut i = 0;
        while i < self.positions.len() {
            let due = {
                let p = &self.positions[i];
                p.is_expired(now_ms) || p.crossed_stop_loss() || p.crossed_take_profit()
            };
            if due {
                let position = self.positions.remove(i);
                self.settle(position, now_ms);
                closed += 1;
            } else {
                i += 1;
            }
        }
        closed
    }

    /// Settle a position against its script. The reconciled P&L is the
    /// scripted target; the displayed exit price is derived from it and
    /// then perturbed by up to max slippage for realism.
    fn settle(&mut self, position: Position, now_ms: i64) {
        let pnl_percent = position.target_pnl_percent;
        let pnl = position.position_size * pnl_percent / 100.0;

        let clean_exit = position.price_at_pnl(pnl_percent);
        let slip = self.config.max_slippage;
        let exit_price = clean_exit * (1.0 + self.rng.gen_range(-slip..=slip));

        let trade = Trade::from_position(&position, exit_price, pnl, pnl_percent, now_ms);
        debug!(
            "Bot {} closed {} {} {:+.2} ({:+.3}%)",
            self.config.name, trade.side, trade.pair, trade.pnl, trade.pnl_percent
        );

        self.realized_today += pnl;
        self.trades_today += 1;
        self.trades.push(trade);
    }

    /// Attempt to open a position on a priced pair. Returns false when no
    /// configured pair has a price this tick.
    fn try_open(&mut self, now_ms: i64, prices: &PriceSnapshot) -> bool {
        let priced: Vec<usize> = (0..self.config.trading_pairs.len())
            .filter(|&i| prices.contains_key(&self.config.trading_pairs[i]))
            .collect();
        if priced.is_empty() {
            return false;
        }
        let pair_idx = priced[self.rng.gen_range(0..priced.len())];
        let pair = self.config.trading_pairs[pair_idx].clone();
        let clean_entry = prices[&pair];
        if clean_entry <= 0.0 {
            return false;
        }

        let lev_idx = self.rng.gen_range(0..self.config.leverages.len());
        let leverage = self.config.leverages[lev_idx];

        let side = match self.config.allowed_sides {
            AllowedSides::Long => Side::Long,
            AllowedSides::Short => Side::Short,
            AllowedSides::Both => {
                if self.rng.gen::<bool>() {
                    Side::Long
                } else {
                    Side::Short
                }
            }
        };

        let position_size = self
            .rng
            .gen_range(self.config.min_position_size..=self.config.max_position_size);

        // Draw the outcome script, steered by the convergence loop.
        let correction = self.correction(now_ms);
        let win_prob = (self.config.win_rate + correction.win_prob_shift)
            .clamp(MIN_WIN_PROB, MAX_WIN_PROB);
        let win = self.rng.gen::<f64>() < win_prob;
        let target_pnl_percent = self.draw_target_pnl(win, correction.magnitude_bias);
        let planned_duration_ms = self
            .rng
            .gen_range(self.config.min_duration_ms..=self.config.max_duration_ms);

        // Displayed entry is the clean price with adverse slippage.
        let slip = self.rng.gen_range(0.0..=self.config.max_slippage);
        let entry_price = match side {
            Side::Long => clean_entry * (1.0 + slip),
            Side::Short => clean_entry * (1.0 - slip),
        };

        let amount = position_size * leverage as f64 / entry_price;

        // Barriers sit beyond both extreme bounds, with a floor keeping
        // them clear of entry slippage.
        let lev = leverage.max(1) as f64;
        let slip_floor = self.config.max_slippage * BARRIER_SLIPPAGE_FLOOR;
        let profit_frac =
            (self.config.win_pnl_max.abs() * BARRIER_PAD / 100.0 / lev).max(slip_floor);
        let loss_frac =
            (self.config.loss_pnl_min.abs() * BARRIER_PAD / 100.0 / lev).max(slip_floor);
        let (stop_loss, take_profit) = match side {
            Side::Long => (
                entry_price * (1.0 - loss_frac),
                entry_price * (1.0 + profit_frac),
            ),
            Side::Short => (
                entry_price * (1.0 + loss_frac),
                entry_price * (1.0 - profit_frac),
            ),
        };

        let mut position = Position {
            id: Uuid::new_v4().to_string(),
            bot_id: self.config.id.clone(),
            pair,
            side,
            amount,
            position_size,
            leverage,
            entry_price,
            current_price: clean_entry,
            pnl: 0.0,
            pnl_percent: 0.0,
            stop_loss,
            take_profit,
            opened_at: now_ms,
            target_pnl_percent,
            planned_duration_ms,
        };
        position.update_price(clean_entry);

        debug!(
            "Bot {} opened {} {} at {:.4} ({}x, target {:+.3}%)",
            self.config.name,
            position.side,
            position.pair,
            position.entry_price,
            position.leverage,
            position.target_pnl_percent
        );
        self.positions.push(position);
        true
    }

    /// Compute the per-trade correction from the intra-day ledger: the gap
    /// against the pro-rated target, spread over the trades still expected
    /// today, expressed in units of the win/loss spread.
    fn correction(&self, now_ms: i64) -> Correction {
        let config = &self.config;

        let mean_size = (config.min_position_size + config.max_position_size) / 2.0;
        let mean_win = (config.win_pnl_min + config.win_pnl_max) / 2.0;
        let mean_loss = (config.loss_pnl_min + config.loss_pnl_max) / 2.0;
        let spread = mean_win - mean_loss;
        if mean_size <= 0.0 || spread <= 0.0 {
            return Correction::default();
        }

        let day_start = self.day_stamp * DAY_MS;
        let elapsed = ((now_ms - day_start) as f64 / DAY_MS as f64).clamp(0.0, 1.0);

        let pro_rated_target =
            config.daily_target_percent / 100.0 * config.invested_capital * elapsed;
        let gap_quote = pro_rated_target - self.realized_today;

        let remaining_trades =
            (config.trades_per_day as f64 * (1.0 - elapsed)).max(1.0);
        let per_trade_gap_pct = gap_quote / remaining_trades / mean_size * 100.0;

        let raw = per_trade_gap_pct / spread;
        let clamped = raw.clamp(-self.correction_cap, self.correction_cap);
        let gain = config.convergence_mode.gain();

        Correction {
            win_prob_shift: gain * clamped,
            magnitude_bias: gain * clamped,
        }
    }

    /// Draw a scripted P&L percent inside the win or loss bounds. The
    /// realism mode shapes the distribution; the bias shifts its center.
    fn draw_target_pnl(&mut self, win: bool, bias: f64) -> f64 {
        let t = (self.draw_unit() + bias).clamp(0.0, 1.0);
        let (lo, hi) = if win {
            (self.config.win_pnl_min, self.config.win_pnl_max)
        } else {
            (self.config.loss_pnl_min, self.config.loss_pnl_max)
        };
        lo + t * (hi - lo)
    }

    /// Unit sample shaped by the realism mode: averaging uniforms pulls
    /// outcomes toward the center of the range.
    fn draw_unit(&mut self) -> f64 {
        match self.config.realism_mode {
            RealismMode::Smooth => {
                (self.rng.gen::<f64>()
                    + self.rng.gen::<f64>()
                    + self.rng.gen::<f64>()
                    + self.rng.gen::<f64>())
                    / 4.0
            }
            RealismMode::Realistic => (self.rng.gen::<f64>() + self.rng.gen::<f64>()) / 2.0,
            RealismMode::Volatile => self.rng.gen::<f64>(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConvergenceMode;
    use std::collections::HashMap;

    const START_MS: i64 = 1_700_000_000_000;

    fn create_test_config(seed: u64) -> BotConfig {
        BotConfig {
            id: "bot-test".to_string(),
            name: "test".to_string(),
            trading_pairs: vec!["BTC/USDT".to_string()],
            invested_capital: 10_000.0,
            trades_per_day: 500,
            open_frequency: 0.5,
            min_duration_ms: 5_000,
            max_duration_ms: 20_000,
            max_concurrent_positions: 3,
            convergence_mode: ConvergenceMode::Assisted,
            seed: Some(seed),
            ..Default::default()
        }
    }

    fn flat_prices() -> PriceSnapshot {
        HashMap::from([("BTC/USDT".to_string(), 50_000.0)])
    }

    fn run_ticks(bot: &mut TradingBot, ticks: usize) {
        let prices = flat_prices();
        for i in 0..ticks {
            bot.tick(START_MS + i as i64 * 1_000, &prices);
        }
    }

    fn assert_trade_in_bounds(config: &BotConfig, trade: &Trade) {
        let in_win = trade.pnl_percent >= config.win_pnl_min - 1e-9
            && trade.pnl_percent <= config.win_pnl_max + 1e-9;
        let in_loss = trade.pnl_percent >= config.loss_pnl_min - 1e-9
            && trade.pnl_percent <= config.loss_pnl_max + 1e-9;
        assert!(
            in_win || in_loss,
            "trade pnl {} outside both bounds",
            trade.pnl_percent
        );
    }

    #[test]
    fn test_tick_opens_and_closes_within_limits() {
        let config = create_test_config(7);
        let mut bot = TradingBot::new(config.clone());
        let prices = flat_prices();

        for i in 0..600 {
            bot.tick(START_MS + i * 1_000, &prices);
            assert!(bot.positions().len() <= config.max_concurrent_positions);
        }

        assert!(!bot.trades().is_empty(), "expected closed trades after 600s");
        for trade in bot.trades() {
            assert_trade_in_bounds(&config, trade);
            assert_eq!(trade.bot_id, "bot-test");
        }
    }

    #[test]
    fn test_settled_pnl_matches_script() {
        let mut bot = TradingBot::new(create_test_config(11));
        run_ticks(&mut bot, 400);

        assert!(!bot.trades().is_empty());
        for trade in bot.trades() {
            let expected_pnl = trade.position_size * trade.pnl_percent / 100.0;
            assert!((trade.pnl - expected_pnl).abs() < 1e-9);
            assert!(trade.exit_price > 0.0);
            assert!(trade.duration_ms >= 0);
        }
    }

    #[test]
    fn test_missing_prices_are_noop() {
        let mut bot = TradingBot::new(create_test_config(3));
        let other = HashMap::from([("ETH/USDT".to_string(), 3_000.0)]);

        for i in 0..100 {
            assert!(!bot.tick(START_MS + i * 1_000, &other));
        }
        assert!(bot.positions().is_empty());
        assert!(bot.trades().is_empty());
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let mut a = TradingBot::new(create_test_config(42));
        let mut b = TradingBot::new(create_test_config(42));
        run_ticks(&mut a, 500);
        run_ticks(&mut b, 500);

        assert_eq!(a.trades().len(), b.trades().len());
        assert!(!a.trades().is_empty());
        for (ta, tb) in a.trades().iter().zip(b.trades()) {
            assert_eq!(ta.pnl_percent, tb.pnl_percent);
            assert_eq!(ta.side, tb.side);
            assert_eq!(ta.opened_at, tb.opened_at);
        }
    }

    #[test]
    fn test_allowed_sides_are_respected() {
        let mut config = create_test_config(5);
        config.allowed_sides = AllowedSides::Short;
        let mut bot = TradingBot::new(config);
        run_ticks(&mut bot, 300);

        assert!(!bot.trades().is_empty());
        assert!(bot.trades().iter().all(|t| t.side == Side::Short));
        assert!(bot.positions().iter().all(|p| p.side == Side::Short));
    }

    #[test]
    fn test_day_rollover_resets_ledger() {
        let mut bot = TradingBot::new(create_test_config(9));
        run_ticks(&mut bot, 300);

        let before = bot.to_record().trades_today;
        let carried = bot.positions().len() as u32;
        assert!(before > carried, "need a day's worth of closed trades");

        // Next tick lands on the following UTC day; the ledger resets and
        // then counts only the carried positions that expire on this tick.
        bot.tick(START_MS + DAY_MS + 1_000, &flat_prices());
        assert!(bot.to_record().trades_today <= carried);
        assert!(bot.to_record().trades_today < before);
    }

    #[test]
    fn test_record_round_trip_resumes_state() {
        let mut bot = TradingBot::new(create_test_config(13));
        run_ticks(&mut bot, 400);

        let record = bot.to_record();
        let restored = TradingBot::from_record(record.clone());

        assert_eq!(restored.config(), bot.config());
        assert_eq!(restored.positions().len(), bot.positions().len());
        assert_eq!(restored.trades().len(), bot.trades().len());
        assert_eq!(restored.to_record().realized_today, record.realized_today);
    }

    #[test]
    fn test_clear_history_keeps_config() {
        let mut bot = TradingBot::new(create_test_config(17));
        run_ticks(&mut bot, 400);
        assert!(!bot.trades().is_empty());

        bot.clear_history();
        assert!(bot.trades().is_empty());
        assert!(bot.positions().is_empty());
        assert_eq!(bot.config().id, "bot-test");
        assert_eq!(bot.to_record().trades_today, 0);
    }

    #[test]
    fn test_stats_reflect_trades() {
        let mut bot = TradingBot::new(create_test_config(19));
        run_ticks(&mut bot, 500);

        let stats = bot.stats();
        assert_eq!(stats.trades_count, bot.trades().len());
        assert!(stats.win_rate >= 0.0 && stats.win_rate <= 1.0);

        let realized: f64 = bot.trades().iter().map(|t| t.pnl).sum();
        let unrealized: f64 = bot.positions().iter().map(|p| p.pnl).sum();
        assert!((stats.total_pnl - (realized + unrealized)).abs() < 1e-9);
    }
}
