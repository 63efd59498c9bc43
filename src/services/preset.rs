//! Preset expansion.
//!
//! Turns the four human inputs of a preset (daily target, trades per day,
//! character, convergence mode) into a full `BotConfig` whose expected
//! per-trade P&L lands exactly on the daily target. The mapping is pure:
//! identical input and context produce an identical config, so a preset
//! can be re-expanded, diffed, and validated without side effects.
//! Timestamps are assigned by the manager when the bot is registered.

use uuid::Uuid;

use crate::types::{BotConfig, PresetContext, PresetInput};

const DAY_MS: f64 = 86_400_000.0;

/// Position size range as a fraction of invested capital.
const POSITION_SIZE_MIN_FRAC: f64 = 0.05;
const POSITION_SIZE_MAX_FRAC: f64 = 0.15;

/// Spread of the P&L bounds around their derived midpoint.
const BOUND_SPREAD: f64 = 0.5;

/// Spread of position lifetime around its derived mean.
const DURATION_SPREAD: f64 = 0.6;

/// Trades per day served by one concurrent position slot.
const TRADES_PER_SLOT: f64 = 75.0;

/// Expand a preset into a full bot configuration.
///
/// The derivation works backward from the target: mean position size fixes
/// the expected per-trade P&L percentage, the character's win rate and
/// loss/win ratio split that into win/loss midpoints, and Little's law sizes
/// concurrency and lifetimes so the configured trade count actually fits in
/// a day.
pub fn map_preset(input: &PresetInput, ctx: &PresetContext) -> BotConfig {
    let character = input.character;
    let win_rate = character.base_win_rate();
    let trades_per_day = input.trades_per_day.max(1);

    // Expected P&L per trade as a percent of mean position size. With mean
    // size at 10% of capital, hitting dailyTarget% of capital over N trades
    // needs dailyTarget / (N * 0.10) percent per trade.
    let mean_size_frac = (POSITION_SIZE_MIN_FRAC + POSITION_SIZE_MAX_FRAC) / 2.0;
    let expected_per_trade = input.daily_target / (trades_per_day as f64 * mean_size_frac);

    // Split into win/loss midpoints: wr * mean_win - (1 - wr) * ratio * mean_win
    // must equal the expected per-trade P&L.
    let loss_ratio = character.loss_win_ratio();
    let denom = (win_rate - (1.0 - win_rate) * loss_ratio).max(0.05);
    let mean_win = (expected_per_trade / denom).max(0.01);
    let mean_loss = -loss_ratio * mean_win;

    // Little's law: slots * day / mean_duration = trades per day.
    let max_concurrent =
        ((trades_per_day as f64 / TRADES_PER_SLOT).round() as usize).clamp(1, 10);
    let mean_duration = DAY_MS * max_concurrent as f64 / trades_per_day as f64;
    let min_duration_ms = (mean_duration * (1.0 - DURATION_SPREAD)).max(30_000.0) as i64;
    let max_duration_ms = (mean_duration * (1.0 + DURATION_SPREAD)).max(60_000.0) as i64;

    // Per-second open probability with 8x headroom so freed slots refill
    // quickly and the concurrency cap, not the dice, paces throughput.
    let open_frequency = (trades_per_day as f64 / 86_400.0 * 8.0).clamp(0.00001, 1.0);

    BotConfig {
        id: ctx
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        name: ctx
            .name
            .clone()
            .unwrap_or_else(|| format!("{} Bot", character.display_name())),
        invested_capital: ctx.invested_capital,
        trading_pairs: ctx.trading_pairs.clone(),
        allowed_sides: crate::types::AllowedSides::Both,
        leverages: character.leverages(),
        win_rate,
        daily_target_percent: input.daily_target,
        trades_per_day,
        min_position_size: POSITION_SIZE_MIN_FRAC * ctx.invested_capital,
        max_position_size: POSITION_SIZE_MAX_FRAC * ctx.invested_capital,
        max_concurrent_positions: max_concurrent,
        open_frequency,
        win_pnl_min: mean_win * (1.0 - BOUND_SPREAD),
        win_pnl_max: mean_win * (1.0 + BOUND_SPREAD),
        loss_pnl_min: mean_loss * (1.0 + BOUND_SPREAD),
        loss_pnl_max: mean_loss * (1.0 - BOUND_SPREAD),
        min_duration_ms,
        max_duration_ms,
        max_slippage: character.max_slippage(),
        convergence_mode: input.convergence_mode,
        realism_mode: input.realism_mode.unwrap_or(character.default_realism()),
        seed: ctx.seed,
        // Stamped at registration; the mapping stays clock-free.
        created_at: 0,
        updated_at: 0,
    }
}
