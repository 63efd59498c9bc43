//! Bot configuration validation.
//!
//! Two layers of checks before a config may be saved:
//! 1. Structural: ranges, orderings, and non-empty sets. Any failure is a
//!    hard issue and blocks the save.
//! 2. Achievability: how hard the convergence loop would have to lean on
//!    each trade to hit the daily target given the configured P&L bounds.
//!    The result is `max_correction_percent`; crossing the mode's ceiling
//!    is a warning, crossing 50% means the target is simply out of reach
//!    and becomes a hard issue.

use crate::types::{BotConfig, ValidationResult};

/// Correction beyond this fraction means the configured bounds cannot
/// reach the target at all.
const UNREACHABLE_CORRECTION: f64 = 0.5;

/// Validate a configuration.
pub fn validate(config: &BotConfig) -> ValidationResult {
    let mut issues = Vec::new();
    let mut warnings = Vec::new();

    if config.invested_capital <= 0.0 {
        issues.push(format!(
            "investedCapital ({}) must be positive",
            config.invested_capital
        ));
    }
    if config.trading_pairs.is_empty() {
        issues.push("tradingPairs must not be empty".to_string());
    }
    if config.leverages.is_empty() {
        issues.push("leverages must not be empty".to_string());
    } else if config.leverages.iter().any(|&l| l == 0) {
        issues.push("leverages must all be at least 1".to_string());
    }
    if config.win_rate <= 0.0 || config.win_rate >= 1.0 {
        issues.push(format!(
            "winRate ({}) must be strictly between 0 and 1",
            config.win_rate
        ));
    }
    if config.daily_target_percent <= 0.0 {
        issues.push(format!(
            "dailyTargetPercent ({}) must be positive",
            config.daily_target_percent
        ));
    }
    if config.trades_per_day == 0 {
        issues.push("tradesPerDay must be at least 1".to_string());
    }
    if config.min_position_size <= 0.0 {
        issues.push(format!(
            "minPositionSize ({}) must be positive",
            config.min_position_size
        ));
    }
    if config.min_position_size > config.max_position_size {
        issues.push(format!(
            "minPositionSize ({}) exceeds maxPositionSize ({})",
            config.min_position_size, config.max_position_size
        ));
    }
    if config.max_concurrent_positions == 0 {
        issues.push("maxConcurrentPositions must be at least 1".to_string());
    }
    if config.open_frequency <= 0.0 || config.open_frequency > 1.0 {
        issues.push(format!(
            "openFrequency ({}) must be within (0, 1]",
            config.open_frequency
        ));
    }
    if config.win_pnl_min <= 0.0 {
        issues.push(format!(
            "winPnlMin ({}) must be positive",
            config.win_pnl_min
        ));
    }
    if config.win_pnl_min > config.win_pnl_max {
        issues.push(format!(
            "winPnlMin ({}) exceeds winPnlMax ({})",
            config.win_pnl_min, config.win_pnl_max
        ));
    }
    if config.loss_pnl_max >= 0.0 {
        issues.push(format!(
            "lossPnlMax ({}) must be negative",
            config.loss_pnl_max
        ));
    }
    if config.loss_pnl_min > config.loss_pnl_max {
        issues.push(format!(
            "lossPnlMin ({}) exceeds lossPnlMax ({})",
            config.loss_pnl_min, config.loss_pnl_max
        ));
    }
    if config.min_duration_ms <= 0 {
        issues.push(format!(
            "minDurationMs ({}) must be positive",
            config.min_duration_ms
        ));
    }
    if config.min_duration_ms > config.max_duration_ms {
        issues.push(format!(
            "minDurationMs ({}) exceeds maxDurationMs ({})",
            config.min_duration_ms, config.max_duration_ms
        ));
    }
    if config.max_slippage < 0.0 || config.max_slippage >= 1.0 {
        issues.push(format!(
            "maxSlippage ({}) must be within [0, 1)",
            config.max_slippage
        ));
    }

    // Achievability only means something once the structure is sound.
    if !issues.is_empty() {
        return ValidationResult {
            valid: false,
            issues,
            warnings,
            max_correction_percent: 0.0,
        };
    }

    let max_correction = max_correction_percent(config);
    let ceiling = config.convergence_mode.correction_ceiling();

    if max_correction > UNREACHABLE_CORRECTION {
        issues.push(format!(
            "daily target is unreachable within the configured P&L bounds (max correction {:.1}%)",
            max_correction * 100.0
        ));
    } else if max_correction > ceiling {
        warnings.push(format!(
            "max correction {:.1}% exceeds the {} mode ceiling of {:.0}%; convergence will be visible in the trade stream",
            max_correction * 100.0,
            config.convergence_mode,
            ceiling * 100.0
        ));
    } else if max_correction > ceiling / 2.0 {
        warnings.push(format!(
            "max correction {:.1}%, within acceptable range",
            max_correction * 100.0
        ));
    }

    ValidationResult {
        valid: issues.is_empty(),
        issues,
        warnings,
        max_correction_percent: max_correction,
    }
}

/// Worst-case per-trade correction needed to stay on the daily target.
///
/// Uses bound midpoints: the static gap between the target per-trade P&L
/// and what the configured win rate and bounds deliver on their own, as a
/// fraction of the win/loss spread, plus one standard error of binomial
/// drift at the configured trade count.
fn max_correction_percent(config: &BotConfig) -> f64 {
    let mean_win = (config.win_pnl_min + config.win_pnl_max) / 2.0;
    let mean_loss = (config.loss_pnl_min + config.loss_pnl_max) / 2.0;
    let spread = mean_win - mean_loss;
    if spread <= 0.0 {
        return UNREACHABLE_CORRECTION + 1.0;
    }

    let expected_per_trade =
        config.win_rate * mean_win + (1.0 - config.win_rate) * mean_loss;

    let mean_size = (config.min_position_size + config.max_position_size) / 2.0;
    let trades = config.trades_per_day as f64;
    let target_per_trade =
        config.daily_target_percent / 100.0 * config.invested_capital / trades / mean_size
            * 100.0;

    let static_gap = (target_per_trade - expected_per_trade).abs() / spread;
    let drift_allowance = (config.win_rate * (1.0 - config.win_rate) / trades).sqrt();

    static_gap + drift_allowance
}
