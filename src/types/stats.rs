//! Derived statistics types.
//!
//! Stats are recomputed on demand from a bot's trades and open positions,
//! never stored or mutated directly.

use serde::{Deserialize, Serialize};

use super::{Position, Trade};

/// Coerce non-finite values (NaN, ±Infinity) to zero.
///
/// Division-by-zero shows up naturally here: empty trade lists, zero capital,
/// zero entry prices. Downstream consumers always get a plain number.
pub fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Point-in-time statistics for one bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotStats {
    /// Bot ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Open positions.
    pub positions: Vec<Position>,
    /// Closed trade history.
    pub trades: Vec<Trade>,
    /// Realized plus unrealized P&L, quote currency.
    pub total_pnl: f64,
    /// Fraction of closed trades that were profitable (0 when no trades).
    pub win_rate: f64,
    /// Number of closed trades.
    pub trades_count: usize,
}

impl BotStats {
    /// Compute stats from a bot's current state.
    pub fn compute(id: &str, name: &str, positions: &[Position], trades: &[Trade]) -> Self {
        let realized: f64 = trades.iter().map(|t| t.pnl).sum();
        let unrealized: f64 = positions.iter().map(|p| p.pnl).sum();
        let wins = trades.iter().filter(|t| t.pnl > 0.0).count();
        let win_rate = sanitize(wins as f64 / trades.len() as f64);

        Self {
            id: id.to_string(),
            name: name.to_string(),
            positions: positions.to_vec(),
            trades: trades.to_vec(),
            total_pnl: sanitize(realized + unrealized),
            win_rate,
            trades_count: trades.len(),
        }
    }
}

/// Aggregated statistics across all bots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerStats {
    /// Sum of invested capital across bots.
    pub total_invested: f64,
    /// Invested capital plus combined P&L.
    pub total_value: f64,
    /// Combined realized plus unrealized P&L.
    pub combined_pnl: f64,
    /// Win rate across every bot's closed trades.
    pub combined_win_rate: f64,
    /// Per-bot stats, sorted by name.
    pub bots: Vec<BotStats>,
    /// Most recent trades across all bots, newest first.
    pub recent_trades: Vec<Trade>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;

    fn create_test_trade(pnl: f64, closed_at: i64) -> Trade {
        Trade {
            id: uuid::Uuid::new_v4().to_string(),
            position_id: "pos".to_string(),
            bot_id: "bot".to_string(),
            pair: "BTC/USDT".to_string(),
            side: Side::Long,
            amount: 0.1,
            position_size: 1_000.0,
            leverage: 10,
            entry_price: 100.0,
            exit_price: 101.0,
            pnl,
            pnl_percent: pnl / 10.0,
            opened_at: closed_at - 60_000,
            closed_at,
            duration_ms: 60_000,
        }
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize(1.5), 1.5);
        assert_eq!(sanitize(f64::NAN), 0.0);
        assert_eq!(sanitize(f64::INFINITY), 0.0);
        assert_eq!(sanitize(f64::NEG_INFINITY), 0.0);
        assert_eq!(sanitize(-3.0), -3.0);
    }

    #[test]
    fn test_compute_empty_history() {
        let stats = BotStats::compute("b1", "empty", &[], &[]);
        assert_eq!(stats.win_rate, 0.0);
        assert_eq!(stats.total_pnl, 0.0);
        assert_eq!(stats.trades_count, 0);
    }

    #[test]
    fn test_compute_win_rate_and_pnl() {
        let trades = vec![
            create_test_trade(10.0, 1_000),
            create_test_trade(-4.0, 2_000),
            create_test_trade(6.0, 3_000),
            create_test_trade(2.0, 4_000),
        ];
        let stats = BotStats::compute("b1", "bot", &[], &trades);

        assert_eq!(stats.trades_count, 4);
        assert!((stats.win_rate - 0.75).abs() < 1e-9);
        assert!((stats.total_pnl - 14.0).abs() < 1e-9);
    }
}
