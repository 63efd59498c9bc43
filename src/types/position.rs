//! Position and trade types.
//!
//! A `Position` is an open simulated leveraged trade owned by exactly one
//! bot. On close it is frozen into a `Trade`, the append-only history record
//! all statistics are derived from.

use serde::{Deserialize, Serialize};

/// Direction of a position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Long,
    Short,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

/// An open simulated trade.
///
/// The outcome script (`target_pnl_percent`, `planned_duration_ms`) is drawn
/// at open time; the close path settles against it regardless of interim
/// valuation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// Unique position ID.
    pub id: String,
    /// Owning bot ID.
    pub bot_id: String,
    /// Trading pair, e.g. "BTC/USDT".
    pub pair: String,
    /// Long or short.
    pub side: Side,
    /// Position size in base units (exposure / entry price).
    pub amount: f64,
    /// Committed margin in quote currency.
    pub position_size: f64,
    /// Leverage multiplier.
    pub leverage: u32,
    /// Entry price (display value, slippage applied).
    pub entry_price: f64,
    /// Latest price seen for the pair.
    pub current_price: f64,
    /// Unrealized P&L in quote currency.
    pub pnl: f64,
    /// Unrealized P&L as percent of position size.
    pub pnl_percent: f64,
    /// Stop-loss price.
    pub stop_loss: f64,
    /// Take-profit price.
    pub take_profit: f64,
    /// Open timestamp, epoch ms.
    pub opened_at: i64,
    /// Scripted final P&L percent, drawn at open time.
    pub target_pnl_percent: f64,
    /// Scripted lifetime, drawn at open time.
    pub planned_duration_ms: i64,
}

impl Position {
    /// Refresh valuation from a new price.
    pub fn update_price(&mut self, price: f64) {
        self.current_price = price;
        if self.entry_price <= 0.0 {
            return;
        }
        let move_pct = match self.side {
            Side::Long => (price - self.entry_price) / self.entry_price,
            Side::Short => (self.entry_price - price) / self.entry_price,
        };
        self.pnl_percent = move_pct * self.leverage as f64 * 100.0;
        self.pnl = self.position_size * self.pnl_percent / 100.0;
    }

    /// Whether the scripted lifetime has elapsed.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms - self.opened_at >= self.planned_duration_ms
    }

    /// Whether the current price has crossed the stop-loss barrier.
    pub fn crossed_stop_loss(&self) -> bool {
        match self.side {
            Side::Long => self.current_price <= self.stop_loss,
            Side::Short => self.current_price >= self.stop_loss,
        }
    }

    /// Whether the current price has crossed the take-profit barrier.
    pub fn crossed_take_profit(&self) -> bool {
        match self.side {
            Side::Long => self.current_price >= self.take_profit,
            Side::Short => self.current_price <= self.take_profit,
        }
    }

    /// Price at which this position shows the given P&L percent.
    pub fn price_at_pnl(&self, pnl_percent: f64) -> f64 {
        let leverage = self.leverage.max(1) as f64;
        let move_frac = pnl_percent / 100.0 / leverage;
        match self.side {
            Side::Long => self.entry_price * (1.0 + move_frac),
            Side::Short => self.entry_price * (1.0 - move_frac),
        }
    }
}

/// A closed position, retained as history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    /// Unique trade ID.
    pub id: String,
    /// ID of the position this trade closed.
    pub position_id: String,
    /// Owning bot ID.
    pub bot_id: String,
    /// Trading pair.
    pub pair: String,
    /// Long or short.
    pub side: Side,
    /// Position size in base units.
    pub amount: f64,
    /// Committed margin in quote currency.
    pub position_size: f64,
    /// Leverage multiplier.
    pub leverage: u32,
    /// Entry price.
    pub entry_price: f64,
    /// Exit price (display value, slippage applied).
    pub exit_price: f64,
    /// Realized P&L in quote currency.
    pub pnl: f64,
    /// Realized P&L as percent of position size.
    pub pnl_percent: f64,
    /// Open timestamp, epoch ms.
    pub opened_at: i64,
    /// Close timestamp, epoch ms.
    pub closed_at: i64,
    /// Actual lifetime in milliseconds.
    pub duration_ms: i64,
}

impl Trade {
    /// Freeze a position into a trade record.
    pub fn from_position(
        position: &Position,
        exit_price: f64,
        pnl: f64,
        pnl_percent: f64,
        closed_at: i64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            position_id: position.id.clone(),
            bot_id: position.bot_id.clone(),
            pair: position.pair.clone(),
            side: position.side,
            amount: position.amount,
            position_size: position.position_size,
            leverage: position.leverage,
            entry_price: position.entry_price,
            exit_price,
            pnl,
            pnl_percent,
            opened_at: position.opened_at,
            closed_at,
            duration_ms: closed_at - position.opened_at,
        }
    }
}
