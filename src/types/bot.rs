//! Bot configuration types.
//!
//! Types describing one simulated trading bot: its targets, trading
//! envelope, outcome bounds, and the partial-update form used by the API.

use serde::{Deserialize, Serialize};

/// How aggressively the engine corrects random drift toward the daily target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConvergenceMode {
    /// Target is a loose attractor; variance dominates (~80% adherence).
    Natural,
    /// Moderate steering toward target (~90% adherence).
    Assisted,
    /// Target is closely tracked (~95% adherence).
    Guaranteed,
}

impl ConvergenceMode {
    /// Gain applied to the per-trade correction (0..1).
    pub fn gain(&self) -> f64 {
        match self {
            ConvergenceMode::Natural => 0.35,
            ConvergenceMode::Assisted => 0.70,
            ConvergenceMode::Guaranteed => 0.95,
        }
    }

    /// Ceiling on the expected per-trade correction before the validator
    /// flags the configuration.
    pub fn correction_ceiling(&self) -> f64 {
        match self {
            ConvergenceMode::Natural => 0.05,
            ConvergenceMode::Assisted => 0.10,
            ConvergenceMode::Guaranteed => 0.15,
        }
    }
}

impl std::fmt::Display for ConvergenceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConvergenceMode::Natural => write!(f, "natural"),
            ConvergenceMode::Assisted => write!(f, "assisted"),
            ConvergenceMode::Guaranteed => write!(f, "guaranteed"),
        }
    }
}

/// How tightly individual trade outcomes cluster within their bounds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RealismMode {
    /// Outcomes cluster tightly near the center of the bound range.
    Smooth,
    /// Outcomes spread across the range, weighted toward the center.
    Realistic,
    /// Outcomes spread uniformly out to the extremes.
    Volatile,
}

impl std::fmt::Display for RealismMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RealismMode::Smooth => write!(f, "smooth"),
            RealismMode::Realistic => write!(f, "realistic"),
            RealismMode::Volatile => write!(f, "volatile"),
        }
    }
}

/// Which sides a bot is allowed to open.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AllowedSides {
    Long,
    Short,
    Both,
}

impl std::fmt::Display for AllowedSides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllowedSides::Long => write!(f, "long"),
            AllowedSides::Short => write!(f, "short"),
            AllowedSides::Both => write!(f, "both"),
        }
    }
}

/// Full configuration for one simulated trading bot.
///
/// Deserializes leniently: omitted fields fall back to [`Default`], so API
/// callers only need to send the fields they care about.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BotConfig {
    /// Unique bot ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Capital base used to convert P&L percentages to currency amounts.
    pub invested_capital: f64,
    /// Trading pairs this bot opens positions on (non-empty).
    pub trading_pairs: Vec<String>,
    /// Sides the bot may open.
    pub allowed_sides: AllowedSides,
    /// Leverage values the bot picks from (non-empty).
    pub leverages: Vec<u32>,
    /// Target fraction of winning trades, exclusive (0, 1).
    pub win_rate: f64,
    /// Target daily return as a percentage of invested capital.
    pub daily_target_percent: f64,
    /// Expected number of trades per day.
    pub trades_per_day: u32,
    /// Minimum position size in quote currency.
    pub min_position_size: f64,
    /// Maximum position size in quote currency.
    pub max_position_size: f64,
    /// Maximum concurrently open positions.
    pub max_concurrent_positions: usize,
    /// Probability of opening a position on a tick with free capacity (0, 1].
    pub open_frequency: f64,
    /// Smallest winning trade P&L, percent of position size (> 0).
    pub win_pnl_min: f64,
    /// Largest winning trade P&L, percent of position size (> 0).
    pub win_pnl_max: f64,
    /// Worst losing trade P&L, percent of position size (< 0).
    pub loss_pnl_min: f64,
    /// Mildest losing trade P&L, percent of position size (< 0).
    pub loss_pnl_max: f64,
    /// Minimum position lifetime in milliseconds.
    pub min_duration_ms: i64,
    /// Maximum position lifetime in milliseconds.
    pub max_duration_ms: i64,
    /// Maximum relative slippage applied to displayed entry/exit prices [0, 1).
    pub max_slippage: f64,
    /// Drift-correction aggressiveness.
    pub convergence_mode: ConvergenceMode,
    /// Outcome clustering behavior.
    pub realism_mode: RealismMode,
    /// Seed for the bot's random source; system entropy when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Created timestamp.
    pub created_at: i64,
    /// Last updated timestamp.
    pub updated_at: i64,
}

impl Default for BotConfig {
    fn default() -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: String::new(),
            invested_capital: 10_000.0,
            trading_pairs: vec![],
            allowed_sides: AllowedSides::Both,
            leverages: vec![10, 15, 20],
            win_rate: 0.6,
            daily_target_percent: 1.0,
            trades_per_day: 100,
            min_position_size: 500.0,
            max_position_size: 1_500.0,
            max_concurrent_positions: 3,
            open_frequency: 0.005,
            win_pnl_min: 0.2,
            win_pnl_max: 0.6,
            loss_pnl_min: -0.5,
            loss_pnl_max: -0.15,
            min_duration_ms: 60_000,
            max_duration_ms: 1_800_000,
            max_slippage: 0.001,
            convergence_mode: ConvergenceMode::Assisted,
            realism_mode: RealismMode::Realistic,
            seed: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl BotConfig {
    /// Create a config with default trading parameters and the given identity.
    pub fn new(name: String, trading_pairs: Vec<String>, invested_capital: f64) -> Self {
        Self {
            name,
            trading_pairs,
            invested_capital,
            ..Default::default()
        }
    }

    /// Rebuild this config with default trading parameters, keeping identity
    /// fields (id, name, pairs, capital, creation time) intact.
    pub fn reset_to_defaults(&self) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            trading_pairs: self.trading_pairs.clone(),
            invested_capital: self.invested_capital,
            created_at: self.created_at,
            seed: self.seed,
            ..Default::default()
        }
    }
}

/// Partial configuration update. Only the provided fields are merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotConfigUpdate {
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Capital base.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invested_capital: Option<f64>,
    /// Trading pairs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trading_pairs: Option<Vec<String>>,
    /// Allowed sides.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_sides: Option<AllowedSides>,
    /// Leverage set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leverages: Option<Vec<u32>>,
    /// Target win rate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win_rate: Option<f64>,
    /// Daily target percent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_target_percent: Option<f64>,
    /// Trades per day.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trades_per_day: Option<u32>,
    /// Minimum position size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_position_size: Option<f64>,
    /// Maximum position size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_position_size: Option<f64>,
    /// Maximum concurrent positions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent_positions: Option<usize>,
    /// Open probability per tick.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_frequency: Option<f64>,
    /// Winning P&L lower bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win_pnl_min: Option<f64>,
    /// Winning P&L upper bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win_pnl_max: Option<f64>,
    /// Losing P&L lower bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loss_pnl_min: Option<f64>,
    /// Losing P&L upper bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loss_pnl_max: Option<f64>,
    /// Minimum duration in ms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_duration_ms: Option<i64>,
    /// Maximum duration in ms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_duration_ms: Option<i64>,
    /// Maximum display slippage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_slippage: Option<f64>,
    /// Convergence mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convergence_mode: Option<ConvergenceMode>,
    /// Realism mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realism_mode: Option<RealismMode>,
    /// Random seed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl BotConfigUpdate {
    /// Apply updates to a config.
    pub fn apply_to(&self, config: &mut BotConfig) {
        if let Some(v) = &self.name {
            config.name = v.clone();
        }
        if let Some(v) = self.invested_capital {
            config.invested_capital = v;
        }
        if let Some(v) = &self.trading_pairs {
            config.trading_pairs = v.clone();
        }
        if let Some(v) = self.allowed_sides {
            config.allowed_sides = v;
        }
        if let Some(v) = &self.leverages {
            config.leverages = v.clone();
        }
        if let Some(v) = self.win_rate {
            config.win_rate = v;
        }
        if let Some(v) = self.daily_target_percent {
            config.daily_target_percent = v;
        }
        if let Some(v) = self.trades_per_day {
            config.trades_per_day = v;
        }
        if let Some(v) = self.min_position_size {
            config.min_position_size = v;
        }
        if let Some(v) = self.max_position_size {
            config.max_position_size = v;
        }
        if let Some(v) = self.max_concurrent_positions {
            config.max_concurrent_positions = v;
        }
        if let Some(v) = self.open_frequency {
            config.open_frequency = v;
        }
        if let Some(v) = self.win_pnl_min {
            config.win_pnl_min = v;
        }
        if let Some(v) = self.win_pnl_max {
            config.win_pnl_max = v;
        }
        if let Some(v) = self.loss_pnl_min {
            config.loss_pnl_min = v;
        }
        if let Some(v) = self.loss_pnl_max {
            config.loss_pnl_max = v;
        }
        if let Some(v) = self.min_duration_ms {
            config.min_duration_ms = v;
        }
        if let Some(v) = self.max_duration_ms {
            config.max_duration_ms = v;
        }
        if let Some(v) = self.max_slippage {
            config.max_slippage = v;
        }
        if let Some(v) = self.convergence_mode {
            config.convergence_mode = v;
        }
        if let Some(v) = self.realism_mode {
            config.realism_mode = v;
        }
        if let Some(v) = self.seed {
            config.seed = Some(v);
        }
        config.updated_at = chrono::Utc::now().timestamp_millis();
    }
}

/// Persisted state for one bot: config plus accumulated history and the
/// intra-day convergence ledger, so a restart resumes mid-day tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotRecord {
    /// Bot configuration.
    pub config: BotConfig,
    /// Open positions at persist time.
    pub positions: Vec<super::Position>,
    /// Closed trade history.
    pub trades: Vec<super::Trade>,
    /// Epoch day of the ledger below.
    #[serde(default)]
    pub day_stamp: i64,
    /// Realized P&L accumulated today, quote currency.
    #[serde(default)]
    pub realized_today: f64,
    /// Trades closed today.
    #[serde(default)]
    pub trades_today: u32,
}
