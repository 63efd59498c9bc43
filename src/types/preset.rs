//! Preset types.
//!
//! A preset is the compressed, human-facing form of a bot configuration:
//! four inputs that the mapper expands into a full `BotConfig`.

use serde::{Deserialize, Serialize};

use super::{ConvergenceMode, RealismMode};

/// Trading character: the risk/return anchor a preset expands from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Character {
    /// Low leverage, high win rate, small steady outcomes.
    Conservative,
    /// Middle of the road.
    Moderate,
    /// High leverage, lower hit count but outsized winners.
    Aggressive,
}

impl Character {
    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Character::Conservative => "Conservative",
            Character::Moderate => "Moderate",
            Character::Aggressive => "Aggressive",
        }
    }

    /// Anchor win rate.
    pub fn base_win_rate(&self) -> f64 {
        match self {
            Character::Conservative => 0.55,
            Character::Moderate => 0.60,
            Character::Aggressive => 0.75,
        }
    }

    /// Leverage set the bot picks from.
    pub fn leverages(&self) -> Vec<u32> {
        match self {
            Character::Conservative => vec![5, 7, 10],
            Character::Moderate => vec![10, 15, 20],
            Character::Aggressive => vec![20, 35, 50],
        }
    }

    /// Mean loss magnitude as a fraction of mean win magnitude.
    pub fn loss_win_ratio(&self) -> f64 {
        match self {
            Character::Conservative => 0.9,
            Character::Moderate => 0.8,
            Character::Aggressive => 0.6,
        }
    }

    /// Maximum display slippage.
    pub fn max_slippage(&self) -> f64 {
        match self {
            Character::Conservative => 0.0005,
            Character::Moderate => 0.001,
            Character::Aggressive => 0.002,
        }
    }

    /// Realism mode used when the preset does not name one.
    pub fn default_realism(&self) -> RealismMode {
        match self {
            Character::Conservative => RealismMode::Smooth,
            Character::Moderate => RealismMode::Realistic,
            Character::Aggressive => RealismMode::Volatile,
        }
    }
}

impl std::fmt::Display for Character {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Character::Conservative => write!(f, "conservative"),
            Character::Moderate => write!(f, "moderate"),
            Character::Aggressive => write!(f, "aggressive"),
        }
    }
}

/// The four human inputs a preset consists of.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetInput {
    /// Daily P&L target as a percentage of invested capital.
    pub daily_target: f64,
    /// Expected trades per day.
    pub trades_per_day: u32,
    /// Risk/return anchor.
    pub character: Character,
    /// Drift-correction aggressiveness.
    pub convergence_mode: ConvergenceMode,
    /// Outcome clustering; derived from the character when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realism_mode: Option<RealismMode>,
}

/// Context the mapper needs beyond the preset itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetContext {
    /// Pairs the bot will trade.
    pub trading_pairs: Vec<String>,
    /// Capital base for P&L conversion.
    pub invested_capital: f64,
    /// Display name; generated from the character when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Bot id; a fresh UUID when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Seed for the bot's random source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_character_ladder_ordering() {
        assert!(Character::Conservative.base_win_rate() < Character::Moderate.base_win_rate());
        assert!(Character::Moderate.base_win_rate() < Character::Aggressive.base_win_rate());

        let max_lev = |c: Character| *c.leverages().iter().max().unwrap();
        assert!(max_lev(Character::Conservative) < max_lev(Character::Moderate));
        assert!(max_lev(Character::Moderate) < max_lev(Character::Aggressive));
    }

    #[test]
    fn test_character_serialization() {
        assert_eq!(
            serde_json::to_string(&Character::Conservative).unwrap(),
            "\"conservative\""
        );
        let back: Character = serde_json::from_str("\"aggressive\"").unwrap();
        assert_eq!(back, Character::Aggressive);
    }

    #[test]
    fn test_preset_input_optional_realism() {
        let json = r#"{"dailyTarget":2.5,"tradesPerDay":250,"character":"moderate","convergenceMode":"guaranteed"}"#;
        let input: PresetInput = serde_json::from_str(json).unwrap();
        assert!(input.realism_mode.is_none());
        assert_eq!(input.trades_per_day, 250);
    }
}
