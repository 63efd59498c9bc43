//! Tests for configuration validation and preset expansion.
//!
//! Tests cover:
//! - Structural checks (orderings, ranges, non-empty sets)
//! - Achievability of the daily target within configured P&L bounds
//! - Preset expansion into full configs
//! - Wire-format compatibility of configs

use marionette::services::{map_preset, validate};
use marionette::types::*;

fn base_config() -> BotConfig {
    BotConfig::new(
        "Validator Test".to_string(),
        vec!["BTC/USDT".to_string()],
        10_000.0,
    )
}

// =============================================================================
// Structural Checks
// =============================================================================

mod structural_tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let result = validate(&base_config());
        assert!(result.valid, "unexpected issues: {:?}", result.issues);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_empty_trading_pairs_rejected() {
        let mut config = base_config();
        config.trading_pairs.clear();

        let result = validate(&config);
        assert!(!result.valid);
        assert!(result.issues.iter().any(|i| i.contains("tradingPairs")));
    }

    #[test]
    fn test_zero_leverage_rejected() {
        let mut config = base_config();
        config.leverages = vec![10, 0, 20];

        let result = validate(&config);
        assert!(!result.valid);
        assert!(result.issues.iter().any(|i| i.contains("leverages")));
    }

    #[test]
    fn test_win_rate_must_be_strictly_inside_unit_interval() {
        for win_rate in [0.0, 1.0, -0.2, 1.5] {
            let mut config = base_config();
            config.win_rate = win_rate;

            let result = validate(&config);
            assert!(!result.valid, "winRate {} should be rejected", win_rate);
            assert!(result.issues.iter().any(|i| i.contains("winRate")));
        }
    }

    #[test]
    fn test_inverted_position_sizes_rejected() {
        let mut config = base_config();
        config.min_position_size = 2_000.0;
        config.max_position_size = 500.0;

        let result = validate(&config);
        assert!(!result.valid);
        assert!(result
            .issues
            .iter()
            .any(|i| i.contains("minPositionSize") && i.contains("maxPositionSize")));
    }

    #[test]
    fn test_inverted_win_bounds_rejected() {
        let mut config = base_config();
        config.win_pnl_min = 0.9;
        config.win_pnl_max = 0.3;

        let result = validate(&config);
        assert!(!result.valid);
        assert!(result
            .issues
            .iter()
            .any(|i| i.contains("winPnlMin") && i.contains("winPnlMax")));
    }

    #[test]
    fn test_inverted_loss_bounds_rejected() {
        let mut config = base_config();
        config.loss_pnl_min = -0.1;
        config.loss_pnl_max = -0.4;

        let result = validate(&config);
        assert!(!result.valid);
        assert!(result
            .issues
            .iter()
            .any(|i| i.contains("lossPnlMin") && i.contains("lossPnlMax")));
    }

    #[test]
    fn test_positive_loss_bound_rejected() {
        let mut config = base_config();
        config.loss_pnl_max = 0.2;

        let result = validate(&config);
        assert!(!result.valid);
        assert!(result.issues.iter().any(|i| i.contains("lossPnlMax")));
    }

    #[test]
    fn test_inverted_durations_rejected() {
        let mut config = base_config();
        config.min_duration_ms = 600_000;
        config.max_duration_ms = 60_000;

        let result = validate(&config);
        assert!(!result.valid);
        assert!(result
            .issues
            .iter()
            .any(|i| i.contains("minDurationMs") && i.contains("maxDurationMs")));
    }

    #[test]
    fn test_slippage_range_rejected() {
        for slippage in [-0.01, 1.0] {
            let mut config = base_config();
            config.max_slippage = slippage;

            let result = validate(&config);
            assert!(!result.valid, "maxSlippage {} should be rejected", slippage);
            assert!(result.issues.iter().any(|i| i.contains("maxSlippage")));
        }
    }

    #[test]
    fn test_all_issues_reported_at_once() {
        let mut config = base_config();
        config.trading_pairs.clear();
        config.trades_per_day = 0;
        config.win_pnl_min = 0.9;
        config.win_pnl_max = 0.3;

        let result = validate(&config);
        assert!(!result.valid);
        assert!(result.issues.len() >= 3);
    }

    #[test]
    fn test_structural_failure_skips_achievability() {
        let mut config = base_config();
        config.trading_pairs.clear();

        let result = validate(&config);
        assert_eq!(result.max_correction_percent, 0.0);
    }
}

// =============================================================================
// Achievability
// =============================================================================

mod achievability_tests {
    use super::*;

    #[test]
    fn test_default_config_correction_is_moderate() {
        let result = validate(&base_config());

        assert!(result.valid);
        assert!(result.max_correction_percent > 0.0);
        assert!(result.max_correction_percent < 0.5);
    }

    #[test]
    fn test_unreachable_target_is_hard_issue() {
        let mut config = base_config();
        config.daily_target_percent = 50.0;
        config.trades_per_day = 10;

        let result = validate(&config);
        assert!(!result.valid);
        assert!(result.issues.iter().any(|i| i.contains("unreachable")));
        assert!(result.max_correction_percent > 0.5);
    }

    #[test]
    fn test_mode_ceiling_changes_the_verdict_texture() {
        // Same bounds, same target; only the convergence mode differs. The
        // gap sits between the natural and guaranteed ceilings.
        let mut config = base_config();
        config.daily_target_percent = 1.5;

        config.convergence_mode = ConvergenceMode::Natural;
        let natural = validate(&config);
        assert!(natural.valid);
        assert!(natural
            .warnings
            .iter()
            .any(|w| w.contains("exceeds") && w.contains("natural")));

        config.convergence_mode = ConvergenceMode::Guaranteed;
        let guaranteed = validate(&config);
        assert!(guaranteed.valid);
        assert!(!guaranteed.warnings.iter().any(|w| w.contains("exceeds")));
    }

    #[test]
    fn test_correction_grows_with_target() {
        let mut config = base_config();
        let low = validate(&config).max_correction_percent;

        config.daily_target_percent = 3.0;
        let high = validate(&config).max_correction_percent;

        assert!(high > low);
    }

    #[test]
    fn test_correction_shrinks_with_trade_count() {
        // More trades mean less binomial drift to absorb per trade.
        let mut config = base_config();
        config.trades_per_day = 25;
        let sparse = validate(&config).max_correction_percent;

        config.trades_per_day = 400;
        let dense = validate(&config).max_correction_percent;

        assert!(dense < sparse);
    }
}

// =============================================================================
// Preset Expansion
// =============================================================================

mod preset_tests {
    use super::*;

    fn preset(character: Character, mode: ConvergenceMode) -> PresetInput {
        PresetInput {
            daily_target: 2.5,
            trades_per_day: 250,
            character,
            convergence_mode: mode,
            realism_mode: None,
        }
    }

    fn context() -> PresetContext {
        PresetContext {
            trading_pairs: vec!["BTC/USDT".to_string(), "ETH/USDT".to_string()],
            invested_capital: 10_000.0,
            name: None,
            id: None,
            seed: None,
        }
    }

    #[test]
    fn test_every_preset_expands_to_a_valid_config() {
        for character in [
            Character::Conservative,
            Character::Moderate,
            Character::Aggressive,
        ] {
            for mode in [
                ConvergenceMode::Natural,
                ConvergenceMode::Assisted,
                ConvergenceMode::Guaranteed,
            ] {
                let config = map_preset(&preset(character, mode), &context());
                let result = validate(&config);
                assert!(
                    result.valid,
                    "{} {} preset produced issues: {:?}",
                    character, mode, result.issues
                );
            }
        }
    }

    #[test]
    fn test_preset_correction_stays_under_natural_ceiling() {
        // Presets put the expected per-trade P&L exactly on target, so the
        // only correction left is binomial drift, and at 250 trades/day
        // that fits even the tightest ceiling.
        for character in [
            Character::Conservative,
            Character::Moderate,
            Character::Aggressive,
        ] {
            let config = map_preset(&preset(character, ConvergenceMode::Natural), &context());
            let result = validate(&config);
            assert!(
                result.max_correction_percent <= 0.05,
                "{} correction {} above natural ceiling",
                character,
                result.max_correction_percent
            );
        }
    }

    #[test]
    fn test_sparse_preset_warns_but_stays_valid() {
        let input = PresetInput {
            daily_target: 2.5,
            trades_per_day: 10,
            character: Character::Moderate,
            convergence_mode: ConvergenceMode::Natural,
            realism_mode: None,
        };

        let config = map_preset(&input, &context());
        let result = validate(&config);
        assert!(result.valid);
        assert!(result.max_correction_percent > 0.05);
        assert!(!result.warnings.is_empty());
    }

    #[test]
    fn test_position_sizes_scale_with_capital() {
        let mut ctx = context();
        ctx.invested_capital = 50_000.0;
        let config = map_preset(&preset(Character::Moderate, ConvergenceMode::Assisted), &ctx);

        assert_eq!(config.min_position_size, 2_500.0);
        assert_eq!(config.max_position_size, 7_500.0);
        assert_eq!(config.invested_capital, 50_000.0);
    }

    #[test]
    fn test_context_identity_is_honored() {
        let input = preset(Character::Aggressive, ConvergenceMode::Guaranteed);
        let ctx = PresetContext {
            trading_pairs: vec!["SOL/USDT".to_string()],
            invested_capital: 2_500.0,
            name: Some("Custom Name".to_string()),
            id: Some("bot-test-1".to_string()),
            seed: Some(99),
        };

        let config = map_preset(&input, &ctx);
        assert_eq!(config.id, "bot-test-1");
        assert_eq!(config.name, "Custom Name");
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.trading_pairs, vec!["SOL/USDT".to_string()]);
    }
}

// =============================================================================
// Wire Format
// =============================================================================

mod wire_format_tests {
    use super::*;

    #[test]
    fn test_config_serializes_camel_case() {
        let config = base_config();
        let json = serde_json::to_string(&config).unwrap();

        assert!(json.contains("\"investedCapital\""));
        assert!(json.contains("\"dailyTargetPercent\""));
        assert!(json.contains("\"winPnlMin\""));
        assert!(json.contains("\"maxConcurrentPositions\""));
        assert!(json.contains("\"convergenceMode\":\"assisted\""));
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = map_preset(
            &PresetInput {
                daily_target: 1.8,
                trades_per_day: 120,
                character: Character::Conservative,
                convergence_mode: ConvergenceMode::Assisted,
                realism_mode: Some(RealismMode::Volatile),
            },
            &PresetContext {
                trading_pairs: vec!["BTC/USDT".to_string()],
                invested_capital: 7_500.0,
                name: Some("Round Trip".to_string()),
                id: Some("round-trip".to_string()),
                seed: Some(7),
            },
        );

        let json = serde_json::to_string(&config).unwrap();
        let back: BotConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_partial_config_json_fills_defaults() {
        // API callers may send only the fields they care about.
        let json = r#"{
            "name": "Sparse",
            "tradingPairs": ["BTC/USDT"],
            "investedCapital": 5000.0,
            "dailyTargetPercent": 2.0
        }"#;

        let config: BotConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.name, "Sparse");
        assert_eq!(config.daily_target_percent, 2.0);
        // Everything omitted falls back to defaults.
        assert_eq!(config.trades_per_day, 100);
        assert_eq!(config.win_rate, 0.6);
        assert_eq!(config.convergence_mode, ConvergenceMode::Assisted);
    }

    #[test]
    fn test_validation_result_shape() {
        let mut config = base_config();
        config.daily_target_percent = 50.0;
        config.trades_per_day = 10;

        let result = validate(&config);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"valid\":false"));
        assert!(json.contains("\"maxCorrectionPercent\""));
    }
}
