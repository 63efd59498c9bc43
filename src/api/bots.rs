//! Bot management API
//!
//! Endpoints for creating, inspecting, and tuning simulated bots:
//!
//! Fleet:
//! - GET /api/bots - Aggregate stats across all bots
//! - POST /api/bots - Create a bot from a full config
//! - POST /api/bots/preset - Create a bot from a preset
//! - POST /api/bots/validate - Validate a config without saving
//!
//! Single bot:
//! - GET /api/bots/:id - Bot stats (positions, trades, P&L)
//! - GET /api/bots/:id/config - Current configuration
//! - PATCH /api/bots/:id/config - Merge a partial config update
//! - POST /api/bots/:id/reset - Restore default trading parameters
//! - POST /api/bots/:id/clear - Drop positions and trade history
//! - DELETE /api/bots/:id - Remove the bot entirely

use axum::{
    extract::{Path, State},
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::services::validator::validate;
use crate::types::{
    BotConfig, BotConfigUpdate, BotStats, ManagerStats, PresetContext, PresetInput,
    ValidationResult,
};
use crate::AppState;

/// Create the bots router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_all_stats))
        .route("/", post(create_bot))
        .route("/preset", post(create_from_preset))
        .route("/validate", post(validate_config))
        .route("/:id", get(get_bot))
        .route("/:id", delete(delete_bot))
        .route("/:id/config", get(get_config))
        .route("/:id/config", patch(update_config))
        .route("/:id/reset", post(reset_config))
        .route("/:id/clear", post(clear_history))
}

#[derive(Debug, Deserialize)]
pub struct CreateFromPresetRequest {
    pub preset: PresetInput,
    pub context: PresetContext,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBotResponse {
    pub bot: BotStats,
    pub validation: ValidationResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetBotResponse {
    pub bot: BotStats,
    pub config: BotConfig,
    pub validation: ValidationResult,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub success: bool,
}

/// GET /api/bots
///
/// Aggregate stats across every bot.
async fn get_all_stats(State(state): State<AppState>) -> Json<ManagerStats> {
    Json(state.manager.get_all_stats())
}

/// POST /api/bots
///
/// Create a bot from a full configuration. Rejected with the validator's
/// issues when the config is unsound; warnings ride along on success.
async fn create_bot(
    State(state): State<AppState>,
    Json(config): Json<BotConfig>,
) -> Result<Json<CreateBotResponse>> {
    let (bot, validation) = state.manager.create_bot(config).await?;
    Ok(Json(CreateBotResponse { bot, validation }))
}

/// POST /api/bots/preset
///
/// Expand a preset into a full config and create the bot from it. The
/// response includes the expanded config so the caller can see what the
/// preset actually produced.
async fn create_from_preset(
    State(state): State<AppState>,
    Json(request): Json<CreateFromPresetRequest>,
) -> Result<Json<PresetBotResponse>> {
    let (bot, validation) = state
        .manager
        .create_from_preset(&request.preset, &request.context)
        .await?;
    let config = state
        .manager
        .get_config(&bot.id)
        .ok_or_else(|| AppError::Internal(format!("bot {} missing after creation", bot.id)))?;
    Ok(Json(PresetBotResponse {
        bot,
        config,
        validation,
    }))
}

/// POST /api/bots/validate
///
/// Validate a configuration without saving anything. Always 200; the
/// verdict is in the body.
async fn validate_config(Json(config): Json<BotConfig>) -> Json<ValidationResult> {
    Json(validate(&config))
}

/// GET /api/bots/:id
async fn get_bot(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BotStats>> {
    state
        .manager
        .get_bot(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Bot not found: {}", id)))
}

/// GET /api/bots/:id/config
async fn get_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BotConfig>> {
    state
        .manager
        .get_config(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Bot not found: {}", id)))
}

/// PATCH /api/bots/:id/config
///
/// Merge a partial update into the bot's config. The merged result must
/// pass validation or nothing changes.
async fn update_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<BotConfigUpdate>,
) -> Result<Json<BotConfig>> {
    let config = state.manager.update_config(&id, &update).await?;
    Ok(Json(config))
}

/// POST /api/bots/:id/reset
///
/// Restore default trading parameters, keeping identity and history.
async fn reset_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BotConfig>> {
    let config = state.manager.reset_config(&id).await?;
    Ok(Json(config))
}

/// POST /api/bots/:id/clear
///
/// Drop accumulated positions and trades, keeping the config.
async fn clear_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ActionResponse>> {
    state.manager.clear_history(&id).await?;
    Ok(Json(ActionResponse { success: true }))
}

/// DELETE /api/bots/:id
async fn delete_bot(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ActionResponse>> {
    state.manager.delete_bot(&id).await?;
    Ok(Json(ActionResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_request_deserialization() {
        let json = r#"{
            "preset": {
                "dailyTarget": 2.5,
                "tradesPerDay": 250,
                "character": "moderate",
                "convergenceMode": "guaranteed"
            },
            "context": {
                "tradingPairs": ["BTC/USDT"],
                "investedCapital": 10000.0
            }
        }"#;

        let request: CreateFromPresetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.preset.trades_per_day, 250);
        assert_eq!(request.context.trading_pairs, vec!["BTC/USDT".to_string()]);
        assert!(request.context.seed.is_none());
    }

    #[test]
    fn test_action_response_serialization() {
        let json = serde_json::to_string(&ActionResponse { success: true }).unwrap();
        assert_eq!(json, r#"{"success":true}"#);
    }
}
