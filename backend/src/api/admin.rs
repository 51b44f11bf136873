//! Owner-only contract calls signed with the server key.
//!
//! The routes sit behind [`AdminAuth`](crate::middleware::AdminAuth). Each handler
//! validates its body, then hands one [`AdminAction`] to the configured
//! [`ChainWriter`](crate::chain::ChainWriter), which simulates, submits and waits for the
//! receipt.

use alloy::primitives::utils::parse_ether;
use alloy::primitives::U256;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::chain::AdminAction;
use crate::config::parse_address;
use crate::error::{Result, StakingError};
use crate::AppState;

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Serialize)]
pub struct TxResponse {
    pub success: bool,
    pub hash: String,
}

/// Accepts `"1.5"` or `1.5`; the frontend sends either.
fn decimal_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Decimal PEAQ to wei (18 decimals). `None` for missing, negative, malformed or zero.
pub fn parse_peaq_amount(value: Option<&Value>) -> Option<U256> {
    let raw = decimal_text(value)?;
    if raw.is_empty() || raw.starts_with('-') || raw.starts_with('+') {
        return None;
    }
    let wei = parse_ether(&raw).ok()?;
    (!wei.is_zero()).then_some(wei)
}

/// Days (fractional allowed) to whole seconds. `None` unless strictly positive.
pub fn parse_delay_days(value: Option<&Value>) -> Option<U256> {
    let days: f64 = decimal_text(value)?.parse().ok()?;
    if !days.is_finite() || days <= 0.0 {
        return None;
    }
    let seconds = (days * SECONDS_PER_DAY).round();
    if seconds < 1.0 || seconds > u64::MAX as f64 {
        return None;
    }
    Some(U256::from(seconds as u64))
}

async fn submit(state: &AppState, action: AdminAction) -> Result<Json<TxResponse>> {
    let writer = state
        .writer
        .as_ref()
        .ok_or(StakingError::SignerNotConfigured)?;

    tracing::info!("Submitting {}", action.name());
    let hash = writer.submit(action).await?;
    tracing::info!("Transaction hash: {}", hash);

    Ok(Json(TxResponse {
        success: true,
        hash: hash.to_string(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct SetStakingLimitRequest {
    #[serde(default)]
    pub limit: Option<Value>,
}

pub async fn set_staking_limit(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetStakingLimitRequest>,
) -> Result<Json<TxResponse>> {
    let limit = parse_peaq_amount(req.limit.as_ref())
        .ok_or_else(|| StakingError::InvalidInput("Invalid staking limit provided".to_string()))?;

    submit(&state, AdminAction::SetStakingLimit { limit }).await
}

// points stPEAQ's minter at the configured LiquidStaking contract, no body needed
pub async fn set_staking_contract(State(state): State<Arc<AppState>>) -> Result<Json<TxResponse>> {
    submit(&state, AdminAction::SetStakingContract).await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferOwnershipRequest {
    #[serde(default)]
    pub new_owner: Option<String>,
}

pub async fn transfer_ownership(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TransferOwnershipRequest>,
) -> Result<Json<TxResponse>> {
    let new_owner = req
        .new_owner
        .as_deref()
        .and_then(|raw| parse_address(raw).ok())
        .ok_or_else(|| StakingError::InvalidInput("Invalid address provided".to_string()))?;

    submit(&state, AdminAction::TransferOwnership { new_owner }).await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalDelayRequest {
    #[serde(default)]
    pub delay_days: Option<Value>,
}

pub async fn set_withdrawal_delay(
    State(state): State<Arc<AppState>>,
    Json(req): Json<WithdrawalDelayRequest>,
) -> Result<Json<TxResponse>> {
    let delay_seconds = parse_delay_days(req.delay_days.as_ref())
        .ok_or_else(|| StakingError::InvalidInput("Invalid withdrawal delay provided".to_string()))?;

    submit(&state, AdminAction::SetWithdrawalDelay { delay_seconds }).await
}

#[derive(Debug, Deserialize)]
pub struct CollatorWhitelistRequest {
    #[serde(default)]
    pub collator: Option<String>,
    #[serde(default)]
    pub whitelisted: Option<bool>,
}

pub async fn set_collator_whitelist(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CollatorWhitelistRequest>,
) -> Result<Json<TxResponse>> {
    let collator = req
        .collator
        .as_deref()
        .and_then(|raw| parse_address(raw).ok())
        .ok_or_else(|| StakingError::InvalidInput("Invalid collator address".to_string()))?;
    let whitelisted = req
        .whitelisted
        .ok_or_else(|| StakingError::InvalidInput("Whitelist status is required".to_string()))?;

    submit(
        &state,
        AdminAction::SetCollatorWhitelist {
            collator,
            whitelisted,
        },
    )
    .await
}

#[derive(Debug, Deserialize)]
pub struct DistributeRewardsRequest {
    #[serde(default)]
    pub amount: Option<Value>,
}

pub async fn distribute_rewards(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DistributeRewardsRequest>,
) -> Result<Json<TxResponse>> {
    let amount = parse_peaq_amount(req.amount.as_ref())
        .ok_or_else(|| StakingError::InvalidInput("Invalid reward amount provided".to_string()))?;

    submit(&state, AdminAction::DistributeRewards { amount }).await
}

#[derive(Debug, Deserialize)]
pub struct WithdrawStakedRequest {
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub collator: Option<String>,
}

/// Pulls delegated PEAQ back from a collator into the staking contract.
pub async fn withdraw_staked(
    State(state): State<Arc<AppState>>,
    Json(req): Json<WithdrawStakedRequest>,
) -> Result<Json<TxResponse>> {
    let amount = parse_peaq_amount(req.amount.as_ref())
        .ok_or_else(|| StakingError::InvalidInput("Invalid withdrawal amount provided".to_string()))?;
    let collator = req
        .collator
        .as_deref()
        .and_then(|raw| parse_address(raw).ok())
        .ok_or_else(|| StakingError::InvalidInput("Invalid collator address".to_string()))?;

    submit(&state, AdminAction::WithdrawStakedPeaq { amount, collator }).await
}
