use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use super::unix_now;
use crate::config::parse_address;
use crate::error::{Result, StakingError};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownResponse {
    pub total_staked: String,
    pub with_collators: String,
    pub pending_withdrawal: String,
    pub available_for_staking: String,
}

/// GET /api/balances/breakdown - where the pool's staked PEAQ currently sits
pub async fn get_breakdown(State(state): State<Arc<AppState>>) -> Result<Json<BreakdownResponse>> {
    let breakdown = state.fetcher.breakdown(unix_now()).await?;

    Ok(Json(BreakdownResponse {
        total_staked: breakdown.total_staked.to_string(),
        with_collators: breakdown.with_collators.to_string(),
        pending_withdrawal: breakdown.pending_withdrawal.to_string(),
        available_for_staking: breakdown.available_for_staking.to_string(),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalanceResponse {
    pub address: String,
    pub st_peaq: String,
    pub native: String,
}

/// GET /api/balances/:address - stPEAQ and native PEAQ held by a wallet
pub async fn get_account_balance(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Json<AccountBalanceResponse>> {
    let account = parse_address(&address)
        .map_err(|_| StakingError::InvalidInput("Invalid address provided".to_string()))?;

    let reader = state.fetcher.reader();
    let (st_peaq, native) = tokio::try_join!(
        reader.receipt_token_balance(account),
        reader.native_balance(account),
    )?;

    Ok(Json(AccountBalanceResponse {
        address: account.to_string(),
        st_peaq: st_peaq.to_string(),
        native: native.to_string(),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StakingInfoResponse {
    pub total_staked: String,
    pub staking_limit: String,
}

/// GET /api/staking - pool totals and the configured cap
pub async fn get_staking_info(State(state): State<Arc<AppState>>) -> Result<Json<StakingInfoResponse>> {
    let reader = state.fetcher.reader();
    let (total_staked, staking_limit) =
        tokio::try_join!(reader.total_staked(), reader.staking_limit())?;

    Ok(Json(StakingInfoResponse {
        total_staked: total_staked.to_string(),
        staking_limit: staking_limit.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{get, router, send};
    use crate::api::unix_now;
    use crate::chain::mock::MockChain;
    use crate::chain::WithdrawalRequest;
    use alloy::primitives::{address, Address, U256};
    use axum::http::StatusCode;

    const ALICE: Address = address!("00000000000000000000000000000000000000a1");

    #[tokio::test]
    async fn test_breakdown() {
        let chain = MockChain::default()
            .with_total_staked(100)
            .with_contract_balance(60)
            .with_holder(
                ALICE,
                vec![WithdrawalRequest {
                    amount: U256::from(20u64),
                    unlock_time: unix_now() + 86_400,
                }],
            );

        let (status, body) = send(router(chain, None), get("/api/balances/breakdown")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalStaked"], "100");
        assert_eq!(body["withCollators"], "40");
        assert_eq!(body["pendingWithdrawal"], "20");
        assert_eq!(body["availableForStaking"], "40");
    }

    #[tokio::test]
    async fn test_breakdown_inconsistent_is_bad_gateway() {
        let chain = MockChain::default()
            .with_total_staked(10)
            .with_contract_balance(0)
            .with_holder(
                ALICE,
                vec![WithdrawalRequest {
                    amount: U256::from(1u64),
                    unlock_time: unix_now() + 86_400,
                }],
            );

        let (status, body) = send(router(chain, None), get("/api/balances/breakdown")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "Inconsistent on-chain balances");
    }

    #[tokio::test]
    async fn test_account_balance() {
        let chain = MockChain::default().with_balances(ALICE, 7, 9);
        let uri = format!("/api/balances/{}", ALICE);

        let (status, body) = send(router(chain, None), get(&uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stPeaq"], "7");
        assert_eq!(body["native"], "9");
    }

    #[tokio::test]
    async fn test_account_balance_rejects_bad_address() {
        let (status, body) = send(router(MockChain::default(), None), get("/api/balances/not-an-address")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid address provided");
    }

    #[tokio::test]
    async fn test_staking_info() {
        let chain = MockChain::default().with_total_staked(500).with_staking_limit(1_000);
        let (status, body) = send(router(chain, None), get("/api/staking")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalStaked"], "500");
        assert_eq!(body["stakingLimit"], "1000");
    }
}
