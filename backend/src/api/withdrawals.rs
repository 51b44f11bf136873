use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use super::{iso8601, unix_now};
use crate::withdrawals::{
    group_by_unlock_date, pending_daily_summaries, Withdrawal, WithdrawalSnapshot, WithdrawalStatus,
};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestView {
    pub amount: String,
    pub unlock_time: String,
    pub is_claimable: bool,
}

#[derive(Debug, Serialize)]
pub struct HolderView {
    pub address: String,
    pub requests: Vec<RequestView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummaryView {
    pub date: String,
    pub total_amount: String,
    pub request_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalView {
    pub address: String,
    pub amount: String,
    pub unlock_time: String,
    pub status: WithdrawalStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayView {
    pub date: String,
    pub total_amount: String,
    pub count: usize,
    pub status: WithdrawalStatus,
    pub withdrawals: Vec<WithdrawalView>,
}

impl From<&Withdrawal> for WithdrawalView {
    fn from(w: &Withdrawal) -> Self {
        Self {
            address: w.holder.to_string(),
            amount: w.amount.to_string(),
            unlock_time: iso8601(w.unlock_time),
            status: w.status,
        }
    }
}

fn holder_views(snapshot: &WithdrawalSnapshot) -> Vec<HolderView> {
    snapshot
        .holders
        .iter()
        .map(|entry| HolderView {
            address: entry.holder.to_string(),
            requests: entry
                .requests
                .iter()
                .map(|request| RequestView {
                    amount: request.amount.to_string(),
                    unlock_time: iso8601(request.unlock_time),
                    is_claimable: WithdrawalStatus::classify(request.unlock_time, snapshot.now)
                        .is_claimable(),
                })
                .collect(),
        })
        .collect()
}

fn fetch_failed() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "success": false,
            "error": "Failed to fetch withdrawals",
        })),
    )
        .into_response()
}

async fn snapshot(state: &AppState) -> Option<WithdrawalSnapshot> {
    match state.fetcher.fetch(unix_now()).await {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            tracing::error!("Error in withdrawals route: {}", e);
            None
        }
    }
}

/// GET /api/withdrawals - every holder's requests with claimability
pub async fn list_withdrawals(State(state): State<Arc<AppState>>) -> Response {
    let Some(snapshot) = snapshot(&state).await else {
        return fetch_failed();
    };

    Json(Envelope {
        success: true,
        data: holder_views(&snapshot),
    })
    .into_response()
}

/// GET /api/withdrawals/summary - future claims per unlock day
pub async fn daily_summary(State(state): State<Arc<AppState>>) -> Response {
    let Some(snapshot) = snapshot(&state).await else {
        return fetch_failed();
    };

    let data: Vec<DailySummaryView> = pending_daily_summaries(&snapshot.withdrawals)
        .into_iter()
        .map(|summary| DailySummaryView {
            date: summary.date,
            total_amount: summary.total_amount.to_string(),
            request_count: summary.request_count,
        })
        .collect();

    Json(Envelope { success: true, data }).into_response()
}

/// GET /api/withdrawals/grouped - all requests bucketed by unlock day
pub async fn grouped_withdrawals(State(state): State<Arc<AppState>>) -> Response {
    let Some(snapshot) = snapshot(&state).await else {
        return fetch_failed();
    };

    let data: Vec<DayView> = group_by_unlock_date(&snapshot.withdrawals)
        .into_iter()
        .map(|(date, bucket)| DayView {
            status: bucket.status(),
            count: bucket.withdrawals.len(),
            total_amount: bucket.total_amount.to_string(),
            withdrawals: bucket.withdrawals.iter().map(WithdrawalView::from).collect(),
            date,
        })
        .collect();

    Json(Envelope { success: true, data }).into_response()
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
    const BOB: Address = address!("00000000000000000000000000000000000000b0");
    const DAY: u64 = 86_400;

    fn request(amount: u64, unlock_time: u64) -> WithdrawalRequest {
        WithdrawalRequest {
            amount: U256::from(amount),
            unlock_time,
        }
    }

    #[tokio::test]
    async fn test_list_withdrawals_shape() {
        let past = 1_709_251_200;
        let future = unix_now() + 30 * DAY;
        let chain = MockChain::default()
            .with_holder(ALICE, vec![request(1_000_000_000_000_000_000, past), request(5, future)]);

        let (status, body) = send(router(chain, None), get("/api/withdrawals")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["address"], ALICE.to_string());

        let requests = data[0]["requests"].as_array().unwrap();
        assert_eq!(requests[0]["amount"], "1000000000000000000");
        assert_eq!(requests[0]["unlockTime"], "2024-03-01T00:00:00.000Z");
        assert_eq!(requests[0]["isClaimable"], true);
        assert_eq!(requests[1]["isClaimable"], false);
    }

    #[tokio::test]
    async fn test_list_withdrawals_skips_failing_holder() {
        let chain = MockChain::default()
            .with_failing_holder(ALICE)
            .with_holder(BOB, vec![request(3, 1_709_251_200)]);

        let (status, body) = send(router(chain, None), get("/api/withdrawals")).await;
        assert_eq!(status, StatusCode::OK);
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["address"], BOB.to_string());
    }

    #[tokio::test]
    async fn test_list_withdrawals_scan_failure() {
        let chain = MockChain::default().with_failing_transfer_scan();

        let (status, body) = send(router(chain, None), get("/api/withdrawals")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Failed to fetch withdrawals");
    }

    #[tokio::test]
    async fn test_empty_chain_returns_empty_data() {
        for uri in ["/api/withdrawals", "/api/withdrawals/summary", "/api/withdrawals/grouped"] {
            let (status, body) = send(router(MockChain::default(), None), get(uri)).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(body["data"], serde_json::json!([]), "{uri}");
        }
    }

    #[tokio::test]
    async fn test_summary_only_counts_pending() {
        // noon UTC a few days out, so both requests share a calendar day
        let day_start = (unix_now() / DAY + 3) * DAY;
        let chain = MockChain::default()
            .with_holder(ALICE, vec![request(10, day_start + 3_600), request(99, 1_709_251_200)])
            .with_holder(BOB, vec![request(15, day_start + 7_200)]);

        let (status, body) = send(router(chain, None), get("/api/withdrawals/summary")).await;
        assert_eq!(status, StatusCode::OK);

        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["totalAmount"], "25");
        assert_eq!(data[0]["requestCount"], 2);
    }

    #[tokio::test]
    async fn test_grouped_sorted_with_status() {
        let future = unix_now() + 10 * DAY;
        let chain = MockChain::default()
            .with_holder(ALICE, vec![request(4, future), request(6, 1_709_251_200)]);

        let (status, body) = send(router(chain, None), get("/api/withdrawals/grouped")).await;
        assert_eq!(status, StatusCode::OK);

        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["date"], "2024-03-01");
        assert_eq!(data[0]["status"], "completed");
        assert_eq!(data[0]["count"], 1);
        assert_eq!(data[1]["status"], "pending");
        assert_eq!(data[1]["withdrawals"][0]["amount"], "4");
    }
}
