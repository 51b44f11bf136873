use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::AppState;

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "stPEAQ Liquid Staking Backend",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicConfigResponse {
    pub chain_id: u64,
    pub rpc_url: String,
    pub liquid_staking_address: String,
    pub st_peaq_address: String,
    pub admin_writes_enabled: bool,
}

// contract addresses and the public RPC are what the frontend needs to build its own client
pub async fn public_config(State(state): State<Arc<AppState>>) -> Json<PublicConfigResponse> {
    let config = &state.config;
    Json(PublicConfigResponse {
        chain_id: config.chain_id,
        rpc_url: config.rpc_url.clone(),
        liquid_staking_address: config.liquid_staking_address.to_string(),
        st_peaq_address: config.stpeaq_address.to_string(),
        admin_writes_enabled: state.writer.is_some() && config.admin_api_token.is_some(),
    })
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{get, router, send};
    use crate::chain::mock::MockChain;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health_check() {
        let (status, body) = send(router(MockChain::default(), None), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_public_config_exposes_chain() {
        let (status, body) = send(router(MockChain::default(), None), get("/config/public")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["chainId"], 3338);
        assert_eq!(body["adminWritesEnabled"], false);
        assert!(body["liquidStakingAddress"].as_str().unwrap().starts_with("0x"));
        assert!(body.get("serverPrivateKey").is_none());
    }
}
