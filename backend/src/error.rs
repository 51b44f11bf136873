use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StakingError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Chain RPC error: {0}")]
    Chain(String),

    #[error("Inconsistent pool balances: total_staked={total_staked}, with_collators={with_collators}, pending_withdrawal={pending_withdrawal}")]
    InconsistentBalances {
        total_staked: String,
        with_collators: String,
        pending_withdrawal: String,
    },

    #[error("Missing or invalid admin token")]
    Unauthorized,

    #[error("Server private key not configured")]
    SignerNotConfigured,

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

}

impl StakingError {
    pub fn status(&self) -> StatusCode {
        match self {
            StakingError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            StakingError::Unauthorized => StatusCode::UNAUTHORIZED,
            StakingError::Chain(_) | StakingError::InconsistentBalances { .. } => {
                StatusCode::BAD_GATEWAY
            }
            StakingError::SignerNotConfigured | StakingError::TransactionFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for StakingError {
    fn into_response(self) -> Response {
        let error_message = match &self {
            // the validation message is the user-facing error for bad requests
            StakingError::InvalidInput(msg) => {
                tracing::warn!("Invalid input: {}", msg);
                msg.as_str()
            }
            StakingError::Unauthorized => {
                tracing::warn!("Rejected admin request without a valid token");
                "Unauthorized"
            }
            StakingError::Chain(_) => {
                tracing::error!("Chain RPC error: {}", self);
                "Blockchain communication error"
            }
            StakingError::InconsistentBalances { .. } => {
                tracing::error!("{}", self);
                "Inconsistent on-chain balances"
            }
            StakingError::SignerNotConfigured => {
                tracing::error!("Admin write attempted without a signing key");
                "Server private key not configured"
            }
            StakingError::TransactionFailed(_) => {
                tracing::error!("Transaction failed: {}", self);
                "Transaction failed"
            }
        };

        let body = Json(json!({
            "error": error_message,
            "details": self.to_string(),
        }));

        (self.status(), body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, StakingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(StakingError::InvalidInput("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(StakingError::Chain("timeout".into()).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(StakingError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            StakingError::SignerNotConfigured.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_into_response_keeps_status() {
        let response = StakingError::InvalidInput("bad limit".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
