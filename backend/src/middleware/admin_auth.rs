use alloy::primitives::{keccak256, B256};
use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::StakingError;

/// Bearer-token gate for the routes that sign with the server key.
///
/// Only the keccak digest of the configured token is kept; presented tokens are hashed
/// before comparing.
#[derive(Clone)]
pub struct AdminAuth {
    token_hash: Option<B256>,
}

impl AdminAuth {
    pub fn new(token: Option<&str>) -> Self {
        Self {
            token_hash: token.map(|t| keccak256(t.as_bytes())),
        }
    }

    fn authorize(&self, headers: &HeaderMap) -> bool {
        match (self.token_hash, bearer_token(headers)) {
            (Some(expected), Some(presented)) => keccak256(presented.as_bytes()) == expected,
            _ => false,
        }
    }

    pub async fn middleware(&self, headers: HeaderMap, request: Request, next: Next) -> Response {
        if !self.authorize(&headers) {
            return StakingError::Unauthorized.into_response();
        }
        next.run(request).await
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(auth: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static(auth));
        headers
    }

    #[test]
    fn test_matching_bearer_token() {
        let auth = AdminAuth::new(Some("s3cret"));
        assert!(auth.authorize(&headers_with("Bearer s3cret")));
        assert!(!auth.authorize(&headers_with("Bearer wrong")));
        assert!(!auth.authorize(&headers_with("s3cret")));
        assert!(!auth.authorize(&HeaderMap::new()));
    }

    #[test]
    fn test_unconfigured_token_rejects_everything() {
        let auth = AdminAuth::new(None);
        assert!(!auth.authorize(&headers_with("Bearer ")));
        assert!(!auth.authorize(&headers_with("Bearer anything")));
    }
}
