use axum::{
    extract::{ConnectInfo, Request},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::{
    net::{IpAddr, SocketAddr},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{SystemTime, UNIX_EPOCH},
};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub limit: u32,
    pub window_secs: u64,
    pub burst_size: u32,
    // distinct client keys tracked per window; new keys past this share one bucket
    pub max_entries: usize,
    pub trust_wallet_header: bool,
}

const OVERFLOW_KEY: &str = "overflow";

impl RateLimitConfig {
    // withdrawal views fan out into one RPC call per holder, so these stay modest
    pub fn read_heavy() -> Self {
        Self {
            limit: 120,
            window_secs: 60,
            burst_size: 30,
            max_entries: 10_000,
            trust_wallet_header: true,
        }
    }

    pub fn admin() -> Self {
        Self {
            limit: 20,
            window_secs: 60,
            burst_size: 5,
            max_entries: 1_000,
            // the wallet header is caller-controlled, admin keys on the client address only
            trust_wallet_header: false,
        }
    }
}

#[derive(Debug, Clone)]
struct WindowEntry {
    count: u32,
    window_start: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: u64,
}

/// Fixed-window limiter keyed per client, shared by every route it wraps.
#[derive(Clone)]
pub struct RateLimitLayer {
    store: Arc<DashMap<String, WindowEntry>>,
    last_sweep: Arc<AtomicU64>,
    config: RateLimitConfig,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl RateLimitLayer {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            last_sweep: Arc::new(AtomicU64::new(0)),
            config,
        }
    }

    pub fn read_heavy() -> Self {
        Self::new(RateLimitConfig::read_heavy())
    }

    pub fn admin() -> Self {
        Self::new(RateLimitConfig::admin())
    }

    fn check(&self, key: &str, now: u64) -> RateLimitResult {
        let window_secs = self.config.window_secs.max(1);
        let window_start = (now / window_secs) * window_secs;
        let reset_at = window_start + window_secs;
        let total_limit = self.config.limit + self.config.burst_size;

        self.sweep_stale(window_start);

        let key = if self.store.len() >= self.config.max_entries.max(1) && !self.store.contains_key(key) {
            OVERFLOW_KEY
        } else {
            key
        };

        let mut entry = self.store.entry(key.to_string()).or_insert(WindowEntry {
            count: 0,
            window_start,
        });

        if entry.window_start < window_start {
            entry.count = 0;
            entry.window_start = window_start;
        }

        if entry.count >= total_limit {
            return RateLimitResult {
                allowed: false,
                limit: total_limit,
                remaining: 0,
                reset_at,
            };
        }

        entry.count += 1;

        RateLimitResult {
            allowed: true,
            limit: total_limit,
            remaining: total_limit.saturating_sub(entry.count),
            reset_at,
        }
    }

    /// Drops entries from earlier windows, once per window rollover.
    fn sweep_stale(&self, window_start: u64) {
        let last = self.last_sweep.load(Ordering::Relaxed);
        if last >= window_start {
            return;
        }
        if self
            .last_sweep
            .compare_exchange(last, window_start, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
        {
            let before = self.store.len();
            self.store.retain(|_, e| e.window_start >= window_start);
            debug!("Rate limit sweep dropped {} stale entries", before.saturating_sub(self.store.len()));
        }
    }

    pub async fn middleware(&self, headers: HeaderMap, request: Request, next: Next) -> Response {
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let key = client_key(&headers, peer, self.config.trust_wallet_header);
        let result = self.check(&key, unix_now());

        if !result.allowed {
            debug!("Rate limit exceeded for {}", key);
            return rate_limit_exceeded_response(&result);
        }

        let mut response = next.run(request).await;
        add_rate_limit_headers(&mut response, &result);
        response
    }
}

/// Wallet header (when trusted), then proxy headers, then the socket peer, then a shared
/// anonymous bucket.
fn client_key(headers: &HeaderMap, peer: Option<IpAddr>, trust_wallet_header: bool) -> String {
    if trust_wallet_header {
        if let Some(wallet) = headers
            .get("x-wallet-address")
            .and_then(|h| h.to_str().ok())
            .filter(|w| !w.is_empty())
        {
            return format!("wallet:{}", wallet.to_ascii_lowercase());
        }
    }

    let ip = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
        })
        .or(peer);

    match ip {
        Some(ip) => format!("ip:{}", ip),
        None => "ip:unknown".to_string(),
    }
}

fn add_rate_limit_headers(response: &mut Response, result: &RateLimitResult) {
    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", HeaderValue::from(result.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(result.remaining));
    headers.insert("x-ratelimit-reset", HeaderValue::from(result.reset_at));
}

fn rate_limit_exceeded_response(result: &RateLimitResult) -> Response {
    let retry_after = result.reset_at.saturating_sub(unix_now());

    let body = serde_json::json!({
        "error": "Rate limit exceeded",
        "message": format!("Too many requests. Please try again in {} seconds.", retry_after),
        "limit": result.limit,
        "reset_at": result.reset_at,
        "retry_after": retry_after,
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, axum::Json(body)).into_response();
    add_rate_limit_headers(&mut response, result);
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    response
}
