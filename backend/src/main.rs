use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use anyhow::Context;
use dotenvy as dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod chain;
mod config;
mod error;
mod middleware;
mod withdrawals;

use chain::{ChainReader, ChainWriter, EvmChainClient, EvmChainWriter};
use config::Config;
use middleware::{AdminAuth, RateLimitLayer};
use withdrawals::WithdrawalFetcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // trying multiple .env locations since working directory differs between dev and prod
    let _ = dotenv::from_filename_override(".env");
    let _ = dotenv::from_filename_override(concat!(env!("CARGO_MANIFEST_DIR"), "/.env"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,staking_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting stPEAQ liquid staking backend");

    let config = Config::from_env().context("error with configuration")?;
    tracing::info!("Configuration loaded: {:?}", config);

    let reader = Arc::new(EvmChainClient::new(&config).context("Failed to initialize chain client")?);

    let writer: Option<Arc<dyn ChainWriter>> = match config.server_private_key.as_deref() {
        Some(key) => Some(Arc::new(
            EvmChainWriter::new(&config, key).context("Failed to initialize admin signer")?,
        )),
        None => {
            tracing::warn!("SERVER_PRIVATE_KEY not set, admin write routes will return 500");
            None
        }
    };

    if config.admin_api_token.is_none() {
        tracing::warn!("ADMIN_API_TOKEN not set, admin write routes will return 401");
    }

    let port = config.port;
    let host = config.host.clone();
    let app = app(AppState::new(config, reader, writer));

    // in case the configured port is taken, try a few more before giving up
    let ip: std::net::IpAddr = host
        .parse()
        .with_context(|| format!("HOST is not an IP address: {host}"))?;
    let mut listener = None;
    let mut candidate = port;

    for _ in 0..10u16 {
        let addr = SocketAddr::new(ip, candidate);
        match tokio::net::TcpListener::bind(&addr).await {
            Ok(l) => {
                listener = Some((addr, l));
                break;
            }
            Err(e) => {
                tracing::warn!("Failed to bind to {}: {} (trying next port)", addr, e);
                candidate = candidate.saturating_add(1);
            }
        }
    }

    let (addr, listener) = listener.ok_or_else(|| {
        anyhow::anyhow!(
            "Failed to bind to any port in range {}..{}",
            port,
            port.saturating_add(9)
        )
    })?;

    tracing::info!("Listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

pub struct AppState {
    pub config: Config,
    pub fetcher: WithdrawalFetcher,
    pub writer: Option<Arc<dyn ChainWriter>>,
}

impl AppState {
    pub fn new(
        config: Config,
        reader: Arc<dyn ChainReader>,
        writer: Option<Arc<dyn ChainWriter>>,
    ) -> Arc<Self> {
        let fetcher = WithdrawalFetcher::new(reader, config.fetch_concurrency);
        Arc::new(Self {
            config,
            fetcher,
            writer,
        })
    }
}

fn app(state: Arc<AppState>) -> Router {
    let rate_limit_read = Arc::new(RateLimitLayer::read_heavy());
    let rate_limit_admin = Arc::new(RateLimitLayer::admin());
    let admin_auth = Arc::new(AdminAuth::new(state.config.admin_api_token.as_deref()));

    // owner-only routes: token check inside, admin rate limit outermost so rejected
    // attempts are throttled too
    let admin_routes: Router<Arc<AppState>> = Router::new()
        .route("/api/set-staking-limit", post(api::admin::set_staking_limit))
        .route("/api/set-staking", post(api::admin::set_staking_contract))
        .route("/api/transfer-ownership", post(api::admin::transfer_ownership))
        .route("/api/withdrawal-delay", post(api::admin::set_withdrawal_delay))
        .route("/api/collator-whitelist", post(api::admin::set_collator_whitelist))
        .route("/api/distribute-rewards", post(api::admin::distribute_rewards))
        .route("/api/withdraw-staked", post(api::admin::withdraw_staked))
        .route_layer({
            let auth = admin_auth.clone();
            axum_middleware::from_fn(move |headers, req, next| {
                let auth = auth.clone();
                async move { auth.middleware(headers, req, next).await }
            })
        })
        .route_layer({
            let limiter = rate_limit_admin.clone();
            axum_middleware::from_fn(move |headers, req, next| {
                let limiter = limiter.clone();
                async move { limiter.middleware(headers, req, next).await }
            })
        });

    let read_routes: Router<Arc<AppState>> = Router::new()
        .route("/api/withdrawals", get(api::withdrawals::list_withdrawals))
        .route("/api/withdrawals/summary", get(api::withdrawals::daily_summary))
        .route("/api/withdrawals/grouped", get(api::withdrawals::grouped_withdrawals))
        .route("/api/balances/breakdown", get(api::balances::get_breakdown))
        .route("/api/balances/:address", get(api::balances::get_account_balance))
        .route("/api/staking", get(api::balances::get_staking_info))
        .route_layer({
            let limiter = rate_limit_read.clone();
            axum_middleware::from_fn(move |headers, req, next| {
                let limiter = limiter.clone();
                async move { limiter.middleware(headers, req, next).await }
            })
        });

    Router::new()
        .merge(admin_routes)
        .merge(read_routes)
        .route("/health", get(api::health::health_check))
        .route("/config/public", get(api::health::public_config))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
