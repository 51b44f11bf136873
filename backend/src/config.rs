use alloy::primitives::Address;
use anyhow::Context;
use std::env;
use std::str::FromStr;

pub const PEAQ_CHAIN_ID: u64 = 3338;
pub const DEFAULT_RPC_URL: &str = "https://peaq.api.onfinality.io/public";

#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub chain_id: u64,
    pub rpc_url: String,
    pub liquid_staking_address: Address,
    pub stpeaq_address: Address,
    // None keeps the admin write routes disabled
    pub server_private_key: Option<String>,
    // bearer token required on every admin route; None rejects them all
    pub admin_api_token: Option<String>,
    pub fetch_concurrency: usize,
    pub rpc_timeout_seconds: u64,
    pub tx_timeout_seconds: u64,
    pub logs_from_block: u64,
}

// hand-written so the signing key never ends up in logs
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("chain_id", &self.chain_id)
            .field("rpc_url", &self.rpc_url)
            .field("liquid_staking_address", &self.liquid_staking_address)
            .field("stpeaq_address", &self.stpeaq_address)
            .field("server_private_key", &self.server_private_key.as_ref().map(|_| "<redacted>"))
            .field("admin_api_token", &self.admin_api_token.as_ref().map(|_| "<redacted>"))
            .field("fetch_concurrency", &self.fetch_concurrency)
            .field("rpc_timeout_seconds", &self.rpc_timeout_seconds)
            .field("tx_timeout_seconds", &self.tx_timeout_seconds)
            .field("logs_from_block", &self.logs_from_block)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // fallback to backend/.env in case the working directory is the workspace root
        if env::var("LIQUID_STAKING_ADDRESS").is_err() {
            let env_path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
            let _ = dotenvy::from_path_override(&env_path);
        }

        let fetch_concurrency: usize = env::var("FETCH_CONCURRENCY")
            .unwrap_or_else(|_| "8".to_string())
            .parse()
            .context("FETCH_CONCURRENCY must be a positive integer")?;
        if fetch_concurrency == 0 {
            anyhow::bail!("FETCH_CONCURRENCY must be greater than zero");
        }

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid port number")?,
            chain_id: env::var("CHAIN_ID")
                .unwrap_or_else(|_| PEAQ_CHAIN_ID.to_string())
                .parse()
                .context("CHAIN_ID must be an integer")?,
            rpc_url: env::var("RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.to_string()),
            liquid_staking_address: required_address("LIQUID_STAKING_ADDRESS")?,
            stpeaq_address: required_address("STPEAQ_ADDRESS")?,
            // treating empty as unset, docker-compose passes "" for missing secrets
            server_private_key: env::var("SERVER_PRIVATE_KEY")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            admin_api_token: env::var("ADMIN_API_TOKEN")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            fetch_concurrency,
            rpc_timeout_seconds: env::var("RPC_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("RPC_TIMEOUT_SECONDS must be an integer")?,
            tx_timeout_seconds: env::var("TX_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .context("TX_TIMEOUT_SECONDS must be an integer")?,
            logs_from_block: env::var("LOGS_FROM_BLOCK")
                .unwrap_or_else(|_| "0".to_string())
                .parse()
                .context("LOGS_FROM_BLOCK must be a block number")?,
        })
    }
}

fn required_address(name: &str) -> anyhow::Result<Address> {
    let raw = env::var(name).with_context(|| format!("{name} is not set"))?;
    parse_address(&raw).with_context(|| format!("{name} is not a valid address"))
}

/// Parses a `0x`-prefixed, 20-byte hex address.
pub fn parse_address(raw: &str) -> anyhow::Result<Address> {
    let raw = raw.trim();
    if !raw.starts_with("0x") || raw.len() != 42 {
        anyhow::bail!("expected 0x followed by 40 hex characters, got {raw:?}");
    }
    Address::from_str(raw).map_err(|e| anyhow::anyhow!("invalid address {raw:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address_accepts_checksummed_and_lowercase() {
        let lower = parse_address("0x5fbdb2315678afecb367f032d93f642f64180aa3").unwrap();
        let mixed = parse_address("0x5FbDB2315678afecb367f032d93F642f64180aa3").unwrap();
        assert_eq!(lower, mixed);
    }

    #[test]
    fn test_parse_address_rejects_malformed() {
        assert!(parse_address("5fbdb2315678afecb367f032d93f642f64180aa3").is_err());
        assert!(parse_address("0x1234").is_err());
        assert!(parse_address("0xzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz").is_err());
        assert!(parse_address("").is_err());
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let config = Config {
            host: "0.0.0.0".to_string(),
            port: 8080,
            chain_id: PEAQ_CHAIN_ID,
            rpc_url: DEFAULT_RPC_URL.to_string(),
            liquid_staking_address: Address::ZERO,
            stpeaq_address: Address::ZERO,
            server_private_key: Some("deadbeef".to_string()),
            admin_api_token: Some("hunter2".to_string()),
            fetch_concurrency: 8,
            rpc_timeout_seconds: 30,
            tx_timeout_seconds: 120,
            logs_from_block: 0,
        };
        let printed = format!("{config:?}");
        assert!(!printed.contains("deadbeef"));
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("<redacted>"));
    }
}
