use alloy::eips::BlockNumberOrTag;
use alloy::network::{ReceiptResponse, TransactionBuilder};
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::SolEvent;
use alloy::transports::{TransportError, TransportResult};
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use std::future::IntoFuture;
use std::time::Duration;

use super::{AdminAction, ChainReader, ChainWriter, ILiquidStaking, IStPeaq, TokenTransfer, WithdrawalRequest};
use crate::config::Config;
use crate::error::{Result, StakingError};

/// Read-only client over the public RPC endpoint.
pub struct EvmChainClient {
    provider: DynProvider,
    liquid_staking: Address,
    stpeaq: Address,
    logs_from_block: u64,
    timeout: Duration,
}

impl EvmChainClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let url = config
            .rpc_url
            .parse()
            .with_context(|| format!("Invalid RPC URL: {}", config.rpc_url))?;

        tracing::info!("RPC URL: {}", config.rpc_url);
        tracing::info!("LiquidStaking: {}", config.liquid_staking_address);
        tracing::info!("stPEAQ: {}", config.stpeaq_address);

        let provider = ProviderBuilder::new().connect_http(url).erased();

        Ok(Self {
            provider,
            liquid_staking: config.liquid_staking_address,
            stpeaq: config.stpeaq_address,
            logs_from_block: config.logs_from_block,
            timeout: Duration::from_secs(config.rpc_timeout_seconds),
        })
    }
}

// every chain read is bounded so a stalled node can't pin a request forever
async fn bounded<T, E, F>(timeout: Duration, what: &str, fut: F) -> Result<T>
where
    F: IntoFuture<Output = std::result::Result<T, E>>,
    E: std::fmt::Display,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(StakingError::Chain(format!("{what}: {e}"))),
        Err(_) => Err(StakingError::Chain(format!(
            "{what}: timed out after {}s",
            timeout.as_secs()
        ))),
    }
}

#[async_trait]
impl ChainReader for EvmChainClient {
    async fn receipt_token_transfers(&self) -> Result<Vec<TokenTransfer>> {
        let filter = Filter::new()
            .address(self.stpeaq)
            .event_signature(IStPeaq::Transfer::SIGNATURE_HASH)
            .from_block(self.logs_from_block)
            .to_block(BlockNumberOrTag::Latest);

        let logs = bounded(
            self.timeout,
            "eth_getLogs(stPEAQ Transfer)",
            self.provider.get_logs(&filter),
        )
        .await?;

        let mut transfers = Vec::with_capacity(logs.len());
        for log in logs {
            match log.log_decode::<IStPeaq::Transfer>() {
                Ok(decoded) => {
                    let event = decoded.inner.data;
                    transfers.push(TokenTransfer {
                        from: event.from,
                        to: event.to,
                        value: event.value,
                    });
                }
                // a log matching the topic but not the layout is not a holder signal
                Err(e) => tracing::warn!("Skipping undecodable Transfer log: {}", e),
            }
        }

        tracing::debug!("Fetched {} stPEAQ Transfer logs", transfers.len());
        Ok(transfers)
    }

    async fn withdrawal_requests(&self, holder: Address) -> Result<Vec<WithdrawalRequest>> {
        let staking = ILiquidStaking::new(self.liquid_staking, self.provider.clone());
        let call = staking.getWithdrawalRequests(holder);
        let raw = bounded(self.timeout, "getWithdrawalRequests", call.call()).await?;

        Ok(raw.into_iter().map(WithdrawalRequest::from).collect())
    }

    async fn total_staked(&self) -> Result<U256> {
        let staking = ILiquidStaking::new(self.liquid_staking, self.provider.clone());
        let call = staking.getTotalStaked();
        bounded(self.timeout, "getTotalStaked", call.call()).await
    }

    async fn staking_limit(&self) -> Result<U256> {
        let staking = ILiquidStaking::new(self.liquid_staking, self.provider.clone());
        let call = staking.stakingLimit();
        bounded(self.timeout, "stakingLimit", call.call()).await
    }

    async fn receipt_token_balance(&self, account: Address) -> Result<U256> {
        let token = IStPeaq::new(self.stpeaq, self.provider.clone());
        let call = token.balanceOf(account);
        bounded(self.timeout, "balanceOf", call.call()).await
    }

    async fn native_balance(&self, account: Address) -> Result<U256> {
        bounded(
            self.timeout,
            "eth_getBalance",
            self.provider.get_balance(account),
        )
        .await
    }

    fn liquid_staking_address(&self) -> Address {
        self.liquid_staking
    }
}

// JSON-RPC error replies (revert, nonce, funds) are tx failures; the rest is transport
fn rpc_failure(what: &str, e: TransportError) -> StakingError {
    if e.is_error_resp() {
        StakingError::TransactionFailed(format!("{what}: {e}"))
    } else {
        StakingError::Chain(format!("{what}: {e}"))
    }
}

async fn bounded_rpc<T, F>(timeout: Duration, what: &str, fut: F) -> Result<T>
where
    F: IntoFuture<Output = TransportResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(rpc_failure(what, e)),
        Err(_) => Err(StakingError::Chain(format!(
            "{what}: timed out after {}s",
            timeout.as_secs()
        ))),
    }
}

/// Signs owner-only calls with `SERVER_PRIVATE_KEY`.
pub struct EvmChainWriter {
    provider: DynProvider,
    signer_address: Address,
    liquid_staking: Address,
    stpeaq: Address,
    rpc_timeout: Duration,
    tx_timeout: Duration,
}

impl EvmChainWriter {
    pub fn new(config: &Config, private_key: &str) -> anyhow::Result<Self> {
        let signer: PrivateKeySigner = private_key
            .trim()
            .parse()
            .map_err(|e| anyhow!("Failed to parse SERVER_PRIVATE_KEY: {}", e))?;
        let signer_address = signer.address();

        let url = config
            .rpc_url
            .parse()
            .with_context(|| format!("Invalid RPC URL: {}", config.rpc_url))?;

        let provider = ProviderBuilder::new()
            .with_chain_id(config.chain_id)
            .wallet(signer)
            .connect_http(url)
            .erased();

        tracing::info!("Admin signer: {}", signer_address);

        Ok(Self {
            provider,
            signer_address,
            liquid_staking: config.liquid_staking_address,
            stpeaq: config.stpeaq_address,
            rpc_timeout: Duration::from_secs(config.rpc_timeout_seconds),
            tx_timeout: Duration::from_secs(config.tx_timeout_seconds),
        })
    }
}

#[async_trait]
impl ChainWriter for EvmChainWriter {
    async fn submit(&self, action: AdminAction) -> Result<TxHash> {
        let call = action.encode(self.liquid_staking, self.stpeaq);
        let tx = TransactionRequest::default()
            .with_from(self.signer_address)
            .with_to(call.to)
            .with_input(call.input)
            .with_value(call.value);

        // simulate first so reverts come back with a reason instead of a burnt tx
        let simulation = format!("{} simulation", action.name());
        bounded_rpc(self.rpc_timeout, &simulation, self.provider.call(tx.clone())).await?;

        let submit = format!("{} submit", action.name());
        let pending = bounded_rpc(self.rpc_timeout, &submit, self.provider.send_transaction(tx)).await?;

        tracing::info!("{} submitted: {}", action.name(), pending.tx_hash());

        let receipt_wait = format!("{} receipt", action.name());
        let receipt = bounded(self.tx_timeout, &receipt_wait, pending.get_receipt()).await?;

        if !receipt.status() {
            return Err(StakingError::TransactionFailed(format!(
                "{} reverted on-chain in {}",
                action.name(),
                receipt.transaction_hash()
            )));
        }

        Ok(receipt.transaction_hash())
    }
}
