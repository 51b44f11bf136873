//! In-memory chain for unit and handler tests.

use alloy::primitives::{address, Address, TxHash, U256};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::{AdminAction, ChainReader, ChainWriter, TokenTransfer, WithdrawalRequest};
use crate::error::{Result, StakingError};

pub const MOCK_LIQUID_STAKING: Address = address!("1000000000000000000000000000000000000001");

#[derive(Default)]
pub struct MockChain {
    transfers: Vec<TokenTransfer>,
    requests: HashMap<Address, Vec<WithdrawalRequest>>,
    failing_holders: HashSet<Address>,
    fail_transfer_scan: bool,
    total_staked: U256,
    staking_limit: U256,
    contract_balance: U256,
    token_balances: HashMap<Address, U256>,
    native_balances: HashMap<Address, U256>,
}

impl MockChain {
    pub fn mint(to: Address, value: u64) -> TokenTransfer {
        TokenTransfer {
            from: Address::ZERO,
            to,
            value: U256::from(value),
        }
    }

    pub fn transfer(from: Address, to: Address, value: u64) -> TokenTransfer {
        TokenTransfer {
            from,
            to,
            value: U256::from(value),
        }
    }

    pub fn with_holder(mut self, holder: Address, requests: Vec<WithdrawalRequest>) -> Self {
        self.transfers.push(Self::mint(holder, 1));
        self.requests.insert(holder, requests);
        self
    }

    pub fn with_failing_holder(mut self, holder: Address) -> Self {
        self.transfers.push(Self::mint(holder, 1));
        self.failing_holders.insert(holder);
        self
    }

    pub fn with_failing_transfer_scan(mut self) -> Self {
        self.fail_transfer_scan = true;
        self
    }

    pub fn with_total_staked(mut self, amount: u64) -> Self {
        self.total_staked = U256::from(amount);
        self
    }

    pub fn with_staking_limit(mut self, amount: u64) -> Self {
        self.staking_limit = U256::from(amount);
        self
    }

    pub fn with_contract_balance(mut self, amount: u64) -> Self {
        self.contract_balance = U256::from(amount);
        self
    }

    pub fn with_balances(mut self, account: Address, token: u64, native: u64) -> Self {
        self.token_balances.insert(account, U256::from(token));
        self.native_balances.insert(account, U256::from(native));
        self
    }
}

#[async_trait]
impl ChainReader for MockChain {
    async fn receipt_token_transfers(&self) -> Result<Vec<TokenTransfer>> {
        if self.fail_transfer_scan {
            return Err(StakingError::Chain("eth_getLogs: connection refused".to_string()));
        }
        Ok(self.transfers.clone())
    }

    async fn withdrawal_requests(&self, holder: Address) -> Result<Vec<WithdrawalRequest>> {
        if self.failing_holders.contains(&holder) {
            return Err(StakingError::Chain(format!("getWithdrawalRequests reverted for {holder}")));
        }
        Ok(self.requests.get(&holder).cloned().unwrap_or_default())
    }

    async fn total_staked(&self) -> Result<U256> {
        Ok(self.total_staked)
    }

    async fn staking_limit(&self) -> Result<U256> {
        Ok(self.staking_limit)
    }

    async fn receipt_token_balance(&self, account: Address) -> Result<U256> {
        Ok(self.token_balances.get(&account).copied().unwrap_or_default())
    }

    async fn native_balance(&self, account: Address) -> Result<U256> {
        if account == MOCK_LIQUID_STAKING {
            return Ok(self.contract_balance);
        }
        Ok(self.native_balances.get(&account).copied().unwrap_or_default())
    }

    fn liquid_staking_address(&self) -> Address {
        MOCK_LIQUID_STAKING
    }
}

/// Records submitted actions and hands back a fixed hash.
#[derive(Default)]
pub struct RecordingWriter {
    pub submitted: Mutex<Vec<AdminAction>>,
    pub fail_with: Option<String>,
}

impl RecordingWriter {
    pub const HASH: TxHash = TxHash::repeat_byte(0xab);

    pub fn failing(reason: &str) -> Self {
        Self {
            submitted: Mutex::new(Vec::new()),
            fail_with: Some(reason.to_string()),
        }
    }
}

#[async_trait]
impl ChainWriter for RecordingWriter {
    async fn submit(&self, action: AdminAction) -> Result<TxHash> {
        self.submitted.lock().unwrap().push(action);
        match &self.fail_with {
            Some(reason) => Err(StakingError::TransactionFailed(reason.clone())),
            None => Ok(Self::HASH),
        }
    }
}
