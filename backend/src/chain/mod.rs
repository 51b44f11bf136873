//! Ports to the Peaq chain.
//!
//! Everything that talks to the RPC node goes through [`ChainReader`] or
//! [`ChainWriter`]; handlers and the withdrawal fetcher only ever see the traits, so
//! tests can swap in an in-memory chain.

pub mod client;
#[cfg(test)]
pub mod mock;

use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use async_trait::async_trait;

use crate::error::Result;

pub use client::{EvmChainClient, EvmChainWriter};

sol! {
    #[sol(rpc)]
    interface ILiquidStaking {
        struct WithdrawalRequest {
            uint256 amount;
            uint256 unlockTime;
        }

        function getWithdrawalRequests(address user) external view returns (WithdrawalRequest[] memory);
        function getTotalStaked() external view returns (uint256);
        function stakingLimit() external view returns (uint256);

        function setStakingLimit(uint256 limit) external;
        function setWithdrawalDelay(uint256 delay) external;
        function setCollatorWhitelist(address collator, bool status) external;
        function distributeRewards() external payable;
        function withdrawStakedPEAQ(uint256 amount, address collator) external;
        function transferOwnership(address newOwner) external;
    }

    #[sol(rpc)]
    interface IStPeaq {
        event Transfer(address indexed from, address indexed to, uint256 value);

        function balanceOf(address account) external view returns (uint256);
        function setStakingContract(address stakingContract) external;
    }
}

/// One entry of `LiquidStaking.getWithdrawalRequests`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawalRequest {
    pub amount: U256,
    pub unlock_time: u64,
}

impl From<ILiquidStaking::WithdrawalRequest> for WithdrawalRequest {
    fn from(raw: ILiquidStaking::WithdrawalRequest) -> Self {
        Self {
            amount: raw.amount,
            // anything past u64 seconds is "never" for our purposes
            unlock_time: raw.unlockTime.saturating_to::<u64>(),
        }
    }
}

/// A decoded stPEAQ `Transfer` log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenTransfer {
    pub from: Address,
    pub to: Address,
    pub value: U256,
}

#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Every stPEAQ `Transfer` log from the configured start block to latest.
    async fn receipt_token_transfers(&self) -> Result<Vec<TokenTransfer>>;

    async fn withdrawal_requests(&self, holder: Address) -> Result<Vec<WithdrawalRequest>>;

    async fn total_staked(&self) -> Result<U256>;

    async fn staking_limit(&self) -> Result<U256>;

    /// stPEAQ balance of `account`.
    async fn receipt_token_balance(&self, account: Address) -> Result<U256>;

    /// Native PEAQ balance of `account`.
    async fn native_balance(&self, account: Address) -> Result<U256>;

    /// Address of the `LiquidStaking` contract this reader is bound to.
    fn liquid_staking_address(&self) -> Address;
}

/// Owner-only contract calls submitted with the server key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminAction {
    SetStakingLimit { limit: U256 },
    SetStakingContract,
    TransferOwnership { new_owner: Address },
    SetWithdrawalDelay { delay_seconds: U256 },
    SetCollatorWhitelist { collator: Address, whitelisted: bool },
    DistributeRewards { amount: U256 },
    WithdrawStakedPeaq { amount: U256, collator: Address },
}

/// Target, calldata and attached value of a contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub to: Address,
    pub input: Bytes,
    pub value: U256,
}

impl AdminAction {
    pub fn name(&self) -> &'static str {
        match self {
            AdminAction::SetStakingLimit { .. } => "setStakingLimit",
            AdminAction::SetStakingContract => "setStakingContract",
            AdminAction::TransferOwnership { .. } => "transferOwnership",
            AdminAction::SetWithdrawalDelay { .. } => "setWithdrawalDelay",
            AdminAction::SetCollatorWhitelist { .. } => "setCollatorWhitelist",
            AdminAction::DistributeRewards { .. } => "distributeRewards",
            AdminAction::WithdrawStakedPeaq { .. } => "withdrawStakedPEAQ",
        }
    }

    pub fn encode(&self, liquid_staking: Address, stpeaq: Address) -> ContractCall {
        let staking_call = |input: Vec<u8>| ContractCall {
            to: liquid_staking,
            input: input.into(),
            value: U256::ZERO,
        };

        match self {
            AdminAction::SetStakingLimit { limit } => {
                staking_call(ILiquidStaking::setStakingLimitCall { limit: *limit }.abi_encode())
            }
            AdminAction::SetStakingContract => ContractCall {
                to: stpeaq,
                input: IStPeaq::setStakingContractCall {
                    stakingContract: liquid_staking,
                }
                .abi_encode()
                .into(),
                value: U256::ZERO,
            },
            AdminAction::TransferOwnership { new_owner } => staking_call(
                ILiquidStaking::transferOwnershipCall {
                    newOwner: *new_owner,
                }
                .abi_encode(),
            ),
            AdminAction::SetWithdrawalDelay { delay_seconds } => staking_call(
                ILiquidStaking::setWithdrawalDelayCall {
                    delay: *delay_seconds,
                }
                .abi_encode(),
            ),
            AdminAction::SetCollatorWhitelist {
                collator,
                whitelisted,
            } => staking_call(
                ILiquidStaking::setCollatorWhitelistCall {
                    collator: *collator,
                    status: *whitelisted,
                }
                .abi_encode(),
            ),
            AdminAction::DistributeRewards { amount } => ContractCall {
                to: liquid_staking,
                input: ILiquidStaking::distributeRewardsCall {}.abi_encode().into(),
                value: *amount,
            },
            AdminAction::WithdrawStakedPeaq { amount, collator } => staking_call(
                ILiquidStaking::withdrawStakedPEAQCall {
                    amount: *amount,
                    collator: *collator,
                }
                .abi_encode(),
            ),
        }
    }
}

#[async_trait]
pub trait ChainWriter: Send + Sync {
    /// Simulates `action`, submits it and waits for the receipt.
    async fn submit(&self, action: AdminAction) -> Result<TxHash>;
}
