use alloy::primitives::U256;

use crate::error::{Result, StakingError};

/// Split of the staked PEAQ held by the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceBreakdown {
    pub total_staked: U256,
    pub with_collators: U256,
    pub pending_withdrawal: U256,
    pub available_for_staking: U256,
}

/// Staked PEAQ that isn't sitting in the contract has been delegated out.
pub fn with_collators(total_staked: U256, contract_balance: U256) -> U256 {
    total_staked.saturating_sub(contract_balance)
}

/// `available = total_staked - with_collators - pending_withdrawal`, exact.
///
/// Errors instead of clamping when the reads don't add up, which happens when the
/// chain moved between the independent reads or the contract state is off.
pub fn partition(
    total_staked: U256,
    with_collators: U256,
    pending_withdrawal: U256,
) -> Result<BalanceBreakdown> {
    let available_for_staking = total_staked
        .checked_sub(with_collators)
        .and_then(|rest| rest.checked_sub(pending_withdrawal))
        .ok_or_else(|| StakingError::InconsistentBalances {
            total_staked: total_staked.to_string(),
            with_collators: with_collators.to_string(),
            pending_withdrawal: pending_withdrawal.to_string(),
        })?;

    Ok(BalanceBreakdown {
        total_staked,
        with_collators,
        pending_withdrawal,
        available_for_staking,
    })
}
