pub mod aggregate;
pub mod breakdown;
pub mod fetcher;

use alloy::primitives::{Address, U256};
use serde::Serialize;

pub use aggregate::{group_by_unlock_date, pending_daily_summaries};
pub use fetcher::{WithdrawalFetcher, WithdrawalSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Completed,
}

impl WithdrawalStatus {
    /// A request is claimable once `now` reaches its unlock time.
    pub fn classify(unlock_time: u64, now: u64) -> Self {
        if unlock_time > now {
            WithdrawalStatus::Pending
        } else {
            WithdrawalStatus::Completed
        }
    }

    pub fn is_claimable(self) -> bool {
        self == WithdrawalStatus::Completed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Withdrawal {
    pub holder: Address,
    pub amount: U256,
    pub unlock_time: u64,
    pub status: WithdrawalStatus,
}
