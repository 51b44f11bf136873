use alloy::primitives::Address;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;

use super::aggregate::total_pending;
use super::breakdown::{partition, with_collators, BalanceBreakdown};
use super::{Withdrawal, WithdrawalStatus};
use crate::chain::{ChainReader, TokenTransfer, WithdrawalRequest};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolderRequests {
    pub holder: Address,
    pub requests: Vec<WithdrawalRequest>,
}

/// Everything read in one pass, classified against a single `now`.
#[derive(Debug, Clone)]
pub struct WithdrawalSnapshot {
    pub now: u64,
    pub holders: Vec<HolderRequests>,
    pub withdrawals: Vec<Withdrawal>,
    pub failed_holders: Vec<Address>,
}

/// Every address that ever sent or received stPEAQ, first-seen order, mint/burn
/// address excluded.
pub fn holders_from_transfers(transfers: &[TokenTransfer]) -> Vec<Address> {
    let mut seen = HashSet::new();
    let mut holders = Vec::new();
    for transfer in transfers {
        for address in [transfer.to, transfer.from] {
            if address != Address::ZERO && seen.insert(address) {
                holders.push(address);
            }
        }
    }
    holders
}

pub struct WithdrawalFetcher {
    reader: Arc<dyn ChainReader>,
    concurrency: usize,
}

impl WithdrawalFetcher {
    pub fn new(reader: Arc<dyn ChainReader>, concurrency: usize) -> Self {
        Self {
            reader,
            concurrency: concurrency.max(1),
        }
    }

    pub fn reader(&self) -> &Arc<dyn ChainReader> {
        &self.reader
    }

    pub async fn holders(&self) -> Result<Vec<Address>> {
        let transfers = self.reader.receipt_token_transfers().await?;
        let holders = holders_from_transfers(&transfers);
        tracing::debug!(
            "Resolved {} stPEAQ holders from {} transfers",
            holders.len(),
            transfers.len()
        );
        Ok(holders)
    }

    /// Reads withdrawal requests for every holder.
    ///
    /// The holder scan failing fails the whole fetch. A single holder's read failing
    /// only drops that holder.
    pub async fn fetch(&self, now: u64) -> Result<WithdrawalSnapshot> {
        let holders = self.holders().await?;

        let results: Vec<(Address, Result<Vec<WithdrawalRequest>>)> = stream::iter(holders)
            .map(|holder| {
                let reader = self.reader.clone();
                async move { (holder, reader.withdrawal_requests(holder).await) }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut snapshot = WithdrawalSnapshot {
            now,
            holders: Vec::new(),
            withdrawals: Vec::new(),
            failed_holders: Vec::new(),
        };

        for (holder, result) in results {
            match result {
                Ok(requests) => {
                    if requests.is_empty() {
                        continue;
                    }
                    snapshot
                        .withdrawals
                        .extend(requests.iter().map(|request| Withdrawal {
                            holder,
                            amount: request.amount,
                            unlock_time: request.unlock_time,
                            status: WithdrawalStatus::classify(request.unlock_time, now),
                        }));
                    snapshot.holders.push(HolderRequests { holder, requests });
                }
                Err(e) => {
                    tracing::warn!("Error fetching withdrawals for {}: {}", holder, e);
                    snapshot.failed_holders.push(holder);
                }
            }
        }

        tracing::info!(
            "Withdrawal snapshot: {} requests across {} holders ({} failed)",
            snapshot.withdrawals.len(),
            snapshot.holders.len(),
            snapshot.failed_holders.len()
        );

        Ok(snapshot)
    }

    /// Pool breakdown from three concurrent reads. Any of them failing fails the lot.
    pub async fn breakdown(&self, now: u64) -> Result<BalanceBreakdown> {
        let contract = self.reader.liquid_staking_address();
        let (total_staked, contract_balance, snapshot) = tokio::try_join!(
            self.reader.total_staked(),
            self.reader.native_balance(contract),
            self.fetch(now),
        )?;

        partition(
            total_staked,
            with_collators(total_staked, contract_balance),
            total_pending(&snapshot.withdrawals),
        )
    }
}
