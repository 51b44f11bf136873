//! Pure grouping of withdrawal requests by their UTC unlock day.
//!
//! Dates are zero-padded `YYYY-MM-DD`, so lexicographic order on the key is
//! calendar order and a `BTreeMap` keeps buckets sorted for free.

use alloy::primitives::U256;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use super::{Withdrawal, WithdrawalStatus};

pub fn unlock_date(unlock_time: u64) -> String {
    let secs = i64::try_from(unlock_time).unwrap_or(i64::MAX);
    DateTime::from_timestamp(secs, 0)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
        .format("%Y-%m-%d")
        .to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayBucket {
    pub total_amount: U256,
    pub withdrawals: Vec<Withdrawal>,
}

impl DayBucket {
    /// Pending while any request unlocking that day is still locked.
    pub fn status(&self) -> WithdrawalStatus {
        if self
            .withdrawals
            .iter()
            .any(|w| w.status == WithdrawalStatus::Pending)
        {
            WithdrawalStatus::Pending
        } else {
            WithdrawalStatus::Completed
        }
    }
}

pub type GroupedWithdrawals = BTreeMap<String, DayBucket>;

pub fn group_by_unlock_date(withdrawals: &[Withdrawal]) -> GroupedWithdrawals {
    let mut grouped = GroupedWithdrawals::new();
    for withdrawal in withdrawals {
        let bucket = grouped.entry(unlock_date(withdrawal.unlock_time)).or_default();
        bucket.total_amount = bucket.total_amount.saturating_add(withdrawal.amount);
        bucket.withdrawals.push(withdrawal.clone());
    }
    grouped
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySummary {
    pub date: String,
    pub total_amount: U256,
    pub request_count: usize,
}

/// Future claims per day, ascending by date. Claimable requests are left out.
pub fn pending_daily_summaries(withdrawals: &[Withdrawal]) -> Vec<DailySummary> {
    let mut by_day: BTreeMap<String, (U256, usize)> = BTreeMap::new();
    for withdrawal in withdrawals
        .iter()
        .filter(|w| w.status == WithdrawalStatus::Pending)
    {
        let entry = by_day
            .entry(unlock_date(withdrawal.unlock_time))
            .or_insert((U256::ZERO, 0));
        entry.0 = entry.0.saturating_add(withdrawal.amount);
        entry.1 += 1;
    }

    by_day
        .into_iter()
        .map(|(date, (total_amount, request_count))| DailySummary {
            date,
            total_amount,
            request_count,
        })
        .collect()
}

pub fn total_pending(withdrawals: &[Withdrawal]) -> U256 {
    withdrawals
        .iter()
        .filter(|w| w.status == WithdrawalStatus::Pending)
        .fold(U256::ZERO, |acc, w| acc.saturating_add(w.amount))
}
