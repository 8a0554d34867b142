//! Absolute timelock classification.
//!
//! Values at or below [`LOCKTIME_THRESHOLD`] are block heights, values above
//! it are Unix timestamps. This mirrors the consensus interpretation of the
//! transaction `nLockTime` field, so the same integer can be pushed into the
//! redeem script and set as the transaction locktime.

use bitcoin::{absolute, Sequence};
use chrono::{TimeZone, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};

/// Consensus boundary between block-height and timestamp locktimes.
pub const LOCKTIME_THRESHOLD: u32 = 500_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timelock {
    /// Locked until a block height in `(0, 500_000_000]`.
    Height(u32),
    /// Locked until a Unix timestamp above `500_000_000`.
    Time(u32),
}

impl Timelock {
    pub fn new(value: i64) -> Result<Self> {
        let Ok(value) = u32::try_from(value) else {
            return Err(Error::InvalidTimelock(value));
        };
        if value == 0 {
            return Err(Error::InvalidTimelock(0));
        }
        if value > LOCKTIME_THRESHOLD {
            Ok(Timelock::Time(value))
        } else {
            Ok(Timelock::Height(value))
        }
    }

    pub fn value(&self) -> u32 {
        match *self {
            Timelock::Height(v) | Timelock::Time(v) => v,
        }
    }

    /// The transaction-level `nLockTime` for this lock.
    pub fn lock_time(&self) -> absolute::LockTime {
        absolute::LockTime::from_consensus(self.value())
    }

    /// Input sequence that keeps OP_CLTV enforceable (anything below
    /// `0xffffffff` enables the transaction locktime).
    pub fn input_sequence(&self) -> Sequence {
        Sequence::ENABLE_RBF_NO_LOCKTIME
    }

    /// True for timestamp locks that have already matured relative to `now`.
    pub fn is_past(&self, now_unix: u64) -> bool {
        match *self {
            Timelock::Height(_) => false,
            Timelock::Time(t) => u64::from(t) < now_unix,
        }
    }

    pub fn describe(&self) -> String {
        match *self {
            Timelock::Height(h) => format!("block height {h}"),
            Timelock::Time(t) => {
                let date = Utc
                    .timestamp_opt(i64::from(t), 0)
                    .single()
                    .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| t.to_string());
                format!("date {date} UTC")
            }
        }
    }

    /// Report the decoded lock on stdout; warn (non-fatally) when a
    /// timestamp lock is already in the past.
    pub fn announce(&self) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        if self.is_past(now) {
            log::warn!("timelock set to a past timestamp ({})", self.describe());
        } else {
            println!("Timelock set to {}", self.describe());
        }
    }
}
