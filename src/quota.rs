//! Daily free-readjustment quota
//!
//! Two states per local day: Available and Exhausted. A new day always
//! resets the counter. Entitled users are never gated, but their applied
//! readjustments are still counted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Free readjustments a non-entitled user gets per day
pub const DEFAULT_FREE_ADJUSTMENTS: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaStatus {
    Available,
    /// Terminal for the rest of the local day; the caller shows the upgrade prompt
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaPolicy {
    pub free_per_day: u32,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            free_per_day: DEFAULT_FREE_ADJUSTMENTS,
        }
    }
}

/// Counter persisted with the settings row
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AdjustmentQuota {
    pub adjustments_today: u32,
    pub last_reset_date: Option<NaiveDate>,
}

impl AdjustmentQuota {
    /// Reset the counter when `today` is a different day than the last reset.
    /// Returns true if a reset happened.
    pub fn roll_over(&mut self, today: NaiveDate) -> bool {
        if self.last_reset_date == Some(today) {
            return false;
        }
        self.adjustments_today = 0;
        self.last_reset_date = Some(today);
        true
    }

    /// Status of an already rolled-over counter
    pub fn status(&self, entitled: bool, policy: &QuotaPolicy) -> QuotaStatus {
        if entitled || self.adjustments_today < policy.free_per_day {
            QuotaStatus::Available
        } else {
            QuotaStatus::Exhausted
        }
    }

    /// Roll over if needed, then report the status for `today`
    pub fn check(&mut self, today: NaiveDate, entitled: bool, policy: &QuotaPolicy) -> QuotaStatus {
        self.roll_over(today);
        self.status(entitled, policy)
    }

    /// Count one applied readjustment
    pub fn record_applied(&mut self, today: NaiveDate) {
        self.roll_over(today);
        self.adjustments_today = self.adjustments_today.saturating_add(1);
    }

    /// Free readjustments left today; `None` means unlimited
    pub fn remaining_free(&self, entitled: bool, policy: &QuotaPolicy) -> Option<u32> {
        if entitled {
            None
        } else {
            Some(policy.free_per_day.saturating_sub(self.adjustments_today))
        }
    }
}
