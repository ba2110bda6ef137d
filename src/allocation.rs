//! Slot Allocator
//!
//! Splits a daily calorie target across meal slots by proportional weight.
//!
//! Key properties:
//! - Budgets are non-negative integers that sum to the target exactly
//! - Rounding leftovers go to the largest fractional remainders first
//! - Ties keep input order, so equal weights differ by at most 1 kcal
//!
//! Also holds the editing rules of the plan-setup screen (slot count and
//! slider rebalancing).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{DailyPlan, MealKey, MealSlot};

/// Weights within this distance of 1.0 are used as-is
pub const WEIGHT_TOLERANCE: f64 = 1e-6;
pub const MIN_SLOTS: usize = 2;
pub const MAX_SLOTS: usize = 4;
/// Targets are clamped to this so per-slot sums cannot overflow
pub const MAX_TARGET_KCAL: i64 = i32::MAX as i64;

// ---------------------------------------------------------------------------
/// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum AllocationError {
    #[error("Invalid meal plan configuration: slot weights sum to zero")]
    ZeroWeights,
}

// ---------------------------------------------------------------------------
/// Largest-remainder allocation
// ---------------------------------------------------------------------------

struct Share {
    key: MealKey,
    kcal: i64,
    remainder: f64,
}

fn clamp_weight(percent: f64) -> f64 {
    if percent.is_finite() && percent > 0.0 {
        percent
    } else {
        0.0
    }
}

/// Allocate `target_kcal` over `(key, weight)` pairs in the given order.
///
/// The target is clamped to `0..=MAX_TARGET_KCAL`. Weights are normalized
/// when they do not already sum to 1. Fails only when the weights sum to
/// exactly zero.
pub fn allocate_weights(
    target_kcal: i64,
    weights: &[(MealKey, f64)],
) -> Result<BTreeMap<MealKey, i64>, AllocationError> {
    let target = target_kcal.clamp(0, MAX_TARGET_KCAL);
    let cleaned: Vec<(MealKey, f64)> = weights
        .iter()
        .map(|(key, percent)| (*key, clamp_weight(*percent)))
        .collect();

    let total: f64 = cleaned.iter().map(|(_, p)| p).sum();
    if total == 0.0 {
        return Err(AllocationError::ZeroWeights);
    }
    let scale = if (total - 1.0).abs() > WEIGHT_TOLERANCE {
        total
    } else {
        1.0
    };

    let mut shares: Vec<Share> = cleaned
        .iter()
        .map(|(key, percent)| {
            let raw = target as f64 * (percent / scale);
            let floor = raw.floor();
            Share {
                key: *key,
                kcal: floor as i64,
                remainder: raw - floor,
            }
        })
        .collect();

    // Stable sort: equal remainders keep input order
    let mut order: Vec<usize> = (0..shares.len()).collect();
    order.sort_by(|&a, &b| shares[b].remainder.total_cmp(&shares[a].remainder));

    let mut missing = target - shares.iter().map(|s| s.kcal).sum::<i64>();
    while missing > 0 {
        for &idx in &order {
            if missing == 0 {
                break;
            }
            shares[idx].kcal += 1;
            missing -= 1;
        }
    }
    // Float noise can push the floors past the target; take back from the
    // smallest remainders
    while missing < 0 {
        for &idx in order.iter().rev() {
            if missing == 0 {
                break;
            }
            if shares[idx].kcal > 0 {
                shares[idx].kcal -= 1;
                missing += 1;
            }
        }
    }

    let mut budgets = BTreeMap::new();
    for share in shares {
        *budgets.entry(share.key).or_insert(0) += share.kcal;
    }
    Ok(budgets)
}

/// Allocate a daily target over configured meal slots
pub fn allocate(
    target_kcal: i64,
    slots: &[MealSlot],
) -> Result<BTreeMap<MealKey, i64>, AllocationError> {
    let weights: Vec<(MealKey, f64)> = slots.iter().map(|s| (s.key, s.percent)).collect();
    allocate_weights(target_kcal, &weights)
}

/// Allocate and wrap the result as the plan for `day`
pub fn materialize_plan(
    day: NaiveDate,
    target_kcal: i64,
    slots: &[MealSlot],
) -> Result<DailyPlan, AllocationError> {
    let budgets = allocate(target_kcal, slots)?;
    Ok(DailyPlan::from_budgets(day, &budgets))
}

// ---------------------------------------------------------------------------
/// Slot configuration editing
// ---------------------------------------------------------------------------

/// Change the number of configured slots (clamped to 2..=4).
///
/// Keeps the first `count` canonical slots, carries over existing weights,
/// seeds new slots with `1/count` and renormalizes to 1.
pub fn resize_slots(slots: &[MealSlot], count: usize) -> Vec<MealSlot> {
    let count = count.clamp(MIN_SLOTS, MAX_SLOTS);
    let even = 1.0 / count as f64;

    let mut next: Vec<MealSlot> = MealKey::ALL[..count]
        .iter()
        .map(|key| {
            let percent = slots
                .iter()
                .find(|s| s.key == *key)
                .map(|s| clamp_weight(s.percent))
                .unwrap_or(even);
            MealSlot::new(*key, percent)
        })
        .collect();

    let sum: f64 = next.iter().map(|s| s.percent).sum();
    for slot in next.iter_mut() {
        slot.percent = if sum > 0.0 { slot.percent / sum } else { even };
    }
    next
}

/// Set one slot's weight and scale the others so the total stays 1.
///
/// The others keep their relative proportions; if they were all zero they
/// share the remainder equally. Out-of-range indexes leave the slots as-is.
pub fn rebalance_after_edit(slots: &[MealSlot], index: usize, percent: f64) -> Vec<MealSlot> {
    let mut next = slots.to_vec();
    if index >= next.len() {
        return next;
    }

    let edited = clamp_weight(percent).min(1.0);
    next[index].percent = edited;

    let rest: f64 = next
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, s)| clamp_weight(s.percent))
        .sum();
    let target_rest = 1.0 - edited;
    let others = (next.len() - 1).max(1) as f64;

    for (i, slot) in next.iter_mut().enumerate() {
        if i == index {
            continue;
        }
        let ratio = if rest > 0.0 {
            clamp_weight(slot.percent) / rest
        } else {
            1.0 / others
        };
        slot.percent = (ratio * target_rest).max(0.0);
    }
    next
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------
