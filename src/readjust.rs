//! Mid-day Readjustment Engine
//!
//! After the user reports unplanned calories ("ate out"), the budget that is
//! left for the day is spread over the meal slots that have not started yet.
//!
//! Key rules:
//! - Slots whose start time is before `now` keep their budget untouched
//! - Remaining slots keep their relative weights (renormalized to 1)
//! - The remaining budget never goes below zero
//! - Pure function of its inputs; the caller decides when to persist

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::allocation::{allocate_weights, AllocationError};
use crate::models::{DailyPlan, MealKey, Settings};

/// One configured slot with its scheduled start and weight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledSlot {
    pub key: MealKey,
    pub start: NaiveTime,
    pub percent: f64,
}

/// Build the day's schedule from the configured slots and meal times
pub fn schedule_from_settings(settings: &Settings) -> Vec<ScheduledSlot> {
    let mut schedule: Vec<ScheduledSlot> = settings
        .meal_slots
        .iter()
        .map(|slot| ScheduledSlot {
            key: slot.key,
            start: settings.meal_times.start_of(slot.key),
            percent: slot.percent,
        })
        .collect();
    schedule.sort_by_key(|s| s.key);
    schedule
}

/// Result of a successful redistribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Readjustment {
    pub plan: DailyPlan,
    pub daily_goal: i64,
    pub projected_consumed: i64,
    pub remaining_budget: i64,
    /// Slots that received new budgets, in schedule order
    pub adjusted_slots: Vec<MealKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReadjustOutcome {
    Rebalanced(Readjustment),
    /// Every slot has already started; the plan is left as it was
    NoRemainingSlots,
}

/// Redistribute the rest of the day's budget after `extra_kcal` unplanned
/// calories. Negative amounts are treated as 0.
pub fn readjust(
    plan: &DailyPlan,
    extra_kcal: i64,
    consumed_so_far: i64,
    now: NaiveTime,
    schedule: &[ScheduledSlot],
) -> Result<ReadjustOutcome, AllocationError> {
    let daily_goal = plan.total();
    let projected_consumed = consumed_so_far.max(0).saturating_add(extra_kcal.max(0));
    let remaining_budget = daily_goal.saturating_sub(projected_consumed).max(0);

    let remaining: Vec<(MealKey, f64)> = schedule
        .iter()
        .filter(|slot| slot.start >= now)
        .map(|slot| (slot.key, slot.percent))
        .collect();

    if remaining.is_empty() {
        return Ok(ReadjustOutcome::NoRemainingSlots);
    }

    let budgets = allocate_weights(remaining_budget, &remaining)?;

    let mut next = plan.clone();
    for (key, kcal) in &budgets {
        next.set_budget(*key, *kcal);
    }

    Ok(ReadjustOutcome::Rebalanced(Readjustment {
        plan: next,
        daily_goal,
        projected_consumed,
        remaining_budget,
        adjusted_slots: remaining.iter().map(|(key, _)| *key).collect(),
    }))
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn plan_2000() -> DailyPlan {
        DailyPlan {
            day: NaiveDate::from_ymd_opt(2025, 4, 9).unwrap(),
            breakfast_kcal: 400,
            lunch_kcal: 700,
            snack_kcal: 300,
            dinner_kcal: 600,
        }
    }

    fn schedule() -> Vec<ScheduledSlot> {
        vec![
            ScheduledSlot { key: MealKey::Breakfast, start: at(8, 0), percent: 0.2 },
            ScheduledSlot { key: MealKey::Lunch, start: at(12, 30), percent: 0.35 },
            ScheduledSlot { key: MealKey::Snack, start: at(16, 0), percent: 0.15 },
            ScheduledSlot { key: MealKey::Dinner, start: at(19, 30), percent: 0.3 },
        ]
    }

    fn rebalanced(outcome: ReadjustOutcome) -> Readjustment {
        match outcome {
            ReadjustOutcome::Rebalanced(r) => r,
            other => panic!("expected rebalanced plan, got {:?}", other),
        }
    }

    #[test]
    fn test_ate_out_after_lunch() {
        let plan = plan_2000();
        let result = rebalanced(readjust(&plan, 500, 1200, at(15, 0), &schedule()).unwrap());

        assert_eq!(result.daily_goal, 2000);
        assert_eq!(result.projected_consumed, 1700);
        assert_eq!(result.remaining_budget, 300);
        assert_eq!(result.adjusted_slots, vec![MealKey::Snack, MealKey::Dinner]);

        assert_eq!(result.plan.breakfast_kcal, 400);
        assert_eq!(result.plan.lunch_kcal, 700);
        assert_eq!(result.plan.snack_kcal, 100);
        assert_eq!(result.plan.dinner_kcal, 200);
        assert_eq!(result.plan.day, plan.day);
    }

    #[test]
    fn test_no_remaining_slots_after_dinner_started() {
        let outcome = readjust(&plan_2000(), 500, 1200, at(20, 15), &schedule()).unwrap();
        assert_eq!(outcome, ReadjustOutcome::NoRemainingSlots);
    }

    #[test]
    fn test_slot_starting_now_is_still_remaining() {
        let result = rebalanced(readjust(&plan_2000(), 100, 1400, at(19, 30), &schedule()).unwrap());
        assert_eq!(result.adjusted_slots, vec![MealKey::Dinner]);
        assert_eq!(result.plan.dinner_kcal, 500);
    }

    #[test]
    fn test_overspend_zeroes_remaining_slots() {
        let result = rebalanced(readjust(&plan_2000(), 900, 1500, at(11, 0), &schedule()).unwrap());

        assert_eq!(result.remaining_budget, 0);
        assert_eq!(result.plan.breakfast_kcal, 400);
        assert_eq!(result.plan.lunch_kcal, 0);
        assert_eq!(result.plan.snack_kcal, 0);
        assert_eq!(result.plan.dinner_kcal, 0);
    }

    #[test]
    fn test_conservation_and_untouched_past_slots() {
        let plan = plan_2000();
        for (now, consumed, extra) in [
            (at(7, 0), 0, 333),
            (at(9, 0), 450, 211),
            (at(13, 0), 1111, 1),
            (at(17, 0), 1420, 77),
        ] {
            let result = rebalanced(readjust(&plan, extra, consumed, now, &schedule()).unwrap());

            let adjusted: i64 = result
                .adjusted_slots
                .iter()
                .map(|key| result.plan.budget(*key))
                .sum();
            assert_eq!(adjusted, result.remaining_budget);

            for key in MealKey::ALL {
                if !result.adjusted_slots.contains(&key) {
                    assert_eq!(result.plan.budget(key), plan.budget(key));
                }
            }
        }
    }

    #[test]
    fn test_preview_is_idempotent() {
        let plan = plan_2000();
        let sched = schedule();
        let first = readjust(&plan, 480, 900, at(14, 10), &sched).unwrap();
        let second = readjust(&plan, 480, 900, at(14, 10), &sched).unwrap();
        assert_eq!(first, second);
        assert_eq!(plan, plan_2000());
    }

    #[test]
    fn test_negative_amounts_treated_as_zero() {
        let result = rebalanced(readjust(&plan_2000(), -250, -10, at(15, 0), &schedule()).unwrap());
        assert_eq!(result.projected_consumed, 0);
        assert_eq!(result.remaining_budget, 2000);
        assert_eq!(result.plan.snack_kcal + result.plan.dinner_kcal, 2000);
    }

    #[test]
    fn test_zero_weight_remaining_slots_is_configuration_error() {
        let mut sched = schedule();
        sched[2].percent = 0.0;
        sched[3].percent = 0.0;
        let result = readjust(&plan_2000(), 100, 1000, at(15, 0), &sched);
        assert_eq!(result, Err(AllocationError::ZeroWeights));
    }

    #[test]
    fn test_schedule_from_settings_follows_configured_slots() {
        let mut settings = Settings::default();
        settings.meal_slots = crate::allocation::resize_slots(&settings.meal_slots, 3);
        let sched = schedule_from_settings(&settings);

        let keys: Vec<MealKey> = sched.iter().map(|s| s.key).collect();
        assert_eq!(keys, vec![MealKey::Breakfast, MealKey::Lunch, MealKey::Snack]);
        assert_eq!(sched[2].start, at(16, 0));
    }
}
