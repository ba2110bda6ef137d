//! Daily energy target from a physical profile
//!
//! Basal metabolic rate by Mifflin-St Jeor, scaled by an activity factor and
//! a goal factor. Pure arithmetic: malformed numbers clamp to 0 instead of
//! failing.

use serde::{Deserialize, Serialize};

use crate::models::{ActivityLevel, Goal, Sex, UserProfile};

pub const MALE_OFFSET: f64 = 5.0;
pub const FEMALE_OFFSET: f64 = -161.0;
/// Neutral offset used for `Sex::Other` unless configured otherwise
pub const DEFAULT_OTHER_OFFSET: f64 = -78.0;

/// Tunable inputs of the target formula
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyParams {
    pub other_sex_offset: f64,
}

impl Default for EnergyParams {
    fn default() -> Self {
        Self {
            other_sex_offset: DEFAULT_OTHER_OFFSET,
        }
    }
}

impl ActivityLevel {
    pub fn factor(self) -> f64 {
        match self {
            Self::Sedentary => 1.2,
            Self::Light => 1.375,
            Self::Moderate => 1.55,
            Self::Intense => 1.725,
        }
    }
}

impl Goal {
    pub fn factor(self) -> f64 {
        match self {
            Self::Lose => 0.85,
            Self::Maintain => 1.0,
            Self::Gain => 1.1,
        }
    }
}

fn sex_offset(sex: Sex, params: &EnergyParams) -> f64 {
    match sex {
        Sex::Male => MALE_OFFSET,
        Sex::Female => FEMALE_OFFSET,
        Sex::Other => params.other_sex_offset,
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Mifflin-St Jeor BMR in kcal/day. May be negative for degenerate inputs.
pub fn basal_metabolic_rate(profile: &UserProfile, params: &EnergyParams) -> f64 {
    10.0 * non_negative(profile.weight_kg) + 6.25 * non_negative(profile.height_cm)
        - 5.0 * profile.age as f64
        + sex_offset(profile.sex, params)
}

/// Daily calorie target, rounded to the nearest kcal and floored at 0
pub fn compute_daily_target(profile: &UserProfile, params: &EnergyParams) -> i64 {
    let tdee = basal_metabolic_rate(profile, params)
        * profile.activity.factor()
        * profile.goal.factor();

    if !tdee.is_finite() {
        return 0;
    }
    (tdee.round() as i64).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(sex: Sex, age: u32, height_cm: f64, weight_kg: f64) -> UserProfile {
        UserProfile {
            sex,
            age,
            height_cm,
            weight_kg,
            goal: Goal::Maintain,
            activity: ActivityLevel::Moderate,
            kcal_target: 0,
        }
    }

    #[test]
    fn test_male_moderate_maintain() {
        // BMR = 800 + 1125 - 150 + 5 = 1780; x1.55 = 2759
        let p = profile(Sex::Male, 30, 180.0, 80.0);
        assert_eq!(compute_daily_target(&p, &EnergyParams::default()), 2759);
    }

    #[test]
    fn test_female_light_lose() {
        // BMR = 600 + 1031.25 - 125 - 161 = 1345.25; x1.375 x0.85 = 1572.27
        let mut p = profile(Sex::Female, 25, 165.0, 60.0);
        p.activity = ActivityLevel::Light;
        p.goal = Goal::Lose;
        assert_eq!(compute_daily_target(&p, &EnergyParams::default()), 1572);
    }

    #[test]
    fn test_other_uses_configured_offset() {
        // BMR = 700 + 1062.5 - 150 - 78 = 1534.5; x1.2 x1.1 = 2025.54
        let mut p = profile(Sex::Other, 30, 170.0, 70.0);
        p.activity = ActivityLevel::Sedentary;
        p.goal = Goal::Gain;
        assert_eq!(compute_daily_target(&p, &EnergyParams::default()), 2026);

        let female_like = EnergyParams {
            other_sex_offset: FEMALE_OFFSET,
        };
        // BMR = 1451.5; x1.2 x1.1 = 1915.98
        assert_eq!(compute_daily_target(&p, &female_like), 1916);
    }

    #[test]
    fn test_degenerate_profile_floors_at_zero() {
        let p = profile(Sex::Female, 120, 0.0, 0.0);
        assert_eq!(compute_daily_target(&p, &EnergyParams::default()), 0);
    }

    #[test]
    fn test_non_finite_measurements_clamp_to_zero() {
        let p = profile(Sex::Male, 30, f64::NAN, f64::INFINITY);
        // Only the age and sex terms remain: -150 + 5 < 0
        assert_eq!(compute_daily_target(&p, &EnergyParams::default()), 0);
    }

    #[test]
    fn test_activity_factors_increase_with_tier() {
        let tiers = [
            ActivityLevel::Sedentary,
            ActivityLevel::Light,
            ActivityLevel::Moderate,
            ActivityLevel::Intense,
        ];
        for pair in tiers.windows(2) {
            assert!(pair[0].factor() < pair[1].factor());
        }
    }
}
