//! Energy expenditure and hydration formulas.

use serde::Serialize;

use crate::domain::{ActivityLevel, Sex};
use crate::error::FormulaError;

/// Approximate energy stored in one kilogram of body weight (kcal).
pub const KCAL_PER_KG: f64 = 7700.0;

/// Mifflin-St Jeor constant terms.
mod mifflin_st_jeor {
    pub const MALE_OFFSET: f64 = 5.0;
    pub const FEMALE_OFFSET: f64 = -161.0;
}

/// Recommended daily water intake, or a marker that the age has no band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", content = "liters", rename_all = "snake_case")]
pub enum WaterRecommendation {
    Liters(f64),
    OutOfRange,
}

impl WaterRecommendation {
    pub fn liters(&self) -> Option<f64> {
        match self {
            WaterRecommendation::Liters(l) => Some(*l),
            WaterRecommendation::OutOfRange => None,
        }
    }
}

/// Age bands for the water intake lookup (inclusive bounds).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaterBand {
    Child,
    Teen,
    Adult,
}

impl WaterBand {
    fn for_age(age: u32) -> Option<Self> {
        match age {
            9..=13 => Some(WaterBand::Child),
            14..=18 => Some(WaterBand::Teen),
            19..=70 => Some(WaterBand::Adult),
            _ => None,
        }
    }

    fn liters(&self, sex: Sex) -> f64 {
        match (self, sex) {
            (WaterBand::Child, Sex::Male) => 2.4,
            (WaterBand::Child, Sex::Female) => 2.1,
            (WaterBand::Teen, Sex::Male) => 3.3,
            (WaterBand::Teen, Sex::Female) => 2.2,
            (WaterBand::Adult, Sex::Male) => 3.7,
            (WaterBand::Adult, Sex::Female) => 2.7,
        }
    }
}

/// Calculates Basal Metabolic Rate using the Mifflin-St Jeor equation.
///
/// Formula:
/// ```text
/// BMR = 10 × weight + 6.25 × height - 5 × age + s
/// ```
/// where `s` is +5 for men and -161 for women.
pub fn bmr(weight_kg: f64, height_cm: f64, age: u32, sex: Sex) -> f64 {
    let offset = match sex {
        Sex::Male => mifflin_st_jeor::MALE_OFFSET,
        Sex::Female => mifflin_st_jeor::FEMALE_OFFSET,
    };
    10.0 * weight_kg + 6.25 * height_cm - 5.0 * age as f64 + offset
}

/// Scales BMR by the activity multiplier to get Total Daily Energy Expenditure.
pub fn tdee(bmr: f64, activity: ActivityLevel) -> f64 {
    bmr * activity.multiplier()
}

/// Estimates weeks needed to move from `current_kg` to `target_kg` at a
/// constant daily calorie deficit or surplus.
///
/// Formula:
/// ```text
/// weeks = |current - target| × 7700 / |delta| / 7
/// ```
///
/// # Errors
/// Returns `FormulaError::ZeroCalorieDelta` if the delta is zero or not finite.
pub fn time_to_goal_weeks(
    current_kg: f64,
    target_kg: f64,
    daily_delta_kcal: f64,
) -> Result<f64, FormulaError> {
    if daily_delta_kcal == 0.0 || !daily_delta_kcal.is_finite() {
        return Err(FormulaError::ZeroCalorieDelta(daily_delta_kcal));
    }

    let total_kcal = (current_kg - target_kg).abs() * KCAL_PER_KG;
    let days = total_kcal / daily_delta_kcal.abs();
    Ok(days / 7.0)
}

/// Looks up the recommended daily water intake for an age and sex.
///
/// Ages outside 9-70 have no recommendation.
pub fn recommended_water_liters(age: u32, sex: Sex) -> WaterRecommendation {
    match WaterBand::for_age(age) {
        Some(band) => WaterRecommendation::Liters(band.liters(sex)),
        None => WaterRecommendation::OutOfRange,
    }
}
