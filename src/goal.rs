//! Weight goal planning: calorie targets, pace estimates and water advice.

use serde::{Deserialize, Serialize};

use crate::domain::{ActivityLevel, Sex};
use crate::error::{FormulaError, InputError};
use crate::formulas::{WaterRecommendation, bmr, recommended_water_liters, tdee, time_to_goal_weeks};

/// Daily deficit used to plan weight loss (kcal).
pub const LOSS_DEFICIT: f64 = 500.0;

/// Daily surplus used to plan weight gain (kcal).
pub const GAIN_SURPLUS: f64 = 250.0;

/// Deficits bounding the loss pace range: slow and fast.
const LOSS_PACE_RANGE: (f64, f64) = (250.0, 1000.0);

/// Surpluses bounding the gain pace range: slow and fast.
const GAIN_PACE_RANGE: (f64, f64) = (125.0, 500.0);

/// Difference in liters within which water intake counts as on track.
const WATER_TOLERANCE_L: f64 = 0.5;

/// Validated inputs of the weight goal form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GoalInputs {
    pub current_weight_kg: f64,
    pub height_cm: f64,
    pub age: u32,
    pub desired_weight_kg: f64,
    pub water_intake_l: f64,
    pub sex: Sex,
    pub activity: ActivityLevel,
}

impl GoalInputs {
    /// Checks every numeric field against the form limits.
    pub fn validate(&self) -> Result<(), InputError> {
        check_range("current_weight_kg", self.current_weight_kg, 20.0, 250.0)?;
        check_range("height_cm", self.height_cm, 90.0, 250.0)?;
        check_range("age", self.age as f64, 1.0, 120.0)?;
        check_range("desired_weight_kg", self.desired_weight_kg, 20.0, 250.0)?;
        check_range("water_intake_l", self.water_intake_l, 0.0, 20.0)?;
        Ok(())
    }
}

/// Validates that `value` lies in `[min, max]`.
pub fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), InputError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(InputError::OutOfRange {
            field,
            min,
            max,
            value,
        })
    }
}

/// Direction of the planned weight change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    Deficit,
    Surplus,
}

impl GoalType {
    fn daily_delta(&self) -> f64 {
        match self {
            GoalType::Deficit => LOSS_DEFICIT,
            GoalType::Surplus => GAIN_SURPLUS,
        }
    }

    fn pace_range(&self) -> (f64, f64) {
        match self {
            GoalType::Deficit => LOSS_PACE_RANGE,
            GoalType::Surplus => GAIN_PACE_RANGE,
        }
    }

    /// Expected weekly weight change at the planned delta (kg).
    fn weekly_change_kg(&self) -> f64 {
        match self {
            GoalType::Deficit => 0.5,
            GoalType::Surplus => 0.25,
        }
    }
}

/// Estimated weeks to reach the goal at slow, recommended and fast paces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PaceRange {
    pub slow_weeks: f64,
    pub recommended_weeks: f64,
    pub fast_weeks: f64,
}

/// Advice comparing actual and recommended water intake.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "advice", rename_all = "snake_case")]
pub enum WaterAdvice {
    Increase { by_liters: f64 },
    Above { by_liters: f64 },
    OnTrack,
}

impl WaterAdvice {
    fn compare(actual: f64, recommended: f64) -> Self {
        let diff = actual - recommended;
        if diff < -WATER_TOLERANCE_L {
            WaterAdvice::Increase {
                by_liters: diff.abs(),
            }
        } else if diff > WATER_TOLERANCE_L {
            WaterAdvice::Above { by_liters: diff }
        } else {
            WaterAdvice::OnTrack
        }
    }

    pub fn message(&self) -> String {
        match self {
            WaterAdvice::Increase { by_liters } => format!(
                "Consider increasing your water intake by about {:.1} liters to meet the recommended amount.",
                by_liters
            ),
            WaterAdvice::Above { by_liters } => format!(
                "Your water intake is {:.1} liters above the recommendation, which is great!",
                by_liters
            ),
            WaterAdvice::OnTrack => {
                "Your water intake is close to the recommended amount. Good job!".to_string()
            }
        }
    }
}

/// Data for the actual vs. recommended water bar chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaterComparison {
    pub actual_l: f64,
    pub recommended: WaterRecommendation,
    pub advice: Option<WaterAdvice>,
    pub advice_message: Option<String>,
}

/// Result of the weight goal calculator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalPlan {
    pub bmr: f64,
    pub tdee: f64,
    pub goal_type: GoalType,
    pub daily_delta: f64,
    pub target_calories: f64,
    pub pace: PaceRange,
    pub weekly_change_kg: f64,
    pub water: WaterComparison,
    pub summary: Vec<String>,
}

impl GoalPlan {
    /// Computes the full plan for the form inputs.
    ///
    /// # Errors
    /// `GoalError::Input` when a field is out of range.
    pub fn compute(inputs: &GoalInputs) -> Result<Self, GoalError> {
        inputs.validate()?;

        let bmr = bmr(inputs.current_weight_kg, inputs.height_cm, inputs.age, inputs.sex);
        let tdee = tdee(bmr, inputs.activity);

        let goal_type = if inputs.current_weight_kg > inputs.desired_weight_kg {
            GoalType::Deficit
        } else {
            GoalType::Surplus
        };
        let daily_delta = goal_type.daily_delta();
        let target_calories = match goal_type {
            GoalType::Deficit => tdee - daily_delta,
            GoalType::Surplus => tdee + daily_delta,
        };

        let weeks = |delta: f64| {
            time_to_goal_weeks(inputs.current_weight_kg, inputs.desired_weight_kg, delta)
        };
        let (slow_delta, fast_delta) = goal_type.pace_range();
        let pace = PaceRange {
            slow_weeks: weeks(slow_delta)?,
            recommended_weeks: weeks(daily_delta)?,
            fast_weeks: weeks(fast_delta)?,
        };

        let recommended = recommended_water_liters(inputs.age, inputs.sex);
        let advice = recommended
            .liters()
            .map(|r| WaterAdvice::compare(inputs.water_intake_l, r));
        let water = WaterComparison {
            actual_l: inputs.water_intake_l,
            recommended,
            advice,
            advice_message: advice.map(|a| a.message()),
        };

        let weekly_change_kg = goal_type.weekly_change_kg();
        let summary = summary_lines(goal_type, tdee, target_calories, daily_delta, &pace);

        Ok(Self {
            bmr,
            tdee,
            goal_type,
            daily_delta,
            target_calories,
            pace,
            weekly_change_kg,
            water,
            summary,
        })
    }
}

/// Errors from computing a goal plan.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GoalError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Formula(#[from] FormulaError),
}

fn summary_lines(
    goal_type: GoalType,
    tdee: f64,
    target_calories: f64,
    daily_delta: f64,
    pace: &PaceRange,
) -> Vec<String> {
    let label = match goal_type {
        GoalType::Deficit => "deficit",
        GoalType::Surplus => "surplus",
    };
    let recommendation = match goal_type {
        GoalType::Deficit => format!(
            "To lose weight safely, aim for a {:.0} calorie daily deficit. This will result in approximately 0.5 kg of weight loss per week.",
            daily_delta
        ),
        GoalType::Surplus => format!(
            "To gain weight safely, aim for a {:.0} calorie daily surplus. This will result in approximately 0.25 kg of weight gain per week.",
            daily_delta
        ),
    };

    vec![
        format!("Your maintenance calories (TDEE): {:.0} calories/day", tdee),
        format!(
            "Recommended daily calories for {}: {:.0} calories/day",
            label, target_calories
        ),
        format!(
            "Estimated time to reach goal: {:.1} weeks",
            pace.recommended_weeks
        ),
        format!("Slow pace: {:.1} weeks", pace.slow_weeks),
        format!("Fast pace: {:.1} weeks", pace.fast_weeks),
        recommendation,
    ]
}
