//! Trend analysis over saved day summaries.
//!
//! Provides the trailing average of the most recent saved days, a one-sample
//! t-test of recent calorie intake against the daily target, and the series
//! for the calories-over-time chart.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{DailySummary, Macros};
use crate::error::TrendError;
use crate::stats::{StatsError, one_sample_t_test};

// === Constants ===

/// Number of most recent summaries used for averages and the t-test.
pub const DEFAULT_WINDOW: usize = 7;

/// p-value below which intake is judged significantly off target.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Smallest sample for which the t statistic is defined.
const MIN_TEST_SAMPLE: usize = 2;

// === Data Structures ===

/// Outcome of comparing recent intake with the calorie target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    OnTarget,
    OffTarget,
}

impl Verdict {
    pub fn message(&self) -> &'static str {
        match self {
            Verdict::OnTarget => {
                "You are on the right track. Your calorie intake is not significantly different from your target."
            }
            Verdict::OffTarget => {
                "You're not eating the right amount of calories: you're either consuming too much or too little compared to your goal."
            }
        }
    }
}

/// Result of the one-sample significance test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignificanceResult {
    pub sample_size: usize,
    pub sample_mean: f64,
    pub target_calories: f64,
    pub t_statistic: f64,
    pub p_value: f64,
    pub verdict: Verdict,
}

/// A point on the calories-over-time chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaloriePoint {
    pub date: NaiveDate,
    pub calories: f64,
}

/// Series for the calories-over-time chart with its target line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalorieChart {
    pub points: Vec<CaloriePoint>,
    pub target_calories: f64,
}

// === Main Calculation Functions ===

/// Averages the last `window` summaries in commit order.
///
/// # Errors
/// `TrendError::InsufficientSummaries` when fewer than `window` summaries exist.
pub fn trailing_average(summaries: &[DailySummary], window: usize) -> Result<Macros, TrendError> {
    let recent = last_window(summaries, window)?;
    Ok(recent
        .iter()
        .map(|s| s.totals)
        .sum::<Macros>()
        .divided_by(window))
}

/// Tests whether the calories of the last `window` summaries differ from
/// `target_calories` (two-sided one-sample t-test at the 5% level).
///
/// # Errors
/// - `TrendError::DegenerateSample` when `window < 2`.
/// - `TrendError::InsufficientSummaries` when fewer than `window` summaries exist.
pub fn significance_test(
    summaries: &[DailySummary],
    window: usize,
    target_calories: f64,
) -> Result<SignificanceResult, TrendError> {
    if window < MIN_TEST_SAMPLE {
        return Err(TrendError::DegenerateSample {
            window,
            required: MIN_TEST_SAMPLE,
        });
    }

    let recent = last_window(summaries, window)?;
    let calories: Vec<f64> = recent.iter().map(|s| s.totals.calories).collect();

    let test = one_sample_t_test(&calories, target_calories).map_err(|e| match e {
        StatsError::InsufficientData { .. } | StatsError::BadDegreesOfFreedom(_) => {
            TrendError::DegenerateSample {
                window,
                required: MIN_TEST_SAMPLE,
            }
        }
    })?;

    let verdict = if test.p_value < SIGNIFICANCE_LEVEL {
        Verdict::OffTarget
    } else {
        Verdict::OnTarget
    };

    log::debug!(
        "t-test: n={}, df={}, mean={:.1}, sd={:.1}, target={:.0}, t={:.3}, p={:.4}",
        calories.len(),
        test.degrees_of_freedom,
        test.mean,
        test.std_dev,
        target_calories,
        test.t_statistic,
        test.p_value
    );

    Ok(SignificanceResult {
        sample_size: calories.len(),
        sample_mean: test.mean,
        target_calories,
        t_statistic: test.t_statistic,
        p_value: test.p_value,
        verdict,
    })
}

/// Builds the calories-over-time series in commit order.
pub fn calorie_chart(summaries: &[DailySummary], target_calories: f64) -> CalorieChart {
    CalorieChart {
        points: summaries
            .iter()
            .map(|s| CaloriePoint {
                date: s.date,
                calories: s.totals.calories,
            })
            .collect(),
        target_calories,
    }
}

// === Helper Functions ===

/// Returns the last `window` summaries, or an error if there are fewer.
fn last_window(summaries: &[DailySummary], window: usize) -> Result<&[DailySummary], TrendError> {
    if window == 0 || summaries.len() < window {
        return Err(TrendError::InsufficientSummaries {
            available: summaries.len(),
            required: window.max(1),
        });
    }
    Ok(&summaries[summaries.len() - window..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() < tolerance
    }

    fn summaries_with_calories(calories: &[f64]) -> Vec<DailySummary> {
        calories
            .iter()
            .enumerate()
            .map(|(i, &c)| DailySummary {
                date: make_date(2024, 1, 1 + i as u32),
                totals: Macros::new(c, c / 20.0, c / 8.0, c / 40.0),
            })
            .collect()
    }

    #[test]
    fn test_trailing_average_requires_full_window() {
        let summaries = summaries_with_calories(&[2000.0; 6]);
        assert_eq!(
            trailing_average(&summaries, DEFAULT_WINDOW),
            Err(TrendError::InsufficientSummaries {
                available: 6,
                required: 7
            })
        );
    }

    #[test]
    fn test_trailing_average_uses_last_seven() {
        // The first value must be ignored
        let summaries =
            summaries_with_calories(&[9000.0, 1000.0, 2000.0, 3000.0, 1000.0, 2000.0, 3000.0, 2000.0]);

        let avg = trailing_average(&summaries, DEFAULT_WINDOW).unwrap();

        assert!(approx_eq(avg.calories, 2000.0, 1e-9));
        assert!(approx_eq(avg.protein, 100.0, 1e-9));
        assert!(approx_eq(avg.carbs, 250.0, 1e-9));
        assert!(approx_eq(avg.fat, 50.0, 1e-9));
    }

    #[test]
    fn test_trailing_average_zero_window() {
        let summaries = summaries_with_calories(&[2000.0; 7]);
        assert!(trailing_average(&summaries, 0).is_err());
    }

    #[test]
    fn test_significance_on_target_when_all_equal_target() {
        let summaries = summaries_with_calories(&[2000.0; 7]);

        let result = significance_test(&summaries, DEFAULT_WINDOW, 2000.0).unwrap();

        assert_eq!(result.p_value, 1.0);
        assert_eq!(result.verdict, Verdict::OnTarget);
    }

    #[test]
    fn test_significance_off_target_when_far_from_target() {
        let summaries = summaries_with_calories(&[3000.0; 7]);

        let result = significance_test(&summaries, DEFAULT_WINDOW, 2000.0).unwrap();

        assert_eq!(result.verdict, Verdict::OffTarget);
        assert!(result.p_value < SIGNIFICANCE_LEVEL);
    }

    #[test]
    fn test_significance_noisy_but_centered_is_on_target() {
        let summaries =
            summaries_with_calories(&[1800.0, 2200.0, 1900.0, 2100.0, 2050.0, 1950.0, 2000.0]);

        let result = significance_test(&summaries, DEFAULT_WINDOW, 2000.0).unwrap();

        assert!(approx_eq(result.sample_mean, 2000.0, 1e-9));
        assert!(approx_eq(result.p_value, 1.0, 1e-9));
        assert_eq!(result.verdict, Verdict::OnTarget);
    }

    #[test]
    fn test_significance_consistent_surplus_is_off_target() {
        let summaries =
            summaries_with_calories(&[2400.0, 2500.0, 2450.0, 2550.0, 2500.0, 2480.0, 2520.0]);

        let result = significance_test(&summaries, DEFAULT_WINDOW, 2000.0).unwrap();

        assert!(result.t_statistic > 0.0);
        assert_eq!(result.verdict, Verdict::OffTarget);
    }

    #[test]
    fn test_significance_insufficient_summaries() {
        let summaries = summaries_with_calories(&[2000.0; 3]);
        assert_eq!(
            significance_test(&summaries, DEFAULT_WINDOW, 2000.0),
            Err(TrendError::InsufficientSummaries {
                available: 3,
                required: 7
            })
        );
    }

    #[test]
    fn test_significance_single_value_window_is_degenerate() {
        let summaries = summaries_with_calories(&[2000.0; 7]);
        assert_eq!(
            significance_test(&summaries, 1, 2000.0),
            Err(TrendError::DegenerateSample {
                window: 1,
                required: 2
            })
        );
    }

    #[test]
    fn test_calorie_chart_keeps_commit_order() {
        let mut summaries = summaries_with_calories(&[1500.0, 1700.0]);
        summaries.push(DailySummary {
            date: make_date(2024, 1, 1),
            totals: Macros::new(1600.0, 0.0, 0.0, 0.0),
        });

        let chart = calorie_chart(&summaries, 1800.0);

        assert_eq!(chart.target_calories, 1800.0);
        let calories: Vec<f64> = chart.points.iter().map(|p| p.calories).collect();
        assert_eq!(calories, vec![1500.0, 1700.0, 1600.0]);
        assert_eq!(chart.points[2].date, make_date(2024, 1, 1));
    }

    #[test]
    fn test_trend_error_serializes_tagged() {
        let err = TrendError::InsufficientSummaries {
            available: 2,
            required: 7,
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["error"], "insufficient_summaries");
        assert_eq!(json["details"]["available"], 2);
    }
}
