//! Domain types for biometric input, food reference data and the food log.

use std::collections::HashMap;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Biological sex used by the BMR and water intake formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Returns the display name for the sex.
    pub fn display_name(&self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
        }
    }
}

impl FromStr for Sex {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            _ => Err(InputError::UnknownSex(s.to_string())),
        }
    }
}

impl TryFrom<String> for Sex {
    type Error = InputError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Sex> for &'static str {
    fn from(sex: Sex) -> Self {
        sex.display_name()
    }
}

impl std::fmt::Display for Sex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Activity tiers used to scale BMR into TDEE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum ActivityLevel {
    Sedentary,
    LightlyActive,
    ModeratelyActive,
    VeryActive,
    ExtraActive,
}

impl ActivityLevel {
    /// Returns all activity levels, least active first.
    pub fn all() -> &'static [ActivityLevel] {
        &[
            ActivityLevel::Sedentary,
            ActivityLevel::LightlyActive,
            ActivityLevel::ModeratelyActive,
            ActivityLevel::VeryActive,
            ActivityLevel::ExtraActive,
        ]
    }

    /// TDEE multiplier for this tier.
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::LightlyActive => 1.375,
            ActivityLevel::ModeratelyActive => 1.55,
            ActivityLevel::VeryActive => 1.725,
            ActivityLevel::ExtraActive => 1.9,
        }
    }

    /// Returns the label shown in the activity selector.
    pub fn display_name(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "Sedentary: Little to no exercise (desk job)",
            ActivityLevel::LightlyActive => "Lightly Active: Light exercise 1-3 days/week",
            ActivityLevel::ModeratelyActive => {
                "Moderately Active: Moderate exercise 3-5 days/week"
            }
            ActivityLevel::VeryActive => "Very Active: Hard exercise 6-7 days/week",
            ActivityLevel::ExtraActive => "Extra Active: Very hard exercise or physical job",
        }
    }

    /// Short identifier, the part of the label before the colon.
    pub fn id(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::LightlyActive => "lightly_active",
            ActivityLevel::ModeratelyActive => "moderately_active",
            ActivityLevel::VeryActive => "very_active",
            ActivityLevel::ExtraActive => "extra_active",
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = InputError;

    /// Accepts the exact selector label or the exact short id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        ActivityLevel::all()
            .iter()
            .copied()
            .find(|level| level.display_name() == trimmed || level.id() == trimmed)
            .ok_or_else(|| InputError::UnknownActivityLevel(s.to_string()))
    }
}

impl TryFrom<String> for ActivityLevel {
    type Error = InputError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ActivityLevel> for &'static str {
    fn from(level: ActivityLevel) -> Self {
        level.display_name()
    }
}

impl std::fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Energy and macronutrient amounts (kcal and grams).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl Macros {
    pub fn new(calories: f64, protein: f64, carbs: f64, fat: f64) -> Self {
        Self {
            calories,
            protein,
            carbs,
            fat,
        }
    }

    /// Scales per-100g reference values to the given quantity in grams.
    pub fn scaled_to_grams(&self, grams: f64) -> Self {
        self.map(|v| v * grams / 100.0)
    }

    /// Divides every component by `count`. Caller guarantees `count > 0`.
    pub fn divided_by(&self, count: usize) -> Self {
        let n = count as f64;
        self.map(|v| v / n)
    }

    fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            calories: f(self.calories),
            protein: f(self.protein),
            carbs: f(self.carbs),
            fat: f(self.fat),
        }
    }
}

impl Add for Macros {
    type Output = Macros;

    fn add(self, rhs: Macros) -> Macros {
        Macros {
            calories: self.calories + rhs.calories,
            protein: self.protein + rhs.protein,
            carbs: self.carbs + rhs.carbs,
            fat: self.fat + rhs.fat,
        }
    }
}

impl AddAssign for Macros {
    fn add_assign(&mut self, rhs: Macros) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for Macros {
    fn sum<I: Iterator<Item = Macros>>(iter: I) -> Self {
        iter.fold(Macros::default(), Add::add)
    }
}

/// A row of the food reference table: macros per 100g.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodItem {
    pub name: String,
    pub per_100g: Macros,
}

impl FoodItem {
    pub fn new(name: impl Into<String>, per_100g: Macros) -> Self {
        Self {
            name: name.into(),
            per_100g,
        }
    }
}

/// Immutable lookup of food items by name, preserving table order.
#[derive(Debug, Clone, Default)]
pub struct FoodReference {
    items: Vec<FoodItem>,
    index: HashMap<String, usize>,
}

impl FoodReference {
    /// Builds the reference from items. Later duplicates of a name are
    /// dropped and returned so the loader can report them.
    pub fn from_items(items: Vec<FoodItem>) -> (Self, Vec<FoodItem>) {
        let mut reference = FoodReference::default();
        let mut duplicates = Vec::new();

        for item in items {
            if reference.index.contains_key(&item.name) {
                duplicates.push(item);
                continue;
            }
            reference
                .index
                .insert(item.name.clone(), reference.items.len());
            reference.items.push(item);
        }

        (reference, duplicates)
    }

    /// Looks up a food item by exact name.
    pub fn get(&self, name: &str) -> Result<&FoodItem, InputError> {
        self.index
            .get(name)
            .map(|&i| &self.items[i])
            .ok_or_else(|| InputError::UnknownFood(name.to_string()))
    }

    /// Food names in table order, as offered by the food selector.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One food consumed on one date, with macros fixed at entry time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumptionEntry {
    pub date: NaiveDate,
    pub food: String,
    #[serde(flatten)]
    pub macros: Macros,
}

/// Snapshot of a day's totals taken when the user saves the day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub totals: Macros,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_level_from_full_label() {
        for level in ActivityLevel::all() {
            assert_eq!(
                ActivityLevel::from_str(level.display_name()).unwrap(),
                *level
            );
        }
    }

    #[test]
    fn test_activity_level_from_ids() {
        for level in ActivityLevel::all() {
            assert_eq!(ActivityLevel::from_str(level.id()).unwrap(), *level);
        }
    }

    #[test]
    fn test_activity_level_invalid() {
        assert_eq!(
            ActivityLevel::from_str("Couch Potato"),
            Err(InputError::UnknownActivityLevel("Couch Potato".to_string()))
        );
        assert!(ActivityLevel::from_str("").is_err());
    }

    #[test]
    fn test_activity_level_rejects_near_matches() {
        for label in [
            "Sedentary: anything",
            "Sedentary",
            "Lightly Active",
            "very-active",
            "VERY_ACTIVE",
        ] {
            assert_eq!(
                ActivityLevel::from_str(label),
                Err(InputError::UnknownActivityLevel(label.to_string()))
            );
        }
    }

    #[test]
    fn test_activity_multipliers() {
        let multipliers: Vec<f64> = ActivityLevel::all().iter().map(|l| l.multiplier()).collect();
        assert_eq!(multipliers, vec![1.2, 1.375, 1.55, 1.725, 1.9]);
    }

    #[test]
    fn test_sex_from_str() {
        assert_eq!(Sex::from_str("Male").unwrap(), Sex::Male);
        assert_eq!(Sex::from_str(" female ").unwrap(), Sex::Female);
        assert!(Sex::from_str("other").is_err());
    }

    #[test]
    fn test_sex_serde_uses_display_name() {
        let json = serde_json::to_string(&Sex::Female).unwrap();
        assert_eq!(json, "\"Female\"");
        let parsed: Sex = serde_json::from_str("\"male\"").unwrap();
        assert_eq!(parsed, Sex::Male);
    }

    #[test]
    fn test_macros_scaled_to_grams() {
        let apple = Macros::new(52.0, 0.3, 14.0, 0.2);
        let scaled = apple.scaled_to_grams(150.0);
        assert!((scaled.calories - 78.0).abs() < 1e-9);
        assert!((scaled.carbs - 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_macros_sum() {
        let total: Macros = vec![Macros::new(1.0, 2.0, 3.0, 4.0), Macros::new(1.0, 1.0, 1.0, 1.0)]
            .into_iter()
            .sum();
        assert_eq!(total, Macros::new(2.0, 3.0, 4.0, 5.0));
    }

    #[test]
    fn test_food_reference_lookup_and_duplicates() {
        let items = vec![
            FoodItem::new("Apple", Macros::new(52.0, 0.3, 14.0, 0.2)),
            FoodItem::new("Rice", Macros::new(130.0, 2.7, 28.0, 0.3)),
            FoodItem::new("Apple", Macros::new(99.0, 9.0, 9.0, 9.0)),
        ];

        let (reference, duplicates) = FoodReference::from_items(items);

        assert_eq!(reference.len(), 2);
        assert_eq!(duplicates.len(), 1);
        assert_eq!(reference.get("Apple").unwrap().per_100g.calories, 52.0);
        assert_eq!(reference.names().collect::<Vec<_>>(), vec!["Apple", "Rice"]);
        assert_eq!(
            reference.get("Banana"),
            Err(InputError::UnknownFood("Banana".to_string()))
        );
    }
}
