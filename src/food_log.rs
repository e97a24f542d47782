//! Session-scoped food log: per-day consumption entries and saved day summaries.
//!
//! Entries are keyed by (date, food). Adding the same food again on the same
//! date replaces the earlier entry. Summaries are snapshots appended when the
//! user saves a day and are never updated afterwards.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::domain::{ConsumptionEntry, DailySummary, FoodItem, FoodReference, Macros};
use crate::error::InputError;

/// A food picked in the selector together with the quantity eaten.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FoodSelection {
    pub food: String,
    pub grams: u32,
}

impl FoodSelection {
    #[cfg(test)]
    pub fn new(food: impl Into<String>, grams: u32) -> Self {
        Self {
            food: food.into(),
            grams,
        }
    }
}

/// The calorie tracker state of one session.
#[derive(Debug, Clone, Default)]
pub struct FoodLog {
    entries: BTreeMap<(NaiveDate, String), ConsumptionEntry>,
    summaries: Vec<DailySummary>,
}

impl FoodLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the entry for (date, food) with the reference
    /// macros scaled to `grams`.
    ///
    /// Returns false without touching the log when `grams` is not positive.
    pub fn add_or_update_entry(
        &mut self,
        date: NaiveDate,
        food_name: &str,
        grams: f64,
        item: &FoodItem,
    ) -> bool {
        if grams.is_nan() || grams <= 0.0 {
            return false;
        }

        let entry = ConsumptionEntry {
            date,
            food: food_name.to_string(),
            macros: item.per_100g.scaled_to_grams(grams),
        };
        self.entries.insert((date, food_name.to_string()), entry);
        true
    }

    /// Applies a batch of selections for one date.
    ///
    /// Every food is resolved first, so an unknown name leaves the log
    /// unchanged. Returns the number of entries written.
    pub fn add_foods(
        &mut self,
        date: NaiveDate,
        reference: &FoodReference,
        selections: &[FoodSelection],
    ) -> Result<usize, InputError> {
        let resolved = selections
            .iter()
            .map(|s| reference.get(&s.food).map(|item| (s, item)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut written = 0;
        for (selection, item) in resolved {
            if self.add_or_update_entry(date, &selection.food, f64::from(selection.grams), item) {
                written += 1;
            }
        }

        log::debug!(
            "Logged {} of {} foods for {} ({} entries total)",
            written,
            selections.len(),
            date,
            self.entry_count()
        );
        Ok(written)
    }

    /// Sums the macros of all entries on `date`. Zero when there are none.
    pub fn totals_for_date(&self, date: NaiveDate) -> Macros {
        self.entries_for_date(date).map(|e| e.macros).sum()
    }

    /// Appends a summary of the current totals for `date` and returns it.
    ///
    /// Saving the same date twice appends two summaries.
    pub fn commit_day(&mut self, date: NaiveDate) -> &DailySummary {
        let totals = self.totals_for_date(date);
        self.summaries.push(DailySummary { date, totals });
        &self.summaries[self.summaries.len() - 1]
    }

    /// Macro totals for a past day, or None if nothing was logged that day.
    pub fn nutrient_breakdown(&self, date: NaiveDate) -> Option<Macros> {
        let mut entries = self.entries_for_date(date).peekable();
        entries.peek()?;
        Some(entries.map(|e| e.macros).sum())
    }

    /// All entries ordered by date, then food name.
    pub fn entries(&self) -> impl Iterator<Item = &ConsumptionEntry> {
        self.entries.values()
    }

    /// Entries logged on `date`, ordered by food name.
    pub fn entries_for_date(&self, date: NaiveDate) -> impl Iterator<Item = &ConsumptionEntry> {
        let start = (date, String::new());
        self.entries
            .range(start..)
            .take_while(move |((d, _), _)| *d == date)
            .map(|(_, entry)| entry)
    }

    /// Saved day summaries in the order they were committed.
    pub fn summaries(&self) -> &[DailySummary] {
        &self.summaries
    }

    /// Earliest and latest dates with entries.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.entries.keys().next()?.0;
        let last = self.entries.keys().next_back()?.0;
        Some((first, last))
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
