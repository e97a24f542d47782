//! Excel file parsing for the food reference table.

use calamine::{Data, DataType, Reader, Xlsx, open_workbook};
use log::warn;
use std::path::Path;

use crate::domain::{FoodItem, FoodReference, Macros};
use crate::error::ParseError;

/// Expected column names (case-insensitive).
const COL_FOOD: &str = "food item";
const COL_CALORIES: &str = "calories per 100g";
const COL_PROTEIN: &str = "protein per 100g";
const COL_CARBS: &str = "carbs per 100g";
const COL_FAT: &str = "fat per 100g";

/// Finds column indices from the header row.
#[derive(Debug)]
struct ColumnIndices {
    food: usize,
    calories: usize,
    protein: usize,
    carbs: usize,
    fat: usize,
}

impl ColumnIndices {
    fn from_header(header: &[Data]) -> Result<Self, ParseError> {
        let find_column = |name: &str| -> Result<usize, ParseError> {
            header
                .iter()
                .position(|cell| {
                    cell.get_string()
                        .is_some_and(|s| s.trim().eq_ignore_ascii_case(name))
                })
                .ok_or_else(|| ParseError::MissingColumn(name.to_string()))
        };

        Ok(Self {
            food: find_column(COL_FOOD)?,
            calories: find_column(COL_CALORIES)?,
            protein: find_column(COL_PROTEIN)?,
            carbs: find_column(COL_CARBS)?,
            fat: find_column(COL_FAT)?,
        })
    }
}

/// Loads the food reference table from an Excel file.
///
/// # Arguments
/// * `path` - Path to the Excel file (.xlsx)
///
/// # Returns
/// FoodReference keyed by food name. Rows with bad values are skipped with a
/// warning, and so are repeated names (the first row wins).
///
/// # Errors
/// Returns ParseError if the file is missing, cannot be read, or lacks a
/// required column.
pub fn load_food_reference<P: AsRef<Path>>(path: P) -> Result<FoodReference, ParseError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ParseError::FileNotFound(path.display().to_string()));
    }

    let mut workbook: Xlsx<_> = open_workbook(path)
        .map_err(|e| ParseError::CannotRead(format!("{}: {}", path.display(), e)))?;

    // Get the first worksheet
    let sheet_names = workbook.sheet_names().to_vec();
    let sheet_name = sheet_names
        .first()
        .ok_or_else(|| ParseError::InvalidFormat("workbook has no sheets".to_string()))?;

    let range = workbook.worksheet_range(sheet_name).map_err(|e| {
        ParseError::CannotRead(format!("cannot read sheet '{}': {}", sheet_name, e))
    })?;

    parse_rows(range.rows())
}

/// Parses a header row followed by food rows.
fn parse_rows<'a>(mut rows: impl Iterator<Item = &'a [Data]>) -> Result<FoodReference, ParseError> {
    let header = rows
        .next()
        .ok_or_else(|| ParseError::InvalidFormat("empty worksheet".to_string()))?;

    let indices = ColumnIndices::from_header(header)?;

    let mut items = Vec::new();

    for (row_idx, row) in rows.enumerate() {
        let row_num = row_idx + 2; // +1 for 0-index, +1 for header row

        match parse_food_row(row, &indices, row_num) {
            Ok(Some(item)) => items.push(item),
            Ok(None) => continue,
            Err(e) => warn!("{}", e),
        }
    }

    let (reference, duplicates) = FoodReference::from_items(items);
    for dup in duplicates {
        warn!("duplicate food item '{}' ignored", dup.name);
    }

    Ok(reference)
}

/// Parses one data row. Returns None for rows without a food name.
fn parse_food_row(
    row: &[Data],
    indices: &ColumnIndices,
    row_num: usize,
) -> Result<Option<FoodItem>, ParseError> {
    let name = match row.get(indices.food) {
        Some(Data::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        // Skip empty rows silently (common at end of spreadsheets)
        None | Some(Data::Empty) | Some(Data::String(_)) => return Ok(None),
        Some(other) => other.to_string(),
    };

    let per_100g = Macros::new(
        parse_amount(row.get(indices.calories), row_num, "Calories per 100g")?,
        parse_amount(row.get(indices.protein), row_num, "Protein per 100g")?,
        parse_amount(row.get(indices.carbs), row_num, "Carbs per 100g")?,
        parse_amount(row.get(indices.fat), row_num, "Fat per 100g")?,
    );

    Ok(Some(FoodItem::new(name, per_100g)))
}

/// Parses a non-negative per-100g amount from a cell.
fn parse_amount(cell: Option<&Data>, row: usize, column: &'static str) -> Result<f64, ParseError> {
    let invalid = |value: String| ParseError::InvalidNumber { row, column, value };

    let value = match cell {
        Some(Data::Float(f)) => *f,
        Some(Data::Int(i)) => *i as f64,
        Some(Data::String(s)) => s.trim().parse::<f64>().map_err(|_| invalid(s.clone()))?,
        None | Some(Data::Empty) => return Err(invalid("(empty)".to_string())),
        Some(other) => return Err(invalid(format!("{:?}", other))),
    };

    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(invalid(value.to_string()))
    }
}
