use crate::schema::{CellValue, RawRow};
use crate::seasonality::match_month_name;

const CURRENCY_SYMBOLS: [char; 6] = ['$', '€', '£', '¥', '₹', '₱'];

/// Strips currency symbols, thousands separators and whitespace from a figure.
pub fn clean_numeric_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace() && *c != ',' && !CURRENCY_SYMBOLS.contains(c))
        .collect()
}

/// Parses a cell as a finite, strictly positive number.
pub fn parse_positive_number(cell: &CellValue) -> Option<f64> {
    let cleaned = clean_numeric_text(&cell.to_text());
    if cleaned.is_empty() {
        return None;
    }
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

/// Month name first, then a whole number in 1..=12.
pub fn parse_month(cell: &CellValue) -> Option<u32> {
    let text = cell.to_text();
    if let Some(month) = match_month_name(&text) {
        return Some(month);
    }
    let value = clean_numeric_text(&text).parse::<f64>().ok()?;
    if value.fract() == 0.0 && (1.0..=12.0).contains(&value) {
        Some(value as u32)
    } else {
        None
    }
}

/// Exact-name lookup that ignores blank cells.
pub fn lookup_cell<'r, 'n>(
    row: &'r RawRow,
    names: impl IntoIterator<Item = &'n str>,
) -> Option<&'r CellValue> {
    names
        .into_iter()
        .filter_map(|name| row.get(name))
        .find(|cell| !cell.is_blank())
}

/// Sorted distinct values.
pub fn distinct_sorted<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let set: std::collections::BTreeSet<&str> = values.collect();
    set.into_iter().map(str::to_string).collect()
}
