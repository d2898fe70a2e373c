use crate::config::ModelConstants;
use std::f64::consts::PI;

/// Month name fragments, matched by substring against lowercased input.
/// Abbreviations come first; every full name contains its abbreviation.
pub const MONTH_NAMES: [(&str, u32); 24] = [
    ("jan", 1),
    ("feb", 2),
    ("mar", 3),
    ("apr", 4),
    ("may", 5),
    ("jun", 6),
    ("jul", 7),
    ("aug", 8),
    ("sep", 9),
    ("oct", 10),
    ("nov", 11),
    ("dec", 12),
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
];

const DISPLAY_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Calendar month (1..=12) that a week index falls in: `ceil(week / weeks_per_month)`.
pub fn month_of_week(week: u32, model: &ModelConstants) -> u32 {
    let month = (week as f64 / model.weeks_per_month).ceil() as u32;
    month.clamp(1, 12)
}

/// `1 + amplitude * sin(2π * week / weeks_per_year)`
pub fn seasonal_factor(week: u32, model: &ModelConstants) -> f64 {
    let phase = 2.0 * PI * week as f64 / model.weeks_per_year as f64;
    1.0 + model.seasonal_amplitude * phase.sin()
}

pub fn month_display_name(month: u32) -> &'static str {
    match month {
        1..=12 => DISPLAY_NAMES[(month - 1) as usize],
        _ => "Unknown",
    }
}

/// Month number for free text such as "Aug", "AUGUST 2024" or "start of march".
pub fn match_month_name(text: &str) -> Option<u32> {
    let lowered = text.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }
    MONTH_NAMES
        .iter()
        .find(|(name, _)| lowered.contains(name))
        .map(|&(_, month)| month)
}
