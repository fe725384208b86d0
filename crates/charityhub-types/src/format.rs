use chrono::Month;

pub const NOT_SPECIFIED: &str = "Not specified";

const MONTH_CODES: [&str; 11] = [
    "01", "02", "03", "04", "05", "06", "07", "08", "09", "10", "11",
];

/// Render a `YYYY-MM-DD` date as `"D Month, YYYY "` for list views.
///
/// The trailing space is part of the established display format.
pub fn sort_date(date: Option<&str>) -> String {
    let date = match date {
        Some(d) if !d.is_empty() => d,
        _ => return NOT_SPECIFIED.to_string(),
    };

    let month = change_month_type(date);
    let parts: Vec<&str> = date.split('-').rev().collect();
    let day = parts.first().copied().unwrap_or_default();
    let year = parts.get(2).copied().unwrap_or_default();

    format!("{} {}, {} ", display_day(day), month, year)
}

/// Month name for the second `-` separated segment of `date`.
///
/// Only the exact codes `"01"` to `"11"` are recognised; everything else,
/// including `"12"`, a missing segment and garbage, renders as December.
pub fn change_month_type(date: &str) -> &'static str {
    let code = date.split('-').nth(1).unwrap_or_default();
    MONTH_CODES
        .iter()
        .position(|c| *c == code)
        .and_then(|idx| Month::try_from(idx as u8 + 1).ok())
        .map(|month| month.name())
        .unwrap_or("December")
}

fn display_day(day: &str) -> &str {
    if day.is_empty() || !day.bytes().all(|b| b.is_ascii_digit()) {
        return day;
    }
    match day.trim_start_matches('0') {
        "" => "0",
        trimmed => trimmed,
    }
}
