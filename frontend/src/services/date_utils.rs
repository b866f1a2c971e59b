//! Date and time helpers shared by the calendar, the slot grid and the view model.
//!
//! Dates travel as `YYYY-MM-DD` strings and slot times as `HH:MM`; display
//! strings are in Brazilian Portuguese, like the rest of the patient client.

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};

const MONTH_NAMES: [&str; 12] = [
    "janeiro", "fevereiro", "março", "abril", "maio", "junho",
    "julho", "agosto", "setembro", "outubro", "novembro", "dezembro",
];

/// Format a date for the API (`YYYY-MM-DD`)
pub fn format_iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a slot time. The API sometimes returns `HH:MM:SS`, which is accepted too.
pub fn parse_slot_time(time_str: &str) -> Option<NaiveTime> {
    let trimmed = time_str.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .ok()
}

/// Format a slot time as `HH:MM`
pub fn format_slot_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Lowercase Portuguese month name for a 1-based month
pub fn month_name(month: u32) -> &'static str {
    match month {
        1..=12 => MONTH_NAMES[(month - 1) as usize],
        _ => "mês inválido",
    }
}

/// Portuguese weekday name as used in long dates ("segunda-feira")
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "segunda-feira",
        Weekday::Tue => "terça-feira",
        Weekday::Wed => "quarta-feira",
        Weekday::Thu => "quinta-feira",
        Weekday::Fri => "sexta-feira",
        Weekday::Sat => "sábado",
        Weekday::Sun => "domingo",
    }
}

/// Calendar header title, e.g. "junho de 2024"
pub fn format_month_title(year: i32, month: u32) -> String {
    format!("{} de {}", month_name(month), year)
}

/// Long date for the "selected date" caption, e.g. "segunda-feira, 10 de junho de 2024"
pub fn format_long_date(date: NaiveDate) -> String {
    format!(
        "{}, {} de {} de {}",
        weekday_name(date.weekday()),
        date.day(),
        month_name(date.month()),
        date.year()
    )
}

/// Short display date, e.g. "12/06/2024"
pub fn format_short_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Number of days in a month (1-based), accounting for leap years
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) { 29 } else { 28 }
        }
        _ => 0,
    }
}

/// Check if a year is a leap year
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

/// Weekday of the first day of the month as a column index (0 = Sunday, ..., 6 = Saturday)
pub fn first_weekday_of_month(year: i32, month: u32) -> Option<u32> {
    NaiveDate::from_ymd_opt(year, month, 1).map(|date| date.weekday().num_days_from_sunday())
}

/// Saturday or Sunday
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Month before (month, year), rolling over at January
pub fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month <= 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

/// Month after (month, year), rolling over at December
pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        assert_eq!(format_iso_date(date), "2024-06-03");
    }

    #[test]
    fn test_parse_slot_time_formats() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert_eq!(parse_slot_time("09:00"), Some(nine));
        assert_eq!(parse_slot_time("09:00:00"), Some(nine));
        assert_eq!(parse_slot_time(" 09:00 "), Some(nine));
        assert_eq!(parse_slot_time("9h"), None);
        assert_eq!(format_slot_time(nine), "09:00");
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2024, 6), 30);
        assert_eq!(days_in_month(2024, 12), 31);
        assert_eq!(days_in_month(2024, 13), 0);
    }

    #[test]
    fn test_first_weekday_of_month() {
        // June 1st 2024 was a Saturday
        assert_eq!(first_weekday_of_month(2024, 6), Some(6));
        // September 1st 2024 was a Sunday
        assert_eq!(first_weekday_of_month(2024, 9), Some(0));
        assert_eq!(first_weekday_of_month(2024, 0), None);
    }

    #[test]
    fn test_month_navigation_rollover() {
        assert_eq!(previous_month(2025, 6), (2025, 5));
        assert_eq!(previous_month(2025, 1), (2024, 12));
        assert_eq!(next_month(2025, 6), (2025, 7));
        assert_eq!(next_month(2025, 12), (2026, 1));
    }

    #[test]
    fn test_portuguese_formatting() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        assert_eq!(format_long_date(date), "segunda-feira, 10 de junho de 2024");
        assert_eq!(format_month_title(2024, 3), "março de 2024");
        assert_eq!(format_short_date(date), "10/06/2024");
        assert_eq!(month_name(13), "mês inválido");
    }
}
