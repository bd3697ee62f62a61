// src/periods.rs
//
// Calendar helpers shared by the inspection and lead-time analytics:
// fiscal quarters and the "most recent Wednesday" reference used by the
// weekly inspection delta.
use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Quarter number (1..=4) of a date.
pub fn quarter_of(date: NaiveDate) -> u32 {
    (date.month() - 1) / 3 + 1
}

/// First and last day of a given (year, quarter).
pub fn quarter_bounds(year: i32, quarter: u32) -> Option<(NaiveDate, NaiveDate)> {
    if !(1..=4).contains(&quarter) {
        return None;
    }
    let start_month = (quarter - 1) * 3 + 1;
    let start = NaiveDate::from_ymd_opt(year, start_month, 1)?;
    let end = if quarter == 4 {
        NaiveDate::from_ymd_opt(year, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(year, start_month + 3, 1)? - Duration::days(1)
    };
    Some((start, end))
}

/// Bounds of the quarter containing `today`.
pub fn current_quarter_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    // quarter_of is always 1..=4, so the bounds always exist
    quarter_bounds(today.year(), quarter_of(today)).expect("valid quarter")
}

/// The reference Wednesday for the weekly inspection delta.
///
/// If today is Wednesday the comparison point is the Wednesday a full week
/// ago; after Wednesday it is this week's Wednesday; before Wednesday it is
/// last week's Wednesday.
pub fn last_wednesday(today: NaiveDate) -> NaiveDate {
    let wd = today.weekday().num_days_from_monday() as i64; // Mon=0 .. Sun=6
    const WEDNESDAY: i64 = 2;
    let days_back = if wd == WEDNESDAY {
        7
    } else if wd > WEDNESDAY {
        wd - WEDNESDAY
    } else {
        7 - (WEDNESDAY - wd)
    };
    today - Duration::days(days_back)
}

/// Quarter label in the form the dashboard displays ("Q3 2025").
pub fn quarter_label(year: i32, quarter: u32) -> String {
    format!("Q{} {}", quarter, year)
}

/// Walk back `steps` quarters from (year, quarter).
pub fn previous_quarter(year: i32, quarter: u32, steps: u32) -> (i32, u32) {
    let mut y = year;
    let mut q = quarter as i64 - steps as i64;
    while q <= 0 {
        q += 4;
        y -= 1;
    }
    (y, q as u32)
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn quarter_bounds_cover_the_year() {
        assert_eq!(
            quarter_bounds(2025, 1).unwrap(),
            (d("2025-01-01"), d("2025-03-31"))
        );
        assert_eq!(
            quarter_bounds(2025, 2).unwrap(),
            (d("2025-04-01"), d("2025-06-30"))
        );
        assert_eq!(
            quarter_bounds(2025, 4).unwrap(),
            (d("2025-10-01"), d("2025-12-31"))
        );
        assert!(quarter_bounds(2025, 5).is_none());
    }

    #[test]
    fn last_wednesday_on_wednesday_goes_back_a_week() {
        // 2025-06-04 is a Wednesday
        assert_eq!(last_wednesday(d("2025-06-04")), d("2025-05-28"));
    }

    #[test]
    fn last_wednesday_after_wednesday_stays_in_week() {
        // 2025-06-06 is a Friday -> this week's Wednesday
        assert_eq!(last_wednesday(d("2025-06-06")), d("2025-06-04"));
    }

    #[test]
    fn last_wednesday_before_wednesday_goes_to_previous_week() {
        // 2025-06-02 is a Monday -> last week's Wednesday
        assert_eq!(last_wednesday(d("2025-06-02")), d("2025-05-28"));
    }

    #[test]
    fn previous_quarter_wraps_years() {
        assert_eq!(previous_quarter(2025, 1, 1), (2024, 4));
        assert_eq!(previous_quarter(2025, 2, 3), (2024, 3));
        assert_eq!(previous_quarter(2025, 3, 0), (2025, 3));
    }
}
