use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

/// Valuation date for a UTC instant. All look-back windows are computed on
/// UTC calendar dates.
pub fn valuation_date(instant: DateTime<Utc>) -> NaiveDate {
    instant.date_naive()
}

/// The date `days` calendar days before `instant`.
pub fn days_before(instant: DateTime<Utc>, days: i64) -> NaiveDate {
    valuation_date(instant - Duration::days(days))
}

/// January 1st of the year containing `instant`.
pub fn start_of_year(instant: DateTime<Utc>) -> NaiveDate {
    let date = valuation_date(instant);
    date.with_ordinal(1).unwrap_or(date)
}

/// Every date from `start` to `end`, both inclusive. Empty when `start > end`.
pub fn get_days_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    if start > end {
        return Vec::new();
    }
    start.iter_days().take_while(|d| *d <= end).collect()
}

/// The trailing `n + 1` dates ending at `end`, oldest first. `n` daily
/// returns need `n + 1` values.
pub fn trailing_days(end: NaiveDate, n: u32) -> Vec<NaiveDate> {
    let start = end - Duration::days(i64::from(n));
    get_days_between(start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn days_between_is_inclusive() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 27).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let days = get_days_between(start, end);
        assert_eq!(days.len(), 4);
        assert_eq!(days.first(), Some(&start));
        assert_eq!(days.last(), Some(&end));
    }

    #[test]
    fn days_between_reversed_range_is_empty() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(get_days_between(start, end).is_empty());
    }

    #[test]
    fn trailing_days_yields_one_extra_point() {
        let end = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let days = trailing_days(end, 30);
        assert_eq!(days.len(), 31);
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2024, 5, 31).unwrap());
    }

    #[test]
    fn start_of_year_is_first_of_january() {
        let now = Utc.with_ymd_and_hms(2024, 8, 15, 13, 0, 0).unwrap();
        assert_eq!(
            start_of_year(now),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert_eq!(
            days_before(now, 7),
            NaiveDate::from_ymd_opt(2024, 8, 8).unwrap()
        );
    }
}
