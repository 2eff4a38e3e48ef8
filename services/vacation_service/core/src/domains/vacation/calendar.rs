//! Business-day computation and vacation-period resolution.
//!
//! Business days are weekdays (Monday–Friday); holiday calendars are not
//! consumed here even when present in company settings. All functions are
//! pure over their inputs.

use chrono::{Datelike, NaiveDate, Weekday};

use super::domain::model::VacationPeriod;

/// Count of days in [start, end] inclusive whose weekday is Mon–Fri.
/// Returns 0 when start > end.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> i32 {
    if start > end {
        return 0;
    }
    let mut count = 0;
    let mut day = start;
    while day <= end {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            count += 1;
        }
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }
    count
}

/// Resolve the vacation period for a date within a company.
///
/// First active period covering the date wins; overlapping candidates are
/// ordered deterministically: default first, then earliest start date, then
/// lexicographically smallest name.
pub fn resolve_period(periods: &[VacationPeriod], date: NaiveDate) -> Option<&VacationPeriod> {
    periods
        .iter()
        .filter(|p| p.is_active && p.covers(date))
        .min_by(|a, b| {
            b.is_default
                .cmp(&a.is_default)
                .then(a.start_date.cmp(&b.start_date))
                .then(a.name.cmp(&b.name))
        })
}

/// Bounds of the materialized-on-demand default period containing `date`:
/// April 1 to March 31.
pub fn default_period_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let year = date.year();
    let april_first = NaiveDate::from_ymd_opt(year, 4, 1).expect("April 1 exists");
    if date >= april_first {
        (
            april_first,
            NaiveDate::from_ymd_opt(year + 1, 3, 31).expect("March 31 exists"),
        )
    } else {
        (
            NaiveDate::from_ymd_opt(year - 1, 4, 1).expect("April 1 exists"),
            NaiveDate::from_ymd_opt(year, 3, 31).expect("March 31 exists"),
        )
    }
}

/// Display name for a materialized default period, e.g. "2025-2026".
pub fn default_period_name(start: NaiveDate) -> String {
    format!("{}-{}", start.year(), start.year() + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use uuid::Uuid;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn period(
        name: &str,
        start: NaiveDate,
        end: NaiveDate,
        is_default: bool,
        is_active: bool,
    ) -> VacationPeriod {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        VacationPeriod {
            period_id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            name: name.to_string(),
            start_date: start,
            end_date: end,
            is_default,
            is_active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn weekday_boundaries() {
        // Mon..Fri
        assert_eq!(business_days(d(2025, 1, 6), d(2025, 1, 10)), 5);
        // Fri..Mon
        assert_eq!(business_days(d(2025, 1, 10), d(2025, 1, 13)), 2);
        // Sat..Sun
        assert_eq!(business_days(d(2025, 1, 11), d(2025, 1, 12)), 0);
        // Single weekday
        assert_eq!(business_days(d(2025, 1, 8), d(2025, 1, 8)), 1);
        // Inverted range
        assert_eq!(business_days(d(2025, 1, 10), d(2025, 1, 6)), 0);
    }

    #[test]
    fn full_week_has_five_business_days() {
        assert_eq!(business_days(d(2025, 7, 14), d(2025, 7, 18)), 5);
        assert_eq!(business_days(d(2025, 7, 14), d(2025, 7, 20)), 5);
    }

    #[test]
    fn resolution_prefers_default_then_start_then_name() {
        let overlapping = vec![
            period("b", d(2025, 4, 1), d(2026, 3, 31), false, true),
            period("a", d(2025, 4, 1), d(2026, 3, 31), false, true),
            period("z", d(2025, 1, 1), d(2025, 12, 31), true, true),
        ];
        let resolved = resolve_period(&overlapping, d(2025, 7, 14)).unwrap();
        assert_eq!(resolved.name, "z"); // default wins

        let no_default = vec![
            period("b", d(2025, 4, 1), d(2026, 3, 31), false, true),
            period("a", d(2025, 4, 1), d(2026, 3, 31), false, true),
            period("c", d(2025, 1, 1), d(2025, 12, 31), false, true),
        ];
        let resolved = resolve_period(&no_default, d(2025, 7, 14)).unwrap();
        assert_eq!(resolved.name, "c"); // earliest start

        let same_start = vec![
            period("b", d(2025, 4, 1), d(2026, 3, 31), false, true),
            period("a", d(2025, 4, 1), d(2026, 3, 31), false, true),
        ];
        let resolved = resolve_period(&same_start, d(2025, 7, 14)).unwrap();
        assert_eq!(resolved.name, "a"); // smallest name
    }

    #[test]
    fn inactive_and_non_covering_periods_are_skipped() {
        let periods = vec![
            period("inactive", d(2025, 4, 1), d(2026, 3, 31), true, false),
            period("elsewhere", d(2024, 4, 1), d(2025, 3, 31), false, true),
        ];
        assert!(resolve_period(&periods, d(2025, 7, 14)).is_none());
    }

    #[test]
    fn request_is_assigned_by_start_date() {
        // A range straddling two periods resolves to the one covering its
        // start date.
        let periods = vec![
            period("2024", d(2024, 4, 1), d(2025, 3, 31), false, true),
            period("2025", d(2025, 4, 1), d(2026, 3, 31), false, true),
        ];
        let resolved = resolve_period(&periods, d(2025, 3, 31)).unwrap();
        assert_eq!(resolved.name, "2024");
    }

    #[test]
    fn default_bounds_wrap_the_fiscal_year() {
        assert_eq!(
            default_period_bounds(d(2025, 7, 14)),
            (d(2025, 4, 1), d(2026, 3, 31))
        );
        assert_eq!(
            default_period_bounds(d(2025, 4, 1)),
            (d(2025, 4, 1), d(2026, 3, 31))
        );
        assert_eq!(
            default_period_bounds(d(2025, 3, 31)),
            (d(2024, 4, 1), d(2025, 3, 31))
        );
        assert_eq!(default_period_name(d(2025, 4, 1)), "2025-2026");
    }

    proptest! {
        /// business_days is deterministic and equals the naive weekday count.
        #[test]
        fn business_days_matches_naive_count(offset in 0i64..3650, len in 0i64..60) {
            let start = d(2020, 1, 1) + chrono::Duration::days(offset);
            let end = start + chrono::Duration::days(len);

            let naive = (0..=len)
                .map(|i| start + chrono::Duration::days(i))
                .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
                .count() as i32;

            prop_assert_eq!(business_days(start, end), naive);
            prop_assert_eq!(business_days(start, end), business_days(start, end));
        }

        /// Every day belongs to exactly one default-period window.
        #[test]
        fn default_bounds_cover_their_date(offset in 0i64..7300) {
            let date = d(2020, 1, 1) + chrono::Duration::days(offset);
            let (start, end) = default_period_bounds(date);
            prop_assert!(start <= date && date <= end);
            prop_assert_eq!(start.month(), 4);
            prop_assert_eq!(start.day(), 1);
            prop_assert_eq!(end.month(), 3);
            prop_assert_eq!(end.day(), 31);
        }
    }
}
