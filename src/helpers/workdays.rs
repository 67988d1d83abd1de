use chrono::{Datelike, Duration, NaiveDate};
use tracing::debug;

use crate::errors::{TimesheetError, TimesheetResult};

/// Upper bound on the number of week anchors a month can produce.
pub const MAX_WEEKS: usize = 8;

/// Returns one representative workday per calendar week of `year`/`month`.
///
/// The first entry is the 1st of the month when it falls on a weekday and
/// `None` otherwise. The second is day `8 - weekday(1st)`, i.e. the Monday
/// starting the second week. Every following entry is seven days after the
/// previous one until the month rolls over or the calendar ends.
pub fn compute_week_anchors(year: i32, month: u32) -> TimesheetResult<Vec<Option<NaiveDate>>> {
    let invalid = || TimesheetError::InvalidMonth { year, month };

    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let weekday = first.weekday().num_days_from_monday();

    let mut anchors = Vec::with_capacity(MAX_WEEKS);
    anchors.push(if weekday > 4 { None } else { Some(first) });

    let second_week = NaiveDate::from_ymd_opt(year, month, 8 - weekday).ok_or_else(invalid)?;
    anchors.push(Some(second_week));

    let mut next = second_week;
    while anchors.len() < MAX_WEEKS {
        // past the last representable date the month has rolled over too
        match next.checked_add_signed(Duration::days(7)) {
            Some(date) if date.month() == second_week.month() => next = date,
            _ => break,
        }
        anchors.push(Some(next));
    }

    debug!("Computed {} week anchors for {}-{:02}", anchors.len(), year, month);
    Ok(anchors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn march_2024_has_five_anchors() {
        let anchors = compute_week_anchors(2024, 3).unwrap();
        assert_eq!(
            anchors,
            vec![
                Some(date(2024, 3, 1)),
                Some(date(2024, 3, 4)),
                Some(date(2024, 3, 11)),
                Some(date(2024, 3, 18)),
                Some(date(2024, 3, 25)),
            ]
        );
    }

    #[test]
    fn weekend_start_has_no_first_workday() {
        // 2024-06-01 is a Saturday
        let anchors = compute_week_anchors(2024, 6).unwrap();
        assert_eq!(anchors[0], None);
        assert_eq!(anchors[1], Some(date(2024, 6, 3)));

        // 2024-09-01 is a Sunday
        let anchors = compute_week_anchors(2024, 9).unwrap();
        assert_eq!(anchors[0], None);
        assert_eq!(anchors[1], Some(date(2024, 9, 2)));
        assert_eq!(anchors.last(), Some(&Some(date(2024, 9, 30))));
        assert_eq!(anchors.len(), 6);
    }

    #[test]
    fn monday_start_pushes_second_week_to_the_eighth() {
        // 2021-02-01 is a Monday, February has exactly four weeks
        let anchors = compute_week_anchors(2021, 2).unwrap();
        assert_eq!(
            anchors,
            vec![
                Some(date(2021, 2, 1)),
                Some(date(2021, 2, 8)),
                Some(date(2021, 2, 15)),
                Some(date(2021, 2, 22)),
            ]
        );
    }

    #[test]
    fn anchors_hold_for_every_month() {
        for year in 1999..=2031 {
            for month in 1..=12 {
                let anchors = compute_week_anchors(year, month).unwrap();
                assert!(anchors.len() <= MAX_WEEKS);
                assert!(anchors.len() >= 4);

                let first = date(year, month, 1);
                let weekend = matches!(first.weekday(), Weekday::Sat | Weekday::Sun);
                assert_eq!(anchors[0].is_none(), weekend);

                let later: Vec<NaiveDate> = anchors[1..].iter().map(|a| a.unwrap()).collect();
                assert!(later.iter().all(|d| d.month() == month));
                assert!(later.iter().all(|d| d.weekday() == Weekday::Mon));
                for pair in later.windows(2) {
                    assert_eq!(pair[1] - pair[0], Duration::days(7));
                }
                // iteration stops only at the month boundary
                let after = *later.last().unwrap() + Duration::days(7);
                assert_ne!(after.month(), month);
            }
        }
    }

    #[test]
    fn last_representable_month_stops_at_the_calendar_end() {
        let year = NaiveDate::MAX.year();
        let anchors = compute_week_anchors(year, 12).unwrap();
        assert!(anchors.len() >= 4);
        assert!(anchors[1..].iter().all(|a| a.unwrap().month() == 12));

        let err = compute_week_anchors(year + 1, 1).unwrap_err();
        assert!(matches!(err, TimesheetError::InvalidMonth { .. }));
    }

    #[test]
    fn invalid_month_is_an_error() {
        let err = compute_week_anchors(2024, 13).unwrap_err();
        assert!(matches!(err, TimesheetError::InvalidMonth { year: 2024, month: 13 }));
        assert!(compute_week_anchors(2024, 0).is_err());
    }
}
