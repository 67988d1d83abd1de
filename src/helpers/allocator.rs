use chrono::{Duration, NaiveDate, NaiveTime};
use tracing::{debug, info};

use crate::errors::{TimesheetError, TimesheetResult};
use crate::models::hours::WeeklyHours;
use crate::models::session::WorkSession;

const HOURS_PER_DAY: u32 = 24;

/// Limits and start times used when splitting weekly hours into sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationConfig {
    pub session_cap_hours: u32,
    pub day_cap_hours: u32,
    pub session1_start_hour: u32,
    pub session2_start_hour: u32,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            session_cap_hours: 4,
            day_cap_hours: 8,
            session1_start_hour: 8,
            session2_start_hour: 14,
        }
    }
}

impl AllocationConfig {
    /// Rejects settings that would produce overlapping sessions, sessions
    /// crossing midnight or a day loop that never drains the hours.
    pub fn validate(&self) -> TimesheetResult<()> {
        let invalid = |msg: String| Err(TimesheetError::InvalidConfig(msg));

        if self.session_cap_hours == 0 {
            return invalid("session cap must be at least one hour".to_string());
        }
        if self.session_cap_hours > HOURS_PER_DAY || self.day_cap_hours > HOURS_PER_DAY {
            return invalid(format!(
                "session cap {}h and day cap {}h must not exceed {}h",
                self.session_cap_hours, self.day_cap_hours, HOURS_PER_DAY
            ));
        }
        if self.day_cap_hours < self.session_cap_hours {
            return invalid(format!(
                "day cap {}h is below session cap {}h",
                self.day_cap_hours, self.session_cap_hours
            ));
        }
        if self.session1_start_hour >= HOURS_PER_DAY || self.session2_start_hour >= HOURS_PER_DAY {
            return invalid("session start hours must be between 0 and 23".to_string());
        }

        let first_end = self.session1_start_hour.checked_add(self.session_cap_hours);
        let second_end = self.session2_start_hour.checked_add(self.session_cap_hours);

        if first_end.is_none_or(|end| end > self.session2_start_hour) {
            return invalid(format!(
                "first session ({}:00 + {}h) overlaps second session ({}:00)",
                self.session1_start_hour, self.session_cap_hours, self.session2_start_hour
            ));
        }
        if second_end.is_none_or(|end| end > HOURS_PER_DAY) {
            return invalid(format!(
                "second session ({}:00 + {}h) runs past midnight",
                self.session2_start_hour, self.session_cap_hours
            ));
        }
        Ok(())
    }

    fn session_starts(&self) -> TimesheetResult<[NaiveTime; 2]> {
        let at = |hour: u32| {
            NaiveTime::from_hms_opt(hour, 0, 0)
                .ok_or_else(|| TimesheetError::InvalidConfig(format!("invalid start hour {hour}")))
        };
        Ok([at(self.session1_start_hour)?, at(self.session2_start_hour)?])
    }
}

/// Splits every week's hours into dated morning/afternoon sessions.
///
/// `weeks`, `anchors` and `labels` are indexed by week. Weeks without hours
/// are skipped and need neither an anchor nor a label. A week spilling over
/// its day cap continues on `anchor + 1`, `anchor + 2`, ... days, always
/// counted from the anchor and without skipping weekends.
pub fn allocate(
    weeks: &[WeeklyHours],
    anchors: &[Option<NaiveDate>],
    labels: &[String],
    config: &AllocationConfig,
) -> TimesheetResult<Vec<WorkSession>> {
    config.validate()?;
    let starts = config.session_starts()?;

    let mut sessions = Vec::new();

    for (idx, week) in weeks.iter().enumerate() {
        if week.is_empty() {
            continue;
        }

        let anchor = match anchors.get(idx) {
            Some(Some(anchor)) => *anchor,
            Some(None) => return Err(TimesheetError::NoWorkdayInWeek { week: idx + 1 }),
            None => {
                return Err(TimesheetError::InsufficientWorkdays {
                    rows: weeks.len(),
                    workdays: anchors.len(),
                });
            }
        };
        week.validate(idx + 1)?;
        let label = labels
            .get(idx)
            .ok_or(TimesheetError::MissingLabel { week: idx + 1 })?;

        let before = sessions.len();
        allocate_week(*week, anchor, label, &starts, config, &mut sessions)?;
        debug!(
            "Week {} ({}h {}m) split into {} session(s) from {}",
            idx + 1,
            week.hours,
            week.minutes,
            sessions.len() - before,
            anchor
        );
    }

    info!("Allocated {} work sessions", sessions.len());
    Ok(sessions)
}

fn allocate_week(
    week: WeeklyHours,
    anchor: NaiveDate,
    label: &str,
    starts: &[NaiveTime; 2],
    config: &AllocationConfig,
    sessions: &mut Vec<WorkSession>,
) -> TimesheetResult<()> {
    // caps are validated to at most a day, so minutes fit comfortably
    let session_cap = u64::from(config.session_cap_hours) * 60;
    let mut remaining = week.total_minutes();
    let mut day = 0;

    while remaining > 0 {
        let date = anchor
            .checked_add_signed(Duration::days(day))
            .ok_or(TimesheetError::DateOutOfRange { anchor, days: day })?;
        let mut day_budget = u64::from(config.day_cap_hours) * 60;

        for start in starts {
            let minutes = remaining.min(session_cap).min(day_budget);
            if minutes == 0 {
                break;
            }
            sessions.push(WorkSession::new(label, date, *start, minutes as u32));
            remaining -= minutes;
            day_budget -= minutes;
        }

        day += 1;
    }

    Ok(())
}
