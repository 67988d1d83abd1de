use serde::Deserialize;

use crate::errors::{TimesheetError, TimesheetResult};

/// A week has 168 hours; anything above is a broken row.
pub const MAX_WEEK_HOURS: u32 = 7 * 24;

/// Hours worked in one calendar week of the target month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeeklyHours {
    pub hours: u32,
    pub minutes: u32,
}

impl WeeklyHours {
    pub fn new(hours: u32, minutes: u32) -> Self {
        Self { hours, minutes }
    }

    pub fn is_empty(&self) -> bool {
        self.hours == 0 && self.minutes == 0
    }

    pub fn total_minutes(&self) -> u64 {
        u64::from(self.hours) * 60 + u64::from(self.minutes)
    }

    /// Rejects more hours than a week has and minutes of a full hour or
    /// more; `week` is 1-based and only used for messages.
    pub fn validate(&self, week: usize) -> TimesheetResult<()> {
        let invalid = |reason: String| Err(TimesheetError::InvalidRow { row: week, reason });

        if self.hours > MAX_WEEK_HOURS {
            return invalid(format!("{} hours exceed a week", self.hours));
        }
        if self.minutes >= 60 {
            return invalid(format!("minutes {} must be below 60", self.minutes));
        }
        Ok(())
    }
}

/// One row of the input table as it appears in the CSV file.
///
/// `h` and `m` drive the allocation, `Hours` is the decimal total used for
/// the summary field and `label` optionally names the week's activity.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HoursRow {
    pub h: i64,
    pub m: i64,
    #[serde(rename = "Hours", default)]
    pub hours: Option<f64>,
    #[serde(default)]
    pub label: Option<String>,
}

impl HoursRow {
    /// Validates the row; `week` is 1-based and only used for messages.
    pub fn weekly_hours(&self, week: usize) -> TimesheetResult<WeeklyHours> {
        let invalid = |reason: String| TimesheetError::InvalidRow { row: week, reason };

        if self.h < 0 {
            return Err(invalid(format!("negative hours {}", self.h)));
        }
        if self.m < 0 {
            return Err(invalid(format!("negative minutes {}", self.m)));
        }
        if let Some(total) = self.hours {
            if !total.is_finite() || total < 0.0 {
                return Err(invalid(format!("invalid Hours value {}", total)));
            }
        }

        let hours = u32::try_from(self.h)
            .map_err(|_| invalid(format!("{} hours exceed a week", self.h)))?;
        let minutes = u32::try_from(self.m)
            .map_err(|_| invalid(format!("minutes {} must be below 60", self.m)))?;

        let week_hours = WeeklyHours::new(hours, minutes);
        week_hours.validate(week)?;
        Ok(week_hours)
    }
}

/// Validated input table, one entry per calendar week.
#[derive(Debug, Clone, Default)]
pub struct HoursTable {
    rows: Vec<HoursRow>,
    weeks: Vec<WeeklyHours>,
}

impl HoursTable {
    pub fn from_rows(rows: Vec<HoursRow>) -> TimesheetResult<Self> {
        let weeks = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| row.weekly_hours(idx + 1))
            .collect::<TimesheetResult<Vec<_>>>()?;

        Ok(Self { rows, weeks })
    }

    pub fn len(&self) -> usize {
        self.weeks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }

    pub fn weekly_hours(&self) -> &[WeeklyHours] {
        &self.weeks
    }

    pub fn labels(&self) -> Vec<Option<String>> {
        self.rows.iter().map(|row| row.label.clone()).collect()
    }

    /// Sum of the `Hours` column when every row carries one, otherwise the
    /// sum of `h + m / 60`.
    pub fn total_hours(&self) -> f64 {
        let column: Option<Vec<f64>> = self.rows.iter().map(|row| row.hours).collect();

        match column {
            Some(values) if !values.is_empty() => values.iter().sum(),
            _ => self
                .weeks
                .iter()
                .map(|week| week.hours as f64 + week.minutes as f64 / 60.0)
                .sum(),
        }
    }
}
