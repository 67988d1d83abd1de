use chrono::{Duration, NaiveDate, NaiveTime};

/// A single timed work block written to one row of the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkSession {
    pub label: String,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub duration: Duration,
}

impl WorkSession {
    pub fn new(label: impl Into<String>, date: NaiveDate, start: NaiveTime, minutes: u32) -> Self {
        let duration = Duration::minutes(minutes as i64);
        Self {
            label: label.into(),
            date,
            start,
            end: start + duration,
            duration,
        }
    }

    pub fn break_time(&self) -> Duration {
        Duration::zero()
    }

    pub fn duration_minutes(&self) -> i64 {
        self.duration.num_minutes()
    }

    pub fn date_field(&self) -> String {
        self.date.format("%d.%m.%y").to_string()
    }

    pub fn start_field(&self) -> String {
        self.start.format("%H:%M").to_string()
    }

    pub fn end_field(&self) -> String {
        self.end.format("%H:%M").to_string()
    }

    pub fn break_field(&self) -> String {
        format_hh_mm(self.break_time())
    }

    pub fn duration_field(&self) -> String {
        format_hh_mm(self.duration)
    }
}

fn format_hh_mm(duration: Duration) -> String {
    let minutes = duration.num_minutes();
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_fields() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let start = NaiveTime::from_hms_opt(14, 0, 0).unwrap();
        let session = WorkSession::new("IOR", date, start, 90);

        assert_eq!(session.date_field(), "04.03.24");
        assert_eq!(session.start_field(), "14:00");
        assert_eq!(session.end_field(), "15:30");
        assert_eq!(session.break_field(), "00:00");
        assert_eq!(session.duration_field(), "01:30");
        assert_eq!(session.end, session.start + session.duration);
    }
}
