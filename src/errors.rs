//! Error type shared by the table reader, the allocator and the form sink.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TimesheetError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Invalid month {year}-{month:02}")]
    InvalidMonth { year: i32, month: u32 },

    #[error("Invalid hours row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },

    #[error("Insufficient workdays for given hour rows: {rows} rows, {workdays} workdays")]
    InsufficientWorkdays { rows: usize, workdays: usize },

    #[error("Week {week} has hours but no workday")]
    NoWorkdayInWeek { week: usize },

    #[error("No label given for week {week}")]
    MissingLabel { week: usize },

    #[error("Date {days} day(s) after {anchor} is out of range")]
    DateOutOfRange { anchor: chrono::NaiveDate, days: i64 },

    #[error("Invalid allocation settings: {0}")]
    InvalidConfig(String),

    #[error("Malformed PDF form: {0}")]
    MalformedForm(String),
}

pub type TimesheetResult<T> = Result<T, TimesheetError>;
