use std::path::Path;
use tracing::{error, info};

use crate::{
    errors::{TimesheetError, TimesheetResult},
    helpers::{
        allocator::{AllocationConfig, allocate},
        fields::{FieldNames, SessionFieldMapping},
        pdf::{FillReport, fill_form},
        table::read_hours_table,
        workdays::compute_week_anchors,
    },
    models::hours::HoursTable,
};

/// Label used when neither the command line nor the table names a week.
pub const DEFAULT_LABEL: &str = "IOR";

/// Configuration for one timesheet run
#[derive(Debug, Clone)]
pub struct TimesheetConfig {
    pub year: i32,
    pub month: u32,
    /// One label per week, a single label for every week, or empty to use
    /// the table's `label` column.
    pub labels: Vec<String>,
    pub allocation: AllocationConfig,
    pub field_names: FieldNames,
}

impl TimesheetConfig {
    pub fn new(year: i32, month: u32) -> Self {
        Self {
            year,
            month,
            labels: Vec::new(),
            allocation: AllocationConfig::default(),
            field_names: FieldNames::default(),
        }
    }
}

/// Turns a weekly hours table into the field mapping of the timesheet form
/// and writes it into a PDF template.
#[derive(Debug, Clone)]
pub struct TimesheetService {
    pub config: TimesheetConfig,
}

impl TimesheetService {
    pub fn new(config: TimesheetConfig) -> Self {
        info!(
            "Creating TimesheetService for {}-{:02}",
            config.year, config.month
        );
        Self { config }
    }

    /// Resolves the label of every week: explicit labels first, then the
    /// table's `label` column, then [`DEFAULT_LABEL`].
    pub fn resolve_labels(&self, table: &HoursTable) -> TimesheetResult<Vec<String>> {
        let explicit = &self.config.labels;
        let from_table = table.labels();

        table
            .weekly_hours()
            .iter()
            .zip(from_table)
            .enumerate()
            .map(|(idx, (week, table_label))| match explicit.len() {
                0 => Ok(table_label
                    .filter(|label| !label.is_empty())
                    .unwrap_or_else(|| DEFAULT_LABEL.to_string())),
                1 => Ok(explicit[0].clone()),
                _ => match explicit.get(idx) {
                    Some(label) => Ok(label.clone()),
                    None if week.is_empty() => Ok(String::new()),
                    None => Err(TimesheetError::MissingLabel { week: idx + 1 }),
                },
            })
            .collect()
    }

    /// Computes the week anchors, allocates the sessions and templates them
    /// into form fields.
    pub fn build_fields(&self, table: &HoursTable) -> TimesheetResult<SessionFieldMapping> {
        let anchors = compute_week_anchors(self.config.year, self.config.month)?;
        let labels = self.resolve_labels(table)?;

        let sessions = allocate(
            table.weekly_hours(),
            &anchors,
            &labels,
            &self.config.allocation,
        )?;

        let mapping = SessionFieldMapping::from_sessions(
            &sessions,
            table.total_hours(),
            &self.config.field_names,
        );
        info!(
            "Built {} form values from {} sessions",
            mapping.len(),
            sessions.len()
        );
        Ok(mapping)
    }

    /// Reads the CSV table at `input` and returns the resulting field mapping.
    pub fn preview<P: AsRef<Path>>(&self, input: P) -> TimesheetResult<SessionFieldMapping> {
        let table = read_hours_table(input)?;
        self.build_fields(&table)
    }

    /// Process timesheet data: read the hours table, allocate sessions, fill
    /// the PDF form
    pub fn process_timesheet<P, T, O>(&self, input: P, template: T, output: O) -> TimesheetResult<FillReport>
    where
        P: AsRef<Path>,
        T: AsRef<Path>,
        O: AsRef<Path>,
    {
        info!(
            "Processing timesheet with template {}",
            template.as_ref().display()
        );

        let mapping = match self.preview(input) {
            Ok(mapping) => mapping,
            Err(e) => {
                error!("Failed to build timesheet entries: {}", e);
                return Err(e);
            }
        };

        match fill_form(template, &mapping, output) {
            Ok(report) => {
                info!(
                    "Filled {} form fields, {} values unmatched",
                    report.matched,
                    report.unmatched_keys.len()
                );
                Ok(report)
            }
            Err(e) => {
                error!("Failed to fill timesheet PDF: {}", e);
                Err(e)
            }
        }
    }
}
