//! Monthly timesheet automation
//!
//! This library turns a table of weekly worked hours into dated
//! morning/afternoon work sessions and writes them into the fields of a PDF
//! timesheet form.

pub mod cli;
pub mod errors;
pub mod helpers;
pub mod models;
pub mod service;

pub use errors::{TimesheetError, TimesheetResult};
pub use service::{TimesheetConfig, TimesheetService};

// Re-export key types for convenience
pub use helpers::allocator::{AllocationConfig, allocate};
pub use helpers::fields::{FieldNames, FieldSlot, SessionFieldMapping, field_key};
pub use helpers::workdays::compute_week_anchors;
pub use models::hours::{HoursTable, WeeklyHours};
pub use models::session::WorkSession;
