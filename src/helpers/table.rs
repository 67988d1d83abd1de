use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use tracing::info;

use crate::errors::TimesheetResult;
use crate::models::hours::{HoursRow, HoursTable};

/// Reads the weekly hours table from a CSV file with an `h`, `m` and
/// optional `Hours` / `label` header.
pub fn read_hours_table<P: AsRef<Path>>(path: P) -> TimesheetResult<HoursTable> {
    let path = path.as_ref();
    info!("Reading hours table from {}", path.display());

    let file = File::open(path)?;
    read_hours_from(BufReader::new(file))
}

pub fn read_hours_from<R: Read>(reader: R) -> TimesheetResult<HoursTable> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

    let rows = rdr
        .deserialize::<HoursRow>()
        .collect::<Result<Vec<_>, csv::Error>>()?;

    let table = HoursTable::from_rows(rows)?;
    info!("Loaded {} week rows, {:.2} hours in total", table.len(), table.total_hours());
    Ok(table)
}
