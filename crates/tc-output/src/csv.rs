//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `allocation_events.csv`
//! - `occupancy.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{AllocationEventRow, OccupancyRow, OutputResult};

pub const EVENTS_FILE: &str = "allocation_events.csv";
pub const OCCUPANCY_FILE: &str = "occupancy.csv";

pub struct CsvWriter {
    events:    Writer<File>,
    occupancy: Writer<File>,
    finished:  bool,
}

impl CsvWriter {
    /// Create the two CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut events = Writer::from_path(dir.join(EVENTS_FILE))?;
        events.write_record(["seq", "elapsed_ms", "event", "client", "resources", "count"])?;

        let mut occupancy = Writer::from_path(dir.join(OCCUPANCY_FILE))?;
        occupancy.write_record(["elapsed_ms", "client", "resource"])?;

        Ok(Self { events, occupancy, finished: false })
    }
}

impl OutputWriter for CsvWriter {
    fn write_event(&mut self, row: &AllocationEventRow) -> OutputResult<()> {
        self.events.write_record(&[
            row.seq.to_string(),
            row.elapsed_ms.to_string(),
            row.event.as_str().to_owned(),
            row.client.clone(),
            row.resources.clone(),
            row.count.to_string(),
        ])?;
        Ok(())
    }

    fn write_occupancy(&mut self, rows: &[OccupancyRow]) -> OutputResult<()> {
        for row in rows {
            self.occupancy.write_record(&[
                row.elapsed_ms.to_string(),
                row.client.clone(),
                row.resource.clone(),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.events.flush()?;
        self.occupancy.flush()?;
        Ok(())
    }
}
