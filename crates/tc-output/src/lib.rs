//! `tc-output` — allocation logs for the traffic-control kernel.
//!
//! | Backend | Files created                                |
//! |---------|----------------------------------------------|
//! | CSV     | `allocation_events.csv`, `occupancy.csv`     |
//!
//! Writers implement [`OutputWriter`] and are driven by
//! [`AllocationLogObserver`], which implements
//! `tc_scheduler::AllocationObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tc_output::{AllocationLogObserver, CsvWriter};
//!
//! let log = Arc::new(AllocationLogObserver::new(CsvWriter::new(Path::new("./output"))?));
//! let scheduler = Scheduler::with_observer(plant, SchedulerConfig::default(), log.clone());
//! // … run …
//! log.record_occupancy(&scheduler.allocations());
//! log.finish();
//! if let Some(e) = log.take_error() { eprintln!("output error: {e}"); }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;


pub use crate::csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::AllocationLogObserver;
pub use row::{AllocationEvent, AllocationEventRow, OccupancyRow};
pub use writer::OutputWriter;
