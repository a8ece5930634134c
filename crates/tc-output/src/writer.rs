//! The `OutputWriter` trait implemented by backend writers.

use crate::{AllocationEventRow, OccupancyRow, OutputResult};

/// Sink for allocation log rows.
///
/// Errors never reach the scheduler; [`AllocationLogObserver`](crate::AllocationLogObserver)
/// stores the first one for [`take_error`](crate::AllocationLogObserver::take_error).
pub trait OutputWriter: Send {
    fn write_event(&mut self, row: &AllocationEventRow) -> OutputResult<()>;

    /// Write one occupancy snapshot (all rows share a timestamp).
    fn write_occupancy(&mut self, rows: &[OccupancyRow]) -> OutputResult<()>;

    /// Flush all underlying file handles.
    ///
    /// Idempotent.
    fn finish(&mut self) -> OutputResult<()>;
}
