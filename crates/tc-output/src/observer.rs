//! `AllocationLogObserver<W>` — bridges `AllocationObserver` to an `OutputWriter`.

use std::collections::BTreeMap;
use std::time::Instant;

use parking_lot::Mutex;

use tc_core::{ClientId, ResourceSet};
use tc_scheduler::AllocationObserver;

use crate::row::{AllocationEvent, AllocationEventRow, OccupancyRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

struct Inner<W> {
    writer:     W,
    next_seq:   u64,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> Inner<W> {
    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            tracing::warn!(error = %e, "allocation log write failed");
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

/// An [`AllocationObserver`] that writes every event to an [`OutputWriter`].
///
/// Observer callbacks cannot fail, so write errors are stored; check them
/// with [`take_error`][Self::take_error] after [`finish`][Self::finish].
pub struct AllocationLogObserver<W: OutputWriter> {
    inner:   Mutex<Inner<W>>,
    started: Instant,
}

impl<W: OutputWriter> AllocationLogObserver<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: Mutex::new(Inner { writer, next_seq: 0, last_error: None }),
            started: Instant::now(),
        }
    }

    /// Take the stored write error, if any.
    pub fn take_error(&self) -> Option<OutputError> {
        self.inner.lock().last_error.take()
    }

    /// Number of events logged so far.
    pub fn event_count(&self) -> u64 {
        self.inner.lock().next_seq
    }

    /// Write the current occupancy table, e.g. from `Scheduler::allocations()`.
    pub fn record_occupancy(&self, allocations: &BTreeMap<ClientId, ResourceSet>) {
        let elapsed_ms = self.elapsed_ms();
        let rows: Vec<OccupancyRow> = allocations
            .iter()
            .flat_map(|(client, held)| {
                held.iter().map(move |r| OccupancyRow {
                    elapsed_ms,
                    client: client.to_string(),
                    resource: r.to_string(),
                })
            })
            .collect();
        let mut inner = self.inner.lock();
        let result = inner.writer.write_occupancy(&rows);
        inner.store_err(result);
    }

    /// Flush the writer.
    pub fn finish(&self) {
        let mut inner = self.inner.lock();
        let result = inner.writer.finish();
        inner.store_err(result);
    }

    /// Unwrap the inner writer.
    pub fn into_writer(self) -> W {
        self.inner.into_inner().writer
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn log(&self, event: AllocationEvent, client: &ClientId, resources: String, count: usize) {
        let elapsed_ms = self.elapsed_ms();
        let mut inner = self.inner.lock();
        let row = AllocationEventRow {
            seq: inner.next_seq,
            elapsed_ms,
            event,
            client: client.to_string(),
            resources,
            count: count as u32,
        };
        inner.next_seq += 1;
        let result = inner.writer.write_event(&row);
        inner.store_err(result);
    }
}

impl<W: OutputWriter> AllocationObserver for AllocationLogObserver<W> {
    fn on_claimed(&self, client: &ClientId, claims: &[ResourceSet]) {
        let joined = claims.iter().map(ToString::to_string).collect::<Vec<_>>().join(";");
        self.log(AllocationEvent::Claimed, client, joined, claims.len());
    }

    fn on_allocated(&self, client: &ClientId, resources: &ResourceSet) {
        self.log(AllocationEvent::Allocated, client, resources.to_string(), resources.len());
    }

    fn on_deferred(&self, client: &ClientId, resources: &ResourceSet) {
        self.log(AllocationEvent::Deferred, client, resources.to_string(), resources.len());
    }

    fn on_failed(&self, client: &ClientId, resources: &ResourceSet) {
        self.log(AllocationEvent::Failed, client, resources.to_string(), resources.len());
    }

    fn on_released(&self, client: &ClientId, resources: &ResourceSet) {
        self.log(AllocationEvent::Released, client, resources.to_string(), resources.len());
    }
}
