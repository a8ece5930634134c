//! Plain data row types written by output backends.

/// Which scheduler event a row records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationEvent {
    Claimed,
    Allocated,
    Deferred,
    Failed,
    Released,
}

impl AllocationEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            AllocationEvent::Claimed   => "claimed",
            AllocationEvent::Allocated => "allocated",
            AllocationEvent::Deferred  => "deferred",
            AllocationEvent::Failed    => "failed",
            AllocationEvent::Released  => "released",
        }
    }
}

/// One scheduler event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationEventRow {
    /// Order in which the observer saw the event, from 0.
    pub seq:        u64,
    /// Milliseconds since the observer was created.
    pub elapsed_ms: u64,
    pub event:      AllocationEvent,
    pub client:     String,
    /// Resource sets in display form, `;`-separated for claims.
    pub resources:  String,
    /// Number of resources, or of resource sets for claims.
    pub count:      u32,
}

/// One held resource at the moment of an occupancy snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyRow {
    pub elapsed_ms: u64,
    pub client:     String,
    pub resource:   String,
}
