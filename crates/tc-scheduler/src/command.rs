//! `AllocatorCommand` — the unit of work of the allocation worker.
//!
//! Commands are totally ordered by `(priority, created, client, seq)`.  The
//! priority tiers make sure released resources are accounted for before any
//! new allocation is attempted:
//!
//! | Command                    | Priority |
//! |----------------------------|----------|
//! | `AllocationsReleased`      | 2        |
//! | `RetryAllocates`           | 3        |
//! | `CheckAllocationsPrepared` | 4        |
//! | `Allocate`                 | 5        |
//!
//! Lower numbers are processed first.  `seq` is a queue-assigned counter that
//! only breaks ties between commands identical in every other key.

use std::cmp::Ordering;
use std::fmt;
use std::time::Instant;

use tc_core::{ClientId, ResourceSet};

/// What a command asks the worker to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandKind {
    /// `resources` were released by `client`; wake up deferred requests.
    AllocationsReleased { resources: ResourceSet },
    /// Re-attempt `client`'s deferred allocation, if it still has one.
    RetryAllocates,
    /// Ask whether `resources`, reserved for `client`, are ready to hand over.
    CheckAllocationsPrepared { resources: ResourceSet },
    /// Allocate `resources`, the head of `client`'s claim queue.
    Allocate { resources: ResourceSet },
}

impl CommandKind {
    pub fn priority(&self) -> u8 {
        match self {
            CommandKind::AllocationsReleased { .. }      => 2,
            CommandKind::RetryAllocates                  => 3,
            CommandKind::CheckAllocationsPrepared { .. } => 4,
            CommandKind::Allocate { .. }                 => 5,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::AllocationsReleased { .. }      => "AllocationsReleased",
            CommandKind::RetryAllocates                  => "RetryAllocates",
            CommandKind::CheckAllocationsPrepared { .. } => "CheckAllocationsPrepared",
            CommandKind::Allocate { .. }                 => "Allocate",
        }
    }
}

/// A queued, immutable instruction for the allocation worker.
#[derive(Clone, Debug)]
pub struct AllocatorCommand {
    pub kind:    CommandKind,
    pub client:  ClientId,
    pub created: Instant,
    pub(crate) seq: u64,
}

impl AllocatorCommand {
    pub(crate) fn new(kind: CommandKind, client: ClientId, seq: u64) -> Self {
        Self { kind, client, created: Instant::now(), seq }
    }

    #[inline]
    pub fn priority(&self) -> u8 {
        self.kind.priority()
    }

    fn sort_key(&self) -> (u8, Instant, &ClientId, u64) {
        (self.priority(), self.created, &self.client, self.seq)
    }
}

impl PartialEq for AllocatorCommand {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl Eq for AllocatorCommand {}

impl PartialOrd for AllocatorCommand {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AllocatorCommand {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl fmt::Display for AllocatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.kind.name(), self.client)
    }
}
