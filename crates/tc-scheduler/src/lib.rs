//! `tc-scheduler` — exclusive allocation of plant resources to vehicles.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`command`]   | `AllocatorCommand`, `CommandKind` and their priority tiers |
//! | [`queue`]     | `CommandQueue` (`BinaryHeap` + `Condvar`)                 |
//! | [`client`]    | `SchedulerClient`, `PreparationHook` traits               |
//! | [`state`]     | `AllocationState` — claims, occupancy, reservations       |
//! | [`allocator`] | `Allocator` — processes one command at a time             |
//! | [`scheduler`] | `Scheduler` — thread-safe facade and worker thread        |
//! | [`observer`]  | `AllocationObserver`, `NoopAllocationObserver`            |
//! | [`error`]     | `SchedulerError`, `SchedulerResult<T>`                    |
//!
//! # Request lifecycle (summary)
//!
//! ```text
//! claim(c, [S0, S1, …])          claim queue := [S0, S1, …]
//! allocate(c, S0)                → Allocate
//!   S0 busy                      → deferred (no callback)
//!   S0 locked / unknown          → allocation_failed(S0)
//!   S0 free                      → reserved → CheckAllocationsPrepared
//!     prepared                   → allocation_successful(S0), queue := [S1, …]
//! release(c, S0)                 → freed now, AllocationsReleased
//!                                → RetryAllocates for every deferred client
//! ```
//!
//! Every mutation of allocation state happens under one lock, and only the
//! allocation worker grants resources, so no resource is ever held by two
//! clients.

pub mod allocator;
pub mod client;
pub mod command;
pub mod error;
pub mod observer;
pub mod queue;
pub mod scheduler;
pub mod state;


pub use allocator::Allocator;
pub use client::{PreparationHook, SchedulerClient};
pub use command::{AllocatorCommand, CommandKind};
pub use error::{SchedulerError, SchedulerResult};
pub use observer::{AllocationObserver, NoopAllocationObserver};
pub use queue::CommandQueue;
pub use scheduler::Scheduler;
pub use state::{AllocationState, Availability, Commit, Reservation};
