//! Allocation observer trait for logging and data collection.

use tc_core::{ClientId, ResourceSet};

/// Callbacks invoked by the scheduler as allocation state changes.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.  They are called without any scheduler
/// lock held, possibly from several threads (`claim` and `release` report from
/// the caller's thread, everything else from the worker).
pub trait AllocationObserver: Send + Sync {
    /// `client` replaced its claim queue.
    fn on_claimed(&self, _client: &ClientId, _claims: &[ResourceSet]) {}

    /// `resources` were handed to `client`.
    fn on_allocated(&self, _client: &ClientId, _resources: &ResourceSet) {}

    /// `client`'s request for `resources` must wait for another client.
    fn on_deferred(&self, _client: &ClientId, _resources: &ResourceSet) {}

    /// `client`'s request for `resources` was permanently denied.
    fn on_failed(&self, _client: &ClientId, _resources: &ResourceSet) {}

    /// `client` gave up `resources`, explicitly or by unregistering.
    fn on_released(&self, _client: &ClientId, _resources: &ResourceSet) {}
}

/// An [`AllocationObserver`] that does nothing.
pub struct NoopAllocationObserver;

impl AllocationObserver for NoopAllocationObserver {}
