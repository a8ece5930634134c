//! Capabilities the scheduler consumes: clients and preparation hooks.

use tc_core::{ClientId, ResourceSet};

/// A participant in resource allocation, typically a vehicle controller.
///
/// The scheduler only ever sees this trait.  Callbacks are invoked on the
/// allocation worker's thread with no scheduler lock held, so an
/// implementation may call back into the scheduler (`allocate`, `release`,
/// `claim`), but must not block for long.
///
/// # Example — a controller that immediately asks for the next step
///
/// ```rust,ignore
/// impl SchedulerClient for Controller {
///     fn id(&self) -> ClientId { self.id.clone() }
///
///     fn allocation_successful(&self, resources: &ResourceSet) {
///         self.send_movement_command(resources);
///     }
///
///     fn allocation_failed(&self, resources: &ResourceSet) {
///         self.request_reroute(resources);
///     }
/// }
/// ```
pub trait SchedulerClient: Send + Sync {
    fn id(&self) -> ClientId;

    /// `resources` are now held by this client and were removed from the head
    /// of its claim queue.
    fn allocation_successful(&self, resources: &ResourceSet);

    /// The request for `resources` was permanently denied.  The client may
    /// claim again and retry if it wants to.
    fn allocation_failed(&self, resources: &ResourceSet);

    /// Whether the client itself is ready to take over `resources`.
    /// Asked while the resources are reserved for it.
    fn resources_prepared(&self, _resources: &ResourceSet) -> bool {
        true
    }
}

/// External readiness check for resources, such as a door or a gate that must
/// open before a vehicle may enter.
///
/// Both methods must return without blocking.  A hook that becomes ready
/// later should call [`Scheduler::preparation_changed`](crate::Scheduler::preparation_changed)
/// so reserved allocations are checked again.
pub trait PreparationHook: Send + Sync {
    /// `resources` were reserved for `client`; start preparing them.
    fn prepare(&self, _client: &ClientId, _resources: &ResourceSet) {}

    /// `true` once `resources` are ready to be handed to `client`.
    fn is_prepared(&self, client: &ClientId, resources: &ResourceSet) -> bool;
}
