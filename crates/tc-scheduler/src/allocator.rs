//! `Allocator` — processes one [`AllocatorCommand`] at a time.
//!
//! # Processing rules
//!
//! - `AllocationsReleased` — the release itself was applied when
//!   [`Scheduler::release`](crate::Scheduler::release) returned; processing
//!   only enqueues a `RetryAllocates` for every client with a deferred request.
//! - `Allocate` / `RetryAllocates` — the request must still be the head of
//!   the client's claim queue.  Unknown or locked resources deny it
//!   (`allocation_failed`).  Resources held elsewhere defer it silently.
//!   Otherwise the resources are reserved, preparation hooks are told to
//!   prepare them, and a `CheckAllocationsPrepared` is enqueued.
//! - An `Allocate` for a different request than the one awaiting preparation
//!   is denied.  One that replaces a different deferred request denies the
//!   deferred one.  A repeat of the reserved request is answered by the
//!   pending check.
//! - `CheckAllocationsPrepared` — if every hook and the client report the
//!   reservation ready, it becomes an allocation (`allocation_successful`).
//!   If not, nothing changes; [`Scheduler::preparation_changed`](crate::Scheduler::preparation_changed)
//!   enqueues another check later.  A reservation whose request is no longer
//!   the claim head is dropped and denied instead.
//!
//! Commands for clients that have since unregistered are no-ops.
//!
//! State is mutated under the state lock; callbacks and observer events are
//! delivered after it is released.  A separate `serial` lock keeps two
//! threads (the worker and a caller of `run_pending`) from processing
//! commands at the same time.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use tc_core::{ClientId, ResourceSet};
use tc_plant::PlantStore;

use crate::state::{expand, AllocationState, Availability, Commit};
use crate::{
    AllocationObserver, AllocatorCommand, CommandKind, CommandQueue, PreparationHook,
    SchedulerClient,
};

/// An outcome to report once the state lock is released.
enum Notice {
    Allocated(ClientId, ResourceSet),
    Failed(ClientId, ResourceSet),
    Deferred(ClientId, ResourceSet),
    Prepare(ClientId, ResourceSet),
}

pub struct Allocator {
    pub(crate) plant:    Arc<PlantStore>,
    pub(crate) queue:    CommandQueue,
    pub(crate) state:    Mutex<AllocationState>,
    pub(crate) clients:  RwLock<BTreeMap<ClientId, Arc<dyn SchedulerClient>>>,
    pub(crate) hooks:    RwLock<Vec<Arc<dyn PreparationHook>>>,
    pub(crate) observer: Arc<dyn AllocationObserver>,
    serial:              Mutex<()>,
}

impl Allocator {
    pub fn new(plant: Arc<PlantStore>, observer: Arc<dyn AllocationObserver>) -> Self {
        Self {
            plant,
            queue: CommandQueue::new(),
            state: Mutex::new(AllocationState::new()),
            clients: RwLock::new(BTreeMap::new()),
            hooks: RwLock::new(Vec::new()),
            observer,
            serial: Mutex::new(()),
        }
    }

    /// Process the next queued command.  `false` if the queue was empty.
    pub fn process_next(&self) -> bool {
        match self.queue.try_pop() {
            Some(command) => {
                self.process(command);
                true
            }
            None => false,
        }
    }

    pub fn process(&self, command: AllocatorCommand) {
        let _serial = self.serial.lock();
        tracing::trace!(%command, "processing command");
        let client = command.client;
        let notices = match command.kind {
            CommandKind::AllocationsReleased { resources } => {
                self.retry_deferred(&client, &resources);
                Vec::new()
            }
            CommandKind::RetryAllocates => {
                let mut state = self.state.lock();
                match state.take_deferred(&client) {
                    Some(request) => self.try_allocate(&mut state, &client, request),
                    None => Vec::new(),
                }
            }
            CommandKind::Allocate { resources } => {
                let mut state = self.state.lock();
                match state.reservation(&client).map(|r| r.request == resources) {
                    Some(true) => {
                        // Answered when the pending check commits it.
                        tracing::debug!(%client, %resources, "request already reserved");
                        Vec::new()
                    }
                    Some(false) => {
                        tracing::warn!(
                            %client,
                            %resources,
                            "another request of this client is awaiting preparation"
                        );
                        vec![Notice::Failed(client.clone(), resources)]
                    }
                    None => {
                        let mut notices = Vec::new();
                        if let Some(old) = state.take_deferred(&client).filter(|old| *old != resources) {
                            tracing::debug!(%client, request = %old, "deferred request superseded");
                            notices.push(Notice::Failed(client.clone(), old));
                        }
                        notices.extend(self.try_allocate(&mut state, &client, resources));
                        notices
                    }
                }
            }
            CommandKind::CheckAllocationsPrepared { resources } => {
                self.check_prepared(&client, &resources)
            }
        };
        self.deliver(notices);
    }

    fn retry_deferred(&self, releasing: &ClientId, released: &ResourceSet) {
        let waiting = self.state.lock().deferred_clients();
        tracing::debug!(
            client = %releasing,
            %released,
            retries = waiting.len(),
            "allocations released"
        );
        for client in waiting {
            self.queue.push(CommandKind::RetryAllocates, client);
        }
    }

    fn try_allocate(
        &self,
        state: &mut AllocationState,
        client: &ClientId,
        request: ResourceSet,
    ) -> Vec<Notice> {
        if !state.is_registered(client) {
            tracing::debug!(%client, "client no longer registered; dropping request");
            return Vec::new();
        }
        if state.claim_head(client) != Some(&request) {
            tracing::warn!(%client, %request, "request is no longer the claim head");
            return vec![Notice::Failed(client.clone(), request)];
        }

        let model = self.plant.snapshot();
        let expanded = match expand(&model, &request) {
            Ok(expanded) => expanded,
            Err(unknown) => {
                tracing::warn!(%client, resource = %unknown, "request names an unknown resource");
                return vec![Notice::Failed(client.clone(), request)];
            }
        };

        match state.availability(&model, client, &expanded) {
            Availability::Locked(resource) => {
                tracing::info!(%client, %resource, "allocation denied: resource locked");
                vec![Notice::Failed(client.clone(), request)]
            }
            Availability::Busy(resource) => {
                tracing::debug!(
                    %client,
                    %resource,
                    holder = ?state.holder(&resource),
                    "allocation deferred"
                );
                state.defer(client, request.clone());
                vec![Notice::Deferred(client.clone(), request)]
            }
            Availability::Available => {
                state.reserve(client, request.clone(), expanded);
                self.queue.push(
                    CommandKind::CheckAllocationsPrepared { resources: request.clone() },
                    client.clone(),
                );
                vec![Notice::Prepare(client.clone(), request)]
            }
        }
    }

    fn check_prepared(&self, client: &ClientId, resources: &ResourceSet) -> Vec<Notice> {
        let reservation = match self.state.lock().reservation(client) {
            Some(r) if &r.request == resources => r.clone(),
            _ => return Vec::new(),
        };

        // Readiness is asked without the state lock held.
        let handle = self.clients.read().get(client).cloned();
        let hooks_ready = self
            .hooks
            .read()
            .iter()
            .all(|h| h.is_prepared(client, &reservation.request));
        let client_ready = handle.is_some_and(|h| h.resources_prepared(&reservation.request));
        if !(hooks_ready && client_ready) {
            tracing::debug!(%client, resources = %reservation.request, "resources not yet prepared");
            return Vec::new();
        }

        let mut state = self.state.lock();
        if state.reservation(client) != Some(&reservation) {
            return Vec::new();
        }
        match state.commit(client) {
            Some(Commit::Allocated(request)) => {
                tracing::debug!(%client, %request, "allocation successful");
                vec![Notice::Allocated(client.clone(), request)]
            }
            Some(Commit::Stale(stale)) => {
                tracing::warn!(%client, request = %stale.request, "prepared request is no longer the claim head");
                self.queue.push(
                    CommandKind::AllocationsReleased { resources: stale.expanded },
                    client.clone(),
                );
                vec![Notice::Failed(client.clone(), stale.request)]
            }
            None => Vec::new(),
        }
    }

    fn deliver(&self, notices: Vec<Notice>) {
        for notice in notices {
            match notice {
                Notice::Allocated(client, resources) => {
                    self.observer.on_allocated(&client, &resources);
                    if let Some(handle) = self.client_handle(&client) {
                        handle.allocation_successful(&resources);
                    }
                }
                Notice::Failed(client, resources) => {
                    self.observer.on_failed(&client, &resources);
                    if let Some(handle) = self.client_handle(&client) {
                        handle.allocation_failed(&resources);
                    }
                }
                Notice::Deferred(client, resources) => {
                    self.observer.on_deferred(&client, &resources);
                }
                Notice::Prepare(client, resources) => {
                    for hook in self.hooks.read().iter() {
                        hook.prepare(&client, &resources);
                    }
                }
            }
        }
    }

    fn client_handle(&self, client: &ClientId) -> Option<Arc<dyn SchedulerClient>> {
        self.clients.read().get(client).cloned()
    }
}
