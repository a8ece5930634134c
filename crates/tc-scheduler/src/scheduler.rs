//! `Scheduler` — the thread-safe facade clients talk to.
//!
//! `claim` and `release` take effect before they return.  `allocate` only
//! enqueues a command; its outcome arrives through the client's callbacks once
//! the allocation worker gets to it.  No method ever waits for an allocation
//! decision.
//!
//! # Driving the worker
//!
//! Call [`start`](Scheduler::start) to spawn the background worker thread.
//! Without it, nothing is processed until [`run_pending`](Scheduler::run_pending)
//! drains the queue on the calling thread, which is what the unit tests do.
//!
//! # Example
//!
//! ```rust,ignore
//! let scheduler = Scheduler::new(plant, SchedulerConfig::default());
//! scheduler.start()?;
//! scheduler.register_client(controller.clone())?;
//! scheduler.claim(&controller.id(), route_resources)?;
//! scheduler.allocate(&controller.id(), route_resources[0].clone())?;
//! // … controller.allocation_successful(..) fires on the worker thread …
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use tc_core::{ClientId, ResourceSet, SchedulerConfig};
use tc_plant::PlantStore;

use crate::state::expand;
use crate::{
    AllocationObserver, Allocator, CommandKind, NoopAllocationObserver, PreparationHook,
    SchedulerClient, SchedulerError, SchedulerResult,
};

pub struct Scheduler {
    config: SchedulerConfig,
    core:   Arc<Allocator>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(plant: Arc<PlantStore>, config: SchedulerConfig) -> Self {
        Self::with_observer(plant, config, Arc::new(NoopAllocationObserver))
    }

    pub fn with_observer(
        plant: Arc<PlantStore>,
        config: SchedulerConfig,
        observer: Arc<dyn AllocationObserver>,
    ) -> Self {
        Self {
            config,
            core: Arc::new(Allocator::new(plant, observer)),
            worker: Mutex::new(None),
        }
    }

    pub fn add_preparation_hook(&self, hook: Arc<dyn PreparationHook>) {
        self.core.hooks.write().push(hook);
    }

    // ── Clients ───────────────────────────────────────────────────────────

    pub fn register_client(&self, client: Arc<dyn SchedulerClient>) -> SchedulerResult<()> {
        let id = client.id();
        let mut clients = self.core.clients.write();
        if !self.core.state.lock().register(&id) {
            return Err(SchedulerError::DuplicateClient(id));
        }
        clients.insert(id.clone(), client);
        tracing::info!(client = %id, "scheduler client registered");
        Ok(())
    }

    /// Remove `client`.  Everything it holds or has reserved is released,
    /// its claims are dropped, and its queued commands are discarded.
    pub fn unregister_client(&self, client: &ClientId) -> SchedulerResult<()> {
        let freed = {
            let mut clients = self.core.clients.write();
            let freed = self
                .core
                .state
                .lock()
                .unregister(client)
                .ok_or_else(|| SchedulerError::UnknownClient(client.clone()))?;
            clients.remove(client);
            freed
        };
        let dropped = self.core.queue.purge(client);
        tracing::info!(%client, released = %freed, dropped, "scheduler client unregistered");

        if !freed.is_empty() {
            self.core.observer.on_released(client, &freed);
            self.core
                .queue
                .push(CommandKind::AllocationsReleased { resources: freed }, client.clone());
        }
        Ok(())
    }

    // ── Claims ────────────────────────────────────────────────────────────

    /// Replace `client`'s claim queue with `claims`, in travel order.
    ///
    /// A reservation awaiting preparation whose request is not the new head
    /// is cancelled and its resources are freed.  That request is then denied
    /// (`allocation_failed`) by the worker.
    pub fn claim(&self, client: &ClientId, claims: Vec<ResourceSet>) -> SchedulerResult<()> {
        let model = self.core.plant.snapshot();
        for set in &claims {
            if set.is_empty() {
                return Err(SchedulerError::EmptyResourceSet(client.clone()));
            }
            expand(&model, set).map_err(SchedulerError::UnknownResource)?;
        }

        let mut state = self.core.state.lock();
        if !state.is_registered(client) {
            return Err(SchedulerError::UnknownClient(client.clone()));
        }
        state.set_claims(client, claims.clone());
        // The cancelled request is answered by the retry the release triggers.
        let cancelled = state.cancel_stale_reservation(client);
        if let Some(reservation) = &cancelled {
            state.defer(client, reservation.request.clone());
        }
        drop(state);

        tracing::debug!(%client, steps = claims.len(), "resources claimed");
        self.core.observer.on_claimed(client, &claims);
        if let Some(reservation) = cancelled {
            tracing::debug!(%client, request = %reservation.request, "reservation cancelled by new claims");
            self.core.queue.push(
                CommandKind::AllocationsReleased { resources: reservation.expanded },
                client.clone(),
            );
        }
        Ok(())
    }

    pub fn claims(&self, client: &ClientId) -> SchedulerResult<Vec<ResourceSet>> {
        self.core
            .state
            .lock()
            .claims(client)
            .ok_or_else(|| SchedulerError::UnknownClient(client.clone()))
    }

    // ── Allocation ────────────────────────────────────────────────────────

    /// Request `resources`, which must equal the head of `client`'s claim
    /// queue.  The answer arrives via `allocation_successful` or
    /// `allocation_failed`.
    pub fn allocate(&self, client: &ClientId, resources: ResourceSet) -> SchedulerResult<()> {
        if resources.is_empty() {
            return Err(SchedulerError::EmptyResourceSet(client.clone()));
        }
        {
            let state = self.core.state.lock();
            if !state.is_registered(client) {
                return Err(SchedulerError::UnknownClient(client.clone()));
            }
            if state.claim_head(client) != Some(&resources) {
                return Err(SchedulerError::NotClaimHead {
                    client: client.clone(),
                    requested: resources,
                });
            }
        }
        self.core.queue.push(CommandKind::Allocate { resources }, client.clone());
        Ok(())
    }

    /// Free `resources`, which must all be held by `client`.
    pub fn release(&self, client: &ClientId, resources: &ResourceSet) -> SchedulerResult<()> {
        if resources.is_empty() {
            return Err(SchedulerError::EmptyResourceSet(client.clone()));
        }
        let model = self.core.plant.snapshot();
        let freed = self.core.state.lock().release(&model, client, resources)?;
        tracing::debug!(%client, %freed, "resources released");

        self.core.observer.on_released(client, &freed);
        self.core
            .queue
            .push(CommandKind::AllocationsReleased { resources: freed }, client.clone());
        Ok(())
    }

    /// Re-check every reservation still waiting for preparation.
    pub fn preparation_changed(&self) {
        let pending: Vec<(ClientId, ResourceSet)> = {
            let state = self.core.state.lock();
            state
                .preparing_clients()
                .into_iter()
                .filter_map(|c| {
                    let request = state.reservation(&c)?.request.clone();
                    Some((c, request))
                })
                .collect()
        };
        for (client, resources) in pending {
            self.core
                .queue
                .push(CommandKind::CheckAllocationsPrepared { resources }, client);
        }
    }

    /// A copy of the current occupancy: every client holding anything.
    pub fn allocations(&self) -> BTreeMap<ClientId, ResourceSet> {
        self.core.state.lock().allocations()
    }

    pub fn pending_commands(&self) -> usize {
        self.core.queue.len()
    }

    // ── Worker ────────────────────────────────────────────────────────────

    /// Process queued commands on the calling thread until the queue is
    /// empty, including commands enqueued while doing so.  Returns how many
    /// were processed.
    ///
    /// Must not be called from inside a client callback.
    pub fn run_pending(&self) -> usize {
        let mut processed = 0;
        while self.core.process_next() {
            processed += 1;
        }
        processed
    }

    /// Spawn the allocation worker thread.
    pub fn start(&self) -> SchedulerResult<()> {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }
        let core = Arc::clone(&self.core);
        let handle = thread::Builder::new()
            .name(self.config.worker_name.clone())
            .spawn(move || {
                while let Some(command) = core.queue.pop_blocking() {
                    core.process(command);
                }
                tracing::debug!("allocation worker stopped");
            })?;
        tracing::info!(worker = %self.config.worker_name, "allocation worker started");
        *worker = Some(handle);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.worker.lock().is_some() && !self.core.queue.is_shut_down()
    }

    /// Stop the worker and wait for it.  Queued commands are dropped.
    pub fn shutdown(&self) {
        self.core.queue.shutdown();
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                tracing::warn!("allocation worker panicked");
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
