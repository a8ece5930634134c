//! `AllocationState` — claim queues and the resource-occupancy table.
//!
//! This is plain data with no locking and no callbacks; the
//! [`Allocator`](crate::Allocator) owns it behind a mutex and decides when to
//! mutate it.
//!
//! # Blocks
//!
//! A requested `Block` is expanded into its members before anything else
//! happens, so clients hold points and paths, never block references.  A
//! block is *occupied* by a client while that client holds any of its
//! members; no other client may take any member of an occupied block.  The
//! block becomes free again when its last held member is released.

use std::collections::{BTreeMap, VecDeque};

use rustc_hash::{FxHashMap, FxHashSet};

use tc_core::{BlockId, ClientId, ResourceRef, ResourceSet};
use tc_plant::PlantModel;

use crate::{SchedulerError, SchedulerResult};

/// Result of checking a request against the occupancy table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Availability {
    Available,
    /// Held by, or blocked through a block occupied by, another client.
    Busy(ResourceRef),
    /// A locked path; the request can never succeed as it stands.
    Locked(ResourceRef),
}

/// Resources set aside for a client while their preparation is pending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reservation {
    /// The set as requested (the client's claim head).
    pub request:  ResourceSet,
    /// The request with blocks expanded; these are what is held.
    pub expanded: ResourceSet,
}

/// What [`AllocationState::commit`] did with a reservation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Commit {
    /// The request now belongs to the client.
    Allocated(ResourceSet),
    /// The request was no longer the claim head; nothing was allocated.
    Stale(Reservation),
}

#[derive(Default)]
pub struct AllocationState {
    claims:    BTreeMap<ClientId, VecDeque<ResourceSet>>,
    allocated: BTreeMap<ClientId, ResourceSet>,
    holders:   FxHashMap<ResourceRef, ClientId>,
    deferred:  BTreeMap<ClientId, ResourceSet>,
    preparing: BTreeMap<ClientId, Reservation>,
}

/// Expand block references into their (transitive) members.
///
/// Fails with the first reference the model does not define.
pub fn expand(model: &PlantModel, request: &ResourceSet) -> Result<ResourceSet, ResourceRef> {
    let mut out = ResourceSet::new();
    let mut seen_blocks: FxHashSet<BlockId> = FxHashSet::default();
    let mut work: Vec<ResourceRef> = request.iter().copied().collect();
    while let Some(r) = work.pop() {
        match r {
            ResourceRef::Block(b) => {
                let block = model.block(b).ok_or(r)?;
                if seen_blocks.insert(b) {
                    work.extend(block.members.iter().copied());
                }
            }
            _ if model.contains(&r) => {
                out.insert(r);
            }
            _ => return Err(r),
        }
    }
    Ok(out)
}

/// Blocks that contain `resource`, directly or through nested blocks.
fn enclosing_blocks(model: &PlantModel, resource: ResourceRef) -> Vec<BlockId> {
    let mut found: Vec<BlockId> = Vec::new();
    let mut work = vec![resource];
    while let Some(r) = work.pop() {
        for &b in model.blocks_containing(&r) {
            if !found.contains(&b) {
                found.push(b);
                work.push(ResourceRef::Block(b));
            }
        }
    }
    found
}

impl AllocationState {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Clients ───────────────────────────────────────────────────────────

    /// Add `client` with an empty claim queue.  `false` if already present.
    pub fn register(&mut self, client: &ClientId) -> bool {
        if self.claims.contains_key(client) {
            return false;
        }
        self.claims.insert(client.clone(), VecDeque::new());
        self.allocated.insert(client.clone(), ResourceSet::new());
        true
    }

    pub fn is_registered(&self, client: &ClientId) -> bool {
        self.claims.contains_key(client)
    }

    /// Remove `client` and everything it holds or has reserved.
    ///
    /// Returns the freed resources, or `None` if the client was unknown.
    pub fn unregister(&mut self, client: &ClientId) -> Option<ResourceSet> {
        self.claims.remove(client)?;
        self.deferred.remove(client);
        let mut freed = self.allocated.remove(client).unwrap_or_default();
        if let Some(reservation) = self.preparing.remove(client) {
            freed.extend_from(&reservation.expanded);
        }
        for r in &freed {
            self.holders.remove(r);
        }
        Some(freed)
    }

    // ── Claims ────────────────────────────────────────────────────────────

    pub fn set_claims(&mut self, client: &ClientId, claims: Vec<ResourceSet>) {
        self.claims.insert(client.clone(), claims.into());
    }

    pub fn claims(&self, client: &ClientId) -> Option<Vec<ResourceSet>> {
        self.claims.get(client).map(|q| q.iter().cloned().collect())
    }

    pub fn claim_head(&self, client: &ClientId) -> Option<&ResourceSet> {
        self.claims.get(client).and_then(VecDeque::front)
    }

    // ── Occupancy ─────────────────────────────────────────────────────────

    pub fn holder(&self, resource: &ResourceRef) -> Option<&ClientId> {
        self.holders.get(resource)
    }

    pub fn allocated(&self, client: &ClientId) -> Option<&ResourceSet> {
        self.allocated.get(client)
    }

    /// Every client currently holding at least one resource.
    pub fn allocations(&self) -> BTreeMap<ClientId, ResourceSet> {
        self.allocated
            .iter()
            .filter(|(_, held)| !held.is_empty())
            .map(|(c, held)| (c.clone(), held.clone()))
            .collect()
    }

    fn held_by_other(&self, resource: &ResourceRef, client: &ClientId) -> bool {
        self.holders.get(resource).is_some_and(|h| h != client)
    }

    /// Can `client` take all of `expanded` right now?
    pub fn availability(
        &self,
        model: &PlantModel,
        client: &ClientId,
        expanded: &ResourceSet,
    ) -> Availability {
        if let Some(&locked) = expanded.iter().find(|r| model.is_locked(r)) {
            return Availability::Locked(locked);
        }
        for &r in expanded {
            if self.held_by_other(&r, client) {
                return Availability::Busy(r);
            }
            for b in enclosing_blocks(model, r) {
                let Some(block) = model.block(b) else { continue };
                let members = expand(model, &block.members).unwrap_or_default();
                if let Some(&m) = members.iter().find(|m| self.held_by_other(m, client)) {
                    return Availability::Busy(m);
                }
            }
        }
        Availability::Available
    }

    // ── Request lifecycle ─────────────────────────────────────────────────

    pub fn defer(&mut self, client: &ClientId, request: ResourceSet) {
        self.deferred.insert(client.clone(), request);
    }

    pub fn take_deferred(&mut self, client: &ClientId) -> Option<ResourceSet> {
        self.deferred.remove(client)
    }

    pub fn has_deferred(&self, client: &ClientId) -> bool {
        self.deferred.contains_key(client)
    }

    /// Clients with a deferred request, in id order.
    pub fn deferred_clients(&self) -> Vec<ClientId> {
        self.deferred.keys().cloned().collect()
    }

    /// Hold `expanded` for `client` pending preparation.
    pub fn reserve(&mut self, client: &ClientId, request: ResourceSet, expanded: ResourceSet) {
        for &r in &expanded {
            self.holders.insert(r, client.clone());
        }
        self.deferred.remove(client);
        self.preparing.insert(client.clone(), Reservation { request, expanded });
    }

    pub fn reservation(&self, client: &ClientId) -> Option<&Reservation> {
        self.preparing.get(client)
    }

    /// Clients with a pending reservation, in id order.
    pub fn preparing_clients(&self) -> Vec<ClientId> {
        self.preparing.keys().cloned().collect()
    }

    /// Drop `client`'s reservation if its request is no longer the head of
    /// the claim queue, freeing what it held.
    pub fn cancel_stale_reservation(&mut self, client: &ClientId) -> Option<Reservation> {
        let stale = self
            .preparing
            .get(client)
            .is_some_and(|r| self.claim_head(client) != Some(&r.request));
        if !stale {
            return None;
        }
        let reservation = self.preparing.remove(client)?;
        for r in &reservation.expanded {
            self.holders.remove(r);
        }
        Some(reservation)
    }

    /// Turn `client`'s reservation into an allocation and consume the claim
    /// head it was made for.
    ///
    /// A reservation whose request stopped being the claim head is dropped
    /// instead and comes back as [`Commit::Stale`].
    pub fn commit(&mut self, client: &ClientId) -> Option<Commit> {
        if let Some(stale) = self.cancel_stale_reservation(client) {
            return Some(Commit::Stale(stale));
        }
        let reservation = self.preparing.remove(client)?;
        self.allocated
            .entry(client.clone())
            .or_default()
            .extend_from(&reservation.expanded);
        if let Some(queue) = self.claims.get_mut(client) {
            queue.pop_front();
        }
        Some(Commit::Allocated(reservation.request))
    }

    /// Free `resources` held by `client`.  Returns what was actually freed.
    ///
    /// Nothing changes unless every resource is held by `client`.
    pub fn release(
        &mut self,
        model: &PlantModel,
        client: &ClientId,
        resources: &ResourceSet,
    ) -> SchedulerResult<ResourceSet> {
        let expanded = expand(model, resources).unwrap_or_else(|_| resources.clone());
        let held = self
            .allocated
            .get_mut(client)
            .ok_or_else(|| SchedulerError::UnknownClient(client.clone()))?;
        if !expanded.is_subset(held) {
            return Err(SchedulerError::NotAllocated {
                client: client.clone(),
                resources: resources.clone(),
            });
        }
        held.subtract(&expanded);
        for r in &expanded {
            self.holders.remove(r);
        }
        Ok(expanded)
    }
}
