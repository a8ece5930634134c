//! Splicing a new route into the one a vehicle is already driving.
//!
//! The branching step is the first old step whose source is the new route's
//! first source.  Old steps before it are kept (the vehicle has been told to
//! drive them), everything from it on is replaced, and the result is
//! renumbered from 0.
//!
//! ```text
//! old:     A→B  B→C  C→D          new (from B):  B→X  X→D
//! merged:  A→B  B→X  X→D          indices 0, 1, 2
//! ```

use tc_core::VehicleProfile;
use tc_routing::{Route, Router, Step};

use crate::{DriveOrder, RerouteError, RerouteResult};

/// Merge two step sequences at the branching point.
pub fn merge_steps(old: &[Step], new: &[Step]) -> RerouteResult<Vec<Step>> {
    let first = new.first().ok_or(RerouteError::EmptyReplacement)?;
    let branch = old
        .iter()
        .position(|s| s.source == first.source)
        .ok_or(RerouteError::NoBranchingPoint(first.source))?;
    tracing::debug!(branch, added = new.len(), "merging steps");

    Ok(renumber(old[..branch].iter().chain(new)))
}

/// Copies of `steps` with route indices 0, 1, 2, …
pub fn renumber<'a>(steps: impl IntoIterator<Item = &'a Step>) -> Vec<Step> {
    steps
        .into_iter()
        .enumerate()
        .map(|(i, s)| s.with_route_index(i as u32))
        .collect()
}

/// Merge the routes of `old` and `new`, keeping `old`'s destination and state.
///
/// The merged route's cost is what the router reports between its two ends.
pub fn merge_drive_orders(
    router: &Router,
    vehicle: &VehicleProfile,
    old: &DriveOrder,
    new: &DriveOrder,
) -> RerouteResult<DriveOrder> {
    let steps = merge_steps(old.steps(), new.steps())?;
    let (Some(first), Some(last)) = (steps.first(), steps.last()) else {
        return Err(RerouteError::EmptyReplacement);
    };
    let costs = router.costs(vehicle, first.source, last.destination)?;
    Ok(old.with_route(Route::new(steps, costs)))
}
