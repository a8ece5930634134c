//! Exclusive spatial resources and resource sets.
//!
//! A [`ResourceRef`] names one claimable plant element.  A [`ResourceSet`]
//! bundles the resources a vehicle must hold together for one step of its
//! route (typically the path it is about to travel plus the point at its end).
//!
//! `ResourceSet` is backed by a `BTreeSet`, so equality and iteration order are
//! independent of insertion order.  The scheduler relies on that when it
//! compares an allocation request against the head of a client's claim queue.

use std::collections::BTreeSet;
use std::fmt;

use crate::{BlockId, PathId, PointId};

/// A claimable plant element.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResourceRef {
    Point(PointId),
    Path(PathId),
    Block(BlockId),
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceRef::Point(id) => write!(f, "{id}"),
            ResourceRef::Path(id) => write!(f, "{id}"),
            ResourceRef::Block(id) => write!(f, "{id}"),
        }
    }
}

impl From<PointId> for ResourceRef {
    fn from(id: PointId) -> Self {
        ResourceRef::Point(id)
    }
}

impl From<PathId> for ResourceRef {
    fn from(id: PathId) -> Self {
        ResourceRef::Path(id)
    }
}

impl From<BlockId> for ResourceRef {
    fn from(id: BlockId) -> Self {
        ResourceRef::Block(id)
    }
}

// ── ResourceSet ───────────────────────────────────────────────────────────────

/// An ordered, duplicate-free set of resources acquired or released together.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceSet(BTreeSet<ResourceRef>);

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, resource: impl Into<ResourceRef>) -> bool {
        self.0.insert(resource.into())
    }

    pub fn remove(&mut self, resource: &ResourceRef) -> bool {
        self.0.remove(resource)
    }

    pub fn contains(&self, resource: &ResourceRef) -> bool {
        self.0.contains(resource)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceRef> + '_ {
        self.0.iter()
    }

    /// `true` if every resource of `self` is also in `other`.
    pub fn is_subset(&self, other: &ResourceSet) -> bool {
        self.0.is_subset(&other.0)
    }

    /// `true` if the two sets share at least one resource.
    pub fn intersects(&self, other: &ResourceSet) -> bool {
        !self.0.is_disjoint(&other.0)
    }

    /// Add every resource of `other` to `self`.
    pub fn extend_from(&mut self, other: &ResourceSet) {
        self.0.extend(other.0.iter().copied());
    }

    /// Remove every resource of `other` from `self`.
    pub fn subtract(&mut self, other: &ResourceSet) {
        for r in &other.0 {
            self.0.remove(r);
        }
    }
}

impl FromIterator<ResourceRef> for ResourceSet {
    fn from_iter<I: IntoIterator<Item = ResourceRef>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ResourceSet {
    type Item = &'a ResourceRef;
    type IntoIter = std::collections::btree_set::Iter<'a, ResourceRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for ResourceSet {
    type Item = ResourceRef;
    type IntoIter = std::collections::btree_set::IntoIter<ResourceRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for ResourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, r) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{r}")?;
        }
        f.write_str("}")
    }
}
