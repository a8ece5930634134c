//! Plant graph representation and builder.
//!
//! # Data layout
//!
//! Points, paths and blocks live in `Vec`s indexed by their typed IDs, so
//! `model.paths[id.index()]` is a direct lookup.  Each point additionally
//! owns a contiguous slice of **incident** path IDs (CSR layout):
//!
//! ```text
//! incident_paths[ point_incident_start[p] .. point_incident_start[p+1] ]
//! ```
//!
//! A path appears in the slices of both its endpoints, because a
//! bidirectional path can be left from either side.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) maps layout `(x, y)` to the nearest `PointId`.
//! Used to resolve a vehicle that reports a precise position but no point.

use rstar::{AABB, PointDistance, RTree, RTreeObject};
use rustc_hash::{FxHashMap, FxHashSet};

use tc_core::{BlockId, Orientation, PathId, PointId, Position, ResourceRef, ResourceSet, TcError};

use crate::{PlantError, PlantResult};

// ── Elements ──────────────────────────────────────────────────────────────────

/// A node of the plant graph: a position a vehicle can stop at.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub id: PointId,
    pub name: String,
    pub position: Position,
    /// Routing groups allowed to use this point.  Empty means every group.
    pub routing_groups: Vec<String>,
}

/// An edge of the plant graph.
///
/// A path is travelable forward when `max_velocity > 0` and in reverse when
/// `max_reverse_velocity > 0`.  A locked path is not travelable at all.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Path {
    pub id: PathId,
    pub name: String,
    pub source: PointId,
    pub destination: PointId,
    pub length_mm: u64,
    /// mm/s; 0 forbids forward travel.
    pub max_velocity: u32,
    /// mm/s; 0 forbids reverse travel.
    pub max_reverse_velocity: u32,
    pub locked: bool,
    /// Extra cost when travelled forward (for the explicit-penalty evaluator).
    pub forward_penalty: u64,
    /// Extra cost when travelled in reverse.
    pub reverse_penalty: u64,
    /// Routing groups allowed to use this path.  Empty means every group.
    pub routing_groups: Vec<String>,
}

impl Path {
    /// `true` if the path's configuration permits travel with `orientation`.
    /// Ignores the lock flag.
    #[inline]
    pub fn allows(&self, orientation: Orientation) -> bool {
        match orientation {
            Orientation::Forward  => self.max_velocity > 0,
            Orientation::Backward => self.max_reverse_velocity > 0,
        }
    }

    /// Velocity limit for `orientation`, in mm/s.
    #[inline]
    pub fn velocity(&self, orientation: Orientation) -> u32 {
        match orientation {
            Orientation::Forward  => self.max_velocity,
            Orientation::Backward => self.max_reverse_velocity,
        }
    }

    #[inline]
    pub fn penalty(&self, orientation: Orientation) -> u64 {
        match orientation {
            Orientation::Forward  => self.forward_penalty,
            Orientation::Backward => self.reverse_penalty,
        }
    }

    /// `(from, to)` points when travelled with `orientation`.
    #[inline]
    pub fn endpoints(&self, orientation: Orientation) -> (PointId, PointId) {
        match orientation {
            Orientation::Forward  => (self.source, self.destination),
            Orientation::Backward => (self.destination, self.source),
        }
    }

    pub fn usable_by_group(&self, group: &str) -> bool {
        group_allows(&self.routing_groups, group)
    }
}

impl Point {
    pub fn usable_by_group(&self, group: &str) -> bool {
        group_allows(&self.routing_groups, group)
    }
}

/// Untagged elements are shared; tagged ones belong to the listed groups only.
fn group_allows(groups: &[String], group: &str) -> bool {
    groups.is_empty() || groups.iter().any(|g| g == group)
}

/// A named set of resources that only one vehicle may occupy at a time.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Block {
    pub id: BlockId,
    pub name: String,
    pub members: ResourceSet,
}

// ── R-tree point entry ────────────────────────────────────────────────────────

#[derive(Clone)]
struct PointEntry {
    xy: [f64; 2],
    id: PointId,
}

impl RTreeObject for PointEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.xy)
    }
}

impl PointDistance for PointEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.xy[0] - point[0];
        let dy = self.xy[1] - point[1];
        dx * dx + dy * dy
    }
}

// ── PlantModel ────────────────────────────────────────────────────────────────

/// An immutable snapshot of the plant: points, paths, blocks and indexes.
///
/// Do not construct directly; use [`PlantModelBuilder`].  Derive modified
/// snapshots with the `with_*` methods.
#[derive(Clone)]
pub struct PlantModel {
    pub points: Vec<Point>,
    pub paths: Vec<Path>,
    pub blocks: Vec<Block>,

    /// CSR row pointer into `incident_paths`.  Length = `point_count + 1`.
    point_incident_start: Vec<u32>,
    incident_paths: Vec<PathId>,

    /// Reverse index: which blocks a resource is a member of.
    blocks_of: FxHashMap<ResourceRef, Vec<BlockId>>,


    spatial_idx: RTree<PointEntry>,
}

impl PlantModel {
    /// A model with no elements.
    pub fn empty() -> Self {
        Self {
            points: Vec::new(),
            paths: Vec::new(),
            blocks: Vec::new(),
            point_incident_start: vec![0],
            incident_paths: Vec::new(),
            blocks_of: FxHashMap::default(),
            spatial_idx: RTree::new(),
        }
    }

    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    pub fn point(&self, id: PointId) -> Option<&Point> {
        self.points.get(id.index())
    }

    pub fn path(&self, id: PathId) -> Option<&Path> {
        self.paths.get(id.index())
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.index())
    }

    /// `true` if the model defines `resource`.
    pub fn contains(&self, resource: &ResourceRef) -> bool {
        match *resource {
            ResourceRef::Point(id) => self.point(id).is_some(),
            ResourceRef::Path(id)  => self.path(id).is_some(),
            ResourceRef::Block(id) => self.block(id).is_some(),
        }
    }

    /// `true` if `resource` is a locked path.  Points and blocks are never
    /// locked themselves.
    pub fn is_locked(&self, resource: &ResourceRef) -> bool {
        match *resource {
            ResourceRef::Path(id) => self.path(id).is_some_and(|p| p.locked),
            _ => false,
        }
    }

    /// Blocks that list `resource` as a member.
    pub fn blocks_containing(&self, resource: &ResourceRef) -> &[BlockId] {
        self.blocks_of.get(resource).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Paths touching `point` (as source or destination).
    ///
    /// This is a contiguous slice — no heap allocation.
    #[inline]
    pub fn incident_paths(&self, point: PointId) -> &[PathId] {
        let start = self.point_incident_start[point.index()] as usize;
        let end   = self.point_incident_start[point.index() + 1] as usize;
        &self.incident_paths[start..end]
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// The point nearest to `pos`.  `None` only if the model has no points.
    pub fn snap_to_point(&self, pos: Position) -> Option<PointId> {
        self.spatial_idx.nearest_neighbor(&[pos.x, pos.y]).map(|e| e.id)
    }

    // ── Derived snapshots ─────────────────────────────────────────────────

    /// A copy of this model with `path`'s lock flag set to `locked`.
    pub fn with_path_locked(&self, path: PathId, locked: bool) -> PlantResult<PlantModel> {
        let mut next = self.clone();
        let p = next
            .paths
            .get_mut(path.index())
            .ok_or(TcError::PathNotFound(path))?;
        p.locked = locked;
        Ok(next)
    }
}

impl std::fmt::Debug for PlantModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlantModel")
            .field("points", &self.points.len())
            .field("paths", &self.paths.len())
            .field("blocks", &self.blocks.len())
            .finish()
    }
}

// ── PlantModelBuilder ─────────────────────────────────────────────────────────

/// Construct a [`PlantModel`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use tc_core::Position;
/// use tc_plant::PlantModelBuilder;
///
/// let mut b = PlantModelBuilder::new();
/// let a = b.add_point("A", Position::new(0.0, 0.0));
/// let c = b.add_point("C", Position::new(1_000.0, 0.0));
/// b.add_bidirectional_path("A--C", a, c, 1_000);
/// let model = b.build().unwrap();
/// assert_eq!(model.point_count(), 2);
/// assert_eq!(model.path_count(), 1);
/// ```
pub struct PlantModelBuilder {
    points: Vec<Point>,
    paths:  Vec<Path>,
    blocks: Vec<Block>,
}

impl PlantModelBuilder {
    pub fn new() -> Self {
        Self { points: Vec::new(), paths: Vec::new(), blocks: Vec::new() }
    }

    /// Start from an existing snapshot, e.g. to apply a topology edit.
    pub fn from_model(model: &PlantModel) -> Self {
        Self {
            points: model.points.clone(),
            paths:  model.paths.clone(),
            blocks: model.blocks.clone(),
        }
    }

    /// Add a point and return its `PointId` (sequential from 0).
    pub fn add_point(&mut self, name: impl Into<String>, position: Position) -> PointId {
        let id = PointId(self.points.len() as u32);
        self.points.push(Point {
            id,
            name: name.into(),
            position,
            routing_groups: Vec::new(),
        });
        id
    }

    /// Add a path travelable **forward only** at 1 m/s.
    pub fn add_path(
        &mut self,
        name: impl Into<String>,
        source: PointId,
        destination: PointId,
        length_mm: u64,
    ) -> PathId {
        let id = PathId(self.paths.len() as u32);
        self.paths.push(Path {
            id,
            name: name.into(),
            source,
            destination,
            length_mm,
            max_velocity: 1_000,
            max_reverse_velocity: 0,
            locked: false,
            forward_penalty: 0,
            reverse_penalty: 0,
            routing_groups: Vec::new(),
        });
        id
    }

    /// Convenience: a path travelable in **both directions** at 1 m/s.
    pub fn add_bidirectional_path(
        &mut self,
        name: impl Into<String>,
        a: PointId,
        b: PointId,
        length_mm: u64,
    ) -> PathId {
        let id = self.add_path(name, a, b, length_mm);
        self.paths[id.index()].max_reverse_velocity = 1_000;
        id
    }

    /// Add a block over `members` and return its `BlockId`.
    pub fn add_block(&mut self, name: impl Into<String>, members: ResourceSet) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(Block { id, name: name.into(), members });
        id
    }

    // ── Element modifiers ─────────────────────────────────────────────────
    //
    // Unknown IDs are ignored here; `build()` is where the model is checked.

    pub fn set_velocities(&mut self, path: PathId, forward: u32, reverse: u32) -> &mut Self {
        if let Some(p) = self.paths.get_mut(path.index()) {
            p.max_velocity = forward;
            p.max_reverse_velocity = reverse;
        }
        self
    }

    pub fn set_locked(&mut self, path: PathId, locked: bool) -> &mut Self {
        if let Some(p) = self.paths.get_mut(path.index()) {
            p.locked = locked;
        }
        self
    }

    pub fn set_penalties(&mut self, path: PathId, forward: u64, reverse: u64) -> &mut Self {
        if let Some(p) = self.paths.get_mut(path.index()) {
            p.forward_penalty = forward;
            p.reverse_penalty = reverse;
        }
        self
    }

    pub fn set_path_groups(&mut self, path: PathId, groups: &[&str]) -> &mut Self {
        if let Some(p) = self.paths.get_mut(path.index()) {
            p.routing_groups = groups.iter().map(|g| (*g).to_owned()).collect();
        }
        self
    }

    pub fn set_point_groups(&mut self, point: PointId, groups: &[&str]) -> &mut Self {
        if let Some(p) = self.points.get_mut(point.index()) {
            p.routing_groups = groups.iter().map(|g| (*g).to_owned()).collect();
        }
        self
    }

    pub fn point_count(&self) -> usize { self.points.len() }
    pub fn path_count(&self) -> usize { self.paths.len() }

    /// Validate and consume the builder, producing a [`PlantModel`].
    ///
    /// Fails on duplicate names, paths with unknown endpoints, and blocks that
    /// are empty or reference unknown elements.
    pub fn build(self) -> PlantResult<PlantModel> {
        let point_count = self.points.len();

        let mut point_names: FxHashSet<&str> = FxHashSet::default();
        for p in &self.points {
            if !point_names.insert(&p.name) {
                return Err(PlantError::DuplicateName(p.name.clone()));
            }
        }
        let mut path_names: FxHashSet<&str> = FxHashSet::default();
        for p in &self.paths {
            for end in [p.source, p.destination] {
                if end.index() >= point_count {
                    return Err(PlantError::DanglingPath { path: p.id, point: end });
                }
            }
            if !path_names.insert(&p.name) {
                return Err(PlantError::DuplicateName(p.name.clone()));
            }
        }

        // Block membership index.
        let mut blocks_of: FxHashMap<ResourceRef, Vec<BlockId>> = FxHashMap::default();
        for b in &self.blocks {
            if b.members.is_empty() {
                return Err(PlantError::EmptyBlock(b.name.clone()));
            }
            for m in &b.members {
                let known = match *m {
                    ResourceRef::Point(id) => id.index() < point_count,
                    ResourceRef::Path(id)  => id.index() < self.paths.len(),
                    ResourceRef::Block(id) => id.index() < self.blocks.len(),
                };
                if !known {
                    return Err(match *m {
                        ResourceRef::Point(id) => TcError::PointNotFound(id),
                        ResourceRef::Path(id)  => TcError::PathNotFound(id),
                        ResourceRef::Block(id) => TcError::BlockNotFound(id),
                    }
                    .into());
                }
                blocks_of.entry(*m).or_default().push(b.id);
            }
        }

        // CSR of incident paths, both endpoints.
        let mut point_incident_start = vec![0u32; point_count + 1];
        for p in &self.paths {
            point_incident_start[p.source.index() + 1] += 1;
            if p.destination != p.source {
                point_incident_start[p.destination.index() + 1] += 1;
            }
        }
        for i in 1..=point_count {
            point_incident_start[i] += point_incident_start[i - 1];
        }
        let mut fill = point_incident_start.clone();
        let mut incident_paths = vec![PathId::INVALID; point_incident_start[point_count] as usize];
        for p in &self.paths {
            incident_paths[fill[p.source.index()] as usize] = p.id;
            fill[p.source.index()] += 1;
            if p.destination != p.source {
                incident_paths[fill[p.destination.index()] as usize] = p.id;
                fill[p.destination.index()] += 1;
            }
        }

        let entries: Vec<PointEntry> = self
            .points
            .iter()
            .map(|p| PointEntry { xy: [p.position.x, p.position.y], id: p.id })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        tracing::debug!(
            points = point_count,
            paths = self.paths.len(),
            blocks = self.blocks.len(),
            "built plant model"
        );

        Ok(PlantModel {
            points: self.points,
            paths: self.paths,
            blocks: self.blocks,
            point_incident_start,
            incident_paths,
            blocks_of,
            spatial_idx,
        })
    }
}

impl Default for PlantModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}
