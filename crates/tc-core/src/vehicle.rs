//! Vehicle description shared by the router and the reroute engine.

use crate::VehicleId;

/// The direction in which a vehicle travels along a path, relative to the
/// path's own source → destination definition.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    /// Travelling from the path's source point to its destination point.
    #[default]
    Forward,
    /// Travelling from the path's destination point back to its source point.
    Backward,
}

impl Orientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Forward  => "forward",
            Orientation::Backward => "backward",
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The routing-relevant properties of one vehicle.
///
/// Edge evaluators receive this so costs can depend on the vehicle (e.g. its
/// top speed); the router uses `routing_group` to pick the cached graph.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleProfile {
    pub id: VehicleId,
    pub name: String,
    /// Routing group tag; `None` means the configured default group.
    pub routing_group: Option<String>,
    /// Maximum forward velocity in mm/s.
    pub max_velocity: u32,
    /// Maximum reverse velocity in mm/s.
    pub max_reverse_velocity: u32,
}

impl VehicleProfile {
    pub fn new(id: VehicleId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            routing_group: None,
            max_velocity: 1_000,
            max_reverse_velocity: 1_000,
        }
    }

    pub fn with_routing_group(mut self, group: impl Into<String>) -> Self {
        self.routing_group = Some(group.into());
        self
    }

    pub fn with_velocities(mut self, forward: u32, reverse: u32) -> Self {
        self.max_velocity = forward;
        self.max_reverse_velocity = reverse;
        self
    }

    /// The effective routing group, falling back to `default_group`.
    ///
    /// Surrounding whitespace is ignored, so `" "` resolves to the default.
    pub fn routing_group_or<'a>(&'a self, default_group: &'a str) -> &'a str {
        match self.routing_group.as_deref().map(str::trim) {
            Some(g) if !g.is_empty() => g,
            _ => default_group,
        }
    }
}
