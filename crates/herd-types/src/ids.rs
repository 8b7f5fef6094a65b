//! Identifier Types
//!
//! Agents, places and kinds are owned by the world; the engine only ever holds
//! their identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an agent (an NPC body in the world).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        AgentId(s.to_string())
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        AgentId(s)
    }
}

/// Unique identifier for a place (a world cell agents can stand in).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceId(pub String);

impl PlaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlaceId {
    fn from(s: &str) -> Self {
        PlaceId(s.to_string())
    }
}

impl From<String> for PlaceId {
    fn from(s: String) -> Self {
        PlaceId(s)
    }
}

/// Identifier for a creature kind (race or species), used for trust lists.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KindId(pub String);

impl KindId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KindId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for KindId {
    fn from(s: &str) -> Self {
        KindId(s.to_string())
    }
}

/// Unique identifier for a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub Uuid);

impl GroupId {
    /// Generates a fresh random group identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Builds a version 4 identifier from caller-supplied random bytes, so a
    /// seeded generator yields reproducible ids.
    pub fn from_random_bytes(bytes: [u8; 16]) -> Self {
        Self(uuid::Builder::from_random_bytes(bytes).into_uuid())
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group_{}", self.0.simple())
    }
}

/// Vertical layer within a place.
///
/// Declaration order runs from the deepest layer to the highest, so the
/// derived ordering compares heights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    DeepUnderwater,
    Underwater,
    #[default]
    GroundLevel,
    InTrees,
    HighInTrees,
    InAir,
}

impl Layer {
    /// Height relative to the ground, negative below the surface.
    pub fn height(self) -> i8 {
        match self {
            Layer::DeepUnderwater => -2,
            Layer::Underwater => -1,
            Layer::GroundLevel => 0,
            Layer::InTrees => 1,
            Layer::HighInTrees => 2,
            Layer::InAir => 3,
        }
    }

    pub fn is_underwater(self) -> bool {
        self.height() < 0
    }

    pub fn is_in_trees(self) -> bool {
        matches!(self, Layer::InTrees | Layer::HighInTrees)
    }

    /// The adjacent layer one step above, if any.
    pub fn above(self) -> Option<Layer> {
        match self {
            Layer::DeepUnderwater => Some(Layer::Underwater),
            Layer::Underwater => Some(Layer::GroundLevel),
            Layer::GroundLevel => Some(Layer::InTrees),
            Layer::InTrees => Some(Layer::HighInTrees),
            Layer::HighInTrees => Some(Layer::InAir),
            Layer::InAir => None,
        }
    }

    /// The adjacent layer one step below, if any.
    pub fn below(self) -> Option<Layer> {
        match self {
            Layer::DeepUnderwater => None,
            Layer::Underwater => Some(Layer::DeepUnderwater),
            Layer::GroundLevel => Some(Layer::Underwater),
            Layer::InTrees => Some(Layer::GroundLevel),
            Layer::HighInTrees => Some(Layer::InTrees),
            Layer::InAir => Some(Layer::HighInTrees),
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Layer::DeepUnderwater => "deep_underwater",
            Layer::Underwater => "underwater",
            Layer::GroundLevel => "ground_level",
            Layer::InTrees => "in_trees",
            Layer::HighInTrees => "high_in_trees",
            Layer::InAir => "in_air",
        };
        f.write_str(name)
    }
}

/// Where an agent currently is: a place plus the layer within it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Placement {
    pub place: PlaceId,
    pub layer: Layer,
}

impl Placement {
    pub fn new(place: impl Into<PlaceId>, layer: Layer) -> Self {
        Self {
            place: place.into(),
            layer,
        }
    }

    /// Placement at ground level.
    pub fn ground(place: impl Into<PlaceId>) -> Self {
        Self::new(place, Layer::GroundLevel)
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.place, self.layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_ordering_follows_height() {
        assert!(Layer::DeepUnderwater < Layer::Underwater);
        assert!(Layer::GroundLevel < Layer::InTrees);
        assert!(Layer::HighInTrees < Layer::InAir);
        assert_eq!(Layer::GroundLevel.height(), 0);
        assert!(Layer::Underwater.is_underwater());
        assert!(!Layer::InAir.is_underwater());
    }

    #[test]
    fn test_layer_neighbours() {
        assert_eq!(Layer::GroundLevel.above(), Some(Layer::InTrees));
        assert_eq!(Layer::GroundLevel.below(), Some(Layer::Underwater));
        assert_eq!(Layer::InAir.above(), None);
        assert_eq!(Layer::DeepUnderwater.below(), None);
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let agent = AgentId::from("deer_01");
        assert_eq!(serde_json::to_string(&agent).unwrap(), r#""deer_01""#);

        let place: PlaceId = serde_json::from_str(r#""meadow""#).unwrap();
        assert_eq!(place, PlaceId::from("meadow"));
    }

    #[test]
    fn test_group_ids_are_unique() {
        assert_ne!(GroupId::new(), GroupId::new());
        assert!(GroupId::new().to_string().starts_with("group_"));
    }

    #[test]
    fn test_group_id_from_bytes_is_stable() {
        let a = GroupId::from_random_bytes([7; 16]);
        let b = GroupId::from_random_bytes([7; 16]);
        assert_eq!(a, b);
        assert_eq!(a.0.get_version_num(), 4);
    }

    #[test]
    fn test_placement_display() {
        let placement = Placement::new("river_ford", Layer::Underwater);
        assert_eq!(placement.to_string(), "river_ford@underwater");
        assert_eq!(Placement::ground("meadow").layer, Layer::GroundLevel);
    }
}
