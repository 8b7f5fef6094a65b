//! Behavior Memory
//!
//! Per-group knowledge owned by the group's policy: known water, known
//! threat locations with last-seen times, emote and wander bookkeeping, and
//! the extras each policy family keeps (untrusted kinds, sentry, territory,
//! last adult death, dominance).
//!
//! The memory is a tagged union keyed by policy family. A policy validates
//! the variant when a group is created or loaded, so handlers never need to
//! cast at use time.

use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use herd_types::{AgentId, KindId, PlaceId, SimTime};

use crate::world::GroupWorld;

/// A persisted reference to an agent, resolved against the world at most once.
///
/// Snapshots store the raw identifier. After load the reference stays
/// `Unresolved` until first accessed, at which point it becomes `Resolved`
/// or, if the world no longer knows the agent, `Missing`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum AgentRef {
    Unresolved(String),
    Resolved(AgentId),
    /// No agent: never set, cleared, or not found on resolution
    #[default]
    Missing,
}

impl AgentRef {
    pub fn to(agent: AgentId) -> Self {
        AgentRef::Resolved(agent)
    }

    /// Resolves the reference if it has not been resolved yet and returns the agent.
    pub fn resolve(&mut self, world: &dyn GroupWorld) -> Option<&AgentId> {
        if let AgentRef::Unresolved(raw) = self {
            *self = match world.resolve_agent(raw) {
                Some(agent) => AgentRef::Resolved(agent),
                None => {
                    tracing::warn!(agent = %raw, "persisted agent reference no longer exists");
                    AgentRef::Missing
                }
            };
        }
        self.get()
    }

    /// The agent, if already resolved.
    pub fn get(&self) -> Option<&AgentId> {
        match self {
            AgentRef::Resolved(agent) => Some(agent),
            _ => None,
        }
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, AgentRef::Missing)
    }

    pub fn clear(&mut self) {
        *self = AgentRef::Missing;
    }
}

impl From<Option<String>> for AgentRef {
    fn from(raw: Option<String>) -> Self {
        match raw {
            Some(raw) => AgentRef::Unresolved(raw),
            None => AgentRef::Missing,
        }
    }
}

impl From<AgentRef> for Option<String> {
    fn from(reference: AgentRef) -> Self {
        match reference {
            AgentRef::Unresolved(raw) => Some(raw),
            AgentRef::Resolved(agent) => Some(agent.0),
            AgentRef::Missing => None,
        }
    }
}

/// Knowledge every policy family keeps.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SharedMemory {
    pub known_water: BTreeSet<PlaceId>,
    /// Threat place to the last time a threat was seen there
    pub known_threats: BTreeMap<PlaceId, SimTime>,
    pub last_emote: Option<SimTime>,
    pub last_posture: Option<SimTime>,
    /// The place the group last wandered away from
    pub last_origin: Option<PlaceId>,
}

impl SharedMemory {
    /// Records a water source. Returns true if it was not known before.
    pub fn note_water(&mut self, place: PlaceId) -> bool {
        self.known_water.insert(place)
    }

    pub fn is_known_water(&self, place: &PlaceId) -> bool {
        self.known_water.contains(place)
    }

    /// Records or refreshes a threat sighting.
    pub fn note_threat(&mut self, place: PlaceId, seen_at: SimTime) {
        let entry = self.known_threats.entry(place).or_insert(seen_at);
        if *entry < seen_at {
            *entry = seen_at;
        }
    }

    /// Forgets threat places not refreshed within `max_age_secs`. Returns how many were dropped.
    pub fn prune_threats(&mut self, now: SimTime, max_age_secs: u64) -> usize {
        let before = self.known_threats.len();
        self.known_threats
            .retain(|_, seen| now.secs_since(*seen) <= max_age_secs);
        before - self.known_threats.len()
    }
}

/// Memory for Neutral and Wimpy herds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HerdMemory {
    #[serde(default)]
    pub shared: SharedMemory,
    #[serde(default)]
    pub untrusted_kinds: Vec<KindId>,
    #[serde(default)]
    pub sentry: AgentRef,
    #[serde(default)]
    pub last_adult_death: Option<SimTime>,
}

impl HerdMemory {
    pub fn new(untrusted_kinds: Vec<KindId>) -> Self {
        Self {
            untrusted_kinds,
            ..Self::default()
        }
    }
}

/// Memory for Territorial herds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TerritorialMemory {
    #[serde(default)]
    pub herd: HerdMemory,
    /// Claimed place to the last time the herd grazed there
    #[serde(default)]
    pub territory: BTreeMap<PlaceId, SimTime>,
}

/// Memory for Family predators.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PredatorMemory {
    pub shared: SharedMemory,
    pub untrusted_kinds: Vec<KindId>,
    pub sentry: AgentRef,
    /// Claimed place to the last time the pack grazed there
    pub territory: BTreeMap<PlaceId, SimTime>,
    pub last_adult_death: Option<SimTime>,
    /// Set while one of the pack's children is under attack
    pub child_attacked: bool,
    /// Kinds the pack has driven off, with how often
    pub dominance: BTreeMap<KindId, u32>,
    /// Kinds engaged in the current fight, credited once the threats are gone
    pub engaged_kinds: BTreeSet<KindId>,
}

impl PredatorMemory {
    pub fn new(untrusted_kinds: Vec<KindId>) -> Self {
        Self {
            untrusted_kinds,
            ..Self::default()
        }
    }

    /// How many times the pack has driven off this kind.
    pub fn dominance_over(&self, kind: &KindId) -> u32 {
        self.dominance.get(kind).copied().unwrap_or(0)
    }

    /// Credits every engaged kind as driven off and clears the engagement list.
    pub fn credit_engaged(&mut self) -> usize {
        let credited = self.engaged_kinds.len();
        for kind in std::mem::take(&mut self.engaged_kinds) {
            *self.dominance.entry(kind).or_insert(0) += 1;
        }
        credited
    }
}

/// Which memory record a policy owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryFamily {
    Herd,
    Territorial,
    Predator,
}

impl fmt::Display for MemoryFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryFamily::Herd => write!(f, "herd"),
            MemoryFamily::Territorial => write!(f, "territorial"),
            MemoryFamily::Predator => write!(f, "predator"),
        }
    }
}

/// Policy-owned behavior memory of one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum BehaviorMemory {
    Herd(HerdMemory),
    Territorial(TerritorialMemory),
    Predator(PredatorMemory),
}

impl BehaviorMemory {
    pub fn family(&self) -> MemoryFamily {
        match self {
            BehaviorMemory::Herd(_) => MemoryFamily::Herd,
            BehaviorMemory::Territorial(_) => MemoryFamily::Territorial,
            BehaviorMemory::Predator(_) => MemoryFamily::Predator,
        }
    }

    /// Encodes the memory for the save manager.
    pub fn save(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decodes memory produced by [`BehaviorMemory::save`].
    pub fn load(serialized: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(serialized)
    }

    pub fn shared(&self) -> &SharedMemory {
        match self {
            BehaviorMemory::Herd(m) => &m.shared,
            BehaviorMemory::Territorial(m) => &m.herd.shared,
            BehaviorMemory::Predator(m) => &m.shared,
        }
    }

    pub fn shared_mut(&mut self) -> &mut SharedMemory {
        match self {
            BehaviorMemory::Herd(m) => &mut m.shared,
            BehaviorMemory::Territorial(m) => &mut m.herd.shared,
            BehaviorMemory::Predator(m) => &mut m.shared,
        }
    }

    pub fn untrusted_kinds(&self) -> &[KindId] {
        match self {
            BehaviorMemory::Herd(m) => &m.untrusted_kinds,
            BehaviorMemory::Territorial(m) => &m.herd.untrusted_kinds,
            BehaviorMemory::Predator(m) => &m.untrusted_kinds,
        }
    }

    pub fn sentry(&self) -> &AgentRef {
        match self {
            BehaviorMemory::Herd(m) => &m.sentry,
            BehaviorMemory::Territorial(m) => &m.herd.sentry,
            BehaviorMemory::Predator(m) => &m.sentry,
        }
    }

    pub fn sentry_mut(&mut self) -> &mut AgentRef {
        match self {
            BehaviorMemory::Herd(m) => &mut m.sentry,
            BehaviorMemory::Territorial(m) => &mut m.herd.sentry,
            BehaviorMemory::Predator(m) => &mut m.sentry,
        }
    }

    /// The appointed sentry, resolving a freshly loaded reference on first use.
    pub fn resolve_sentry(&mut self, world: &dyn GroupWorld) -> Option<AgentId> {
        self.sentry_mut().resolve(world).cloned()
    }

    pub fn last_adult_death(&self) -> Option<SimTime> {
        match self {
            BehaviorMemory::Herd(m) => m.last_adult_death,
            BehaviorMemory::Territorial(m) => m.herd.last_adult_death,
            BehaviorMemory::Predator(m) => m.last_adult_death,
        }
    }

    pub fn record_adult_death(&mut self, at: SimTime) {
        let slot = match self {
            BehaviorMemory::Herd(m) => &mut m.last_adult_death,
            BehaviorMemory::Territorial(m) => &mut m.herd.last_adult_death,
            BehaviorMemory::Predator(m) => &mut m.last_adult_death,
        };
        *slot = Some(at);
    }

    /// Territory, for the families that keep one.
    pub fn territory(&self) -> Option<&BTreeMap<PlaceId, SimTime>> {
        match self {
            BehaviorMemory::Herd(_) => None,
            BehaviorMemory::Territorial(m) => Some(&m.territory),
            BehaviorMemory::Predator(m) => Some(&m.territory),
        }
    }

    fn territory_mut(&mut self) -> Option<&mut BTreeMap<PlaceId, SimTime>> {
        match self {
            BehaviorMemory::Herd(_) => None,
            BehaviorMemory::Territorial(m) => Some(&mut m.territory),
            BehaviorMemory::Predator(m) => Some(&mut m.territory),
        }
    }

    /// Claims a place, or refreshes an existing claim. Returns true if it was new.
    pub fn claim_territory(&mut self, place: PlaceId, at: SimTime) -> bool {
        let Some(territory) = self.territory_mut() else {
            return false;
        };
        match territory.entry(place) {
            Entry::Occupied(mut claim) => {
                if *claim.get() < at {
                    claim.insert(at);
                }
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(at);
                true
            }
        }
    }

    /// Gives up places not grazed within `max_age_secs`. Returns how many were dropped.
    pub fn prune_territory(&mut self, now: SimTime, max_age_secs: u64) -> usize {
        let Some(territory) = self.territory_mut() else {
            return 0;
        };
        let before = territory.len();
        territory.retain(|_, claimed| now.secs_since(*claimed) <= max_age_secs);
        before - territory.len()
    }

    pub fn in_territory(&self, place: &PlaceId) -> bool {
        self.territory().is_some_and(|t| t.contains_key(place))
    }

    pub fn as_predator(&self) -> Option<&PredatorMemory> {
        match self {
            BehaviorMemory::Predator(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_predator_mut(&mut self) -> Option<&mut PredatorMemory> {
        match self {
            BehaviorMemory::Predator(m) => Some(m),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::SandboxWorld;

    #[test]
    fn test_prune_threats_after_window() {
        let mut shared = SharedMemory::default();
        shared.note_threat(PlaceId::from("ridge"), SimTime::from_secs(0));
        shared.note_threat(PlaceId::from("ford"), SimTime::from_secs(40_000));

        let dropped = shared.prune_threats(SimTime::from_secs(43_201), 43_200);

        assert_eq!(dropped, 1);
        assert!(!shared.known_threats.contains_key(&PlaceId::from("ridge")));
        assert!(shared.known_threats.contains_key(&PlaceId::from("ford")));
    }

    #[test]
    fn test_note_threat_refreshes_but_never_rewinds() {
        let mut shared = SharedMemory::default();
        let place = PlaceId::from("ridge");
        shared.note_threat(place.clone(), SimTime::from_secs(100));
        shared.note_threat(place.clone(), SimTime::from_secs(500));
        shared.note_threat(place.clone(), SimTime::from_secs(200));

        assert_eq!(shared.known_threats[&place], SimTime::from_secs(500));
    }

    #[test]
    fn test_territory_claims_lapse_when_not_grazed() {
        let mut memory = BehaviorMemory::Predator(PredatorMemory::default());
        assert!(memory.claim_territory(PlaceId::from("den"), SimTime::from_secs(1_000)));
        assert!(memory.claim_territory(PlaceId::from("ford"), SimTime::from_secs(1_000)));
        // Grazing again refreshes the claim without counting as new
        assert!(!memory.claim_territory(PlaceId::from("den"), SimTime::from_secs(90_000)));

        assert_eq!(memory.prune_territory(SimTime::from_secs(100_000), 20_000), 1);
        assert!(memory.in_territory(&PlaceId::from("den")));
        assert!(!memory.in_territory(&PlaceId::from("ford")));

        let mut herd = BehaviorMemory::Herd(HerdMemory::default());
        assert!(!herd.claim_territory(PlaceId::from("den"), SimTime::from_secs(1_000)));
        assert_eq!(herd.prune_territory(SimTime::from_secs(100_000), 0), 0);
    }

    #[test]
    fn test_memory_save_load() {
        let mut herd = HerdMemory::new(vec![KindId::from("wolf")]);
        herd.shared.note_water(PlaceId::from("pond"));
        herd.sentry = AgentRef::to(AgentId::from("deer_03"));
        let memory = BehaviorMemory::Territorial(TerritorialMemory {
            herd,
            territory: [(PlaceId::from("meadow"), SimTime::from_secs(600))].into_iter().collect(),
        });

        let saved = memory.save().unwrap();
        assert!(saved.contains(r#""family":"territorial""#));
        assert!(saved.contains(r#""sentry":"deer_03""#));

        let loaded = BehaviorMemory::load(&saved).unwrap();
        assert_eq!(loaded.family(), MemoryFamily::Territorial);
        assert!(loaded.shared().is_known_water(&PlaceId::from("pond")));
        assert!(loaded.in_territory(&PlaceId::from("meadow")));
        // References come back unresolved
        assert_eq!(
            loaded.sentry(),
            &AgentRef::Unresolved("deer_03".to_string())
        );
    }

    #[test]
    fn test_agent_ref_resolves_once() {
        let mut world = SandboxWorld::new();
        world.add_place("meadow");
        world.add_agent(crate::sandbox::SandboxAgent::new("deer_01", "deer", "meadow"));

        let mut present = AgentRef::Unresolved("deer_01".to_string());
        assert_eq!(present.resolve(&world), Some(&AgentId::from("deer_01")));
        assert!(matches!(present, AgentRef::Resolved(_)));

        let mut gone = AgentRef::Unresolved("deer_99".to_string());
        assert_eq!(gone.resolve(&world), None);
        assert_eq!(gone, AgentRef::Missing);

        // A later arrival does not revive a reference already found missing
        world.add_agent(crate::sandbox::SandboxAgent::new("deer_99", "deer", "meadow"));
        assert_eq!(gone.resolve(&world), None);
    }

    #[test]
    fn test_missing_sentry_serializes_as_null() {
        let memory = BehaviorMemory::Herd(HerdMemory::default());
        let saved = memory.save().unwrap();
        assert!(saved.contains(r#""sentry":null"#));

        let minimal = BehaviorMemory::load(r#"{"family":"herd"}"#).unwrap();
        assert_eq!(minimal.sentry(), &AgentRef::Missing);
        assert!(minimal.territory().is_none());
    }

    #[test]
    fn test_predator_dominance_credit() {
        let mut pack = PredatorMemory::new(vec![KindId::from("human")]);
        pack.engaged_kinds.insert(KindId::from("bear"));

        assert_eq!(pack.credit_engaged(), 1);
        pack.engaged_kinds.insert(KindId::from("bear"));
        pack.credit_engaged();

        assert_eq!(pack.dominance_over(&KindId::from("bear")), 2);
        assert_eq!(pack.dominance_over(&KindId::from("human")), 0);
        assert!(pack.engaged_kinds.is_empty());
    }

    #[test]
    fn test_adult_death_recorded_for_every_family() {
        for mut memory in [
            BehaviorMemory::Herd(HerdMemory::default()),
            BehaviorMemory::Territorial(TerritorialMemory::default()),
            BehaviorMemory::Predator(PredatorMemory::default()),
        ] {
            memory.record_adult_death(SimTime::from_secs(77));
            assert_eq!(memory.last_adult_death(), Some(SimTime::from_secs(77)));
        }
    }
}
