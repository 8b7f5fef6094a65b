//! Sandbox World
//!
//! A small in-memory [`GroupWorld`] for tests and demos. Places form a
//! directed graph of named exits, routes are plain breadth-first searches,
//! visibility is "same place", and combat is a pair of target links.
//!
//! # Example
//!
//! ```
//! use herd_core::sandbox::{SandboxAgent, SandboxWorld};
//! use herd_core::world::GroupWorld;
//! use herd_types::{AgentId, PlaceId};
//!
//! let mut world = SandboxWorld::new();
//! world.add_place("meadow");
//! world.add_place("pond");
//! world.link("meadow", "south", "pond", "north");
//! world.add_agent(SandboxAgent::new("deer_01", "deer", "meadow"));
//!
//! let path = world
//!     .find_path(&PlaceId::from("meadow"), &PlaceId::from("pond"), 5)
//!     .unwrap();
//! assert_eq!(path.len(), 1);
//! assert!(world.move_through(&AgentId::from("deer_01"), &path[0]));
//! ```

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use herd_types::{AgentId, KindId, Layer, PlaceId, Placement, SimTime};

use crate::world::{
    AgeCategory, AgentStatus, Capabilities, Consumable, ConsumableKind, Exit, GroupWorld,
    LayerShift, RestState, Sex, Stance,
};

/// An agent living in the sandbox.
#[derive(Debug, Clone, PartialEq)]
pub struct SandboxAgent {
    pub id: AgentId,
    pub kind: KindId,
    pub placement: Placement,
    pub age: AgeCategory,
    pub sex: Sex,
    pub health: f32,
    pub alive: bool,
    pub status: AgentStatus,
    pub capabilities: Capabilities,
    pub thirsty: bool,
    pub hungry: bool,
    pub rest: RestState,
    pub path: VecDeque<Exit>,
    pub combat_target: Option<AgentId>,
    pub stance: Stance,
}

impl SandboxAgent {
    /// A healthy, awake adult male standing on the ground.
    pub fn new(id: impl Into<String>, kind: impl Into<String>, place: impl Into<String>) -> Self {
        Self {
            id: AgentId::new(id),
            kind: KindId::new(kind),
            placement: Placement::ground(PlaceId::new(place)),
            age: AgeCategory::Adult,
            sex: Sex::Male,
            health: 1.0,
            alive: true,
            status: AgentStatus::idle(),
            capabilities: Capabilities::default(),
            thirsty: false,
            hungry: false,
            rest: RestState::Awake,
            path: VecDeque::new(),
            combat_target: None,
            stance: Stance::Normal,
        }
    }

    pub fn with_age(mut self, age: AgeCategory) -> Self {
        self.age = age;
        self
    }

    pub fn with_sex(mut self, sex: Sex) -> Self {
        self.sex = sex;
        self
    }

    pub fn with_health(mut self, health: f32) -> Self {
        self.health = health;
        self
    }

    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.placement.layer = layer;
        self
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_status(mut self, status: AgentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn thirsty(mut self) -> Self {
        self.thirsty = true;
        self
    }

    pub fn hungry(mut self) -> Self {
        self.hungry = true;
        self
    }
}

/// An emote emitted into the sandbox.
#[derive(Debug, Clone, PartialEq)]
pub struct EmoteRecord {
    pub at: Placement,
    pub actor: AgentId,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
struct SandboxPlace {
    exits: Vec<Exit>,
    consumables: BTreeMap<Layer, Vec<Consumable>>,
}

/// In-memory world.
#[derive(Debug, Clone, Default)]
pub struct SandboxWorld {
    now: SimTime,
    places: BTreeMap<PlaceId, SandboxPlace>,
    agents: BTreeMap<AgentId, SandboxAgent>,
    emotes: Vec<EmoteRecord>,
}

impl SandboxWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, now: SimTime) -> Self {
        self.now = now;
        self
    }

    pub fn set_now(&mut self, now: SimTime) {
        self.now = now;
    }

    /// Moves the clock forward.
    pub fn advance(&mut self, secs: u64) {
        self.now = self.now.plus_secs(secs);
    }

    pub fn add_place(&mut self, place: impl Into<String>) {
        self.places.entry(PlaceId::new(place)).or_default();
    }

    /// Adds a one-way exit.
    pub fn connect(&mut self, from: impl Into<String>, name: impl Into<String>, to: impl Into<String>) {
        let to = PlaceId::new(to);
        self.places.entry(to.clone()).or_default();
        self.places
            .entry(PlaceId::new(from))
            .or_default()
            .exits
            .push(Exit::new(name, to));
    }

    /// Adds exits in both directions.
    pub fn link(
        &mut self,
        a: impl Into<String>,
        a_to_b: impl Into<String>,
        b: impl Into<String>,
        b_to_a: impl Into<String>,
    ) {
        let (a, b) = (a.into(), b.into());
        self.connect(a.clone(), a_to_b, b.clone());
        self.connect(b, b_to_a, a);
    }

    pub fn add_consumable(&mut self, place: impl Into<String>, layer: Layer, consumable: Consumable) {
        self.places
            .entry(PlaceId::new(place))
            .or_default()
            .consumables
            .entry(layer)
            .or_default()
            .push(consumable);
    }

    pub fn add_agent(&mut self, agent: SandboxAgent) {
        self.places.entry(agent.placement.place.clone()).or_default();
        self.agents.insert(agent.id.clone(), agent);
    }

    pub fn agent(&self, id: &str) -> Option<&SandboxAgent> {
        self.agents.get(&AgentId::from(id))
    }

    pub fn agent_mut(&mut self, id: &str) -> Option<&mut SandboxAgent> {
        self.agents.get_mut(&AgentId::from(id))
    }

    /// Places an agent directly, dropping any path it was following.
    pub fn teleport(&mut self, id: &str, placement: Placement) {
        if let Some(agent) = self.agent_mut(id) {
            agent.placement = placement;
            agent.path.clear();
        }
    }

    pub fn kill(&mut self, id: &str) {
        let target = AgentId::from(id);
        if let Some(agent) = self.agents.get_mut(&target) {
            agent.alive = false;
            agent.combat_target = None;
        }
        self.release_opponents(&target);
    }

    /// Takes an agent out of the world entirely.
    pub fn remove_agent(&mut self, id: &str) -> Option<SandboxAgent> {
        let target = AgentId::from(id);
        self.release_opponents(&target);
        self.agents.remove(&target)
    }

    pub fn emotes(&self) -> &[EmoteRecord] {
        &self.emotes
    }

    pub fn clear_emotes(&mut self) {
        self.emotes.clear();
    }

    pub fn agent_ids(&self) -> impl Iterator<Item = &AgentId> {
        self.agents.keys()
    }

    fn release_opponents(&mut self, target: &AgentId) {
        for other in self.agents.values_mut() {
            if other.combat_target.as_ref() == Some(target) {
                other.combat_target = None;
            }
        }
    }

    /// Breadth-first search returning the predecessor exit of every reached place.
    fn search(&self, from: &PlaceId, max_hops: u32) -> BTreeMap<PlaceId, (u32, Option<(PlaceId, Exit)>)> {
        let mut reached = BTreeMap::new();
        if !self.places.contains_key(from) {
            return reached;
        }
        reached.insert(from.clone(), (0, None));

        let mut frontier = VecDeque::from([from.clone()]);
        while let Some(place) = frontier.pop_front() {
            let depth = reached[&place].0;
            if depth >= max_hops {
                continue;
            }
            for exit in self.exits(&place) {
                if reached.contains_key(&exit.destination) {
                    continue;
                }
                reached.insert(
                    exit.destination.clone(),
                    (depth + 1, Some((place.clone(), exit.clone()))),
                );
                frontier.push_back(exit.destination.clone());
            }
        }
        reached
    }
}

impl GroupWorld for SandboxWorld {
    fn now(&self) -> SimTime {
        self.now
    }

    fn resolve_agent(&self, raw_id: &str) -> Option<AgentId> {
        let id = AgentId::from(raw_id);
        self.agents.contains_key(&id).then_some(id)
    }

    fn is_alive(&self, agent: &AgentId) -> bool {
        self.agents.get(agent).is_some_and(|a| a.alive)
    }

    fn age_category(&self, agent: &AgentId) -> AgeCategory {
        self.agents.get(agent).map_or(AgeCategory::Adult, |a| a.age)
    }

    fn sex(&self, agent: &AgentId) -> Sex {
        self.agents.get(agent).map_or(Sex::Neuter, |a| a.sex)
    }

    fn kind_of(&self, agent: &AgentId) -> KindId {
        self.agents
            .get(agent)
            .map_or_else(|| KindId::new("unknown"), |a| a.kind.clone())
    }

    fn health_fraction(&self, agent: &AgentId) -> f32 {
        self.agents.get(agent).map_or(0.0, |a| a.health)
    }

    fn status(&self, agent: &AgentId) -> AgentStatus {
        match self.agents.get(agent) {
            Some(a) => AgentStatus {
                disabled: a.status.disabled || !a.alive,
                in_melee: a.status.in_melee || a.combat_target.is_some(),
                ..a.status
            },
            None => AgentStatus {
                disabled: true,
                ..AgentStatus::idle()
            },
        }
    }

    fn capabilities(&self, agent: &AgentId) -> Capabilities {
        self.agents.get(agent).map_or_else(Capabilities::default, |a| a.capabilities)
    }

    fn is_thirsty(&self, agent: &AgentId) -> bool {
        self.agents.get(agent).is_some_and(|a| a.thirsty)
    }

    fn is_hungry(&self, agent: &AgentId) -> bool {
        self.agents.get(agent).is_some_and(|a| a.hungry)
    }

    fn rest_state(&self, agent: &AgentId) -> RestState {
        self.agents.get(agent).map_or(RestState::Awake, |a| a.rest)
    }

    fn placement(&self, agent: &AgentId) -> Option<Placement> {
        self.agents
            .get(agent)
            .filter(|a| a.alive)
            .map(|a| a.placement.clone())
    }

    fn exits(&self, place: &PlaceId) -> Vec<Exit> {
        self.places
            .get(place)
            .map(|p| p.exits.clone())
            .unwrap_or_default()
    }

    fn find_path(&self, from: &PlaceId, to: &PlaceId, max_hops: u32) -> Option<Vec<Exit>> {
        let reached = self.search(from, max_hops);
        reached.get(to)?;

        let mut path = Vec::new();
        let mut cursor = to.clone();
        while let Some((_, Some((previous, exit)))) = reached.get(&cursor) {
            path.push(exit.clone());
            cursor = previous.clone();
        }
        path.reverse();
        Some(path)
    }

    fn hop_distance(&self, from: &PlaceId, to: &PlaceId, max_hops: u32) -> Option<u32> {
        self.search(from, max_hops).get(to).map(|(depth, _)| *depth)
    }

    fn places_within(&self, origin: &PlaceId, max_hops: u32) -> Vec<(PlaceId, u32)> {
        self.search(origin, max_hops)
            .into_iter()
            .map(|(place, (depth, _))| (place, depth))
            .collect()
    }

    fn has_path(&self, agent: &AgentId) -> bool {
        self.agents.get(agent).is_some_and(|a| !a.path.is_empty())
    }

    fn set_path(&mut self, agent: &AgentId, path: Vec<Exit>) {
        if let Some(a) = self.agents.get_mut(agent) {
            a.path = path.into();
        }
    }

    fn advance_path(&mut self, agent: &AgentId) -> bool {
        let Some(step) = self.agents.get_mut(agent).and_then(|a| a.path.pop_front()) else {
            return false;
        };
        let moved = self.move_through(agent, &step);
        if !moved {
            if let Some(a) = self.agents.get_mut(agent) {
                a.path.clear();
            }
        }
        moved
    }

    fn move_through(&mut self, agent: &AgentId, exit: &Exit) -> bool {
        let Some(current) = self.agents.get(agent).filter(|a| a.alive).map(|a| a.placement.place.clone()) else {
            return false;
        };
        if !self.exits(&current).contains(exit) {
            return false;
        }

        if let Some(a) = self.agents.get_mut(agent) {
            a.placement = Placement::ground(exit.destination.clone());
            a.combat_target = None;
        }
        self.release_opponents(agent);
        true
    }

    fn shift_layer(&mut self, agent: &AgentId, shift: LayerShift) -> bool {
        let Some(a) = self.agents.get_mut(agent) else {
            return false;
        };
        let layer = a.placement.layer;
        let caps = a.capabilities;
        let next = match shift {
            LayerShift::Climb if caps.can_climb && layer >= Layer::GroundLevel && layer < Layer::HighInTrees => {
                layer.above()
            }
            LayerShift::ClimbDown if layer.is_in_trees() => layer.below(),
            LayerShift::SwimUp if caps.can_swim && layer.is_underwater() => layer.above(),
            LayerShift::Dive if caps.can_swim && layer <= Layer::GroundLevel => layer.below(),
            LayerShift::Fly if caps.can_fly && layer < Layer::InAir => Some(Layer::InAir),
            LayerShift::Land if caps.can_fly && layer == Layer::InAir => Some(Layer::GroundLevel),
            _ => None,
        };
        match next {
            Some(layer) => {
                a.placement.layer = layer;
                true
            }
            None => false,
        }
    }

    fn visible_agents(&self, observer: &AgentId) -> Vec<AgentId> {
        let Some(place) = self.placement(observer).map(|p| p.place) else {
            return Vec::new();
        };
        self.agents
            .values()
            .filter(|a| a.alive && &a.id != observer && a.placement.place == place)
            .map(|a| a.id.clone())
            .collect()
    }

    fn consumables_at(&self, placement: &Placement) -> Vec<Consumable> {
        self.places
            .get(&placement.place)
            .and_then(|p| p.consumables.get(&placement.layer))
            .cloned()
            .unwrap_or_default()
    }

    fn drink(&mut self, agent: &AgentId, source: &Consumable) -> bool {
        if !source.quenches_thirst {
            return false;
        }
        match self.agents.get_mut(agent) {
            Some(a) => {
                a.thirsty = false;
                true
            }
            None => false,
        }
    }

    fn eat(&mut self, agent: &AgentId, food: &Consumable) -> bool {
        let Some(placement) = self.agents.get(agent).map(|a| a.placement.clone()) else {
            return false;
        };
        if let Some(a) = self.agents.get_mut(agent) {
            if food.nourishes {
                a.hungry = false;
            }
            if food.quenches_thirst {
                a.thirsty = false;
            }
        }
        if food.kind != ConsumableKind::LiquidSource {
            if let Some(items) = self
                .places
                .get_mut(&placement.place)
                .and_then(|p| p.consumables.get_mut(&placement.layer))
            {
                if let Some(index) = items.iter().position(|item| item.id == food.id) {
                    items.remove(index);
                }
            }
        }
        true
    }

    fn settle(&mut self, agent: &AgentId, state: RestState) {
        if let Some(a) = self.agents.get_mut(agent) {
            a.rest = state;
        }
    }

    fn rouse(&mut self, agent: &AgentId) {
        if let Some(a) = self.agents.get_mut(agent) {
            a.rest = RestState::Awake;
        }
    }

    fn in_combat(&self, agent: &AgentId) -> bool {
        self.agents.get(agent).is_some_and(|a| a.combat_target.is_some())
    }

    fn combat_target(&self, agent: &AgentId) -> Option<AgentId> {
        self.agents.get(agent).and_then(|a| a.combat_target.clone())
    }

    fn can_engage(&self, agent: &AgentId, target: &AgentId) -> bool {
        if agent == target {
            return false;
        }
        match (self.placement(agent), self.placement(target)) {
            (Some(a), Some(b)) => a.place == b.place,
            _ => false,
        }
    }

    fn engage(&mut self, agent: &AgentId, target: &AgentId) -> bool {
        if !self.can_engage(agent, target) {
            return false;
        }
        if let Some(a) = self.agents.get_mut(agent) {
            a.combat_target = Some(target.clone());
        }
        if let Some(t) = self.agents.get_mut(target) {
            if t.combat_target.is_none() {
                t.combat_target = Some(agent.clone());
            }
        }
        true
    }

    fn stance(&self, agent: &AgentId) -> Stance {
        self.agents.get(agent).map_or(Stance::Normal, |a| a.stance)
    }

    fn set_stance(&mut self, agent: &AgentId, stance: Stance) {
        if let Some(a) = self.agents.get_mut(agent) {
            a.stance = stance;
        }
    }

    fn emote(&mut self, at: &Placement, actor: &AgentId, text: &str) {
        self.emotes.push(EmoteRecord {
            at: at.clone(),
            actor: actor.clone(),
            text: text.to_string(),
        });
    }
}
