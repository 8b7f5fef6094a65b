//! World Interface
//!
//! The engine never owns agents, places or items. Everything it needs from
//! the surrounding simulation goes through [`GroupWorld`]: movement and
//! pathfinding, perception, consumption, posture, combat engagement and
//! output. The engine calls these synchronously from inside a tick, and any
//! mutation is visible to groups processed later in the same tick.

use serde::{Deserialize, Serialize};

use herd_types::{AgentId, KindId, PlaceId, Placement, SimTime};

/// Life stage of an agent, as reported by the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeCategory {
    Infant,
    Child,
    Youth,
    Adult,
    Elder,
}

/// Biological sex, used for leadership eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
    Neuter,
}

/// Rest posture of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RestState {
    #[default]
    Awake,
    Resting,
    Sleeping,
}

/// Combat stance the engine may request for an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    #[default]
    Normal,
    /// Try to break away from any fight
    Flee,
}

/// Conditions that make an agent unavailable to group handlers this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AgentStatus {
    /// Unconscious, paralysed or otherwise unable to act
    pub disabled: bool,
    /// Already mid-movement
    pub moving: bool,
    /// Already in melee
    pub in_melee: bool,
    /// Under an effect that blocks new actions
    pub blocked: bool,
}

impl AgentStatus {
    /// An agent free to act.
    pub const fn idle() -> Self {
        Self {
            disabled: false,
            moving: false,
            in_melee: false,
            blocked: false,
        }
    }

    /// The skip predicate: busy agents are deferred to a later tick.
    pub fn is_busy(&self) -> bool {
        self.disabled || self.moving || self.in_melee || self.blocked
    }
}

/// Locomotion capabilities of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub can_move: bool,
    pub can_climb: bool,
    pub can_swim: bool,
    pub can_fly: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            can_move: true,
            can_climb: false,
            can_swim: false,
            can_fly: false,
        }
    }
}

/// A one-step vertical transition within the current place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerShift {
    /// Up into or through the trees
    Climb,
    /// Down out of the trees
    ClimbDown,
    /// Up toward the surface
    SwimUp,
    /// Down beneath the surface
    Dive,
    /// Up into the air
    Fly,
    /// Down out of the air
    Land,
}

/// A way out of a place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Exit {
    /// Direction or keyword naming the exit ("north", "up the bank")
    pub name: String,
    pub destination: PlaceId,
}

impl Exit {
    pub fn new(name: impl Into<String>, destination: impl Into<PlaceId>) -> Self {
        Self {
            name: name.into(),
            destination: destination.into(),
        }
    }
}

/// How much handling a consumable needs, cheapest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumableKind {
    /// Standing or running water drunk in place
    LiquidSource,
    /// Liquid held in a container
    LiquidContainer,
    /// Plain edible item or forage
    Edible,
    /// A whole corpse
    Corpse,
    /// A severed body part
    SeveredPart,
}

impl ConsumableKind {
    /// Only predators eat these.
    pub fn is_carrion(self) -> bool {
        matches!(self, ConsumableKind::Corpse | ConsumableKind::SeveredPart)
    }
}

/// Something present at a place that can be eaten or drunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consumable {
    pub id: String,
    pub kind: ConsumableKind,
    /// Satisfies hunger
    pub nourishes: bool,
    /// Satisfies thirst
    pub quenches_thirst: bool,
}

impl Consumable {
    /// A water source such as a pond or stream.
    pub fn water(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ConsumableKind::LiquidSource,
            nourishes: false,
            quenches_thirst: true,
        }
    }

    /// A plain food item.
    pub fn food(id: impl Into<String>, kind: ConsumableKind) -> Self {
        Self {
            id: id.into(),
            kind,
            nourishes: true,
            quenches_thirst: false,
        }
    }

    pub fn quenching(mut self) -> Self {
        self.quenches_thirst = true;
        self
    }
}

/// Everything the engine consumes from the simulated world.
pub trait GroupWorld {
    /// Current simulated time.
    fn now(&self) -> SimTime;

    /// Looks up a persisted agent identifier in the live world registry.
    fn resolve_agent(&self, raw_id: &str) -> Option<AgentId>;

    fn is_alive(&self, agent: &AgentId) -> bool;

    fn age_category(&self, agent: &AgentId) -> AgeCategory;

    fn sex(&self, agent: &AgentId) -> Sex;

    fn kind_of(&self, agent: &AgentId) -> KindId;

    /// Remaining health between 0.0 and 1.0.
    fn health_fraction(&self, agent: &AgentId) -> f32;

    fn status(&self, agent: &AgentId) -> AgentStatus;

    fn capabilities(&self, agent: &AgentId) -> Capabilities;

    fn is_thirsty(&self, agent: &AgentId) -> bool;

    fn is_hungry(&self, agent: &AgentId) -> bool;

    fn rest_state(&self, agent: &AgentId) -> RestState;

    /// Current place and layer, or `None` if the agent is not in the world.
    fn placement(&self, agent: &AgentId) -> Option<Placement>;

    fn exits(&self, place: &PlaceId) -> Vec<Exit>;

    /// A route from `from` to `to` avoiding closed doors, at most `max_hops` long.
    fn find_path(&self, from: &PlaceId, to: &PlaceId, max_hops: u32) -> Option<Vec<Exit>>;

    /// Number of exits between two places, if within `max_hops`.
    fn hop_distance(&self, from: &PlaceId, to: &PlaceId, max_hops: u32) -> Option<u32>;

    /// Every place reachable from `origin` within `max_hops`, with its distance.
    fn places_within(&self, origin: &PlaceId, max_hops: u32) -> Vec<(PlaceId, u32)>;

    /// Whether the agent has a path-following continuation attached.
    fn has_path(&self, agent: &AgentId) -> bool;

    /// Attaches a path-following continuation, replacing any existing one.
    fn set_path(&mut self, agent: &AgentId, path: Vec<Exit>);

    /// Takes the next step of the attached path. Returns false when there is
    /// nothing left to follow or the step failed.
    fn advance_path(&mut self, agent: &AgentId) -> bool;

    fn move_through(&mut self, agent: &AgentId, exit: &Exit) -> bool;

    fn shift_layer(&mut self, agent: &AgentId, shift: LayerShift) -> bool;

    /// Agents the observer can currently see, excluding itself.
    fn visible_agents(&self, observer: &AgentId) -> Vec<AgentId>;

    fn consumables_at(&self, placement: &Placement) -> Vec<Consumable>;

    fn drink(&mut self, agent: &AgentId, source: &Consumable) -> bool;

    fn eat(&mut self, agent: &AgentId, food: &Consumable) -> bool;

    /// Lowers the agent toward its kind's minimum rest or sleep posture.
    fn settle(&mut self, agent: &AgentId, state: RestState);

    fn rouse(&mut self, agent: &AgentId);

    fn in_combat(&self, agent: &AgentId) -> bool;

    fn combat_target(&self, agent: &AgentId) -> Option<AgentId>;

    fn can_engage(&self, agent: &AgentId, target: &AgentId) -> bool;

    fn engage(&mut self, agent: &AgentId, target: &AgentId) -> bool;

    fn stance(&self, agent: &AgentId) -> Stance;

    fn set_stance(&mut self, agent: &AgentId, stance: Stance);

    /// Emits an emote visible at a placement. `$0` in the text stands for the actor.
    fn emote(&mut self, at: &Placement, actor: &AgentId, text: &str);
}
