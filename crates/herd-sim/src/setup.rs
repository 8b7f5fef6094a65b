//! Valley Setup
//!
//! Builds the sandbox valley the demo runs in: a deer herd grazing the
//! meadows, a wolf family denned in the woods, and a hunter walking a fixed
//! round through the valley.

use herd_core::sandbox::{SandboxAgent, SandboxWorld};
use herd_core::{AgeCategory, Consumable, ConsumableKind, Sex};
use herd_types::{AgentId, Layer, Placement, SimTime};

/// Places the hunter visits, in order.
pub const HUNTER_ROUND: [&str; 5] = ["ford", "lower_meadow", "upper_meadow", "birch_wood", "ford"];

pub const HUNTER: &str = "hunter_01";

/// Create the valley map with water, forage and carrion.
pub fn create_valley(start: SimTime) -> SandboxWorld {
    let mut world = SandboxWorld::new().at(start);

    world.link("lower_meadow", "north", "upper_meadow", "south");
    world.link("lower_meadow", "east", "pond", "west");
    world.link("lower_meadow", "south", "ford", "north");
    world.link("upper_meadow", "east", "birch_wood", "west");
    world.link("birch_wood", "north", "pine_wood", "south");
    world.link("pine_wood", "east", "den", "west");
    world.link("pine_wood", "north", "ridge", "south");
    world.link("ford", "east", "river_bank", "west");

    world.add_consumable("pond", Layer::GroundLevel, Consumable::water("pond"));
    world.add_consumable("ford", Layer::GroundLevel, Consumable::water("river"));
    world.add_consumable(
        "upper_meadow",
        Layer::GroundLevel,
        Consumable::food("clover", ConsumableKind::Edible),
    );
    world.add_consumable(
        "lower_meadow",
        Layer::GroundLevel,
        Consumable::food("grass", ConsumableKind::Edible),
    );
    world.add_consumable(
        "ridge",
        Layer::GroundLevel,
        Consumable::food("elk_carcass", ConsumableKind::Corpse),
    );

    world
}

/// Spawn the deer herd. Returns its members.
pub fn spawn_deer(world: &mut SandboxWorld) -> Vec<AgentId> {
    let herd = [
        SandboxAgent::new("stag_01", "deer", "upper_meadow"),
        SandboxAgent::new("doe_01", "deer", "upper_meadow").with_sex(Sex::Female),
        SandboxAgent::new("doe_02", "deer", "upper_meadow").with_sex(Sex::Female).thirsty(),
        SandboxAgent::new("doe_03", "deer", "lower_meadow").with_sex(Sex::Female),
        SandboxAgent::new("fawn_01", "deer", "upper_meadow").with_age(AgeCategory::Child),
        SandboxAgent::new("old_stag", "deer", "upper_meadow")
            .with_age(AgeCategory::Elder)
            .with_health(0.6),
    ];
    spawn_all(world, herd)
}

/// Spawn the wolf family. Returns its members.
pub fn spawn_wolves(world: &mut SandboxWorld) -> Vec<AgentId> {
    let pack = [
        SandboxAgent::new("wolf_01", "wolf", "den").hungry(),
        SandboxAgent::new("wolf_02", "wolf", "den").with_sex(Sex::Female),
        SandboxAgent::new("pup_01", "wolf", "den").with_age(AgeCategory::Child),
    ];
    spawn_all(world, pack)
}

pub fn spawn_hunter(world: &mut SandboxWorld) {
    world.add_agent(SandboxAgent::new(HUNTER, "human", HUNTER_ROUND[0]));
}

/// Moves the hunter to the next stop of the round, once every `stop_secs`.
pub fn walk_hunter(world: &mut SandboxWorld, elapsed_secs: u64, stop_secs: u64) {
    if stop_secs == 0 || elapsed_secs % stop_secs != 0 {
        return;
    }
    let stop = (elapsed_secs / stop_secs) as usize % HUNTER_ROUND.len();
    world.teleport(HUNTER, Placement::ground(HUNTER_ROUND[stop]));
}

fn spawn_all<const N: usize>(world: &mut SandboxWorld, agents: [SandboxAgent; N]) -> Vec<AgentId> {
    agents
        .into_iter()
        .map(|agent| {
            let id = agent.id.clone();
            world.add_agent(agent);
            id
        })
        .collect()
}
