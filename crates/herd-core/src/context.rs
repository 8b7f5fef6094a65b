//! Per-tick context shared by the group handlers.

use rand::rngs::SmallRng;
use rand::Rng;

use herd_types::{AgentId, SimTime};

use crate::config::EngineConfig;
use crate::world::GroupWorld;

/// Everything a handler needs besides the group itself.
pub struct TickContext<'a> {
    pub world: &'a mut dyn GroupWorld,
    pub rng: &'a mut SmallRng,
    pub config: &'a EngineConfig,
    /// World time captured at the start of the tick
    pub now: SimTime,
}

impl<'a> TickContext<'a> {
    pub fn new(
        world: &'a mut dyn GroupWorld,
        rng: &'a mut SmallRng,
        config: &'a EngineConfig,
    ) -> Self {
        let now = world.now();
        Self {
            world,
            rng,
            config,
            now,
        }
    }

    /// True with the given probability. Values outside `0.0..=1.0` are clamped.
    pub fn chance(&mut self, probability: f64) -> bool {
        if probability <= 0.0 {
            false
        } else if probability >= 1.0 {
            true
        } else {
            self.rng.gen_bool(probability)
        }
    }

    /// Whether handlers must leave this agent alone for now.
    pub fn is_busy(&self, agent: &AgentId) -> bool {
        self.world.status(agent).is_busy()
    }

    pub fn can_move(&self, agent: &AgentId) -> bool {
        self.world.capabilities(agent).can_move
    }
}
