//! Tick Driver
//!
//! The [`Engine`] owns every group, the policy registry, the configuration
//! and the one random generator all decisions draw from. Each call to
//! [`Engine::tick`] runs the fast handler of every group when its interval
//! has elapsed, in group id order, then the slow handlers when theirs has.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::path::Path;

use herd_types::{AgentId, GroupId, GroupSnapshot, SimTime};

use crate::config::EngineConfig;
use crate::context::TickContext;
use crate::error::{EngineError, Result};
use crate::group::GroupRecord;
use crate::persistence::restore_group;
use crate::policy::PolicyRegistry;
use crate::tick::{fast_tick, slow_tick, HandlerOutcome};
use crate::world::GroupWorld;

/// Which handlers ran on a tick and what they changed.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub now: SimTime,
    pub fast_ran: bool,
    pub slow_ran: bool,
    /// Groups whose alertness or action moved, in run order
    pub changes: Vec<(GroupId, HandlerOutcome)>,
}

impl TickReport {
    fn idle(now: SimTime) -> Self {
        Self {
            now,
            fast_ran: false,
            slow_ran: false,
            changes: Vec::new(),
        }
    }

    fn record(&mut self, group: GroupId, outcome: HandlerOutcome) {
        if !outcome.is_quiet() {
            self.changes.push((group, outcome));
        }
    }
}

/// The group AI engine.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    policies: PolicyRegistry,
    groups: BTreeMap<GroupId, GroupRecord>,
    rng: SmallRng,
    last_fast: Option<SimTime>,
    last_slow: Option<SimTime>,
}

impl Engine {
    /// Creates an engine seeded from the configuration.
    pub fn new(config: EngineConfig) -> Self {
        let seed = config.engine.seed;
        Self::with_seed(config, seed)
    }

    /// Creates an engine with an explicit seed, overriding the configured one.
    pub fn with_seed(config: EngineConfig, seed: u64) -> Self {
        let policies = PolicyRegistry::from_config(&config);
        tracing::debug!(seed, policies = policies.len(), "engine created");
        Self {
            config,
            policies,
            groups: BTreeMap::new(),
            rng: SmallRng::seed_from_u64(seed),
            last_fast: None,
            last_slow: None,
        }
    }

    /// Creates an engine from a TOML configuration file.
    pub fn from_config_file(path: &Path) -> Result<Self> {
        let config = EngineConfig::from_file(path)?;
        Ok(Self::new(config))
    }

    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn policies(&self) -> &PolicyRegistry {
        &self.policies
    }

    /// Forms a new group under a configured policy.
    pub fn create_group(
        &mut self,
        policy: &str,
        members: impl IntoIterator<Item = AgentId>,
    ) -> Result<GroupId> {
        let policy = self.policies.get(policy)?;
        let id = GroupId::from_random_bytes(self.rng.gen());
        let group = GroupRecord::new(policy, members).with_id(id);
        tracing::info!(group = %id, policy = %group.policy().name, members = group.len(), "group created");
        self.groups.insert(id, group);
        Ok(id)
    }

    /// Restores a group from a snapshot. Its member references resolve on its first tick.
    pub fn load_group(&mut self, snapshot: GroupSnapshot) -> Result<GroupId> {
        let group = restore_group(snapshot, &self.policies)?;
        let id = group.id;
        tracing::info!(group = %id, policy = %group.policy().name, "group loaded");
        self.groups.insert(id, group);
        Ok(id)
    }

    pub fn disband_group(&mut self, id: GroupId) -> Result<GroupRecord> {
        let group = self.groups.remove(&id).ok_or(EngineError::UnknownGroup(id))?;
        tracing::info!(group = %id, "group disbanded");
        Ok(group)
    }

    pub fn group(&self, id: GroupId) -> Option<&GroupRecord> {
        self.groups.get(&id)
    }

    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut GroupRecord> {
        self.groups.get_mut(&id)
    }

    pub fn groups(&self) -> impl Iterator<Item = &GroupRecord> {
        self.groups.values()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Snapshots every group that changed since the last drain and clears their dirty flags.
    pub fn drain_dirty(&mut self, now: SimTime) -> Result<Vec<GroupSnapshot>> {
        let mut snapshots = Vec::new();
        for group in self.groups.values_mut().filter(|g| g.is_dirty()) {
            snapshots.push(group.snapshot(now)?);
            group.clear_dirty();
        }
        Ok(snapshots)
    }

    /// Snapshots every group regardless of dirty state.
    pub fn snapshot_all(&self, now: SimTime) -> Result<Vec<GroupSnapshot>> {
        self.groups.values().map(|group| group.snapshot(now)).collect()
    }

    fn is_due(last: Option<SimTime>, interval_secs: u64, now: SimTime) -> bool {
        last.map_or(true, |last| now.secs_since(last) >= interval_secs)
    }

    /// Runs whichever handlers are due at the world's current time.
    pub fn tick(&mut self, world: &mut dyn GroupWorld) -> Result<TickReport> {
        let now = world.now();
        let fast_due = Self::is_due(self.last_fast, self.config.ticks.fast_interval_secs, now);
        let slow_due = Self::is_due(self.last_slow, self.config.ticks.slow_interval_secs, now);
        let mut report = TickReport::idle(now);
        if !fast_due && !slow_due {
            return Ok(report);
        }

        let config = &self.config;
        let rng = &mut self.rng;
        let groups = &mut self.groups;

        if fast_due {
            for (id, group) in groups.iter_mut() {
                let mut ctx = TickContext::new(&mut *world, rng, config);
                let outcome = fast_tick(group, &mut ctx)?;
                report.record(*id, outcome);
            }
            report.fast_ran = true;
        }

        if slow_due {
            for (id, group) in groups.iter_mut() {
                let mut ctx = TickContext::new(&mut *world, rng, config);
                let outcome = slow_tick(group, &mut ctx)?;
                report.record(*id, outcome);
            }
            report.slow_ran = true;
        }

        if fast_due {
            self.last_fast = Some(now);
        }
        if slow_due {
            self.last_slow = Some(now);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::{SandboxAgent, SandboxWorld};
    use herd_types::Role;

    fn deer_world() -> SandboxWorld {
        let mut world = SandboxWorld::new().at(SimTime::from_secs(12 * 3600));
        world.add_agent(SandboxAgent::new("deer_01", "deer", "meadow"));
        world.add_agent(SandboxAgent::new("deer_02", "deer", "meadow"));
        world
    }

    fn deer() -> Vec<AgentId> {
        vec![AgentId::from("deer_01"), AgentId::from("deer_02")]
    }

    #[test]
    fn test_create_group_needs_known_policy() {
        let mut engine = Engine::with_defaults();
        assert!(engine.create_group("plains_herd", deer()).is_ok());
        assert!(matches!(
            engine.create_group("griffins", deer()),
            Err(EngineError::UnknownPolicy(_))
        ));
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_group_ids_follow_seed() {
        let mut first = Engine::with_seed(EngineConfig::default(), 9);
        let mut second = Engine::with_seed(EngineConfig::default(), 9);
        assert_eq!(
            first.create_group("plains_herd", deer()).unwrap(),
            second.create_group("plains_herd", deer()).unwrap()
        );
    }

    #[test]
    fn test_handler_cadence() {
        let mut world = deer_world();
        let mut engine = Engine::with_defaults();
        engine.create_group("plains_herd", deer()).unwrap();

        let report = engine.tick(&mut world).unwrap();
        assert!(report.fast_ran && report.slow_ran);

        world.advance(5);
        let report = engine.tick(&mut world).unwrap();
        assert!(!report.fast_ran && !report.slow_ran);

        world.advance(5);
        let report = engine.tick(&mut world).unwrap();
        assert!(report.fast_ran && !report.slow_ran);

        world.advance(50);
        let report = engine.tick(&mut world).unwrap();
        assert!(report.fast_ran && report.slow_ran);
    }

    #[test]
    fn test_tick_keeps_group_invariants() {
        let mut world = deer_world();
        let mut engine = Engine::with_defaults();
        let id = engine.create_group("plains_herd", deer()).unwrap();

        for _ in 0..30 {
            engine.tick(&mut world).unwrap();
            world.advance(10);
        }

        let group = engine.group(id).unwrap();
        assert_eq!(group.roles.keys().collect::<Vec<_>>(), group.members.iter().collect::<Vec<_>>());
        assert_eq!(group.members_with_role(Role::Leader).len(), 1);
    }

    #[test]
    fn test_drain_dirty_clears_flags() {
        let mut world = deer_world();
        let mut engine = Engine::with_defaults();
        let id = engine.create_group("plains_herd", deer()).unwrap();
        engine.tick(&mut world).unwrap();

        let drained = engine.drain_dirty(world.now()).unwrap();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].group_id, id);
        assert!(!engine.group(id).unwrap().is_dirty());
        assert!(engine.drain_dirty(world.now()).unwrap().is_empty());
    }

    #[test]
    fn test_load_and_disband() {
        let mut engine = Engine::with_defaults();
        let id = engine.create_group("plains_herd", deer()).unwrap();
        let snapshot = engine.group(id).unwrap().snapshot(SimTime::from_secs(0)).unwrap();

        let record = engine.disband_group(id).unwrap();
        assert_eq!(record.id, id);
        assert!(matches!(engine.disband_group(id), Err(EngineError::UnknownGroup(_))));

        assert_eq!(engine.load_group(snapshot).unwrap(), id);
        assert!(!engine.group(id).unwrap().is_resolved());
    }
}
