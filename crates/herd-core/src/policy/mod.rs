//! Behavior Policies
//!
//! A policy is a stateless strategy shared by every group of one configured
//! type. It supplies the threat and leadership predicates, builds and
//! validates the group's memory record, and makes the policy-specific calls
//! inside alertness evaluation and priority establishment.
//!
//! The set of policies is closed: [`PolicyKind`] names each variant together
//! with its tuning parameters, and [`GroupPolicy`] dispatches on it.
//!
//! # Modules
//!
//! - [`neutral`]: herds that posture when confident and otherwise avoid
//! - [`wimpy`]: herds that never stand their ground
//! - [`territorial`]: herds that defend a home range
//! - [`family`]: predator packs protecting their young

pub mod family;
pub mod neutral;
pub mod territorial;
pub mod wimpy;

pub use family::FamilyParams;
pub use neutral::NeutralParams;
pub use territorial::TerritorialParams;
pub use wimpy::WimpyParams;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use herd_types::{AgentId, Alertness, GroupAction, KindId, Role, SimTime, TimeOfDay};

use crate::alertness::ThreatAssessment;
use crate::config::EngineConfig;
use crate::context::TickContext;
use crate::error::{EngineError, Result};
use crate::group::GroupRecord;
use crate::memory::{BehaviorMemory, HerdMemory, MemoryFamily, PredatorMemory, TerritorialMemory};
use crate::world::{AgeCategory, GroupWorld, Sex};

/// Which sex may lead a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LeaderSex {
    #[default]
    Any,
    Male,
    Female,
}

impl LeaderSex {
    pub fn allows(self, sex: Sex) -> bool {
        match self {
            LeaderSex::Any => true,
            LeaderSex::Male => sex == Sex::Male,
            LeaderSex::Female => sex == Sex::Female,
        }
    }
}

/// The part of the day a group is up and about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActiveWindow {
    #[default]
    Diurnal,
    Nocturnal,
    Crepuscular,
    Always,
}

impl ActiveWindow {
    pub fn is_active(self, time_of_day: TimeOfDay) -> bool {
        match self {
            ActiveWindow::Diurnal => matches!(
                time_of_day,
                TimeOfDay::Dawn | TimeOfDay::Morning | TimeOfDay::Afternoon
            ),
            ActiveWindow::Nocturnal => matches!(time_of_day, TimeOfDay::Dusk | TimeOfDay::Night),
            ActiveWindow::Crepuscular => time_of_day.is_twilight(),
            ActiveWindow::Always => true,
        }
    }
}

/// Grazers split off outsiders; predators split off their vulnerable members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyFamily {
    Grazer,
    Predator,
}

/// The closed set of policy variants and their parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyKind {
    Neutral(NeutralParams),
    Wimpy(WimpyParams),
    Territorial(TerritorialParams),
    FamilyPredator(FamilyParams),
}

impl PolicyKind {
    pub fn label(&self) -> &'static str {
        match self {
            PolicyKind::Neutral(_) => "neutral",
            PolicyKind::Wimpy(_) => "wimpy",
            PolicyKind::Territorial(_) => "territorial",
            PolicyKind::FamilyPredator(_) => "family_predator",
        }
    }
}

/// One `[policies.<name>]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(flatten)]
    pub kind: PolicyKind,
    #[serde(default)]
    pub leader_sex: LeaderSex,
    #[serde(default)]
    pub active_window: ActiveWindow,
    /// Kinds treated as threats on sight
    #[serde(default)]
    pub untrusted_kinds: Vec<KindId>,
}

/// A configured, named policy.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupPolicy {
    pub name: String,
    pub kind: PolicyKind,
    pub leader_sex: LeaderSex,
    pub active_window: ActiveWindow,
    pub untrusted_kinds: Vec<KindId>,
}

impl GroupPolicy {
    pub fn from_config(name: impl Into<String>, config: &PolicyConfig) -> Self {
        Self {
            name: name.into(),
            kind: config.kind.clone(),
            leader_sex: config.leader_sex,
            active_window: config.active_window,
            untrusted_kinds: config.untrusted_kinds.clone(),
        }
    }

    pub fn family(&self) -> PolicyFamily {
        match self.kind {
            PolicyKind::FamilyPredator(_) => PolicyFamily::Predator,
            _ => PolicyFamily::Grazer,
        }
    }

    pub fn memory_family(&self) -> MemoryFamily {
        match self.kind {
            PolicyKind::Neutral(_) | PolicyKind::Wimpy(_) => MemoryFamily::Herd,
            PolicyKind::Territorial(_) => MemoryFamily::Territorial,
            PolicyKind::FamilyPredator(_) => MemoryFamily::Predator,
        }
    }

    /// Fresh memory for a newly formed group.
    pub fn new_memory(&self) -> BehaviorMemory {
        let untrusted = self.untrusted_kinds.clone();
        match self.memory_family() {
            MemoryFamily::Herd => BehaviorMemory::Herd(HerdMemory::new(untrusted)),
            MemoryFamily::Territorial => BehaviorMemory::Territorial(TerritorialMemory {
                herd: HerdMemory::new(untrusted),
                territory: BTreeMap::new(),
            }),
            MemoryFamily::Predator => BehaviorMemory::Predator(PredatorMemory::new(untrusted)),
        }
    }

    /// Rejects memory records this policy does not own.
    pub fn accepts_memory(&self, memory: &BehaviorMemory) -> Result<()> {
        if memory.family() == self.memory_family() {
            Ok(())
        } else {
            Err(EngineError::PolicyMismatch {
                policy: self.name.clone(),
                found: memory.family().to_string(),
            })
        }
    }

    /// Adult of the allowed sex.
    pub fn is_leadership_eligible(&self, world: &dyn GroupWorld, agent: &AgentId) -> bool {
        matches!(world.age_category(agent), AgeCategory::Adult | AgeCategory::Elder)
            && self.leader_sex.allows(world.sex(agent))
    }

    /// Whether a visible non-member counts as a threat to the group.
    pub fn is_threat(
        &self,
        world: &dyn GroupWorld,
        members: &BTreeSet<AgentId>,
        memory: &BehaviorMemory,
        candidate: &AgentId,
    ) -> bool {
        if members.contains(candidate) || !world.is_alive(candidate) {
            return false;
        }

        let kind = world.kind_of(candidate);
        if memory.untrusted_kinds().contains(&kind) {
            return true;
        }

        if world
            .combat_target(candidate)
            .is_some_and(|target| members.contains(&target))
        {
            return true;
        }

        match &self.kind {
            PolicyKind::FamilyPredator(_) => family::is_rival(world, members, memory, candidate, &kind),
            _ => false,
        }
    }

    /// Whether an otherwise fighting group should disengage.
    pub fn should_break(&self, group: &GroupRecord, world: &dyn GroupWorld, now: SimTime) -> bool {
        let leader_health = group.leader().map(|leader| world.health_fraction(leader));
        let last_death = group.memory.last_adult_death();

        match &self.kind {
            PolicyKind::Neutral(params) => params.should_break(last_death, now),
            PolicyKind::Wimpy(_) => true,
            PolicyKind::Territorial(params) => params.should_break(last_death, leader_health, now),
            PolicyKind::FamilyPredator(params) => {
                let child_attacked = group
                    .memory
                    .as_predator()
                    .is_some_and(|pack| pack.child_attacked);
                params.should_break(last_death, leader_health, child_attacked, now)
            }
        }
    }

    /// Upper bound of the de-escalation draw at this alertness.
    pub fn calm_range(&self, alertness: Alertness, config: &EngineConfig) -> u32 {
        let range = match &self.kind {
            PolicyKind::Neutral(params) => params.calm_range,
            PolicyKind::Wimpy(params) => params.calm_range,
            PolicyKind::Territorial(params) => params.calm_range_at(alertness),
            PolicyKind::FamilyPredator(params) => params.calm_range_at(alertness),
        };
        if range == 0 {
            config.alertness.calm_range
        } else {
            range
        }
    }

    /// Members that engage threats during an attack.
    pub fn is_fighter(&self, role: Role) -> bool {
        match &self.kind {
            PolicyKind::Wimpy(_) => false,
            PolicyKind::FamilyPredator(_) => role != Role::Child,
            _ => role.is_adult_tier(),
        }
    }

    /// Members that hold the line during a controlled retreat.
    pub fn is_retreat_fighter(&self, role: Role) -> bool {
        match &self.kind {
            PolicyKind::Wimpy(_) => false,
            PolicyKind::FamilyPredator(_) => role.is_adult_tier() || role == Role::Elder,
            _ => role.is_adult_tier(),
        }
    }

    /// The response to members already fighting: attack, or break away.
    pub fn combat_response(&self, group: &GroupRecord, world: &dyn GroupWorld, now: SimTime) -> GroupAction {
        if matches!(self.kind, PolicyKind::Wimpy(_)) {
            return wimpy::combat_response();
        }

        if self.should_break(group, world, now) {
            self.break_response(group)
        } else {
            GroupAction::AttackThreats
        }
    }

    /// How a breaking group leaves: retreating around its children, or fleeing outright.
    pub fn break_response(&self, group: &GroupRecord) -> GroupAction {
        if group.has_role(Role::Child) && self.handles(GroupAction::ControlledRetreat) {
            GroupAction::ControlledRetreat
        } else {
            GroupAction::Flee
        }
    }

    /// First response to threats once the group is Agitated.
    pub fn threat_response(
        &self,
        group: &GroupRecord,
        assessment: &ThreatAssessment,
        fighters: usize,
        ctx: &mut TickContext<'_>,
    ) -> GroupAction {
        let threats = assessment.threats.len().max(1);
        let ratio = fighters as f64 / threats as f64;

        match &self.kind {
            PolicyKind::Neutral(params) => params.threat_response(ratio),
            PolicyKind::Wimpy(_) => wimpy::threat_response(),
            PolicyKind::Territorial(params) => {
                let trespass = assessment
                    .threat_places
                    .iter()
                    .any(|place| group.memory.in_territory(place));
                params.threat_response(ratio, trespass, ctx)
            }
            PolicyKind::FamilyPredator(params) => {
                let kinds: Vec<KindId> = assessment
                    .threats
                    .iter()
                    .map(|threat| ctx.world.kind_of(threat))
                    .collect();
                let dominated = group
                    .memory
                    .as_predator()
                    .map(|pack| kinds.iter().filter(|k| pack.dominance_over(k) > 0).count())
                    .unwrap_or(0);
                params.threat_response(ratio, dominated, kinds.len())
            }
        }
    }

    /// Whether this policy has a handler for the action.
    pub fn handles(&self, action: GroupAction) -> bool {
        match &self.kind {
            PolicyKind::Wimpy(_) => wimpy::handles(action),
            _ => true,
        }
    }

    pub fn eats_carrion(&self) -> bool {
        self.family() == PolicyFamily::Predator
    }

    pub fn is_active(&self, time_of_day: TimeOfDay) -> bool {
        self.active_window.is_active(time_of_day)
    }
}

/// Configured policies by name, shared between groups.
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    policies: BTreeMap<String, Arc<GroupPolicy>>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        let mut registry = Self::new();
        for (name, policy) in &config.policies {
            registry.register(GroupPolicy::from_config(name.clone(), policy));
        }
        registry
    }

    pub fn register(&mut self, policy: GroupPolicy) -> Arc<GroupPolicy> {
        let policy = Arc::new(policy);
        self.policies.insert(policy.name.clone(), Arc::clone(&policy));
        policy
    }

    pub fn get(&self, name: &str) -> Result<Arc<GroupPolicy>> {
        self.policies
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::UnknownPolicy(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.policies.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::{SandboxAgent, SandboxWorld};

    fn registry() -> PolicyRegistry {
        PolicyRegistry::from_config(&EngineConfig::default())
    }

    #[test]
    fn test_registry_lookup() {
        let registry = registry();
        assert_eq!(registry.len(), 4);
        assert!(registry.get("wolf_family").is_ok());
        assert!(matches!(
            registry.get("dragons"),
            Err(EngineError::UnknownPolicy(name)) if name == "dragons"
        ));
    }

    #[test]
    fn test_memory_matches_policy() {
        let registry = registry();
        let bulls = registry.get("bull_herd").unwrap();
        let wolves = registry.get("wolf_family").unwrap();

        let memory = bulls.new_memory();
        assert_eq!(memory.family(), MemoryFamily::Territorial);
        assert!(bulls.accepts_memory(&memory).is_ok());

        let err = wolves.accepts_memory(&memory).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_leadership_eligibility_by_sex_and_age() {
        let mut world = SandboxWorld::new();
        world.add_place("meadow");
        world.add_agent(SandboxAgent::new("stag", "deer", "meadow").with_sex(Sex::Male));
        world.add_agent(SandboxAgent::new("doe", "deer", "meadow").with_sex(Sex::Female));
        world.add_agent(
            SandboxAgent::new("fawn", "deer", "meadow")
                .with_sex(Sex::Male)
                .with_age(AgeCategory::Child),
        );

        let plains = registry().get("plains_herd").unwrap();
        assert!(plains.is_leadership_eligible(&world, &AgentId::from("stag")));
        assert!(!plains.is_leadership_eligible(&world, &AgentId::from("doe")));
        assert!(!plains.is_leadership_eligible(&world, &AgentId::from("fawn")));

        let wolves = registry().get("wolf_family").unwrap();
        assert!(wolves.is_leadership_eligible(&world, &AgentId::from("doe")));
    }

    #[test]
    fn test_threat_predicate() {
        let mut world = SandboxWorld::new();
        world.add_place("meadow");
        world.add_agent(SandboxAgent::new("deer_01", "deer", "meadow"));
        world.add_agent(SandboxAgent::new("wolf_01", "wolf", "meadow"));
        world.add_agent(SandboxAgent::new("boar_01", "boar", "meadow"));
        world.add_agent(SandboxAgent::new("boar_02", "boar", "meadow"));

        let plains = registry().get("plains_herd").unwrap();
        let memory = plains.new_memory();
        let members: BTreeSet<AgentId> = [AgentId::from("deer_01")].into_iter().collect();

        assert!(plains.is_threat(&world, &members, &memory, &AgentId::from("wolf_01")));
        assert!(!plains.is_threat(&world, &members, &memory, &AgentId::from("boar_01")));
        assert!(!plains.is_threat(&world, &members, &memory, &AgentId::from("deer_01")));

        world.engage(&AgentId::from("boar_02"), &AgentId::from("deer_01"));
        assert!(plains.is_threat(&world, &members, &memory, &AgentId::from("boar_02")));
    }

    #[test]
    fn test_active_windows() {
        assert!(ActiveWindow::Diurnal.is_active(TimeOfDay::Morning));
        assert!(!ActiveWindow::Diurnal.is_active(TimeOfDay::Night));
        assert!(ActiveWindow::Nocturnal.is_active(TimeOfDay::Night));
        assert!(ActiveWindow::Crepuscular.is_active(TimeOfDay::Dusk));
        assert!(!ActiveWindow::Crepuscular.is_active(TimeOfDay::Afternoon));
        assert!(ActiveWindow::Always.is_active(TimeOfDay::Night));
    }

    #[test]
    fn test_fighter_roles() {
        let registry = registry();
        let plains = registry.get("plains_herd").unwrap();
        let wolves = registry.get("wolf_family").unwrap();
        let skittish = registry.get("skittish_herd").unwrap();

        assert!(plains.is_fighter(Role::Adult));
        assert!(!plains.is_fighter(Role::Elder));
        assert!(wolves.is_fighter(Role::Juvenile));
        assert!(!wolves.is_fighter(Role::Child));
        assert!(wolves.is_retreat_fighter(Role::Elder));
        assert!(!wolves.is_retreat_fighter(Role::Juvenile));
        assert!(!skittish.is_fighter(Role::Leader));
    }

    #[test]
    fn test_calm_range_per_tier() {
        let config = EngineConfig::default();
        let registry = registry();
        let plains = registry.get("plains_herd").unwrap();
        let bulls = registry.get("bull_herd").unwrap();
        let wolves = registry.get("wolf_family").unwrap();

        assert_eq!(plains.calm_range(Alertness::Aggressive, &config), 120);
        assert_eq!(bulls.calm_range(Alertness::Agitated, &config), 120);
        assert_eq!(bulls.calm_range(Alertness::Aggressive, &config), 60);
        assert_eq!(wolves.calm_range(Alertness::Broken, &config), 60);
        assert_eq!(wolves.calm_range(Alertness::VeryAgitated, &config), 120);
    }
}
