//! Group Record
//!
//! The aggregate for one collective: membership, per-member roles, the
//! group's alertness and current action, its shared policy and its
//! policy-owned memory. The record holds agent identifiers only; the agents
//! themselves live in the world.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use herd_types::{AgentId, Alertness, GroupAction, GroupId, GroupSnapshot, Role, SimTime};

use crate::error::Result;
use crate::memory::BehaviorMemory;
use crate::policy::GroupPolicy;
use crate::world::GroupWorld;

/// Membership restored from a snapshot, not yet resolved against the world.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMembers {
    pub members: Vec<String>,
    pub roles: BTreeMap<String, Role>,
}

/// One collective of agents governed by a single policy.
#[derive(Debug, Clone)]
pub struct GroupRecord {
    pub id: GroupId,
    pub members: BTreeSet<AgentId>,
    pub roles: BTreeMap<AgentId, Role>,
    pub memory: BehaviorMemory,
    alertness: Alertness,
    action: GroupAction,
    policy: Arc<GroupPolicy>,
    dirty: bool,
    pending: Option<PendingMembers>,
}

impl GroupRecord {
    /// Forms a new group with fresh memory.
    pub fn new(policy: Arc<GroupPolicy>, members: impl IntoIterator<Item = AgentId>) -> Self {
        Self {
            id: GroupId::new(),
            members: members.into_iter().collect(),
            roles: BTreeMap::new(),
            memory: policy.new_memory(),
            alertness: Alertness::NotAlert,
            action: GroupAction::Graze,
            policy,
            dirty: true,
            pending: None,
        }
    }

    pub fn with_id(mut self, id: GroupId) -> Self {
        self.id = id;
        self
    }

    /// Rebuilds a group from a snapshot. Members stay unresolved until
    /// [`GroupRecord::resolve_members`] runs against the live world.
    pub fn from_snapshot(snapshot: GroupSnapshot, policy: Arc<GroupPolicy>) -> Result<Self> {
        let memory: BehaviorMemory = serde_json::from_value(snapshot.memory)?;
        policy.accepts_memory(&memory)?;

        Ok(Self {
            id: snapshot.group_id,
            members: BTreeSet::new(),
            roles: BTreeMap::new(),
            memory,
            alertness: snapshot.alertness,
            action: snapshot.action,
            policy,
            dirty: false,
            pending: Some(PendingMembers {
                members: snapshot.members,
                roles: snapshot.roles,
            }),
        })
    }

    /// Resolves persisted member references, once. Unknown agents are dropped.
    pub fn resolve_members(&mut self, world: &dyn GroupWorld) {
        let Some(pending) = self.pending.take() else {
            return;
        };

        for raw in &pending.members {
            match world.resolve_agent(raw) {
                Some(agent) => {
                    if let Some(role) = pending.roles.get(raw) {
                        self.roles.insert(agent.clone(), *role);
                    }
                    self.members.insert(agent);
                }
                None => {
                    tracing::warn!(group = %self.id, agent = %raw, "dropping unknown member from snapshot");
                    self.dirty = true;
                }
            }
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.pending.is_none()
    }

    /// Serializable form for the save manager.
    pub fn snapshot(&self, now: SimTime) -> Result<GroupSnapshot> {
        let (members, roles) = match &self.pending {
            Some(pending) => (pending.members.clone(), pending.roles.clone()),
            None => (
                self.members.iter().map(|m| m.to_string()).collect(),
                self.roles
                    .iter()
                    .map(|(agent, role)| (agent.to_string(), *role))
                    .collect(),
            ),
        };

        Ok(GroupSnapshot {
            group_id: self.id,
            policy: self.policy.name.clone(),
            members,
            roles,
            alertness: self.alertness,
            action: self.action,
            memory: serde_json::to_value(&self.memory)?,
            saved_at: now,
        })
    }

    pub fn policy(&self) -> &Arc<GroupPolicy> {
        &self.policy
    }

    pub fn alertness(&self) -> Alertness {
        self.alertness
    }

    /// Sets alertness. Returns true and marks the group dirty if it changed.
    pub fn set_alertness(&mut self, alertness: Alertness) -> bool {
        if self.alertness == alertness {
            return false;
        }
        tracing::debug!(group = %self.id, from = %self.alertness, to = %alertness, "alertness changed");
        self.alertness = alertness;
        self.dirty = true;
        true
    }

    pub fn action(&self) -> GroupAction {
        self.action
    }

    /// Sets the current action. Returns true and marks the group dirty if it changed.
    pub fn set_action(&mut self, action: GroupAction) -> bool {
        if self.action == action {
            return false;
        }
        tracing::debug!(group = %self.id, from = %self.action, to = %action, "action changed");
        self.action = action;
        self.dirty = true;
        true
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn len(&self) -> usize {
        match &self.pending {
            Some(pending) => pending.members.len(),
            None => self.members.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, agent: &AgentId) -> bool {
        self.members.contains(agent)
    }

    pub fn role_of(&self, agent: &AgentId) -> Option<Role> {
        self.roles.get(agent).copied()
    }

    /// The first member holding the Leader role.
    pub fn leader(&self) -> Option<&AgentId> {
        self.roles
            .iter()
            .find(|(agent, role)| **role == Role::Leader && self.members.contains(*agent))
            .map(|(agent, _)| agent)
    }

    /// Members currently holding the given role, in identifier order.
    pub fn members_with_role(&self, role: Role) -> Vec<AgentId> {
        self.roles
            .iter()
            .filter(|(agent, r)| **r == role && self.members.contains(*agent))
            .map(|(agent, _)| agent.clone())
            .collect()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles
            .iter()
            .any(|(agent, r)| *r == role && self.members.contains(agent))
    }

    /// Adds a member; its role is assigned on the next role-maintenance pass.
    pub fn add_member(&mut self, agent: AgentId) -> bool {
        let added = self.members.insert(agent);
        self.dirty |= added;
        added
    }

    /// Adds a peripheral member that has not yet been folded into the group.
    pub fn add_outsider(&mut self, agent: AgentId) -> bool {
        let added = self.members.insert(agent.clone());
        if added {
            self.roles.insert(agent, Role::Outsider);
            self.dirty = true;
        }
        added
    }

    /// Removes a member. Its role entry is pruned on the next role-maintenance pass.
    pub fn remove_member(&mut self, agent: &AgentId) -> bool {
        let removed = self.members.remove(agent);
        self.dirty |= removed;
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::policy::PolicyRegistry;
    use crate::sandbox::{SandboxAgent, SandboxWorld};

    fn plains_policy() -> Arc<GroupPolicy> {
        let registry = PolicyRegistry::from_config(&EngineConfig::default());
        registry.get("plains_herd").unwrap()
    }

    fn ids(names: &[&str]) -> Vec<AgentId> {
        names.iter().map(|n| AgentId::from(*n)).collect()
    }

    #[test]
    fn test_new_group_is_dirty_with_fresh_memory() {
        let group = GroupRecord::new(plains_policy(), ids(&["deer_01", "deer_02"]));

        assert!(group.is_dirty());
        assert_eq!(group.len(), 2);
        assert_eq!(group.alertness(), Alertness::NotAlert);
        assert_eq!(group.action(), GroupAction::Graze);
        assert!(group.memory.shared().known_water.is_empty());
        assert!(!group.memory.untrusted_kinds().is_empty());
    }

    #[test]
    fn test_setters_mark_dirty_only_on_change() {
        let mut group = GroupRecord::new(plains_policy(), ids(&["deer_01"]));
        group.clear_dirty();

        assert!(!group.set_alertness(Alertness::NotAlert));
        assert!(!group.is_dirty());

        assert!(group.set_action(GroupAction::Rest));
        assert!(group.is_dirty());
    }

    #[test]
    fn test_snapshot_restores_lazily() {
        let mut group = GroupRecord::new(plains_policy(), ids(&["deer_01", "deer_02"]));
        group.roles.insert(AgentId::from("deer_01"), Role::Leader);
        group.roles.insert(AgentId::from("deer_02"), Role::Adult);
        group.set_alertness(Alertness::Wary);

        let snapshot = group.snapshot(SimTime::from_secs(60)).unwrap();
        let mut restored = GroupRecord::from_snapshot(snapshot.clone(), plains_policy()).unwrap();

        assert!(!restored.is_resolved());
        assert_eq!(restored.len(), 2);
        assert!(restored.members.is_empty());
        // Snapshots of an unresolved group echo the raw references
        assert_eq!(restored.snapshot(SimTime::from_secs(60)).unwrap().members, snapshot.members);

        let mut world = SandboxWorld::new();
        world.add_place("meadow");
        world.add_agent(SandboxAgent::new("deer_01", "deer", "meadow"));
        restored.resolve_members(&world);

        assert!(restored.is_resolved());
        assert_eq!(restored.members.len(), 1);
        assert_eq!(restored.leader(), Some(&AgentId::from("deer_01")));
        assert_eq!(restored.alertness(), Alertness::Wary);
        assert!(restored.is_dirty());
    }

    #[test]
    fn test_add_outsider_gets_role() {
        let mut group = GroupRecord::new(plains_policy(), ids(&["deer_01"]));
        assert!(group.add_outsider(AgentId::from("stag_09")));
        assert!(!group.add_outsider(AgentId::from("stag_09")));
        assert_eq!(group.role_of(&AgentId::from("stag_09")), Some(Role::Outsider));
    }

    #[test]
    fn test_removed_member_is_not_leader() {
        let mut group = GroupRecord::new(plains_policy(), ids(&["deer_01", "deer_02"]));
        group.roles.insert(AgentId::from("deer_01"), Role::Leader);
        group.remove_member(&AgentId::from("deer_01"));

        assert!(group.leader().is_none());
        assert!(!group.has_role(Role::Leader));
    }
}
