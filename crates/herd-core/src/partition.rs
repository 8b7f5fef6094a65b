//! Subgroup Partitioner
//!
//! Splits membership each tick, relative to the group's anchor, into the
//! main body, stragglers, and a third bucket: outsiders for grazers,
//! vulnerable members (children and elders) for predators.

use std::collections::BTreeMap;

use herd_types::{AgentId, Placement, Role};

use crate::group::GroupRecord;
use crate::policy::PolicyFamily;
use crate::world::GroupWorld;

/// One tick's spatial split of a group. The three lists are disjoint and
/// together hold every member exactly once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    /// Where the group is considered to be
    pub anchor: Option<Placement>,
    pub main: Vec<AgentId>,
    pub stragglers: Vec<AgentId>,
    pub third: Vec<AgentId>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.main.len() + self.stragglers.len() + self.third.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn in_main(&self, agent: &AgentId) -> bool {
        self.main.contains(agent)
    }

    pub fn all(&self) -> impl Iterator<Item = &AgentId> {
        self.main.iter().chain(&self.stragglers).chain(&self.third)
    }
}

/// The leader's placement if it has one, else the most common placement among members.
pub fn anchor(group: &GroupRecord, world: &dyn GroupWorld) -> Option<Placement> {
    if let Some(placement) = group.leader().and_then(|leader| world.placement(leader)) {
        return Some(placement);
    }

    let mut counts: BTreeMap<Placement, usize> = BTreeMap::new();
    for member in &group.members {
        if let Some(placement) = world.placement(member) {
            *counts.entry(placement).or_insert(0) += 1;
        }
    }

    let best = counts.values().copied().max()?;
    counts
        .into_iter()
        .find(|(_, count)| *count == best)
        .map(|(placement, _)| placement)
}

/// Splits the group's members for this tick.
pub fn partition(group: &GroupRecord, world: &dyn GroupWorld) -> Partition {
    let anchor = anchor(group, world);
    let family = group.policy().family();
    let at_water = anchor
        .as_ref()
        .is_some_and(|a| group.memory.shared().is_known_water(&a.place));

    let mut split = Partition {
        anchor: anchor.clone(),
        ..Partition::default()
    };

    for member in &group.members {
        let role = group.role_of(member);
        let third = match family {
            PolicyFamily::Grazer => {
                role == Some(Role::Outsider) && !(at_water && world.is_thirsty(member))
            }
            PolicyFamily::Predator => matches!(role, Some(Role::Child) | Some(Role::Elder)),
        };

        if third {
            split.third.push(member.clone());
        } else if anchor.is_some() && world.placement(member) == anchor {
            split.main.push(member.clone());
        } else {
            split.stragglers.push(member.clone());
        }
    }

    split
}
