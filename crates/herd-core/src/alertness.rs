//! Alertness Evaluator
//!
//! A six-level probabilistic state machine run every fast tick. With threats
//! in view the group escalates one level at a time, with probability equal to
//! the threat count in percent. With none it calms one level at a time, faster
//! the larger its main body. A member already fighting a non-member forces
//! the group to at least VeryAgitated in one jump.

use rand::Rng;
use std::collections::BTreeSet;

use herd_types::{AgentId, Alertness, PlaceId, Role};

use crate::context::TickContext;
use crate::group::GroupRecord;
use crate::partition::Partition;
use crate::world::GroupWorld;

/// What the group can see this tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThreatAssessment {
    /// Visible non-members the policy considers threats
    pub threats: Vec<AgentId>,
    /// Where those threats stand
    pub threat_places: BTreeSet<PlaceId>,
    /// A member is already in combat with a non-member
    pub member_fighting_outsider: bool,
    /// A threat is attacking one of the group's children
    pub children_attacked: bool,
}

impl ThreatAssessment {
    pub fn has_threats(&self) -> bool {
        !self.threats.is_empty()
    }
}

/// Gathers threats visible to any member.
pub fn assess_threats(group: &GroupRecord, world: &dyn GroupWorld) -> ThreatAssessment {
    let policy = group.policy();
    let mut threats: BTreeSet<AgentId> = BTreeSet::new();
    let mut assessment = ThreatAssessment::default();

    for member in &group.members {
        if world.placement(member).is_none() {
            continue;
        }
        if let Some(opponent) = world.combat_target(member) {
            if !group.members.contains(&opponent) {
                assessment.member_fighting_outsider = true;
            }
        }
        for seen in world.visible_agents(member) {
            if !threats.contains(&seen) && policy.is_threat(world, &group.members, &group.memory, &seen) {
                threats.insert(seen);
            }
        }
    }

    for threat in &threats {
        if let Some(placement) = world.placement(threat) {
            assessment.threat_places.insert(placement.place);
        }
        if world
            .combat_target(threat)
            .is_some_and(|target| group.role_of(&target) == Some(Role::Child))
        {
            assessment.children_attacked = true;
        }
    }
    assessment.threats = threats.into_iter().collect();
    assessment
}

/// Result of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertnessChange {
    Unchanged,
    /// Moved one level up or down
    Stepped { from: Alertness, to: Alertness },
    /// Members are fighting; stepwise logic was skipped
    Forced { from: Alertness, to: Alertness },
}

impl AlertnessChange {
    /// Whether priorities must be re-established.
    pub fn needs_priorities(self) -> bool {
        !matches!(self, AlertnessChange::Unchanged)
    }
}

/// Folds what the group saw into its memory.
fn remember(group: &mut GroupRecord, assessment: &ThreatAssessment, ctx: &TickContext<'_>) {
    if !assessment.threat_places.is_empty() {
        let shared = group.memory.shared_mut();
        for place in &assessment.threat_places {
            shared.note_threat(place.clone(), ctx.now);
        }
        group.mark_dirty();
    }

    let broken = group.alertness() == Alertness::Broken;
    let mut changed = false;
    if let Some(pack) = group.memory.as_predator_mut() {
        if pack.child_attacked != assessment.children_attacked {
            pack.child_attacked = assessment.children_attacked;
            changed = true;
        }
        if !assessment.has_threats() && !pack.engaged_kinds.is_empty() {
            // Kinds the pack fought are only credited when it held its ground.
            if broken {
                pack.engaged_kinds.clear();
            } else {
                pack.credit_engaged();
            }
            changed = true;
        }
    }
    if changed {
        group.mark_dirty();
    }
}

/// Runs one alertness evaluation for the group.
pub fn evaluate_alertness(
    group: &mut GroupRecord,
    split: &Partition,
    assessment: &ThreatAssessment,
    ctx: &mut TickContext<'_>,
) -> AlertnessChange {
    remember(group, assessment, ctx);

    let from = group.alertness();

    if assessment.member_fighting_outsider {
        let to = from.max(Alertness::VeryAgitated);
        group.set_alertness(to);
        return AlertnessChange::Forced { from, to };
    }

    let to = if assessment.has_threats() {
        match from {
            Alertness::Broken => None,
            Alertness::Aggressive => {
                let policy = std::sync::Arc::clone(group.policy());
                policy
                    .should_break(group, &*ctx.world, ctx.now)
                    .then_some(Alertness::Broken)
            }
            _ => {
                let range = ctx.config.alertness.escalation_range;
                let escalate = range > 0 && ctx.rng.gen_range(0..range) < assessment.threats.len() as u32;
                if escalate {
                    from.escalated()
                } else {
                    None
                }
            }
        }
    } else {
        match from {
            Alertness::NotAlert => None,
            Alertness::Broken => Some(Alertness::Aggressive),
            _ => {
                let range = group.policy().calm_range(from, ctx.config);
                let calm = range > 0 && ctx.rng.gen_range(0..range) < split.main.len() as u32;
                if calm {
                    from.calmed()
                } else {
                    None
                }
            }
        }
    };

    match to {
        Some(to) => {
            group.set_alertness(to);
            AlertnessChange::Stepped { from, to }
        }
        None => AlertnessChange::Unchanged,
    }
}
