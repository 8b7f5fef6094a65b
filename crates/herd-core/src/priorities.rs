//! Priority / Action Establisher
//!
//! Re-selects the group's current action. Runs on the slow tick and again
//! whenever alertness changes. Rules are tried in order and the first one
//! that applies decides:
//!
//! 1. A member is fighting a non-member: attack, or break away.
//! 2. Threats in view at Agitated or above: posture if the fighters are
//!    confident enough, otherwise avoid.
//! 3. Still avoiding or posturing at VeryAgitated or above: rule 1's choice.
//! 4. Calm again (Wary or below) after a threat response: back to grazing.
//! 5. Routine: graze, forage, rest and sleep by the policy's active window,
//!    each change gated by a draw.

use std::sync::Arc;

use herd_types::{Alertness, GroupAction, Role};

use crate::alertness::ThreatAssessment;
use crate::context::TickContext;
use crate::group::GroupRecord;
use crate::partition::Partition;

/// Located non-Child members, weighed against the threat count when choosing
/// between posturing and avoiding. Who actually engages is up to the policy.
pub fn fighter_count(group: &GroupRecord, ctx: &TickContext<'_>) -> usize {
    group
        .roles
        .iter()
        .filter(|(member, role)| {
            group.contains(member)
                && **role != Role::Child
                && ctx.world.is_alive(member)
                && ctx.world.placement(member).is_some()
        })
        .count()
}

/// The routine action for this time of day, or `None` to keep the current one.
fn routine(group: &GroupRecord, ctx: &mut TickContext<'_>) -> Option<GroupAction> {
    let config = ctx.config;
    let chances = &config.priorities;
    let current = group.action();
    let active = group.policy().is_active(ctx.now.time_of_day());

    if group.alertness() > Alertness::NotAlert {
        // Nobody dozes off with something on their mind.
        return current.is_resting().then_some(GroupAction::Graze);
    }

    match (active, current) {
        (true, GroupAction::Rest | GroupAction::Sleep) => {
            ctx.chance(chances.wake_chance).then_some(GroupAction::Graze)
        }
        (true, _) => ctx.chance(chances.idle_rest_chance).then_some(GroupAction::Rest),
        (false, GroupAction::Rest) => ctx.chance(chances.sleep_chance).then_some(GroupAction::Sleep),
        (false, GroupAction::Sleep) => None,
        (false, _) => ctx.chance(chances.rest_chance).then_some(GroupAction::Rest),
    }
}

/// Picks the group's action. Returns true if it changed.
pub fn establish_priorities(
    group: &mut GroupRecord,
    split: &Partition,
    assessment: &ThreatAssessment,
    ctx: &mut TickContext<'_>,
) -> bool {
    let policy = Arc::clone(group.policy());
    let alertness = group.alertness();
    let current = group.action();

    let next = if assessment.member_fighting_outsider {
        Some(policy.combat_response(group, &*ctx.world, ctx.now))
    } else if assessment.has_threats()
        && alertness >= Alertness::Agitated
        && !current.is_threat_response()
    {
        let fighters = fighter_count(group, ctx);
        Some(policy.threat_response(group, assessment, fighters, ctx))
    } else if alertness >= Alertness::VeryAgitated
        && matches!(current, GroupAction::AvoidThreat | GroupAction::Posture)
    {
        Some(policy.combat_response(group, &*ctx.world, ctx.now))
    } else if alertness <= Alertness::Wary && current.is_threat_response() {
        Some(GroupAction::Graze)
    } else if current.is_threat_response() {
        None
    } else {
        routine(group, ctx)
    };

    let Some(next) = next else {
        return false;
    };
    let changed = group.set_action(next);
    if changed {
        tracing::trace!(
            group = %group.id,
            main = split.main.len(),
            threats = assessment.threats.len(),
            "priorities re-established"
        );
    }
    changed
}
