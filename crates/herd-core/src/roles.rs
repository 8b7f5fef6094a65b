//! Role Assignor / Leader Elector
//!
//! Keeps the role map congruent with membership and guarantees a leader.
//! Also hosts the slow duties that shuffle roles: folding outsiders into the
//! group and rotating sentry duty.

use rand::seq::SliceRandom;

use herd_types::{AgentId, Alertness, Role};

use crate::context::TickContext;
use crate::group::GroupRecord;
use crate::partition;
use crate::policy::GroupPolicy;
use crate::world::{AgeCategory, GroupWorld};

/// Initial role of a member, from its age and leadership eligibility.
pub fn classify(policy: &GroupPolicy, world: &dyn GroupWorld, agent: &AgentId) -> Role {
    match world.age_category(agent) {
        AgeCategory::Infant | AgeCategory::Child => Role::Child,
        AgeCategory::Youth => Role::Juvenile,
        AgeCategory::Elder => Role::Elder,
        AgeCategory::Adult => promoted_role(policy, world, agent),
    }
}

/// Role given to an outsider folded into the group.
fn promoted_role(policy: &GroupPolicy, world: &dyn GroupWorld, agent: &AgentId) -> Role {
    if policy.is_leadership_eligible(world, agent) {
        Role::Pretender
    } else {
        Role::Adult
    }
}

/// Brings the role map in line with membership and makes sure there is a leader.
///
/// Idempotent: a second call with no membership change does nothing.
/// Returns true if the role map changed.
pub fn evaluate_roles(group: &mut GroupRecord, ctx: &mut TickContext<'_>) -> bool {
    let mut changed = false;
    let policy = std::sync::Arc::clone(group.policy());

    // Dead agents leave the group.
    let dead: Vec<AgentId> = group
        .members
        .iter()
        .filter(|m| !ctx.world.is_alive(m))
        .cloned()
        .collect();
    for agent in &dead {
        group.members.remove(agent);
        changed = true;
    }

    // Prune stale roles, remembering adult deaths.
    let stale: Vec<(AgentId, Role)> = group
        .roles
        .iter()
        .filter(|(agent, _)| !group.members.contains(*agent))
        .map(|(agent, role)| (agent.clone(), *role))
        .collect();
    for (agent, role) in stale {
        group.roles.remove(&agent);
        changed = true;
        if role.is_adult_tier() && !ctx.world.is_alive(&agent) {
            tracing::debug!(group = %group.id, agent = %agent, role = %role, "adult member died");
            group.memory.record_adult_death(ctx.now);
        }
    }

    // New members get a role.
    let unassigned: Vec<AgentId> = group
        .members
        .iter()
        .filter(|m| !group.roles.contains_key(*m))
        .cloned()
        .collect();
    for agent in unassigned {
        let role = classify(&policy, &*ctx.world, &agent);
        tracing::trace!(group = %group.id, agent = %agent, role = %role, "assigned role");
        group.roles.insert(agent, role);
        changed = true;
    }

    // A group of nothing but outsiders folds them all in.
    if !group.members.is_empty() && !group.roles.values().any(|r| r.is_core()) {
        for agent in group.members_with_role(Role::Outsider) {
            let role = promoted_role(&policy, &*ctx.world, &agent);
            group.roles.insert(agent, role);
            changed = true;
        }
    }

    changed |= ensure_leader_exists(group, ctx).is_some();

    if changed {
        group.mark_dirty();
    }
    changed
}

/// Elects a leader if the group has none. Returns the newly elected leader.
///
/// Candidates are drawn uniformly from the first non-empty tier of
/// Pretenders, Adults, eligible Elders, other Elders, and finally anyone.
pub fn ensure_leader_exists(group: &mut GroupRecord, ctx: &mut TickContext<'_>) -> Option<AgentId> {
    if group.members.is_empty() || group.leader().is_some() {
        return None;
    }

    let policy = std::sync::Arc::clone(group.policy());
    let elders = group.members_with_role(Role::Elder);
    let (eligible_elders, other_elders): (Vec<AgentId>, Vec<AgentId>) = elders
        .into_iter()
        .partition(|elder| policy.is_leadership_eligible(&*ctx.world, elder));

    let tiers = [
        group.members_with_role(Role::Pretender),
        group.members_with_role(Role::Adult),
        eligible_elders,
        other_elders,
        group.members.iter().cloned().collect(),
    ];

    let chosen = tiers
        .iter()
        .find(|tier| !tier.is_empty())
        .and_then(|tier| tier.choose(&mut *ctx.rng))
        .cloned()?;

    tracing::debug!(group = %group.id, leader = %chosen, "elected leader");
    group.roles.insert(chosen.clone(), Role::Leader);
    group.mark_dirty();
    Some(chosen)
}

/// Folds outsiders standing with the group into it while things are calm.
/// Returns how many were integrated.
pub fn integrate_outsiders(group: &mut GroupRecord, ctx: &mut TickContext<'_>) -> usize {
    if group.alertness() > Alertness::Wary {
        return 0;
    }
    let Some(anchor) = partition::anchor(group, &*ctx.world) else {
        return 0;
    };

    let policy = std::sync::Arc::clone(group.policy());
    let chance = ctx.config.roles.outsider_integration_chance;
    let mut integrated = 0;
    for outsider in group.members_with_role(Role::Outsider) {
        if ctx.world.placement(&outsider).as_ref() != Some(&anchor) {
            continue;
        }
        if !ctx.chance(chance) {
            continue;
        }
        let role = promoted_role(&policy, &*ctx.world, &outsider);
        tracing::debug!(group = %group.id, agent = %outsider, role = %role, "outsider integrated");
        group.roles.insert(outsider, role);
        integrated += 1;
    }

    if integrated > 0 {
        group.mark_dirty();
    }
    integrated
}

/// Members fit to keep watch.
fn sentry_candidates(group: &GroupRecord, world: &dyn GroupWorld) -> Vec<AgentId> {
    group
        .roles
        .iter()
        .filter(|(agent, role)| {
            group.members.contains(*agent)
                && (role.is_adult_tier() || **role == Role::Elder)
                && world.placement(agent).is_some()
        })
        .map(|(agent, _)| agent.clone())
        .collect()
}

/// Keeps a sentry appointed and occasionally hands the duty to someone else.
/// Returns true if the sentry changed.
pub fn rotate_sentry(group: &mut GroupRecord, ctx: &mut TickContext<'_>) -> bool {
    let current = group.memory.resolve_sentry(&*ctx.world);
    let candidates = sentry_candidates(group, &*ctx.world);

    let rotation = ctx.config.roles.sentry_rotation_chance;
    let current_valid = current.as_ref().is_some_and(|s| candidates.contains(s));
    if current_valid && !ctx.chance(rotation) {
        return false;
    }

    let pool: Vec<&AgentId> = candidates
        .iter()
        .filter(|c| Some(*c) != current.as_ref() || candidates.len() == 1)
        .collect();
    let next = pool.choose(&mut *ctx.rng).map(|a| (*a).clone());

    if next == current {
        return false;
    }

    let sentry = group.memory.sentry_mut();
    match &next {
        Some(agent) => {
            tracing::debug!(group = %group.id, sentry = %agent, "sentry appointed");
            *sentry = crate::memory::AgentRef::to(agent.clone());
        }
        None => sentry.clear(),
    }
    group.mark_dirty();
    true
}
