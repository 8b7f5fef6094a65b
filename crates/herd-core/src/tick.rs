//! Group Handlers
//!
//! The two per-group handlers the engine drives.
//!
//! Fast (every 10 simulated seconds):
//! role maintenance, emote check, partition, straggler recovery, member
//! upkeep, alertness evaluation, action dispatch.
//!
//! Slow (every simulated minute):
//! stale-threat pruning, outsider integration, sentry rotation, priority
//! establishment.

use herd_types::{Alertness, GroupAction};

use crate::alertness::{assess_threats, evaluate_alertness, AlertnessChange};
use crate::context::TickContext;
use crate::dispatch::dispatch;
use crate::emotes::check_emote;
use crate::error::Result;
use crate::group::GroupRecord;
use crate::partition::partition;
use crate::priorities::establish_priorities;
use crate::recovery::gather_stragglers;
use crate::roles::{evaluate_roles, integrate_outsiders, rotate_sentry};
use crate::upkeep::maintain_members;

/// What one handler run changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HandlerOutcome {
    /// Alertness before and after, when it moved
    pub alertness: Option<(Alertness, Alertness)>,
    /// Action before and after, when it changed
    pub action: Option<(GroupAction, GroupAction)>,
}

impl HandlerOutcome {
    fn observe(group: &GroupRecord, alertness: Alertness, action: GroupAction) -> Self {
        Self {
            alertness: (group.alertness() != alertness).then_some((alertness, group.alertness())),
            action: (group.action() != action).then_some((action, group.action())),
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.alertness.is_none() && self.action.is_none()
    }
}

/// Runs the fast handler for one group.
pub fn fast_tick(group: &mut GroupRecord, ctx: &mut TickContext<'_>) -> Result<HandlerOutcome> {
    let alertness = group.alertness();
    let action = group.action();

    group.resolve_members(&*ctx.world);
    evaluate_roles(group, ctx);
    if group.is_empty() {
        return Ok(HandlerOutcome::default());
    }

    check_emote(group, ctx);

    let split = partition(group, &*ctx.world);
    gather_stragglers(group, &split, ctx);
    maintain_members(group, ctx);

    let assessment = assess_threats(group, &*ctx.world);
    let change = evaluate_alertness(group, &split, &assessment, ctx);
    if let AlertnessChange::Forced { .. } = change {
        tracing::trace!(group = %group.id, threats = assessment.threats.len(), "members fighting outsiders");
    }
    if change.needs_priorities() {
        establish_priorities(group, &split, &assessment, ctx);
    }

    dispatch(group, &split, &assessment, ctx)?;
    Ok(HandlerOutcome::observe(group, alertness, action))
}

/// Runs the slow handler for one group.
pub fn slow_tick(group: &mut GroupRecord, ctx: &mut TickContext<'_>) -> Result<HandlerOutcome> {
    let alertness = group.alertness();
    let action = group.action();

    group.resolve_members(&*ctx.world);

    let max_age = ctx.config.memory.threat_memory_secs;
    let pruned = group.memory.shared_mut().prune_threats(ctx.now, max_age);
    if pruned > 0 {
        tracing::trace!(group = %group.id, pruned, "forgot stale threat sightings");
        group.mark_dirty();
    }
    let lapsed = group
        .memory
        .prune_territory(ctx.now, ctx.config.memory.territory_memory_secs);
    if lapsed > 0 {
        tracing::trace!(group = %group.id, lapsed, "gave up territory no longer grazed");
        group.mark_dirty();
    }

    if group.is_empty() {
        return Ok(HandlerOutcome::default());
    }

    integrate_outsiders(group, ctx);
    rotate_sentry(group, ctx);

    let split = partition(group, &*ctx.world);
    let assessment = assess_threats(group, &*ctx.world);
    establish_priorities(group, &split, &assessment, ctx);

    Ok(HandlerOutcome::observe(group, alertness, action))
}
