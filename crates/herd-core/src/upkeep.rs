//! General per-member upkeep run every fast tick, before alertness.

use herd_types::GroupAction;

use crate::context::TickContext;
use crate::group::GroupRecord;
use crate::world::{RestState, Stance};

/// Clears stale flee stances, wakes members once the group is up, and keeps
/// the sentry on its feet. Returns how many members were touched.
pub fn maintain_members(group: &mut GroupRecord, ctx: &mut TickContext<'_>) -> usize {
    let action = group.action();
    let rouse_chance = ctx.config.dispatch.rouse_chance;
    let sentry = group.memory.resolve_sentry(&*ctx.world);

    let mut touched = 0;
    for member in &group.members {
        if !ctx.world.is_alive(member) {
            continue;
        }

        if action != GroupAction::Flee && ctx.world.stance(member) == Stance::Flee {
            ctx.world.set_stance(member, Stance::Normal);
            touched += 1;
        }

        if ctx.world.rest_state(member) == RestState::Awake || ctx.is_busy(member) {
            continue;
        }
        let is_sentry = sentry.as_ref() == Some(member);
        if is_sentry || (!action.is_resting() && ctx.chance(rouse_chance)) {
            tracing::trace!(group = %group.id, member = %member, is_sentry, "rousing");
            ctx.world.rouse(member);
            touched += 1;
        }
    }
    touched
}
