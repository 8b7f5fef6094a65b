//! Action Dispatcher
//!
//! Maps the group's current action onto world calls: feeding and drinking,
//! searching, bedding down, avoiding, fleeing, retreating, posturing and
//! attacking. Handlers leave busy members alone; they are picked up again on
//! a later tick.
//!
//! Movement is driven through a guide (the leader when it can act). The rest
//! of the group follows through straggler recovery, since the anchor moves
//! with the leader.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;
use std::sync::Arc;

use herd_types::{AgentId, GroupAction, PlaceId, Role};

use crate::alertness::ThreatAssessment;
use crate::context::TickContext;
use crate::emotes;
use crate::error::{EngineError, Result};
use crate::group::GroupRecord;
use crate::partition::Partition;
use crate::policy::GroupPolicy;
use crate::world::{Consumable, ConsumableKind, Exit, RestState, Stance};

/// Runs the handler for the group's current action.
pub fn dispatch(
    group: &mut GroupRecord,
    split: &Partition,
    assessment: &ThreatAssessment,
    ctx: &mut TickContext<'_>,
) -> Result<()> {
    let policy = Arc::clone(group.policy());
    let action = group.action();
    if !policy.handles(action) {
        return Err(EngineError::UnhandledAction {
            policy: policy.name.clone(),
            action,
        });
    }

    let acted = match action {
        GroupAction::Graze => graze(group, split, ctx),
        GroupAction::FindWater => find_water(group, split, ctx),
        GroupAction::FindFood => find_food(group, split, ctx),
        GroupAction::Rest => settle_members(group, RestState::Resting, ctx),
        GroupAction::Sleep => settle_members(group, RestState::Sleeping, ctx),
        GroupAction::AvoidThreat => avoid(group, assessment, ctx),
        GroupAction::Flee => flee(group, assessment, ctx),
        GroupAction::ControlledRetreat => controlled_retreat(group, assessment, ctx),
        GroupAction::Posture => {
            let fighters = members_where(group, |role| policy.is_fighter(role));
            usize::from(emotes::posture(group, &fighters, ctx))
        }
        GroupAction::AttackThreats => {
            let fighters = members_where(group, |role| policy.is_fighter(role));
            engage_threats(group, &fighters, assessment, ctx)
        }
    };

    if acted > 0 {
        tracing::trace!(group = %group.id, %action, acted, "dispatched");
    }
    Ok(())
}

/// Members whose role passes `keep`.
fn members_where(group: &GroupRecord, keep: impl Fn(Role) -> bool) -> Vec<AgentId> {
    group
        .roles
        .iter()
        .filter(|(member, role)| group.contains(member) && keep(**role))
        .map(|(member, _)| member.clone())
        .collect()
}

/// The member that leads movement this tick: the leader if it can act and move,
/// else anyone in the main body who can.
fn guide(group: &GroupRecord, split: &Partition, ctx: &TickContext<'_>) -> Option<AgentId> {
    let leader = group.leader().filter(|leader| split.in_main(leader)).cloned();
    leader
        .into_iter()
        .chain(split.main.iter().cloned())
        .find(|member| !ctx.is_busy(member) && ctx.can_move(member))
}

/// Something to drink: a standing source first, then anything else that quenches thirst.
fn water_at<'c>(items: &'c [Consumable], policy: &GroupPolicy) -> Option<&'c Consumable> {
    items
        .iter()
        .find(|item| item.kind == ConsumableKind::LiquidSource && item.quenches_thirst)
        .or_else(|| {
            items
                .iter()
                .filter(|item| item.quenches_thirst && (policy.eats_carrion() || !item.kind.is_carrion()))
                .min_by_key(|item| item.kind)
        })
}

/// The food needing the least handling that the policy will eat.
fn food_at<'c>(items: &'c [Consumable], policy: &GroupPolicy) -> Option<&'c Consumable> {
    items
        .iter()
        .filter(|item| item.nourishes && (policy.eats_carrion() || !item.kind.is_carrion()))
        .min_by_key(|item| item.kind)
}

fn drink_from(agent: &AgentId, item: &Consumable, ctx: &mut TickContext<'_>) -> bool {
    match item.kind {
        ConsumableKind::LiquidSource | ConsumableKind::LiquidContainer => ctx.world.drink(agent, item),
        _ => ctx.world.eat(agent, item),
    }
}

fn has_source(items: &[Consumable]) -> bool {
    items.iter().any(|item| item.kind == ConsumableKind::LiquidSource)
}

fn graze(group: &mut GroupRecord, split: &Partition, ctx: &mut TickContext<'_>) -> usize {
    let config = ctx.config;
    let settings = &config.dispatch;
    let policy = Arc::clone(group.policy());

    if let Some(anchor) = &split.anchor {
        if group.memory.claim_territory(anchor.place.clone(), ctx.now) {
            group.mark_dirty();
        }
    }

    let mut acted = 0;
    let mut need_water = false;
    let mut need_food = false;

    for member in &split.main {
        if ctx.is_busy(member) {
            continue;
        }
        let Some(at) = ctx.world.placement(member) else {
            continue;
        };

        let items = ctx.world.consumables_at(&at);
        if has_source(&items) && group.memory.shared_mut().note_water(at.place.clone()) {
            group.mark_dirty();
        }

        if ctx.world.is_thirsty(member) && !ctx.chance(settings.drink_skip_chance) {
            match water_at(&items, &policy) {
                Some(source) => {
                    if drink_from(member, source, ctx) {
                        acted += 1;
                    }
                }
                None => need_water = true,
            }
        }

        if ctx.world.is_hungry(member) && !ctx.chance(settings.eat_skip_chance) {
            // Drinking may have used something up.
            let items = ctx.world.consumables_at(&at);
            match food_at(&items, &policy) {
                Some(food) => {
                    if ctx.world.eat(member, food) {
                        acted += 1;
                    }
                }
                None => need_food = true,
            }
        }
    }

    if need_water {
        group.set_action(GroupAction::FindWater);
    } else if need_food {
        group.set_action(GroupAction::FindFood);
    }
    acted
}

/// Path to the closest remembered water, by hops.
fn nearest_known_water(group: &GroupRecord, from: &PlaceId, ctx: &TickContext<'_>) -> Option<Vec<Exit>> {
    let hops = ctx.config.dispatch.water_search_hops;
    group
        .memory
        .shared()
        .known_water
        .iter()
        .filter(|place| *place != from)
        .filter_map(|place| ctx.world.find_path(from, place, hops))
        .filter(|path| !path.is_empty())
        .min_by_key(|path| path.len())
}

fn find_water(group: &mut GroupRecord, split: &Partition, ctx: &mut TickContext<'_>) -> usize {
    let Some(anchor) = split.anchor.clone() else {
        return 0;
    };

    let items = ctx.world.consumables_at(&anchor);
    if has_source(&items) && group.memory.shared_mut().note_water(anchor.place.clone()) {
        group.mark_dirty();
    }
    let thirsty = split.all().any(|member| ctx.world.is_thirsty(member));
    if water_at(&items, group.policy()).is_some() || !thirsty {
        group.set_action(GroupAction::Graze);
        return 0;
    }

    let Some(mover) = guide(group, split, ctx) else {
        return 0;
    };
    if ctx.world.has_path(&mover) {
        return usize::from(ctx.world.advance_path(&mover));
    }

    match nearest_known_water(group, &anchor.place, ctx) {
        Some(path) => {
            tracing::trace!(group = %group.id, guide = %mover, hops = path.len(), "heading for known water");
            ctx.world.set_path(&mover, path);
            usize::from(ctx.world.advance_path(&mover))
        }
        None => wander(group, &mover, ctx),
    }
}

fn find_food(group: &mut GroupRecord, split: &Partition, ctx: &mut TickContext<'_>) -> usize {
    let Some(anchor) = split.anchor.clone() else {
        return 0;
    };
    let policy = Arc::clone(group.policy());

    let items = ctx.world.consumables_at(&anchor);
    let hungry = split.all().any(|member| ctx.world.is_hungry(member));
    if food_at(&items, &policy).is_some() || !hungry {
        group.set_action(GroupAction::Graze);
        return 0;
    }

    let Some(mover) = guide(group, split, ctx) else {
        return 0;
    };
    if ctx.world.has_path(&mover) {
        return usize::from(ctx.world.advance_path(&mover));
    }
    wander(group, &mover, ctx)
}

/// Leaves through a random exit, disfavouring the way the group came in.
fn wander(group: &mut GroupRecord, mover: &AgentId, ctx: &mut TickContext<'_>) -> usize {
    if !ctx.can_move(mover) {
        return 0;
    }
    let Some(here) = ctx.world.placement(mover) else {
        return 0;
    };
    let exits = ctx.world.exits(&here.place);
    let backtrack = ctx.config.dispatch.wander_backtrack_weight.max(0.0);
    let origin = group.memory.shared().last_origin.clone();

    let weights: Vec<f64> = exits
        .iter()
        .map(|exit| {
            if Some(&exit.destination) == origin.as_ref() {
                backtrack
            } else {
                1.0
            }
        })
        .collect();
    let Some(exit) = weighted_exit(&exits, &weights, ctx).cloned() else {
        return 0;
    };

    if !ctx.world.move_through(mover, &exit) {
        return 0;
    }
    tracing::trace!(group = %group.id, guide = %mover, exit = %exit.name, "wandering");
    group.memory.shared_mut().last_origin = Some(here.place);
    group.mark_dirty();
    1
}

/// Rolls against the cumulative weights. Uniform when every weight is zero.
fn weighted_exit<'a>(exits: &'a [Exit], weights: &[f64], ctx: &mut TickContext<'_>) -> Option<&'a Exit> {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return exits.choose(&mut *ctx.rng);
    }

    let mut roll = ctx.rng.gen::<f64>() * total;
    for (exit, weight) in exits.iter().zip(weights) {
        if roll < *weight {
            return Some(exit);
        }
        roll -= weight;
    }
    exits.last()
}

fn settle_members(group: &mut GroupRecord, state: RestState, ctx: &mut TickContext<'_>) -> usize {
    let chance = ctx.config.dispatch.settle_chance;
    let sentry = group.memory.resolve_sentry(&*ctx.world);

    let mut settled = 0;
    for member in &group.members {
        if sentry.as_ref() == Some(member)
            || ctx.is_busy(member)
            || ctx.world.placement(member).is_none()
            || ctx.world.rest_state(member) == state
        {
            continue;
        }
        if ctx.chance(chance) {
            ctx.world.settle(member, state);
            settled += 1;
        }
    }
    settled
}

/// Places the group steers clear of: threats in view and remembered sightings.
fn danger_places(group: &GroupRecord, assessment: &ThreatAssessment) -> BTreeSet<PlaceId> {
    let mut places = assessment.threat_places.clone();
    places.extend(group.memory.shared().known_threats.keys().cloned());
    places
}

/// How strongly a place is exposed to danger within the scan radius. Closer threats weigh more.
fn exposure(place: &PlaceId, danger: &BTreeSet<PlaceId>, scan: u32, ctx: &TickContext<'_>) -> u32 {
    danger
        .iter()
        .filter_map(|threat| ctx.world.hop_distance(place, threat, scan))
        .map(|hops| scan + 1 - hops)
        .sum()
}

/// The exit out of `from` least exposed to danger.
pub fn avoid_exit(from: &PlaceId, danger: &BTreeSet<PlaceId>, ctx: &TickContext<'_>) -> Option<Exit> {
    let scan = ctx.config.dispatch.threat_scan_hops;
    ctx.world
        .exits(from)
        .into_iter()
        .min_by_key(|exit| exposure(&exit.destination, danger, scan, ctx))
}

/// Moves one agent out through the avoid exit of its current place.
fn leave(group: &mut GroupRecord, agent: &AgentId, danger: &BTreeSet<PlaceId>, ctx: &mut TickContext<'_>) -> bool {
    if !ctx.can_move(agent) {
        return false;
    }
    let Some(here) = ctx.world.placement(agent) else {
        return false;
    };
    let Some(exit) = avoid_exit(&here.place, danger, ctx) else {
        return false;
    };
    if !ctx.world.move_through(agent, &exit) {
        return false;
    }
    tracing::trace!(group = %group.id, agent = %agent, exit = %exit.name, "moving away from threats");
    group.memory.shared_mut().last_origin = Some(here.place);
    group.mark_dirty();
    true
}

fn avoid(group: &mut GroupRecord, assessment: &ThreatAssessment, ctx: &mut TickContext<'_>) -> usize {
    let danger = danger_places(group, assessment);
    if danger.is_empty() {
        return 0;
    }
    let mover = group
        .leader()
        .cloned()
        .into_iter()
        .chain(group.members.iter().cloned())
        .find(|member| {
            !ctx.is_busy(member) && ctx.can_move(member) && ctx.world.placement(member).is_some()
        });
    match mover {
        Some(mover) => usize::from(leave(group, &mover, &danger, ctx)),
        None => 0,
    }
}

fn flee(group: &mut GroupRecord, assessment: &ThreatAssessment, ctx: &mut TickContext<'_>) -> usize {
    for member in &group.members {
        if ctx.world.is_alive(member) && ctx.world.stance(member) != Stance::Flee {
            ctx.world.set_stance(member, Stance::Flee);
        }
    }
    avoid(group, assessment, ctx)
}

fn controlled_retreat(group: &mut GroupRecord, assessment: &ThreatAssessment, ctx: &mut TickContext<'_>) -> usize {
    let policy = Arc::clone(group.policy());
    let fighters = members_where(group, |role| policy.is_retreat_fighter(role));
    let others: Vec<AgentId> = group
        .members
        .iter()
        .filter(|member| !fighters.contains(member))
        .cloned()
        .collect();

    let mut acted = engage_threats(group, &fighters, assessment, ctx);

    let danger = danger_places(group, assessment);
    if danger.is_empty() {
        return acted;
    }
    for member in &others {
        if !ctx.is_busy(member) && leave(group, member, &danger, ctx) {
            acted += 1;
        }
    }
    acted
}

/// Each free fighter engages a random visible threat it can reach. Returns how many engaged.
fn engage_threats(
    group: &mut GroupRecord,
    fighters: &[AgentId],
    assessment: &ThreatAssessment,
    ctx: &mut TickContext<'_>,
) -> usize {
    let mut engaged = 0;
    let mut kinds = BTreeSet::new();

    for fighter in fighters {
        if ctx.is_busy(fighter) || ctx.world.in_combat(fighter) {
            continue;
        }
        let targets: Vec<AgentId> = ctx
            .world
            .visible_agents(fighter)
            .into_iter()
            .filter(|seen| assessment.threats.contains(seen) && ctx.world.can_engage(fighter, seen))
            .collect();
        let Some(target) = targets.choose(&mut *ctx.rng).cloned() else {
            continue;
        };
        if ctx.world.engage(fighter, &target) {
            tracing::trace!(group = %group.id, fighter = %fighter, target = %target, "engaging threat");
            kinds.insert(ctx.world.kind_of(&target));
            engaged += 1;
        }
    }

    let recorded = match group.memory.as_predator_mut() {
        Some(pack) if !kinds.is_empty() => {
            pack.engaged_kinds.extend(kinds);
            true
        }
        _ => false,
    };
    if recorded {
        group.mark_dirty();
    }
    engaged
}
