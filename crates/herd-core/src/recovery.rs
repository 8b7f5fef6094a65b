//! Straggler and Outsider Recovery
//!
//! Brings separated members back toward the anchor. Stragglers close the
//! gap directly; outsiders hang back at a spot near the group that keeps its
//! distance from known and visible threats.

use std::collections::BTreeSet;

use herd_types::{AgentId, Layer, PlaceId, Placement};

use crate::context::TickContext;
use crate::group::GroupRecord;
use crate::partition::Partition;
use crate::policy::PolicyFamily;
use crate::world::{Capabilities, LayerShift};

/// The single vertical move that brings `from` closer to `to`, if the agent can make it.
pub fn layer_step(from: Layer, to: Layer, caps: Capabilities) -> Option<LayerShift> {
    if from == to {
        return None;
    }
    if to > from {
        if from.is_underwater() {
            caps.can_swim.then_some(LayerShift::SwimUp)
        } else if to == Layer::InAir {
            if caps.can_fly {
                Some(LayerShift::Fly)
            } else {
                caps.can_climb.then_some(LayerShift::Climb)
            }
        } else {
            caps.can_climb.then_some(LayerShift::Climb)
        }
    } else if from == Layer::InAir {
        caps.can_fly.then_some(LayerShift::Land)
    } else if from.is_in_trees() {
        Some(LayerShift::ClimbDown)
    } else {
        caps.can_swim.then_some(LayerShift::Dive)
    }
}

/// Moves one straggler a step toward the anchor. Returns true if it did anything.
fn recover(agent: &AgentId, anchor: &Placement, ctx: &mut TickContext<'_>) -> bool {
    if !ctx.can_move(agent) {
        return false;
    }
    if ctx.world.has_path(agent) {
        return ctx.world.advance_path(agent);
    }

    let Some(here) = ctx.world.placement(agent) else {
        return false;
    };

    if here.place == anchor.place {
        let caps = ctx.world.capabilities(agent);
        return match layer_step(here.layer, anchor.layer, caps) {
            Some(shift) => {
                tracing::trace!(agent = %agent, ?shift, "straggler changing layer");
                ctx.world.shift_layer(agent, shift)
            }
            None => false,
        };
    }

    let hops = ctx.config.recovery.straggler_search_hops;
    match ctx.world.find_path(&here.place, &anchor.place, hops) {
        Some(path) if !path.is_empty() => {
            tracing::trace!(agent = %agent, hops = path.len(), "straggler heading back");
            ctx.world.set_path(agent, path);
            ctx.world.advance_path(agent)
        }
        _ => false,
    }
}

/// Places currently holding a known or visible threat to the group.
fn threat_places(group: &GroupRecord, watcher: &AgentId, ctx: &TickContext<'_>) -> BTreeSet<PlaceId> {
    let mut places: BTreeSet<PlaceId> = group.memory.shared().known_threats.keys().cloned().collect();
    let policy = group.policy();
    for seen in ctx.world.visible_agents(watcher) {
        if policy.is_threat(&*ctx.world, &group.members, &group.memory, &seen) {
            if let Some(placement) = ctx.world.placement(&seen) {
                places.insert(placement.place);
            }
        }
    }
    places
}

/// A spot near the anchor at a safe remove from every threat place.
pub fn outsider_vantage(
    anchor: &PlaceId,
    threats: &BTreeSet<PlaceId>,
    ctx: &TickContext<'_>,
) -> Option<PlaceId> {
    let settings = &ctx.config.recovery;
    let min_distance = settings.outsider_min_threat_distance;

    let mut candidates = ctx.world.places_within(anchor, settings.outsider_search_hops);
    candidates.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

    candidates
        .into_iter()
        .find(|(place, _)| {
            min_distance == 0
                || threats.iter().all(|threat| {
                    ctx.world
                        .hop_distance(place, threat, min_distance - 1)
                        .is_none()
                })
        })
        .map(|(place, _)| place)
}

fn approach(agent: &AgentId, anchor: &PlaceId, ctx: &mut TickContext<'_>, group: &GroupRecord) -> bool {
    if !ctx.can_move(agent) {
        return false;
    }
    if ctx.world.has_path(agent) {
        return ctx.world.advance_path(agent);
    }
    let Some(here) = ctx.world.placement(agent) else {
        return false;
    };
    if &here.place == anchor {
        return false;
    }

    let threats = threat_places(group, agent, ctx);
    let Some(target) = outsider_vantage(anchor, &threats, ctx) else {
        return false;
    };
    if target == here.place {
        return false;
    }

    let settings = &ctx.config.recovery;
    let hops = settings.straggler_search_hops + settings.outsider_search_hops;
    match ctx.world.find_path(&here.place, &target, hops) {
        Some(path) if !path.is_empty() => {
            tracing::trace!(agent = %agent, target = %target, "outsider closing in");
            ctx.world.set_path(agent, path);
            ctx.world.advance_path(agent)
        }
        _ => false,
    }
}

/// Moves stragglers and outsiders back toward the group. Returns how many agents moved.
pub fn gather_stragglers(group: &GroupRecord, split: &Partition, ctx: &mut TickContext<'_>) -> usize {
    let Some(anchor) = split.anchor.clone() else {
        return 0;
    };

    let mut moved = 0;
    for agent in &split.stragglers {
        if !ctx.is_busy(agent) && recover(agent, &anchor, ctx) {
            moved += 1;
        }
    }

    match group.policy().family() {
        PolicyFamily::Grazer => {
            for outsider in &split.third {
                if !ctx.is_busy(outsider) && approach(outsider, &anchor.place, ctx, group) {
                    moved += 1;
                }
            }
        }
        PolicyFamily::Predator => {
            for vulnerable in &split.third {
                let placed = ctx.world.placement(vulnerable);
                if placed.as_ref() == Some(&anchor) || ctx.is_busy(vulnerable) {
                    continue;
                }
                if recover(vulnerable, &anchor, ctx) {
                    moved += 1;
                }
            }
        }
    }
    moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::partition::partition;
    use crate::policy::PolicyRegistry;
    use crate::sandbox::{SandboxAgent, SandboxWorld};
    use crate::world::GroupWorld;
    use herd_types::{Role, SimTime};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn line_world() -> SandboxWorld {
        // meadow - woods - ridge - cliffs
        let mut world = SandboxWorld::new();
        world.link("meadow", "east", "woods", "west");
        world.link("woods", "east", "ridge", "west");
        world.link("ridge", "east", "cliffs", "west");
        world
    }

    fn herd(roles: &[(&str, Role)]) -> GroupRecord {
        let policy = PolicyRegistry::from_config(&EngineConfig::default())
            .get("plains_herd")
            .unwrap();
        let mut group = GroupRecord::new(policy, roles.iter().map(|(n, _)| AgentId::from(*n)));
        for (name, role) in roles {
            group.roles.insert(AgentId::from(*name), *role);
        }
        group
    }

    #[test]
    fn test_layer_step_choices() {
        let climber = Capabilities { can_climb: true, ..Capabilities::default() };
        let swimmer = Capabilities { can_swim: true, ..Capabilities::default() };
        let flyer = Capabilities { can_fly: true, ..Capabilities::default() };

        assert_eq!(layer_step(Layer::GroundLevel, Layer::InTrees, climber), Some(LayerShift::Climb));
        assert_eq!(layer_step(Layer::GroundLevel, Layer::InTrees, swimmer), None);
        assert_eq!(layer_step(Layer::InTrees, Layer::GroundLevel, Capabilities::default()), Some(LayerShift::ClimbDown));
        assert_eq!(layer_step(Layer::Underwater, Layer::GroundLevel, swimmer), Some(LayerShift::SwimUp));
        assert_eq!(layer_step(Layer::GroundLevel, Layer::Underwater, swimmer), Some(LayerShift::Dive));
        assert_eq!(layer_step(Layer::GroundLevel, Layer::InAir, flyer), Some(LayerShift::Fly));
        assert_eq!(layer_step(Layer::InAir, Layer::GroundLevel, flyer), Some(LayerShift::Land));
        assert_eq!(layer_step(Layer::GroundLevel, Layer::GroundLevel, flyer), None);
    }

    #[test]
    fn test_straggler_walks_back() {
        let mut world = line_world();
        world.add_agent(SandboxAgent::new("lead", "deer", "meadow"));
        world.add_agent(SandboxAgent::new("lost", "deer", "ridge"));
        let group = herd(&[("lead", Role::Leader), ("lost", Role::Adult)]);
        let config = EngineConfig::default();
        let mut rng = SmallRng::seed_from_u64(1);

        let split = partition(&group, &world);
        assert_eq!(split.stragglers, vec![AgentId::from("lost")]);

        let mut ctx = TickContext::new(&mut world, &mut rng, &config);
        assert_eq!(gather_stragglers(&group, &split, &mut ctx), 1);
        assert_eq!(ctx.world.placement(&AgentId::from("lost")), Some(Placement::ground("woods")));
        assert!(ctx.world.has_path(&AgentId::from("lost")));

        assert_eq!(gather_stragglers(&group, &split, &mut ctx), 1);
        assert_eq!(ctx.world.placement(&AgentId::from("lost")), Some(Placement::ground("meadow")));
    }

    #[test]
    fn test_immobile_straggler_stays_put() {
        let mut world = line_world();
        world.add_agent(SandboxAgent::new("lead", "deer", "meadow"));
        world.add_agent(SandboxAgent::new("lame", "deer", "ridge").with_capabilities(Capabilities {
            can_move: false,
            ..Capabilities::default()
        }));
        let group = herd(&[("lead", Role::Leader), ("lame", Role::Adult)]);
        let config = EngineConfig::default();
        let mut rng = SmallRng::seed_from_u64(1);
        let split = partition(&group, &world);
        assert_eq!(split.stragglers, vec![AgentId::from("lame")]);

        let mut ctx = TickContext::new(&mut world, &mut rng, &config);
        assert_eq!(gather_stragglers(&group, &split, &mut ctx), 0);
        assert_eq!(ctx.world.placement(&AgentId::from("lame")), Some(Placement::ground("ridge")));
        assert!(!ctx.world.has_path(&AgentId::from("lame")));
    }

    #[test]
    fn test_busy_straggler_is_deferred() {
        let mut world = line_world();
        world.add_agent(SandboxAgent::new("lead", "deer", "meadow"));
        world.add_agent(SandboxAgent::new("lost", "deer", "ridge").with_status(crate::world::AgentStatus {
            moving: true,
            ..crate::world::AgentStatus::idle()
        }));
        let group = herd(&[("lead", Role::Leader), ("lost", Role::Adult)]);
        let config = EngineConfig::default();
        let mut rng = SmallRng::seed_from_u64(1);
        let split = partition(&group, &world);

        let mut ctx = TickContext::new(&mut world, &mut rng, &config);
        assert_eq!(gather_stragglers(&group, &split, &mut ctx), 0);
        assert_eq!(ctx.world.placement(&AgentId::from("lost")), Some(Placement::ground("ridge")));
    }

    #[test]
    fn test_outsider_keeps_away_from_threats() {
        let mut world = line_world().at(SimTime::from_secs(100));
        world.add_agent(SandboxAgent::new("lead", "deer", "woods"));
        world.add_agent(SandboxAgent::new("stray", "deer", "cliffs"));
        let mut group = herd(&[("lead", Role::Leader), ("stray", Role::Outsider)]);
        group
            .memory
            .shared_mut()
            .note_threat(PlaceId::from("meadow"), SimTime::from_secs(90));

        let config = EngineConfig::default();
        let mut rng = SmallRng::seed_from_u64(1);
        let split = partition(&group, &world);
        assert_eq!(split.third, vec![AgentId::from("stray")]);

        let mut ctx = TickContext::new(&mut world, &mut rng, &config);
        let threats: BTreeSet<PlaceId> = [PlaceId::from("meadow")].into_iter().collect();
        // woods is one hop from the threat, ridge is two
        assert_eq!(
            outsider_vantage(&PlaceId::from("woods"), &threats, &ctx),
            Some(PlaceId::from("ridge"))
        );

        assert_eq!(gather_stragglers(&group, &split, &mut ctx), 1);
        assert_eq!(ctx.world.placement(&AgentId::from("stray")), Some(Placement::ground("ridge")));

        // Already at the vantage point: stays put
        ctx.world.set_path(&AgentId::from("stray"), Vec::new());
        assert_eq!(gather_stragglers(&group, &split, &mut ctx), 0);
    }
}
