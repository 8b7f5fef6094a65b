//! Group Emotes
//!
//! Ambient and posturing emotes, chosen from a configurable table by the
//! group's current action, alertness and the actor's role. Both kinds are
//! rate limited through timestamps kept in behavior memory.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use herd_types::{AgentId, Alertness, GroupAction, Role};

use crate::context::TickContext;
use crate::group::GroupRecord;

/// One row of the emote table. `$0` in the text stands for the actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmoteRule {
    pub text: String,
    /// Only while the group performs this action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<GroupAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_alertness: Option<Alertness>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_alertness: Option<Alertness>,
    /// Only for actors holding this role
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl EmoteRule {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: None,
            min_alertness: None,
            max_alertness: None,
            role: None,
        }
    }

    pub fn during(mut self, action: GroupAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn between(mut self, min: Alertness, max: Alertness) -> Self {
        self.min_alertness = Some(min);
        self.max_alertness = Some(max);
        self
    }

    pub fn at_least(mut self, min: Alertness) -> Self {
        self.min_alertness = Some(min);
        self
    }

    pub fn for_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Whether the rule applies to the group's state, ignoring the actor.
    pub fn matches(&self, action: GroupAction, alertness: Alertness) -> bool {
        self.action.map_or(true, |a| a == action)
            && self.min_alertness.map_or(true, |min| alertness >= min)
            && self.max_alertness.map_or(true, |max| alertness <= max)
    }
}

/// The built-in emote table.
pub fn default_emote_rules() -> Vec<EmoteRule> {
    vec![
        EmoteRule::new("$0 grazes contentedly.")
            .during(GroupAction::Graze)
            .between(Alertness::NotAlert, Alertness::NotAlert),
        EmoteRule::new("$0 lifts its head and sniffs the air.")
            .during(GroupAction::Graze)
            .between(Alertness::NotAlert, Alertness::Wary),
        EmoteRule::new("$0 tests the breeze for the scent of water.").during(GroupAction::FindWater),
        EmoteRule::new("$0 noses through the undergrowth.").during(GroupAction::FindFood),
        EmoteRule::new("$0 shifts its weight and dozes.").during(GroupAction::Rest),
        EmoteRule::new("$0 stamps nervously, ears swiveling.")
            .between(Alertness::Wary, Alertness::Agitated),
        EmoteRule::new("$0 snorts a warning to the others.")
            .at_least(Alertness::Agitated)
            .for_role(Role::Leader),
        EmoteRule::new("$0 lowers its head and paws the ground threateningly.")
            .during(GroupAction::Posture),
        EmoteRule::new("$0 rears up and bellows a challenge!")
            .during(GroupAction::Posture)
            .for_role(Role::Leader),
        EmoteRule::new("$0 bolts in panic!").during(GroupAction::Flee),
    ]
}

/// Members able to emote right now, optionally restricted to a role.
fn candidates(group: &GroupRecord, role: Option<Role>, ctx: &TickContext<'_>) -> Vec<AgentId> {
    group
        .members
        .iter()
        .filter(|m| role.map_or(true, |r| group.role_of(m) == Some(r)))
        .filter(|m| ctx.world.placement(m).is_some() && !ctx.is_busy(m))
        .cloned()
        .collect()
}

/// Picks a matching rule with an available actor and emits it. Returns true if anything was said.
fn emit_from(
    group: &GroupRecord,
    rules: &[&EmoteRule],
    eligible: Option<&[AgentId]>,
    ctx: &mut TickContext<'_>,
) -> bool {
    let mut options: Vec<(&EmoteRule, Vec<AgentId>)> = rules
        .iter()
        .filter_map(|rule| {
            let mut actors = candidates(group, rule.role, ctx);
            if let Some(eligible) = eligible {
                actors.retain(|a| eligible.contains(a));
            }
            (!actors.is_empty()).then_some((*rule, actors))
        })
        .collect();

    if options.is_empty() {
        return false;
    }
    let index = ctx.rng.gen_range(0..options.len());
    let (rule, actors) = options.swap_remove(index);
    let Some(actor) = actors.choose(&mut *ctx.rng).cloned() else {
        return false;
    };
    let Some(at) = ctx.world.placement(&actor) else {
        return false;
    };

    tracing::trace!(group = %group.id, actor = %actor, text = %rule.text, "group emote");
    ctx.world.emote(&at, &actor, &rule.text);
    true
}

/// Ambient emote check run at the start of every fast tick.
pub fn check_emote(group: &mut GroupRecord, ctx: &mut TickContext<'_>) -> bool {
    let config = ctx.config;
    let settings = &config.emotes;
    if settings.rules.is_empty() {
        return false;
    }
    if let Some(last) = group.memory.shared().last_emote {
        if ctx.now.secs_since(last) < settings.min_interval_secs {
            return false;
        }
    }
    if !ctx.chance(settings.emote_chance) {
        return false;
    }

    let rules: Vec<&EmoteRule> = settings
        .rules
        .iter()
        .filter(|rule| rule.matches(group.action(), group.alertness()))
        .collect();

    let emitted = emit_from(group, &rules, None, ctx);
    if emitted {
        group.memory.shared_mut().last_emote = Some(ctx.now);
        group.mark_dirty();
    }
    emitted
}

/// Posturing display by one of the group's fighters, rate limited.
pub fn posture(group: &mut GroupRecord, fighters: &[AgentId], ctx: &mut TickContext<'_>) -> bool {
    if let Some(last) = group.memory.shared().last_posture {
        if ctx.now.secs_since(last) < ctx.config.emotes.posture_interval_secs {
            return false;
        }
    }

    let config = ctx.config;
    let rules: Vec<&EmoteRule> = config
        .emotes
        .rules
        .iter()
        .filter(|rule| rule.action == Some(GroupAction::Posture))
        .filter(|rule| rule.matches(GroupAction::Posture, group.alertness()))
        .collect();

    let emitted = emit_from(group, &rules, Some(fighters), ctx);
    if emitted {
        group.memory.shared_mut().last_posture = Some(ctx.now);
        group.mark_dirty();
    }
    emitted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::policy::PolicyRegistry;
    use crate::sandbox::{SandboxAgent, SandboxWorld};
    use herd_types::SimTime;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn herd(world: &mut SandboxWorld, config: &EngineConfig) -> GroupRecord {
        world.add_place("meadow");
        world.add_agent(SandboxAgent::new("deer_01", "deer", "meadow"));
        world.add_agent(SandboxAgent::new("deer_02", "deer", "meadow"));
        let policy = PolicyRegistry::from_config(config).get("plains_herd").unwrap();
        let mut group = GroupRecord::new(policy, [AgentId::from("deer_01"), AgentId::from("deer_02")]);
        group.roles.insert(AgentId::from("deer_01"), Role::Leader);
        group.roles.insert(AgentId::from("deer_02"), Role::Adult);
        group
    }

    #[test]
    fn test_rule_matching() {
        let rule = EmoteRule::new("$0 stamps.")
            .during(GroupAction::Graze)
            .between(Alertness::Wary, Alertness::Agitated);

        assert!(rule.matches(GroupAction::Graze, Alertness::Wary));
        assert!(!rule.matches(GroupAction::Graze, Alertness::NotAlert));
        assert!(!rule.matches(GroupAction::Graze, Alertness::Broken));
        assert!(!rule.matches(GroupAction::Rest, Alertness::Wary));
    }

    #[test]
    fn test_emote_is_rate_limited() {
        let mut config = EngineConfig::default();
        config.emotes.emote_chance = 1.0;
        let mut world = SandboxWorld::new().at(SimTime::from_secs(1_000));
        let mut group = herd(&mut world, &config);
        let mut rng = SmallRng::seed_from_u64(1);

        {
            let mut ctx = TickContext::new(&mut world, &mut rng, &config);
            assert!(check_emote(&mut group, &mut ctx));
            assert!(!check_emote(&mut group, &mut ctx));
        }
        assert_eq!(world.emotes().len(), 1);
        assert!(world.emotes()[0].text.contains("$0"));

        world.advance(config.emotes.min_interval_secs);
        let mut ctx = TickContext::new(&mut world, &mut rng, &config);
        assert!(check_emote(&mut group, &mut ctx));
    }

    #[test]
    fn test_empty_table_disables_emotes() {
        let mut config = EngineConfig::default();
        config.emotes.emote_chance = 1.0;
        config.emotes.rules.clear();
        let mut world = SandboxWorld::new();
        let mut group = herd(&mut world, &config);
        let mut rng = SmallRng::seed_from_u64(1);
        let mut ctx = TickContext::new(&mut world, &mut rng, &config);

        assert!(!check_emote(&mut group, &mut ctx));
    }

    #[test]
    fn test_posture_uses_fighters_and_rate_limit() {
        let config = EngineConfig::default();
        let mut world = SandboxWorld::new().at(SimTime::from_secs(500));
        let mut group = herd(&mut world, &config);
        let mut rng = SmallRng::seed_from_u64(9);
        let fighters = vec![AgentId::from("deer_02")];

        {
            let mut ctx = TickContext::new(&mut world, &mut rng, &config);
            assert!(posture(&mut group, &fighters, &mut ctx));
            assert!(!posture(&mut group, &fighters, &mut ctx));
        }
        let emote = &world.emotes()[0];
        assert_eq!(emote.actor, AgentId::from("deer_02"));
        assert_eq!(emote.text, "$0 lowers its head and paws the ground threateningly.");
    }
}
