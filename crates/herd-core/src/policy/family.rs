//! Family predators
//!
//! Packs in which every non-child fights and elders cover a controlled
//! retreat. The pack breaks when its leader is badly hurt or an adult died
//! recently, unless one of its children is under attack. Rivals of the pack's
//! own kind inside its territory are threats, and kinds the pack has driven
//! off before are faced with extra confidence.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use herd_types::{AgentId, Alertness, GroupAction, KindId, SimTime};

use super::neutral::recent_death;
use crate::memory::BehaviorMemory;
use crate::world::GroupWorld;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FamilyParams {
    pub confidence: f64,
    /// Leader health below this fraction breaks the pack
    pub break_health: f32,
    pub break_window_secs: u64,
    /// Added to the fighter ratio, scaled by the share of threats whose kind was driven off before
    pub dominance_bonus: f64,
    pub calm_range: u32,
    /// De-escalation draw range at Aggressive and Broken
    pub top_calm_range: u32,
}

impl Default for FamilyParams {
    fn default() -> Self {
        Self {
            confidence: 0.75,
            break_health: 0.3,
            break_window_secs: 900,
            dominance_bonus: 0.5,
            calm_range: 120,
            top_calm_range: 60,
        }
    }
}

impl FamilyParams {
    pub fn should_break(
        &self,
        last_adult_death: Option<SimTime>,
        leader_health: Option<f32>,
        child_attacked: bool,
        now: SimTime,
    ) -> bool {
        if child_attacked {
            return false;
        }
        leader_health.is_some_and(|health| health < self.break_health)
            || recent_death(last_adult_death, now, self.break_window_secs)
    }

    pub fn calm_range_at(&self, alertness: Alertness) -> u32 {
        if matches!(alertness, Alertness::Aggressive | Alertness::Broken) {
            self.top_calm_range
        } else {
            self.calm_range
        }
    }

    pub fn threat_response(&self, ratio: f64, dominated: usize, threats: usize) -> GroupAction {
        let bonus = if threats == 0 {
            0.0
        } else {
            self.dominance_bonus * dominated as f64 / threats as f64
        };
        if ratio + bonus >= self.confidence {
            GroupAction::Posture
        } else {
            GroupAction::AvoidThreat
        }
    }
}

/// A same-kind stranger standing inside the pack's territory.
pub(crate) fn is_rival(
    world: &dyn GroupWorld,
    members: &BTreeSet<AgentId>,
    memory: &BehaviorMemory,
    candidate: &AgentId,
    kind: &KindId,
) -> bool {
    let Some(place) = world.placement(candidate).map(|p| p.place) else {
        return false;
    };
    memory.in_territory(&place) && members.iter().any(|member| &world.kind_of(member) == kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::PredatorMemory;
    use crate::sandbox::{SandboxAgent, SandboxWorld};
    use herd_types::PlaceId;

    #[test]
    fn test_child_under_attack_overrides_break() {
        let params = FamilyParams::default();
        let now = SimTime::from_secs(1_000);

        assert!(params.should_break(None, Some(0.1), false, now));
        assert!(!params.should_break(None, Some(0.1), true, now));
        assert!(params.should_break(Some(SimTime::from_secs(900)), Some(1.0), false, now));
        assert!(!params.should_break(None, Some(0.8), false, now));
    }

    #[test]
    fn test_dominance_adds_confidence() {
        let params = FamilyParams::default();
        // Half a fighter per threat is short of 0.75 on its own
        assert_eq!(params.threat_response(0.5, 0, 2), GroupAction::AvoidThreat);
        assert_eq!(params.threat_response(0.5, 2, 2), GroupAction::Posture);
    }

    #[test]
    fn test_rival_inside_territory() {
        let mut world = SandboxWorld::new();
        world.add_place("den");
        world.add_place("ridge");
        world.add_agent(SandboxAgent::new("wolf_01", "wolf", "den"));
        world.add_agent(SandboxAgent::new("lone_wolf", "wolf", "den"));
        world.add_agent(SandboxAgent::new("far_wolf", "wolf", "ridge"));

        let mut pack = PredatorMemory::default();
        pack.territory.insert(PlaceId::from("den"), SimTime::from_secs(0));
        let memory = BehaviorMemory::Predator(pack);
        let members: BTreeSet<AgentId> = [AgentId::from("wolf_01")].into_iter().collect();
        let wolf = KindId::from("wolf");

        assert!(is_rival(&world, &members, &memory, &AgentId::from("lone_wolf"), &wolf));
        assert!(!is_rival(&world, &members, &memory, &AgentId::from("far_wolf"), &wolf));
    }
}
