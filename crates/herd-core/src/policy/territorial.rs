//! Territorial herds
//!
//! Behave like neutral herds until a threat stands inside their territory,
//! where they attack with probability `aggression` and posture otherwise.
//! A badly hurt leader breaks the herd as well as a recent adult death.

use serde::{Deserialize, Serialize};

use herd_types::{Alertness, GroupAction, SimTime};

use super::neutral::recent_death;
use crate::context::TickContext;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerritorialParams {
    pub confidence: f64,
    /// Chance to attack trespassers outright
    pub aggression: f64,
    pub break_window_secs: u64,
    /// Leader health below this fraction breaks the herd
    pub injury_threshold: f32,
    pub calm_range: u32,
    /// De-escalation draw range at Aggressive and above
    pub top_calm_range: u32,
}

impl Default for TerritorialParams {
    fn default() -> Self {
        Self {
            confidence: 1.0,
            aggression: 0.5,
            break_window_secs: 600,
            injury_threshold: 0.25,
            calm_range: 120,
            top_calm_range: 60,
        }
    }
}

impl TerritorialParams {
    pub fn should_break(
        &self,
        last_adult_death: Option<SimTime>,
        leader_health: Option<f32>,
        now: SimTime,
    ) -> bool {
        recent_death(last_adult_death, now, self.break_window_secs)
            || leader_health.is_some_and(|health| health < self.injury_threshold)
    }

    pub fn calm_range_at(&self, alertness: Alertness) -> u32 {
        if alertness >= Alertness::Aggressive {
            self.top_calm_range
        } else {
            self.calm_range
        }
    }

    pub fn threat_response(&self, ratio: f64, trespass: bool, ctx: &mut TickContext<'_>) -> GroupAction {
        if trespass {
            if ctx.chance(self.aggression) {
                GroupAction::AttackThreats
            } else {
                GroupAction::Posture
            }
        } else if ratio >= self.confidence {
            GroupAction::Posture
        } else {
            GroupAction::AvoidThreat
        }
    }
}
