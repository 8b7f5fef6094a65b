//! Neutral herds: posture when the herd outnumbers the threat, otherwise move away.

use serde::{Deserialize, Serialize};

use herd_types::{GroupAction, SimTime};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeutralParams {
    /// Fighters per threat needed to posture instead of avoiding
    pub confidence: f64,
    /// An adult death this recent breaks the herd
    pub break_window_secs: u64,
    /// De-escalation draw range; zero falls back to the engine default
    pub calm_range: u32,
}

impl Default for NeutralParams {
    fn default() -> Self {
        Self {
            confidence: 1.5,
            break_window_secs: 600,
            calm_range: 120,
        }
    }
}

impl NeutralParams {
    pub fn should_break(&self, last_adult_death: Option<SimTime>, now: SimTime) -> bool {
        recent_death(last_adult_death, now, self.break_window_secs)
    }

    pub fn threat_response(&self, ratio: f64) -> GroupAction {
        if ratio >= self.confidence {
            GroupAction::Posture
        } else {
            GroupAction::AvoidThreat
        }
    }
}

/// True when an adult died within the window ending now.
pub(crate) fn recent_death(last_adult_death: Option<SimTime>, now: SimTime, window_secs: u64) -> bool {
    last_adult_death.is_some_and(|died| now.secs_since(died) <= window_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breaks_only_on_recent_death() {
        let params = NeutralParams::default();
        let now = SimTime::from_secs(10_000);

        assert!(!params.should_break(None, now));
        assert!(params.should_break(Some(SimTime::from_secs(9_500)), now));
        assert!(!params.should_break(Some(SimTime::from_secs(1_000)), now));
    }

    #[test]
    fn test_confidence_threshold() {
        let params = NeutralParams::default();
        assert_eq!(params.threat_response(2.0), GroupAction::Posture);
        assert_eq!(params.threat_response(1.5), GroupAction::Posture);
        assert_eq!(params.threat_response(1.0), GroupAction::AvoidThreat);
    }
}
