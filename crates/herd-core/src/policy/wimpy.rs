//! Wimpy herds never posture or fight. Anything past Wary sends them running.

use serde::{Deserialize, Serialize};

use herd_types::GroupAction;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WimpyParams {
    pub calm_range: u32,
}

impl Default for WimpyParams {
    fn default() -> Self {
        Self { calm_range: 120 }
    }
}

pub fn threat_response() -> GroupAction {
    GroupAction::Flee
}

pub fn combat_response() -> GroupAction {
    GroupAction::Flee
}

pub fn handles(action: GroupAction) -> bool {
    !matches!(
        action,
        GroupAction::Posture | GroupAction::AttackThreats | GroupAction::ControlledRetreat
    )
}
