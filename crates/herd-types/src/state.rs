//! Group State Types
//!
//! Roles, alertness levels and collective actions shared by the engine and
//! the persisted snapshots.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Social role of a member within its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Infant or child-aged member
    Child,
    /// Youth-aged member, part of the main group but not a fighter
    Juvenile,
    /// Adult not eligible for leadership
    Adult,
    /// Adult eligible for leadership
    Pretender,
    /// Senior member
    Elder,
    /// Current leader; the group anchors on the leader's location
    Leader,
    /// Peripheral member not yet folded into the main group
    Outsider,
}

impl Role {
    /// Leader, Pretender and Adult: the roles whose loss counts as an adult death.
    pub fn is_adult_tier(self) -> bool {
        matches!(self, Role::Leader | Role::Pretender | Role::Adult)
    }

    /// Roles that keep a group from being "outsiders only".
    pub fn is_core(self) -> bool {
        matches!(self, Role::Leader | Role::Elder | Role::Pretender | Role::Adult)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Child => "child",
            Role::Juvenile => "juvenile",
            Role::Adult => "adult",
            Role::Pretender => "pretender",
            Role::Elder => "elder",
            Role::Leader => "leader",
            Role::Outsider => "outsider",
        };
        f.write_str(name)
    }
}

/// Group threat posture, totally ordered from calm to broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Alertness {
    #[default]
    NotAlert,
    Wary,
    Agitated,
    VeryAgitated,
    Aggressive,
    Broken,
}

impl Alertness {
    /// All levels in ascending order.
    pub const ALL: [Alertness; 6] = [
        Alertness::NotAlert,
        Alertness::Wary,
        Alertness::Agitated,
        Alertness::VeryAgitated,
        Alertness::Aggressive,
        Alertness::Broken,
    ];

    /// The next level up, or `None` at Broken.
    pub fn escalated(self) -> Option<Alertness> {
        match self {
            Alertness::NotAlert => Some(Alertness::Wary),
            Alertness::Wary => Some(Alertness::Agitated),
            Alertness::Agitated => Some(Alertness::VeryAgitated),
            Alertness::VeryAgitated => Some(Alertness::Aggressive),
            Alertness::Aggressive => Some(Alertness::Broken),
            Alertness::Broken => None,
        }
    }

    /// The next level down, or `None` at NotAlert.
    pub fn calmed(self) -> Option<Alertness> {
        match self {
            Alertness::NotAlert => None,
            Alertness::Wary => Some(Alertness::NotAlert),
            Alertness::Agitated => Some(Alertness::Wary),
            Alertness::VeryAgitated => Some(Alertness::Agitated),
            Alertness::Aggressive => Some(Alertness::VeryAgitated),
            Alertness::Broken => Some(Alertness::Aggressive),
        }
    }

    /// Number of levels between two alertness values.
    pub fn distance(self, other: Alertness) -> usize {
        (self as i32 - other as i32).unsigned_abs() as usize
    }
}

impl fmt::Display for Alertness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Alertness::NotAlert => "not_alert",
            Alertness::Wary => "wary",
            Alertness::Agitated => "agitated",
            Alertness::VeryAgitated => "very_agitated",
            Alertness::Aggressive => "aggressive",
            Alertness::Broken => "broken",
        };
        f.write_str(name)
    }
}

/// The group's current collective behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GroupAction {
    #[default]
    Graze,
    FindFood,
    FindWater,
    Rest,
    Sleep,
    AvoidThreat,
    Flee,
    Posture,
    ControlledRetreat,
    AttackThreats,
}

impl GroupAction {
    /// Actions chosen in response to threats.
    pub fn is_threat_response(self) -> bool {
        matches!(
            self,
            GroupAction::AvoidThreat
                | GroupAction::Flee
                | GroupAction::Posture
                | GroupAction::ControlledRetreat
                | GroupAction::AttackThreats
        )
    }

    pub fn is_resting(self) -> bool {
        matches!(self, GroupAction::Rest | GroupAction::Sleep)
    }
}

impl fmt::Display for GroupAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GroupAction::Graze => "graze",
            GroupAction::FindFood => "find_food",
            GroupAction::FindWater => "find_water",
            GroupAction::Rest => "rest",
            GroupAction::Sleep => "sleep",
            GroupAction::AvoidThreat => "avoid_threat",
            GroupAction::Flee => "flee",
            GroupAction::Posture => "posture",
            GroupAction::ControlledRetreat => "controlled_retreat",
            GroupAction::AttackThreats => "attack_threats",
        };
        f.write_str(name)
    }
}
