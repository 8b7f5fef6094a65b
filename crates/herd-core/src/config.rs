//! Configuration loading for the engine.
//!
//! All tunables are loaded from a TOML configuration file and passed into the
//! engine at startup. Nothing is read from process-wide settings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::emotes::{default_emote_rules, EmoteRule};
use crate::policy::{
    ActiveWindow, FamilyParams, LeaderSex, NeutralParams, PolicyConfig, PolicyKind,
    TerritorialParams, WimpyParams,
};
use herd_types::KindId;

/// Complete engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// General engine settings
    #[serde(default)]
    pub engine: GeneralConfig,
    /// Tick cadence
    #[serde(default)]
    pub ticks: TickConfig,
    /// Behavior memory retention
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Alertness draw ranges
    #[serde(default)]
    pub alertness: AlertnessConfig,
    /// Routine action rotation
    #[serde(default)]
    pub priorities: PriorityConfig,
    /// Action handler tunables
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Straggler and outsider recovery
    #[serde(default)]
    pub recovery: RecoveryConfig,
    /// Role maintenance and sentries
    #[serde(default)]
    pub roles: RoleConfig,
    /// Collective emotes
    #[serde(default)]
    pub emotes: EmoteConfig,
    /// Configured policies by name
    #[serde(default = "default_policies")]
    pub policies: BTreeMap<String, PolicyConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            engine: GeneralConfig::default(),
            ticks: TickConfig::default(),
            memory: MemoryConfig::default(),
            alertness: AlertnessConfig::default(),
            priorities: PriorityConfig::default(),
            dispatch: DispatchConfig::default(),
            recovery: RecoveryConfig::default(),
            roles: RoleConfig::default(),
            emotes: EmoteConfig::default(),
            policies: default_policies(),
        }
    }
}

impl EngineConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Serializes the configuration as a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// General engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Seed for the shared random generator
    pub seed: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self { seed: 42 }
    }
}

/// Fast and slow handler cadence, in simulated seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    pub fast_interval_secs: u64,
    pub slow_interval_secs: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            fast_interval_secs: 10,
            slow_interval_secs: 60,
        }
    }
}

/// Behavior memory retention.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Threat locations older than this are forgotten (12 simulated hours)
    pub threat_memory_secs: u64,
    /// Territory not grazed for this long is given up (3 simulated days)
    pub territory_memory_secs: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            threat_memory_secs: 12 * herd_types::SECONDS_PER_HOUR,
            territory_memory_secs: 72 * herd_types::SECONDS_PER_HOUR,
        }
    }
}

/// Draw ranges for the stepwise alertness evaluator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertnessConfig {
    /// Escalation draw is taken from `0..escalation_range` and compared to the threat count
    pub escalation_range: u32,
    /// Default de-escalation draw range, compared to the main group size
    pub calm_range: u32,
}

impl Default for AlertnessConfig {
    fn default() -> Self {
        Self {
            escalation_range: 100,
            calm_range: 120,
        }
    }
}

/// Chances gating routine action changes on the slow tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityConfig {
    /// Chance to settle into Rest outside the active window
    pub rest_chance: f64,
    /// Chance to go from Rest to Sleep outside the active window
    pub sleep_chance: f64,
    /// Chance to get up from Rest or Sleep inside the active window
    pub wake_chance: f64,
    /// Chance of a short rest during the active window
    pub idle_rest_chance: f64,
}

impl Default for PriorityConfig {
    fn default() -> Self {
        Self {
            rest_chance: 0.2,
            sleep_chance: 0.15,
            wake_chance: 0.25,
            idle_rest_chance: 0.02,
        }
    }
}

/// Action handler tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Per-member chance to skip drinking this tick
    pub drink_skip_chance: f64,
    /// Per-member chance to skip eating this tick
    pub eat_skip_chance: f64,
    /// Per-member chance to settle toward rest or sleep this tick
    pub settle_chance: f64,
    /// Per-member chance to get up when the group is no longer resting
    pub rouse_chance: f64,
    /// Search bound when pathing to known water
    pub water_search_hops: u32,
    /// Search bound when weighing exits against threat places
    pub threat_scan_hops: u32,
    /// Relative weight of the exit back to where the group just came from
    pub wander_backtrack_weight: f64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            drink_skip_chance: 0.5,
            eat_skip_chance: 0.5,
            settle_chance: 0.3,
            rouse_chance: 0.5,
            water_search_hops: 12,
            threat_scan_hops: 3,
            wander_backtrack_weight: 0.25,
        }
    }
}

/// Straggler and outsider recovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Search bound for straggler paths back to the anchor
    pub straggler_search_hops: u32,
    /// Search bound around the anchor for an outsider vantage point
    pub outsider_search_hops: u32,
    /// Minimum hops an outsider keeps between itself and any threat place
    pub outsider_min_threat_distance: u32,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            straggler_search_hops: 10,
            outsider_search_hops: 6,
            outsider_min_threat_distance: 2,
        }
    }
}

/// Role maintenance and sentry duty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleConfig {
    /// Chance per slow tick that a co-located outsider is folded into the group
    pub outsider_integration_chance: f64,
    /// Chance per slow tick that sentry duty passes to another member
    pub sentry_rotation_chance: f64,
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self {
            outsider_integration_chance: 0.05,
            sentry_rotation_chance: 0.1,
        }
    }
}

/// Collective emote settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmoteConfig {
    /// Minimum time between ambient emotes
    pub min_interval_secs: u64,
    /// Chance per fast tick to emote once the interval has passed
    pub emote_chance: f64,
    /// Minimum time between posturing displays
    pub posture_interval_secs: u64,
    /// Emote table; an empty table disables emotes
    pub rules: Vec<EmoteRule>,
}

impl Default for EmoteConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: 300,
            emote_chance: 0.1,
            posture_interval_secs: 60,
            rules: default_emote_rules(),
        }
    }
}

/// Policies available when no `[policies]` table is configured.
pub fn default_policies() -> BTreeMap<String, PolicyConfig> {
    let mut policies = BTreeMap::new();
    policies.insert(
        "plains_herd".to_string(),
        PolicyConfig {
            kind: PolicyKind::Neutral(NeutralParams::default()),
            leader_sex: LeaderSex::Male,
            active_window: ActiveWindow::Diurnal,
            untrusted_kinds: vec![KindId::from("wolf"), KindId::from("human")],
        },
    );
    policies.insert(
        "skittish_herd".to_string(),
        PolicyConfig {
            kind: PolicyKind::Wimpy(WimpyParams::default()),
            leader_sex: LeaderSex::Female,
            active_window: ActiveWindow::Crepuscular,
            untrusted_kinds: vec![KindId::from("wolf"), KindId::from("human"), KindId::from("fox")],
        },
    );
    policies.insert(
        "bull_herd".to_string(),
        PolicyConfig {
            kind: PolicyKind::Territorial(TerritorialParams::default()),
            leader_sex: LeaderSex::Male,
            active_window: ActiveWindow::Diurnal,
            untrusted_kinds: vec![KindId::from("wolf"), KindId::from("human")],
        },
    );
    policies.insert(
        "wolf_family".to_string(),
        PolicyConfig {
            kind: PolicyKind::FamilyPredator(FamilyParams::default()),
            leader_sex: LeaderSex::Any,
            active_window: ActiveWindow::Nocturnal,
            untrusted_kinds: vec![KindId::from("human"), KindId::from("bear")],
        },
    );
    policies
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    /// Error parsing TOML config
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
    /// Error writing TOML config
    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
}

/// Generates a default configuration file content.
pub fn default_config_toml() -> String {
    r#"# Group AI engine configuration

[engine]
seed = 42

[ticks]
fast_interval_secs = 10
slow_interval_secs = 60

[memory]
threat_memory_secs = 43200
territory_memory_secs = 259200

[alertness]
escalation_range = 100
calm_range = 120

[priorities]
rest_chance = 0.2
sleep_chance = 0.15
wake_chance = 0.25
idle_rest_chance = 0.02

[dispatch]
drink_skip_chance = 0.5
eat_skip_chance = 0.5
settle_chance = 0.3
rouse_chance = 0.5
water_search_hops = 12
threat_scan_hops = 3
wander_backtrack_weight = 0.25

[recovery]
straggler_search_hops = 10
outsider_search_hops = 6
outsider_min_threat_distance = 2

[roles]
outsider_integration_chance = 0.05
sentry_rotation_chance = 0.1

# Emote rules default to the built-in table unless [[emotes.rules]] entries are given.
[emotes]
min_interval_secs = 300
emote_chance = 0.1
posture_interval_secs = 60

[policies.plains_herd]
kind = "neutral"
leader_sex = "male"
active_window = "diurnal"
untrusted_kinds = ["wolf", "human"]
confidence = 1.5
break_window_secs = 600
calm_range = 120

[policies.skittish_herd]
kind = "wimpy"
leader_sex = "female"
active_window = "crepuscular"
untrusted_kinds = ["wolf", "human", "fox"]
calm_range = 120

[policies.bull_herd]
kind = "territorial"
leader_sex = "male"
active_window = "diurnal"
untrusted_kinds = ["wolf", "human"]
confidence = 1.0
aggression = 0.5
break_window_secs = 600
injury_threshold = 0.25
calm_range = 120
top_calm_range = 60

[policies.wolf_family]
kind = "family_predator"
leader_sex = "any"
active_window = "nocturnal"
untrusted_kinds = ["human", "bear"]
confidence = 0.75
break_health = 0.3
break_window_secs = 900
dominance_bonus = 0.5
calm_range = 120
top_calm_range = 60
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();

        assert_eq!(config.ticks.fast_interval_secs, 10);
        assert_eq!(config.ticks.slow_interval_secs, 60);
        assert_eq!(config.memory.threat_memory_secs, 43_200);
        assert_eq!(config.memory.territory_memory_secs, 259_200);
        assert_eq!(config.alertness.escalation_range, 100);
        assert_eq!(config.alertness.calm_range, 120);
        assert_eq!(config.policies.len(), 4);
        assert!(!config.emotes.rules.is_empty());
    }

    #[test]
    fn test_default_config_toml_parses() {
        let config = EngineConfig::from_str(&default_config_toml()).unwrap();

        assert_eq!(config.engine.seed, 42);
        assert_eq!(config.recovery.outsider_min_threat_distance, 2);
        assert!(matches!(
            config.policies["bull_herd"].kind,
            PolicyKind::Territorial(TerritorialParams { top_calm_range: 60, .. })
        ));
        assert!(matches!(
            config.policies["skittish_herd"].kind,
            PolicyKind::Wimpy(_)
        ));
        assert_eq!(config.policies["wolf_family"].leader_sex, LeaderSex::Any);
        // Emote rules fall back to the built-in table
        assert!(!config.emotes.rules.is_empty());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
            [ticks]
            fast_interval_secs = 5
        "#;

        let config = EngineConfig::from_str(toml).unwrap();

        assert_eq!(config.ticks.fast_interval_secs, 5);
        assert_eq!(config.ticks.slow_interval_secs, 60);
        assert_eq!(config.dispatch.water_search_hops, 12);
        assert_eq!(config.policies.len(), 4);
    }

    #[test]
    fn test_policy_params_default_when_omitted() {
        let toml = r#"
            [policies.goats]
            kind = "neutral"
        "#;

        let config = EngineConfig::from_str(toml).unwrap();

        assert_eq!(config.policies.len(), 1);
        let goats = &config.policies["goats"];
        assert_eq!(goats.leader_sex, LeaderSex::Any);
        assert_eq!(goats.active_window, ActiveWindow::Diurnal);
        match &goats.kind {
            PolicyKind::Neutral(params) => {
                assert_eq!(params.confidence, NeutralParams::default().confidence);
                assert_eq!(params.calm_range, 120);
            }
            other => panic!("unexpected policy kind {:?}", other),
        }
    }

    #[test]
    fn test_unknown_policy_kind_rejected() {
        let toml = r#"
            [policies.dragons]
            kind = "hoarder"
        "#;

        assert!(EngineConfig::from_str(toml).is_err());
    }

    #[test]
    fn test_config_to_toml() {
        let config = EngineConfig::default();
        let toml = config.to_toml().unwrap();

        assert!(toml.contains("[ticks]"));
        assert!(toml.contains("[alertness]"));
        assert!(toml.contains("plains_herd"));
    }

    #[test]
    fn test_custom_emote_rules_replace_defaults() {
        let toml = r#"
            [[emotes.rules]]
            text = "$0 honks."
            action = "graze"
        "#;

        let config = EngineConfig::from_str(toml).unwrap();

        assert_eq!(config.emotes.rules.len(), 1);
        assert_eq!(config.emotes.rules[0].text, "$0 honks.");
        assert_eq!(config.emotes.min_interval_secs, 300);
    }

    #[test]
    fn test_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("herd.toml");
        std::fs::write(&path, "[memory]\nthreat_memory_secs = 3600\n").unwrap();

        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config.memory.threat_memory_secs, 3600);

        let missing = EngineConfig::from_file(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::IoError(_))));
    }
}
