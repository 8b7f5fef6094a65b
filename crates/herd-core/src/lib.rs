//! Group AI: collective behavior for herds and packs.
//!
//! The engine decides, tick by tick, what each group of agents should be
//! doing as a whole (grazing, resting, fleeing, posturing, attacking) and
//! keeps its members together: it assigns roles, elects leaders, gathers
//! stragglers and tracks how alarmed the group is.
//!
//! The engine owns no agents. Everything it knows about the world comes
//! through the [`GroupWorld`] trait, and everything it does to the world goes
//! back out through it.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐  fast / slow ticks  ┌──────────────┐   GroupWorld calls   ┌───────┐
//! │   Engine   │ ──────────────────▶ │ GroupRecord  │ ───────────────────▶ │ world │
//! └────────────┘                     └──────────────┘                      └───────┘
//! ```
//!
//! # Modules
//!
//! - [`engine`]: Tick driver owning groups, policies and the random generator
//! - [`group`]: The per-group aggregate
//! - [`memory`]: Policy-owned behavior memory
//! - [`policy`]: Closed set of behavior policies
//! - [`roles`]: Role assignment, leader election, sentries
//! - [`partition`]: Main body, stragglers and the third bucket
//! - [`recovery`]: Bringing stragglers and outsiders back
//! - [`alertness`]: Threat assessment and the alertness state machine
//! - [`priorities`]: Action selection
//! - [`dispatch`]: Action handlers
//! - [`emotes`]: Collective emotes
//! - [`sandbox`]: In-memory world for tests and demos

pub mod alertness;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod emotes;
pub mod engine;
pub mod error;
pub mod group;
pub mod memory;
pub mod partition;
pub mod persistence;
pub mod policy;
pub mod priorities;
pub mod recovery;
pub mod roles;
pub mod sandbox;
pub mod tick;
pub mod upkeep;
pub mod world;

// Re-export engine types
pub use engine::{Engine, TickReport};
pub use tick::HandlerOutcome;

// Re-export config types
pub use config::{
    default_config_toml, AlertnessConfig, ConfigError, DispatchConfig, EmoteConfig, EngineConfig,
    GeneralConfig, MemoryConfig, PriorityConfig, RecoveryConfig, RoleConfig, TickConfig,
};

// Re-export error types
pub use error::{EngineError, Result};

// Re-export group and memory types
pub use group::GroupRecord;
pub use memory::{AgentRef, BehaviorMemory, HerdMemory, MemoryFamily, PredatorMemory, TerritorialMemory};

// Re-export policy types
pub use policy::{ActiveWindow, GroupPolicy, LeaderSex, PolicyConfig, PolicyKind, PolicyRegistry};

// Re-export world interface types
pub use world::{
    AgeCategory, AgentStatus, Capabilities, Consumable, ConsumableKind, Exit, GroupWorld,
    LayerShift, RestState, Sex, Stance,
};

pub use alertness::ThreatAssessment;
pub use emotes::EmoteRule;
pub use partition::Partition;
pub use persistence::{read_snapshots, write_snapshots};
