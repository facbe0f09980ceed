//! Run configuration.
//!
//! Every field has a default, so a TOML file only needs to name what it
//! changes:
//!
//! ```toml
//! host = "https://staging.example.com"
//! users = 500
//! spawn_rate = 1.0
//! run_time_secs = 600
//! profile = "help-desk"
//!
//! [generator]
//! seed = 42
//! mode = "serialized"
//!
//! [behavior]
//! conversation_create_probability = 0.2
//! ```

use crate::error::ConfigError;
use crate::profile::{ConversationScope, Profile};
use chatload_registry::GeneratorConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CREATE_PROBABILITY: f64 = 0.3;
pub const DEFAULT_CLAIM_PROBABILITY: f64 = 0.3;
pub const DEFAULT_EXPERT_PREFIX: &str = "expert";
/// Slowest accepted spawn rate: one session every ~17 minutes.
pub const MIN_SPAWN_RATE: f64 = 0.001;
/// Fastest accepted spawn rate, sessions per second.
pub const MAX_SPAWN_RATE: f64 = 10_000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Base URL of the chat service.
    pub host: String,
    /// Number of concurrent simulated sessions.
    pub users: usize,
    /// Sessions started per second until `users` are running.
    pub spawn_rate: f64,
    /// Stop after this many seconds; run until interrupted when unset.
    pub run_time_secs: Option<u64>,
    pub profile: Profile,
    pub request_timeout_secs: u64,
    /// Call `GET /health` before spawning anyone. Off by default; not every
    /// deployment serves that route.
    pub health_check: bool,
    /// Seeds persona assignment and action scheduling.
    pub rng_seed: Option<u64>,
    pub generator: GeneratorConfig,
    pub behavior: BehaviorConfig,
}

/// Knobs that shape what personas do once running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Falls back to the profile's default when unset.
    pub conversation_scope: Option<ConversationScope>,
    /// Chance that an active persona's create-conversation action fires.
    pub conversation_create_probability: f64,
    /// Chance that an expert tries to claim a waiting conversation per queue poll.
    pub claim_probability: f64,
    pub expert_prefix: String,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:3000".to_string(),
            users: 10,
            spawn_rate: 1.0,
            run_time_secs: None,
            profile: Profile::default(),
            request_timeout_secs: 30,
            health_check: false,
            rng_seed: None,
            generator: GeneratorConfig::default(),
            behavior: BehaviorConfig::default(),
        }
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            conversation_scope: None,
            conversation_create_probability: DEFAULT_CREATE_PROBABILITY,
            claim_probability: DEFAULT_CLAIM_PROBABILITY,
            expert_prefix: DEFAULT_EXPERT_PREFIX.to_string(),
        }
    }
}

impl ScenarioConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::invalid("host", "must not be empty"));
        }
        if self.users == 0 {
            return Err(ConfigError::invalid("users", "must be at least 1"));
        }
        if !(MIN_SPAWN_RATE..=MAX_SPAWN_RATE).contains(&self.spawn_rate) {
            return Err(ConfigError::invalid(
                "spawn_rate",
                format!(
                    "must be between {MIN_SPAWN_RATE} and {MAX_SPAWN_RATE} per second, got {}",
                    self.spawn_rate
                ),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::invalid("request_timeout_secs", "must be at least 1"));
        }
        if self.generator.max_users == 0 {
            return Err(ConfigError::invalid("generator.max_users", "must be at least 1"));
        }
        check_probability(
            "behavior.conversation_create_probability",
            self.behavior.conversation_create_probability,
        )?;
        check_probability("behavior.claim_probability", self.behavior.claim_probability)?;
        if self.behavior.expert_prefix.is_empty() {
            return Err(ConfigError::invalid("behavior.expert_prefix", "must not be empty"));
        }
        Ok(())
    }

    pub fn conversation_scope(&self) -> ConversationScope {
        self.behavior
            .conversation_scope
            .unwrap_or_else(|| self.profile.default_scope())
    }

    pub fn run_time(&self) -> Option<Duration> {
        self.run_time_secs.map(Duration::from_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Delay between two session starts. The rate is clamped to
    /// [`MIN_SPAWN_RATE`, `MAX_SPAWN_RATE`] so the result is never zero.
    pub fn spawn_interval(&self) -> Duration {
        let rate = if self.spawn_rate.is_nan() {
            MIN_SPAWN_RATE
        } else {
            self.spawn_rate.clamp(MIN_SPAWN_RATE, MAX_SPAWN_RATE)
        };
        Duration::try_from_secs_f64(1.0 / rate)
            .unwrap_or(Duration::from_secs(1_000))
            .max(Duration::from_nanos(1))
    }
}

fn check_probability(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{value} is outside [0, 1]")))
    }
}
