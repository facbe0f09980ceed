use crate::profile::PersonaKind;
use chatload_registry::GeneratorError;
use chatload_sdk::SdkError;
use thiserror::Error;

/// Failure that ends one simulated session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{persona} session could not log in or register as {username}")]
    AuthFailure {
        persona: PersonaKind,
        username: String,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Failure that prevents a run from starting.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("username generator: {0}")]
    Generator(#[from] GeneratorError),

    #[error("client setup: {0}")]
    Client(#[from] SdkError),

    #[error("health check against {host} failed: {source}")]
    HealthCheck {
        host: String,
        #[source]
        source: SdkError,
    },

    #[error("stats setup: {0}")]
    Stats(String),
}
