//! Error types for the registry crate

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("max_users must be greater than zero")]
    ZeroMaxUsers,

    #[error("multiplier {multiplier} is not one of the supported primes")]
    UnsupportedMultiplier { multiplier: u64 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("registry holds no users yet")]
    EmptyRegistry,
}

pub type Result<T> = std::result::Result<T, RegistryError>;
