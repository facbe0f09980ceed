//! Shared state for simulated chat users.
//!
//! [`UsernameGenerator`] hands out a deterministic sequence of account names
//! and [`UserRegistry`] collects the accounts and conversations that
//! concurrent personas create, so they can discover and act on each other's
//! data.

pub mod errors;
pub mod generator;
pub mod store;
pub mod types;

pub use errors::*;
pub use generator::{CounterMode, GeneratorConfig, UsernameGenerator, DEFAULT_MAX_USERS, MULTIPLIERS};
pub use store::UserRegistry;
pub use types::UserRecord;
