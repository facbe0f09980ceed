//! Persona-driven load scenarios for the help-desk chat service.
//!
//! A [`LoadRunner`] spawns simulated sessions drawn from a [`Profile`]'s
//! persona mix. Each session authenticates, then loops over weighted actions
//! (polling, chatting, working the expert queue) with think time in between,
//! against a shared [`chatload_registry::UserRegistry`].

pub mod config;
pub mod context;
pub mod error;
pub mod persona;
pub mod profile;
pub mod runner;
pub mod scheduler;
pub mod session;
pub mod stats;

pub use config::{BehaviorConfig, ScenarioConfig};
pub use context::SimContext;
pub use error::{ConfigError, ScenarioError, SessionError};
pub use persona::{drive, Persona};
pub use profile::{Action, ConversationScope, PersonaKind, PersonaSpec, Profile, WaitTime};
pub use runner::LoadRunner;
pub use scheduler::{Scheduler, ScriptedScheduler, TokioScheduler};
pub use session::{AuthOrder, Session};
pub use stats::{EndpointReport, Report, RequestStats, SessionCounts, SessionStats};
