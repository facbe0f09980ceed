//! Persona behaviours and the loop that drives them.
//!
//! A session goes `Unauthenticated -> Authenticated` in
//! [`Persona::on_start`], then repeats weighted actions until shutdown.

mod active;
mod expert;
mod idle;
mod newcomer;

pub use active::ActivePersona;
pub use expert::ExpertPersona;
pub use idle::IdlePersona;
pub use newcomer::NewPersona;

use crate::context::SimContext;
use crate::error::SessionError;
use crate::profile::{Action, PersonaKind, PersonaSpec};
use crate::scheduler::Scheduler;
use crate::session::Session;
use async_trait::async_trait;
use tokio::sync::watch;
use tracing::trace;

#[async_trait]
pub trait Persona: Send {
    fn spec(&self) -> &PersonaSpec;

    fn session(&self) -> &Session;

    /// Authenticate and run any one-off setup. An error ends the session.
    async fn on_start(&mut self) -> Result<(), SessionError>;

    /// Run one recurring action. Failures are absorbed.
    async fn perform(&mut self, action: Action);
}

pub fn build(spec: PersonaSpec, ctx: SimContext) -> Box<dyn Persona> {
    match spec.kind {
        PersonaKind::Idle => Box::new(IdlePersona::new(spec, ctx)),
        PersonaKind::Active => Box::new(ActivePersona::new(spec, ctx)),
        PersonaKind::New => Box::new(NewPersona::new(spec, ctx)),
        PersonaKind::Expert => Box::new(ExpertPersona::new(spec, ctx)),
    }
}

/// Run `persona` to completion: startup, then scheduled actions separated by
/// the persona's wait time. Returns once `shutdown` flips to `true` (or its
/// sender goes away) or the scheduler has nothing left to run.
pub async fn drive(
    persona: &mut dyn Persona,
    scheduler: &dyn Scheduler,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), SessionError> {
    tokio::select! {
        biased;
        _ = stopped(&mut shutdown) => return Ok(()),
        started = persona.on_start() => started?,
    }

    let weights: Vec<u32> = persona.spec().actions.iter().map(|(_, w)| *w).collect();
    let wait = persona.spec().wait;

    while let Some(index) = scheduler.pick(&weights) {
        let action = persona.spec().actions[index].0;
        trace!(persona = %persona.spec().kind, ?action, "running action");
        tokio::select! {
            biased;
            _ = stopped(&mut shutdown) => break,
            _ = persona.perform(action) => {}
        }
        tokio::select! {
            biased;
            _ = stopped(&mut shutdown) => break,
            _ = scheduler.pause(wait) => {}
        }
    }
    Ok(())
}

pub(crate) async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

fn ignored(kind: PersonaKind, action: Action) {
    trace!(persona = %kind, ?action, "action not part of this persona");
}
