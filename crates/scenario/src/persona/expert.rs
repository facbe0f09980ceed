use super::{ignored, Persona};
use crate::context::SimContext;
use crate::error::SessionError;
use crate::profile::{Action, PersonaSpec};
use crate::session::{chance, AuthOrder, Session};
use async_trait::async_trait;
use chatload_sdk::{ExpertQueue, ResourceId};
use rand::seq::SliceRandom;
use tracing::debug;

/// Help-desk expert: watches the queue, claims waiting conversations and
/// answers in the ones it holds.
///
/// The claimed list is this session's belief only. It gains every id the
/// server reports as assigned and every claim the server accepted; it is
/// never reconciled beyond that.
#[derive(Debug)]
pub struct ExpertPersona {
    spec: PersonaSpec,
    session: Session,
    claimed: Vec<ResourceId>,
}

impl ExpertPersona {
    pub fn new(spec: PersonaSpec, ctx: SimContext) -> Self {
        let session = Session::new(ctx, spec.kind);
        Self {
            spec,
            session,
            claimed: Vec::new(),
        }
    }

    pub fn claimed(&self) -> &[ResourceId] {
        &self.claimed
    }

    fn remember(&mut self, id: ResourceId) {
        if !self.claimed.contains(&id) {
            self.claimed.push(id);
        }
    }

    async fn poll_queue(&mut self) {
        let Some(ExpertQueue { waiting, assigned }) = self.session.poll_expert_queue().await
        else {
            return;
        };
        for id in assigned {
            self.remember(id);
        }

        let probability = self.session.context().behavior.claim_probability;
        if waiting.is_empty() || !chance(probability) {
            return;
        }
        let Some(candidate) = pick(&waiting) else {
            return;
        };
        // Other experts race for the same conversation; only a claim the
        // server accepted counts.
        if self.session.claim(&candidate).await {
            self.remember(candidate);
        }
    }

    async fn respond(&mut self) {
        match pick(&self.claimed) {
            Some(conversation) => {
                self.session.send_message(&conversation).await;
            }
            None => debug!(persona = %self.spec.kind, "respond skipped: nothing claimed"),
        }
    }
}

fn pick(ids: &[ResourceId]) -> Option<ResourceId> {
    ids.choose(&mut rand::thread_rng()).cloned()
}

#[async_trait]
impl Persona for ExpertPersona {
    fn spec(&self) -> &PersonaSpec {
        &self.spec
    }

    fn session(&self) -> &Session {
        &self.session
    }

    async fn on_start(&mut self) -> Result<(), SessionError> {
        let ctx = self.session.context();
        let username = ctx.generator.generate_with_prefix(&ctx.behavior.expert_prefix);
        self.session
            .authenticate(username, AuthOrder::LoginFirst)
            .await?;
        Ok(())
    }

    async fn perform(&mut self, action: Action) {
        match action {
            Action::PollQueue => self.poll_queue().await,
            Action::Respond => self.respond().await,
            Action::Poll => {
                self.session.poll(self.spec.polls_queue).await;
            }
            other => ignored(self.spec.kind, other),
        }
    }
}
