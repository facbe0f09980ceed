use super::{ignored, Persona};
use crate::context::SimContext;
use crate::error::SessionError;
use crate::profile::{Action, PersonaSpec};
use crate::session::{chance, AuthOrder, Session};
use async_trait::async_trait;
use tracing::debug;

/// Chats: sends messages, opens conversations now and then, and polls.
#[derive(Debug)]
pub struct ActivePersona {
    spec: PersonaSpec,
    session: Session,
}

impl ActivePersona {
    pub fn new(spec: PersonaSpec, ctx: SimContext) -> Self {
        let session = Session::new(ctx, spec.kind);
        Self { spec, session }
    }

    async fn send_message(&mut self) {
        match self.session.random_conversation() {
            Some(conversation) => {
                self.session.send_message(&conversation).await;
            }
            None => {
                debug!(persona = %self.spec.kind, "no known conversation, creating one");
                self.session.create_conversation().await;
            }
        }
    }

    async fn maybe_create_conversation(&mut self) {
        let probability = self
            .session
            .context()
            .behavior
            .conversation_create_probability;
        if chance(probability) {
            self.session.create_conversation().await;
        }
    }
}

#[async_trait]
impl Persona for ActivePersona {
    fn spec(&self) -> &PersonaSpec {
        &self.spec
    }

    fn session(&self) -> &Session {
        &self.session
    }

    async fn on_start(&mut self) -> Result<(), SessionError> {
        let username = self.session.context().generator.generate();
        self.session
            .authenticate(username, AuthOrder::LoginFirst)
            .await?;
        // Seed one conversation so the first send has somewhere to go.
        self.session.create_conversation().await;
        Ok(())
    }

    async fn perform(&mut self, action: Action) {
        match action {
            Action::SendMessage => self.send_message().await,
            Action::CreateConversation => self.maybe_create_conversation().await,
            Action::Poll => {
                self.session.poll(self.spec.polls_queue).await;
            }
            other => ignored(self.spec.kind, other),
        }
    }
}
