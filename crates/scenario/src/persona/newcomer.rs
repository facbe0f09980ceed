use super::{ignored, Persona};
use crate::context::SimContext;
use crate::error::SessionError;
use crate::profile::{Action, PersonaSpec};
use crate::session::{AuthOrder, Session};
use async_trait::async_trait;

/// First-time visitor: registers, opens one conversation, sends one message
/// and then polls occasionally.
#[derive(Debug)]
pub struct NewPersona {
    spec: PersonaSpec,
    session: Session,
}

impl NewPersona {
    pub fn new(spec: PersonaSpec, ctx: SimContext) -> Self {
        let session = Session::new(ctx, spec.kind);
        Self { spec, session }
    }
}

#[async_trait]
impl Persona for NewPersona {
    fn spec(&self) -> &PersonaSpec {
        &self.spec
    }

    fn session(&self) -> &Session {
        &self.session
    }

    async fn on_start(&mut self) -> Result<(), SessionError> {
        let username = self.session.context().generator.generate();
        // Registration can collide with a name another session already took;
        // logging in covers that case.
        self.session
            .authenticate(username, AuthOrder::RegisterFirst)
            .await?;

        if self.session.create_conversation().await {
            if let Some(conversation) = self.session.random_conversation() {
                self.session.send_message(&conversation).await;
            }
        }
        Ok(())
    }

    async fn perform(&mut self, action: Action) {
        match action {
            Action::Poll => {
                self.session.poll(self.spec.polls_queue).await;
            }
            other => ignored(self.spec.kind, other),
        }
    }
}
