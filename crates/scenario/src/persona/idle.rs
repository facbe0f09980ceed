use super::{ignored, Persona};
use crate::context::SimContext;
use crate::error::SessionError;
use crate::profile::{Action, PersonaSpec};
use crate::session::{AuthOrder, Session};
use async_trait::async_trait;

/// Logged in with the browser open: only polls for updates.
#[derive(Debug)]
pub struct IdlePersona {
    spec: PersonaSpec,
    session: Session,
}

impl IdlePersona {
    pub fn new(spec: PersonaSpec, ctx: SimContext) -> Self {
        let session = Session::new(ctx, spec.kind);
        Self { spec, session }
    }
}

#[async_trait]
impl Persona for IdlePersona {
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
