//! Per-session state and the API calls personas are built from.
//!
//! Only authentication can fail a session. Every other call reports success
//! as a `bool`; a rejected or unreachable request is logged at debug level
//! and the action becomes a no-op.

use crate::context::SimContext;
use crate::error::SessionError;
use crate::profile::{ConversationScope, PersonaKind};
use chatload_registry::{UserRecord, UserRegistry};
use chatload_sdk::{Credentials, Endpoint, ExpertQueue, ResourceId};
use chrono::{DateTime, SecondsFormat, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, warn};

/// Which call a session tries first when authenticating. The other one is
/// the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOrder {
    LoginFirst,
    RegisterFirst,
}

/// Conversations a session can send messages to.
#[derive(Debug)]
pub enum ConversationPool {
    Shared(Arc<UserRegistry>),
    Own(Vec<ResourceId>),
}

impl ConversationPool {
    fn for_scope(scope: ConversationScope, registry: &Arc<UserRegistry>) -> Self {
        match scope {
            ConversationScope::Global => ConversationPool::Shared(Arc::clone(registry)),
            ConversationScope::Local => ConversationPool::Own(Vec::new()),
        }
    }

    pub fn add(&mut self, id: ResourceId) {
        match self {
            ConversationPool::Shared(registry) => registry.add_conversation(id),
            ConversationPool::Own(ids) => ids.push(id),
        }
    }

    pub fn random(&self) -> Option<ResourceId> {
        match self {
            ConversationPool::Shared(registry) => registry.random_conversation(),
            ConversationPool::Own(ids) => ids.choose(&mut rand::thread_rng()).cloned(),
        }
    }

    pub fn snapshot(&self) -> Vec<ResourceId> {
        match self {
            ConversationPool::Shared(registry) => registry.conversations(),
            ConversationPool::Own(ids) => ids.clone(),
        }
    }
}

#[derive(Debug)]
pub struct Session {
    ctx: SimContext,
    kind: PersonaKind,
    user: Option<UserRecord>,
    /// Completion time of the last fully successful update poll.
    last_poll: Option<DateTime<Utc>>,
    /// Completion time of the last successful expert-queue poll.
    last_queue_poll: Option<DateTime<Utc>>,
    conversations: ConversationPool,
}

impl Session {
    pub fn new(ctx: SimContext, kind: PersonaKind) -> Self {
        let conversations = ConversationPool::for_scope(ctx.scope, &ctx.registry);
        Self {
            ctx,
            kind,
            user: None,
            last_poll: None,
            last_queue_poll: None,
            conversations,
        }
    }

    pub fn context(&self) -> &SimContext {
        &self.ctx
    }

    pub fn kind(&self) -> PersonaKind {
        self.kind
    }

    pub fn user(&self) -> Option<&UserRecord> {
        self.user.as_ref()
    }

    /// `since` value the next update poll will send.
    pub fn poll_cursor(&self) -> Option<String> {
        self.last_poll.map(format_cursor)
    }

    pub fn known_conversations(&self) -> Vec<ResourceId> {
        self.conversations.snapshot()
    }

    pub fn random_conversation(&self) -> Option<ResourceId> {
        self.conversations.random()
    }

    /// Log in or register as `username` (password = username), falling back
    /// to the other call when the first is rejected. The account is stored
    /// in the shared registry on success.
    pub async fn authenticate(
        &mut self,
        username: String,
        order: AuthOrder,
    ) -> Result<UserRecord, SessionError> {
        let credentials = Credentials::mirrored(username);
        let attempts = match order {
            AuthOrder::LoginFirst => [Endpoint::Login, Endpoint::Register],
            AuthOrder::RegisterFirst => [Endpoint::Register, Endpoint::Login],
        };

        for endpoint in attempts {
            if let Some(record) = self.try_auth(endpoint, &credentials).await {
                self.user = Some(record.clone());
                return Ok(record);
            }
        }

        warn!(
            persona = %self.kind,
            username = %credentials.username,
            "login and registration both failed"
        );
        Err(SessionError::AuthFailure {
            persona: self.kind,
            username: credentials.username,
        })
    }

    async fn try_auth(&self, endpoint: Endpoint, credentials: &Credentials) -> Option<UserRecord> {
        let client = &self.ctx.client;
        let result = match endpoint {
            Endpoint::Register => client.register(credentials).await,
            _ => client.login(credentials).await,
        };
        match result {
            Ok(auth) => Some(self.ctx.registry.store_user(
                credentials.username.clone(),
                auth.token,
                auth.user_id,
            )),
            Err(err) => {
                debug!(persona = %self.kind, username = %credentials.username, "{endpoint} rejected: {err}");
                None
            }
        }
    }

    /// Create a conversation titled `Conversation <n>` and remember its id.
    /// Returns whether the server accepted the request.
    pub async fn create_conversation(&mut self) -> bool {
        let Some(token) = self.token("create conversation") else {
            return false;
        };
        let title = format!("Conversation {}", random_suffix());
        match self
            .ctx
            .client
            .create_conversation(token.as_deref(), &title)
            .await
        {
            Ok(Some(id)) => {
                self.conversations.add(id);
                true
            }
            Ok(None) => true,
            Err(err) => {
                debug!(persona = %self.kind, "create conversation failed: {err}");
                false
            }
        }
    }

    pub async fn send_message(&self, conversation_id: &ResourceId) -> bool {
        let Some(token) = self.token("send message") else {
            return false;
        };
        let content = format!("msg-{}", random_suffix());
        match self
            .ctx
            .client
            .send_message(token.as_deref(), conversation_id, &content)
            .await
        {
            Ok(()) => true,
            Err(err) => {
                debug!(persona = %self.kind, conversation = %conversation_id, "send message failed: {err}");
                false
            }
        }
    }

    /// Check conversation and message updates, plus the expert queue when
    /// `include_queue` is set. The cursor only advances when every request
    /// succeeded.
    pub async fn poll(&mut self, include_queue: bool) -> bool {
        let Some(user) = self.user.clone() else {
            debug!(persona = %self.kind, "poll skipped: not authenticated");
            return false;
        };
        let since = self.poll_cursor();
        let token = user.token();
        let user_id = user.user_id.as_ref();
        let client = &self.ctx.client;

        let mut ok = true;
        if let Err(err) = client
            .conversation_updates(token, user_id, since.as_deref())
            .await
        {
            debug!(persona = %self.kind, "conversation poll failed: {err}");
            ok = false;
        }
        if let Err(err) = client.message_updates(token, user_id, since.as_deref()).await {
            debug!(persona = %self.kind, "message poll failed: {err}");
            ok = false;
        }
        if include_queue {
            if let Err(err) = client
                .expert_queue_updates(token, user_id, since.as_deref())
                .await
            {
                debug!(persona = %self.kind, "queue poll failed: {err}");
                ok = false;
            }
        }

        if ok {
            self.last_poll = Some(Utc::now());
        }
        ok
    }

    /// Fetch the expert queue using this session's own queue cursor.
    pub async fn poll_expert_queue(&mut self) -> Option<ExpertQueue> {
        let user = self.user.clone()?;
        let since = self.last_queue_poll.map(format_cursor);
        match self
            .ctx
            .client
            .expert_queue_updates(user.token(), user.user_id.as_ref(), since.as_deref())
            .await
        {
            Ok(queue) => {
                self.last_queue_poll = Some(Utc::now());
                Some(queue)
            }
            Err(err) => {
                debug!(persona = %self.kind, "queue poll failed: {err}");
                None
            }
        }
    }

    /// Ask the server to assign `conversation_id` to this session's user.
    pub async fn claim(&self, conversation_id: &ResourceId) -> bool {
        let Some(token) = self.token("claim") else {
            return false;
        };
        match self
            .ctx
            .client
            .claim_conversation(token.as_deref(), conversation_id)
            .await
        {
            Ok(()) => true,
            Err(err) => {
                debug!(persona = %self.kind, conversation = %conversation_id, "claim rejected: {err}");
                false
            }
        }
    }

    /// Token of the authenticated user; the outer `None` means nobody is
    /// logged in and the action is skipped.
    fn token(&self, action: &str) -> Option<Option<String>> {
        match &self.user {
            Some(user) => Some(user.auth_token.clone()),
            None => {
                debug!(persona = %self.kind, "{action} skipped: not authenticated");
                None
            }
        }
    }
}

/// True with probability `p`. Values outside [0, 1] saturate.
pub(crate) fn chance(p: f64) -> bool {
    rand::thread_rng().gen::<f64>() < p
}

fn random_suffix() -> u32 {
    rand::thread_rng().gen_range(1..=1_000_000)
}

fn format_cursor(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}
