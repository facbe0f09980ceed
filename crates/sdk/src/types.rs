use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned identifier. The service emits user ids as JSON numbers
/// and conversation ids as strings, so both shapes are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    Number(i64),
    Text(String),
}

impl ResourceId {
    /// An empty or whitespace-only string id; it cannot address a resource.
    pub fn is_blank(&self) -> bool {
        matches!(self, ResourceId::Text(s) if s.trim().is_empty())
    }

    pub(crate) fn usable(id: Option<ResourceId>) -> Option<ResourceId> {
        id.filter(|id| !id.is_blank())
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Number(n) => write!(f, "{n}"),
            ResourceId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ResourceId {
    fn from(value: i64) -> Self {
        ResourceId::Number(value)
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        ResourceId::Text(value.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(value: String) -> Self {
        ResourceId::Text(value)
    }
}

/// Username/password pair posted to `/auth/login` and `/auth/register`.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Load-test accounts use the username as password.
    pub fn mirrored(username: impl Into<String>) -> Self {
        let username = username.into();
        Self {
            password: username.clone(),
            username,
        }
    }
}

/// Outcome of a successful login or registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub token: Option<String>,
    pub user_id: Option<ResourceId>,
}

/// Waiting and assigned conversations visible to an expert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpertQueue {
    pub waiting: Vec<ResourceId>,
    pub assigned: Vec<ResourceId>,
}

impl ExpertQueue {
    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty() && self.assigned.is_empty()
    }
}

// --- wire views ---

#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<AuthUserView>,
}

#[derive(Debug, Deserialize)]
struct AuthUserView {
    #[serde(default)]
    id: Option<ResourceId>,
}

impl From<AuthResponse> for AuthSession {
    fn from(value: AuthResponse) -> Self {
        Self {
            token: value.token,
            user_id: value.user.and_then(|u| u.id),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct NewConversation<'a> {
    pub title: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConversationCreated {
    #[serde(default)]
    pub id: Option<ResourceId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewMessage<'a> {
    pub conversation_id: String,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ConversationRef {
    #[serde(default)]
    id: Option<ResourceId>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueueSnapshotView {
    #[serde(default)]
    waiting_conversations: Vec<ConversationRef>,
    #[serde(default)]
    assigned_conversations: Vec<ConversationRef>,
}

/// The queue endpoint has been observed both as a bare object and wrapped in
/// a list; either shape is flattened into one `ExpertQueue`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum QueueResponse {
    Many(Vec<QueueSnapshotView>),
    One(QueueSnapshotView),
}

impl From<QueueResponse> for ExpertQueue {
    fn from(value: QueueResponse) -> Self {
        let snapshots = match value {
            QueueResponse::Many(list) => list,
            QueueResponse::One(single) => vec![single],
        };
        let mut queue = ExpertQueue::default();
        for snapshot in snapshots {
            queue.waiting.extend(
                snapshot
                    .waiting_conversations
                    .into_iter()
                    .filter_map(|c| ResourceId::usable(c.id)),
            );
            queue.assigned.extend(
                snapshot
                    .assigned_conversations
                    .into_iter()
                    .filter_map(|c| ResourceId::usable(c.id)),
            );
        }
        queue
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub errors: Option<Vec<String>>,
}
