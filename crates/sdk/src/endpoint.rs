//! Chat-service endpoints and the status codes each one treats as success.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Endpoint {
    Login,
    Register,
    CreateConversation,
    SendMessage,
    ConversationUpdates,
    MessageUpdates,
    ExpertQueueUpdates,
    ClaimConversation,
    Health,
}

impl Endpoint {
    pub const ALL: [Endpoint; 9] = [
        Endpoint::Login,
        Endpoint::Register,
        Endpoint::CreateConversation,
        Endpoint::SendMessage,
        Endpoint::ConversationUpdates,
        Endpoint::MessageUpdates,
        Endpoint::ExpertQueueUpdates,
        Endpoint::ClaimConversation,
        Endpoint::Health,
    ];

    /// Label used when aggregating request statistics. Path parameters are
    /// collapsed so every claim lands in the same bucket.
    pub fn name(self) -> &'static str {
        match self {
            Endpoint::Login => "/auth/login",
            Endpoint::Register => "/auth/register",
            Endpoint::CreateConversation => "/conversations#create",
            Endpoint::SendMessage => "/messages#create",
            Endpoint::ConversationUpdates => "/api/conversations/updates",
            Endpoint::MessageUpdates => "/api/messages/updates",
            Endpoint::ExpertQueueUpdates => "/api/expert-queue/updates",
            Endpoint::ClaimConversation => "/expert/conversations/[id]/claim",
            Endpoint::Health => "/health",
        }
    }

    pub fn method(self) -> reqwest::Method {
        match self {
            Endpoint::ConversationUpdates
            | Endpoint::MessageUpdates
            | Endpoint::ExpertQueueUpdates
            | Endpoint::Health => reqwest::Method::GET,
            _ => reqwest::Method::POST,
        }
    }

    pub fn accepts(self, status: u16) -> bool {
        match self {
            Endpoint::Register | Endpoint::CreateConversation | Endpoint::SendMessage => {
                matches!(status, 200 | 201)
            }
            _ => status == 200,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method(), self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_only_accepts_ok() {
        assert!(Endpoint::Login.accepts(200));
        assert!(!Endpoint::Login.accepts(201));
        assert!(!Endpoint::Login.accepts(401));
    }

    #[test]
    fn creation_endpoints_accept_created() {
        for endpoint in [
            Endpoint::Register,
            Endpoint::CreateConversation,
            Endpoint::SendMessage,
        ] {
            assert!(endpoint.accepts(200), "{endpoint}");
            assert!(endpoint.accepts(201), "{endpoint}");
            assert!(!endpoint.accepts(422), "{endpoint}");
        }
    }

    #[test]
    fn polls_and_claims_require_ok() {
        for endpoint in [
            Endpoint::ConversationUpdates,
            Endpoint::MessageUpdates,
            Endpoint::ExpertQueueUpdates,
            Endpoint::ClaimConversation,
        ] {
            assert!(endpoint.accepts(200));
            assert!(!endpoint.accepts(201));
            assert!(!endpoint.accepts(422));
        }
    }

    #[test]
    fn display_includes_method() {
        assert_eq!(Endpoint::Login.to_string(), "POST /auth/login");
        assert_eq!(
            Endpoint::ExpertQueueUpdates.to_string(),
            "GET /api/expert-queue/updates"
        );
    }
}
