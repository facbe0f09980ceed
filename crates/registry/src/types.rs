use chatload_sdk::ResourceId;
use serde::Serialize;

/// Account created (or logged into) by a simulated session. Never mutated
/// after it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub username: String,
    pub auth_token: Option<String>,
    pub user_id: Option<ResourceId>,
}

impl UserRecord {
    pub fn token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }
}
