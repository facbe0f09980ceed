//! Registry of users and conversations shared by every simulated session.
//!
//! Users and conversations sit behind separate locks; operations on one
//! collection never wait on the other. Nothing is ever removed.

use crate::errors::*;
use crate::types::UserRecord;
use chatload_sdk::ResourceId;
use parking_lot::Mutex;
use rand::seq::{IteratorRandom, SliceRandom};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct UserRegistry {
    /// Username → record
    users: Mutex<HashMap<String, UserRecord>>,
    /// Conversation ids contributed by any persona, in insertion order
    conversations: Mutex<Vec<ResourceId>>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the record for `username` and return it.
    pub fn store_user(
        &self,
        username: impl Into<String>,
        auth_token: Option<String>,
        user_id: Option<ResourceId>,
    ) -> UserRecord {
        let record = UserRecord {
            username: username.into(),
            auth_token,
            user_id,
        };
        self.users
            .lock()
            .insert(record.username.clone(), record.clone());
        record
    }

    /// Uniformly chosen stored user.
    pub fn random_user(&self) -> Result<UserRecord> {
        let users = self.users.lock();
        users
            .values()
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or(RegistryError::EmptyRegistry)
    }

    pub fn get_user(&self, username: &str) -> Option<UserRecord> {
        self.users.lock().get(username).cloned()
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().len()
    }

    pub fn add_conversation(&self, conversation_id: ResourceId) {
        self.conversations.lock().push(conversation_id);
    }

    /// Uniformly chosen known conversation, `None` while the list is empty.
    pub fn random_conversation(&self) -> Option<ResourceId> {
        let conversations = self.conversations.lock();
        conversations.choose(&mut rand::thread_rng()).cloned()
    }

    pub fn conversation_count(&self) -> usize {
        self.conversations.lock().len()
    }

    /// Copy of every known conversation id.
    pub fn conversations(&self) -> Vec<ResourceId> {
        self.conversations.lock().clone()
    }
}
