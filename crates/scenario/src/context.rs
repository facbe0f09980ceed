use crate::config::{BehaviorConfig, ScenarioConfig};
use crate::error::ScenarioError;
use crate::profile::ConversationScope;
use chatload_registry::{UserRegistry, UsernameGenerator};
use chatload_sdk::{ChatClient, RequestObserver};
use std::sync::Arc;

/// Handles shared by every session of one run. Built once and passed to each
/// persona explicitly.
#[derive(Debug, Clone)]
pub struct SimContext {
    pub client: ChatClient,
    pub registry: Arc<UserRegistry>,
    pub generator: Arc<UsernameGenerator>,
    pub behavior: Arc<BehaviorConfig>,
    pub scope: ConversationScope,
}

impl SimContext {
    pub fn new(
        client: ChatClient,
        registry: Arc<UserRegistry>,
        generator: Arc<UsernameGenerator>,
        behavior: BehaviorConfig,
        scope: ConversationScope,
    ) -> Self {
        Self {
            client,
            registry,
            generator,
            behavior: Arc::new(behavior),
            scope,
        }
    }

    /// Build a fresh client, registry and generator from `config`.
    pub fn from_config(
        config: &ScenarioConfig,
        observer: Option<Arc<dyn RequestObserver>>,
    ) -> Result<Self, ScenarioError> {
        let mut client = ChatClient::new(&config.host, config.request_timeout())?;
        if let Some(observer) = observer {
            client = client.with_observer(observer);
        }
        let generator = UsernameGenerator::new(&config.generator)?;

        Ok(Self::new(
            client,
            Arc::new(UserRegistry::new()),
            Arc::new(generator),
            config.behavior.clone(),
            config.conversation_scope(),
        ))
    }
}
