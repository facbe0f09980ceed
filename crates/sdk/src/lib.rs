//! Async client for the help-desk chat service.
//!
//! Each call maps one-to-one onto an HTTP endpoint. Responses whose status is
//! outside the endpoint's success set come back as
//! [`SdkError::UnexpectedStatus`]; every request, successful or not, is
//! reported to the attached [`RequestObserver`].

mod endpoint;
mod error;
mod types;

pub use crate::endpoint::Endpoint;
pub use crate::error::SdkError;
pub use crate::types::{AuthSession, Credentials, ExpertQueue, ResourceId};

use crate::types::{
    ApiErrorResponse, AuthResponse, ConversationCreated, NewConversation, NewMessage,
    QueueResponse,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// One completed (or failed) request, as seen by a [`RequestObserver`].
#[derive(Debug, Clone, Copy)]
pub struct RequestRecord {
    pub endpoint: Endpoint,
    /// `None` when the request never produced a response.
    pub status: Option<u16>,
    pub success: bool,
    pub latency: Duration,
}

/// Hook for collecting per-request statistics.
pub trait RequestObserver: Send + Sync {
    fn observe(&self, record: &RequestRecord);
}

#[derive(Clone)]
pub struct ChatClient {
    base_url: Url,
    http: Client,
    observer: Option<Arc<dyn RequestObserver>>,
}

impl fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatClient")
            .field("base_url", &self.base_url.as_str())
            .field("observed", &self.observer.is_some())
            .finish()
    }
}

impl ChatClient {
    /// Create a client for the service at `base_url` (e.g. `http://localhost:3000`).
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self, SdkError> {
        Self::with_http_client(base_url, Client::builder().timeout(timeout).build()?)
    }

    /// Use an existing reqwest client (custom TLS, pooling, proxies).
    pub fn with_http_client(base_url: impl AsRef<str>, http: Client) -> Result<Self, SdkError> {
        let mut url = Url::parse(base_url.as_ref())
            .map_err(|_| SdkError::InvalidBaseUrl(base_url.as_ref().to_string()))?;
        if url.cannot_be_a_base() {
            return Err(SdkError::InvalidBaseUrl(base_url.as_ref().to_string()));
        }
        if !url.path().ends_with('/') {
            let mut path = url.path().trim_end_matches('/').to_owned();
            path.push('/');
            url.set_path(&path);
        }
        Ok(Self {
            base_url: url,
            http,
            observer: None,
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn RequestObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<AuthSession, SdkError> {
        let request = self.request(Endpoint::Login, "auth/login")?.json(credentials);
        let response = self.execute(Endpoint::Login, request).await?;
        Ok(Self::decode::<AuthResponse>(Endpoint::Login, response)
            .await?
            .into())
    }

    pub async fn register(&self, credentials: &Credentials) -> Result<AuthSession, SdkError> {
        let request = self
            .request(Endpoint::Register, "auth/register")?
            .json(credentials);
        let response = self.execute(Endpoint::Register, request).await?;
        Ok(Self::decode::<AuthResponse>(Endpoint::Register, response)
            .await?
            .into())
    }

    /// Create a conversation; returns the server-assigned id when the
    /// response carries a non-blank one.
    pub async fn create_conversation(
        &self,
        token: Option<&str>,
        title: &str,
    ) -> Result<Option<ResourceId>, SdkError> {
        let request = self
            .request(Endpoint::CreateConversation, "conversations")?
            .json(&NewConversation { title });
        let response = self
            .execute(Endpoint::CreateConversation, authorize(request, token))
            .await?;
        let created =
            Self::decode::<ConversationCreated>(Endpoint::CreateConversation, response).await?;
        Ok(ResourceId::usable(created.id))
    }

    pub async fn send_message(
        &self,
        token: Option<&str>,
        conversation_id: &ResourceId,
        content: &str,
    ) -> Result<(), SdkError> {
        let request = self
            .request(Endpoint::SendMessage, "messages")?
            .json(&NewMessage {
                conversation_id: conversation_id.to_string(),
                content,
            });
        self.execute(Endpoint::SendMessage, authorize(request, token))
            .await?;
        Ok(())
    }

    pub async fn conversation_updates(
        &self,
        token: Option<&str>,
        user_id: Option<&ResourceId>,
        since: Option<&str>,
    ) -> Result<(), SdkError> {
        self.poll(
            Endpoint::ConversationUpdates,
            "api/conversations/updates",
            token,
            ("userId", user_id),
            since,
        )
        .await
        .map(drop)
    }

    pub async fn message_updates(
        &self,
        token: Option<&str>,
        user_id: Option<&ResourceId>,
        since: Option<&str>,
    ) -> Result<(), SdkError> {
        self.poll(
            Endpoint::MessageUpdates,
            "api/messages/updates",
            token,
            ("userId", user_id),
            since,
        )
        .await
        .map(drop)
    }

    pub async fn expert_queue_updates(
        &self,
        token: Option<&str>,
        expert_id: Option<&ResourceId>,
        since: Option<&str>,
    ) -> Result<ExpertQueue, SdkError> {
        let response = self
            .poll(
                Endpoint::ExpertQueueUpdates,
                "api/expert-queue/updates",
                token,
                ("expertId", expert_id),
                since,
            )
            .await?;
        Ok(
            Self::decode::<QueueResponse>(Endpoint::ExpertQueueUpdates, response)
                .await?
                .into(),
        )
    }

    pub async fn claim_conversation(
        &self,
        token: Option<&str>,
        conversation_id: &ResourceId,
    ) -> Result<(), SdkError> {
        let path = format!("expert/conversations/{conversation_id}/claim");
        let request = self.request(Endpoint::ClaimConversation, &path)?;
        self.execute(Endpoint::ClaimConversation, authorize(request, token))
            .await?;
        Ok(())
    }

    pub async fn health(&self) -> Result<(), SdkError> {
        let request = self.request(Endpoint::Health, "health")?;
        self.execute(Endpoint::Health, request).await?;
        Ok(())
    }

    async fn poll(
        &self,
        endpoint: Endpoint,
        path: &str,
        token: Option<&str>,
        (id_param, id): (&str, Option<&ResourceId>),
        since: Option<&str>,
    ) -> Result<Response, SdkError> {
        let mut params: Vec<(&str, String)> = Vec::with_capacity(2);
        if let Some(id) = id {
            params.push((id_param, id.to_string()));
        }
        if let Some(since) = since {
            params.push(("since", since.to_string()));
        }
        let request = self.request(endpoint, path)?.query(&params);
        self.execute(endpoint, authorize(request, token)).await
    }

    fn request(&self, endpoint: Endpoint, path: &str) -> Result<RequestBuilder, SdkError> {
        let url = self.base_url.join(path)?;
        Ok(self.http.request(endpoint.method(), url))
    }

    async fn execute(
        &self,
        endpoint: Endpoint,
        request: RequestBuilder,
    ) -> Result<Response, SdkError> {
        let started = Instant::now();
        let result = request.send().await;
        let latency = started.elapsed();

        match result {
            Ok(response) => {
                let status = response.status().as_u16();
                let success = endpoint.accepts(status);
                self.observe(RequestRecord {
                    endpoint,
                    status: Some(status),
                    success,
                    latency,
                });
                if success {
                    Ok(response)
                } else {
                    Err(Self::map_api_error(endpoint, response).await)
                }
            }
            Err(err) => {
                self.observe(RequestRecord {
                    endpoint,
                    status: None,
                    success: false,
                    latency,
                });
                Err(err.into())
            }
        }
    }

    fn observe(&self, record: RequestRecord) {
        if let Some(observer) = &self.observer {
            observer.observe(&record);
        }
    }

    async fn decode<T>(endpoint: Endpoint, response: Response) -> Result<T, SdkError>
    where
        T: DeserializeOwned,
    {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|source| SdkError::Decode { endpoint, source })
    }

    async fn map_api_error(endpoint: Endpoint, response: Response) -> SdkError {
        let status = response.status().as_u16();
        let bytes = response.bytes().await.unwrap_or_default();
        if let Ok(api_error) = serde_json::from_slice::<ApiErrorResponse>(&bytes) {
            if let Some(message) = api_error.error {
                return SdkError::unexpected_status(endpoint, status, message);
            }
            if let Some(errors) = api_error.errors {
                return SdkError::unexpected_status(endpoint, status, errors.join("; "));
            }
        }
        let text = String::from_utf8_lossy(&bytes);
        SdkError::unexpected_status(endpoint, status, text.chars().take(200).collect::<String>())
    }
}

/// Attach `Authorization: Bearer <token>` when a non-empty token is known.
fn authorize(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) if !token.is_empty() => request.bearer_auth(token),
        _ => request,
    }
}
