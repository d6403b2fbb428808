//! REST client for the conversation API.

use renraku_server::infrastructure::dto::http::{
    ConversationSummaryDto, CreateConversationRequest, MarkReadRequest, MessageDto,
    PostMessageRequest,
};

use crate::error::ClientError;

/// HTTP client for conversation CRUD and message history.
///
/// リアルタイムでない操作（会話一覧、履歴、投稿、既読化）は REST を使う。
/// 投稿結果のファンアウトはサーバー側が WebSocket で行う。
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// # Arguments
    ///
    /// * `base_url` - Server base URL without a trailing slash
    ///   (e.g., "http://127.0.0.1:8080")
    pub fn new(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    pub async fn create_conversation(
        &self,
        company_id: &str,
        freelancer_id: &str,
    ) -> Result<ConversationSummaryDto, ClientError> {
        let response = self
            .http
            .post(format!("{}/api/conversations", self.base_url))
            .json(&CreateConversationRequest {
                company_id: company_id.to_string(),
                freelancer_id: freelancer_id.to_string(),
            })
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn list_conversations(
        &self,
        user_id: &str,
    ) -> Result<Vec<ConversationSummaryDto>, ClientError> {
        let response = self
            .http
            .get(format!("{}/api/conversations", self.base_url))
            .query(&[("user_id", user_id)])
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn message_history(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<Vec<MessageDto>, ClientError> {
        let response = self
            .http
            .get(format!(
                "{}/api/conversations/{}/messages",
                self.base_url, conversation_id
            ))
            .query(&[("user_id", user_id)])
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn post_message(
        &self,
        conversation_id: &str,
        sender_id: &str,
        content: &str,
        attachment: Option<String>,
    ) -> Result<MessageDto, ClientError> {
        let response = self
            .http
            .post(format!(
                "{}/api/conversations/{}/messages",
                self.base_url, conversation_id
            ))
            .json(&PostMessageRequest {
                sender_id: sender_id.to_string(),
                content: content.to_string(),
                attachment,
            })
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn mark_read(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<ConversationSummaryDto, ClientError> {
        let response = self
            .http
            .post(format!(
                "{}/api/conversations/{}/read",
                self.base_url, conversation_id
            ))
            .json(&MarkReadRequest {
                user_id: user_id.to_string(),
            })
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        if !response.status().is_success() {
            return Err(ClientError::ApiStatus(response.status()));
        }
        Ok(response.json().await?)
    }
}
