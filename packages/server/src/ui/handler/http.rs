//! HTTP API endpoint handlers.
//!
//! メッセージ投稿を含む書き込み系は REST で受け付け、結果のファンアウトは
//! UseCase 層が WebSocket 経由で行う。

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    domain::{ConversationId, MessageContent, UserId},
    infrastructure::dto::http::{
        ConversationSummaryDto, CreateConversationRequest, MarkReadRequest, MessageDto,
        PostMessageRequest, UserQuery,
    },
    ui::state::AppState,
    usecase::{CreateConversationError, HistoryError, MarkReadError, SendMessageError},
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Debug endpoint to inspect current presence state (for testing purposes)
pub async fn debug_state(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let (online_users, connection_count) = {
        let registry = state.registry.lock().await;
        (
            registry
                .online_users()
                .into_iter()
                .map(|u| u.into_string())
                .collect::<Vec<_>>(),
            registry.connection_count(),
        )
    };
    let room_count = state.roster.lock().await.room_count();

    Json(serde_json::json!({
        "online_users": online_users,
        "connection_count": connection_count,
        "room_count": room_count,
    }))
}

/// Create a conversation between a company and a freelancer
pub async fn create_conversation(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateConversationRequest>,
) -> Result<(StatusCode, Json<ConversationSummaryDto>), StatusCode> {
    // String -> Domain Model への変換
    let company = UserId::new(req.company_id).map_err(|_| StatusCode::BAD_REQUEST)?;
    let freelancer = UserId::new(req.freelancer_id).map_err(|_| StatusCode::BAD_REQUEST)?;

    match state.create_conversation.execute(company, freelancer).await {
        Ok(conversation) => Ok((StatusCode::CREATED, Json(conversation.into()))),
        Err(CreateConversationError::AlreadyExists(_, _)) => Err(StatusCode::CONFLICT),
        Err(CreateConversationError::StoreFailed(e)) => {
            tracing::error!("Failed to create conversation: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// List the conversations a user participates in, most recently updated first
pub async fn list_conversations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<ConversationSummaryDto>>, StatusCode> {
    let user = UserId::new(query.user_id).map_err(|_| StatusCode::BAD_REQUEST)?;

    let conversations = state.list_conversations.execute(&user).await;
    Ok(Json(conversations.into_iter().map(Into::into).collect()))
}

/// Get the message history of a conversation, oldest first
pub async fn message_history(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<String>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<MessageDto>>, StatusCode> {
    let user = UserId::new(query.user_id).map_err(|_| StatusCode::BAD_REQUEST)?;
    let conversation_id =
        ConversationId::new(conversation_id).map_err(|_| StatusCode::BAD_REQUEST)?;

    match state.message_history.execute(&user, &conversation_id).await {
        Ok(messages) => Ok(Json(messages.into_iter().map(Into::into).collect())),
        Err(HistoryError::ConversationNotFound(_)) => Err(StatusCode::NOT_FOUND),
        Err(HistoryError::NotAParticipant(_, _)) => Err(StatusCode::FORBIDDEN),
    }
}

/// Post a message to a conversation
///
/// 永続化とルームメンバーへのファンアウトは DeliverMessageUseCase が行い、
/// ここでは正規化されたレコードを投稿者に返すだけ。
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<String>,
    Json(req): Json<PostMessageRequest>,
) -> Result<(StatusCode, Json<MessageDto>), StatusCode> {
    let sender = UserId::new(req.sender_id).map_err(|_| StatusCode::BAD_REQUEST)?;
    let conversation_id =
        ConversationId::new(conversation_id).map_err(|_| StatusCode::BAD_REQUEST)?;
    let content = MessageContent::new(req.content).map_err(|_| StatusCode::BAD_REQUEST)?;

    match state
        .deliver_message
        .execute(sender, conversation_id, content, req.attachment)
        .await
    {
        Ok(message) => Ok((StatusCode::CREATED, Json(message.into()))),
        Err(SendMessageError::ConversationNotFound(_)) => Err(StatusCode::NOT_FOUND),
        Err(SendMessageError::NotAParticipant(_, _)) => Err(StatusCode::FORBIDDEN),
        Err(SendMessageError::PersistFailed(e)) => {
            tracing::error!("Failed to persist message: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Mark a conversation as read for a user
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<String>,
    Json(req): Json<MarkReadRequest>,
) -> Result<Json<ConversationSummaryDto>, StatusCode> {
    let user = UserId::new(req.user_id).map_err(|_| StatusCode::BAD_REQUEST)?;
    let conversation_id =
        ConversationId::new(conversation_id).map_err(|_| StatusCode::BAD_REQUEST)?;

    match state.mark_read.execute(&user, &conversation_id).await {
        Ok(conversation) => Ok(Json(conversation.into())),
        Err(MarkReadError::ConversationNotFound(_)) => Err(StatusCode::NOT_FOUND),
        Err(MarkReadError::NotAParticipant(_, _)) => Err(StatusCode::FORBIDDEN),
    }
}
