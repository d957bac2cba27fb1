//! Chat endpoint handlers. Every route here requires [`AuthUser`].

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use supportdesk_core::chat::orchestrator::SendOutcome;
use supportdesk_core::chat::store::clamp_history_limit;
use supportdesk_core::service::auth::authorize_owner;
use supportdesk_types::chat::{Conversation, ConversationId, ConversationSummary};
use supportdesk_types::error::ChatError;

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthUser;
use crate::http::extractors::query::HistoryQuery;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub message: String,
}

/// POST /chat/send - Append a user turn and answer it.
///
/// Completion failures still answer 200 with an apology turn.
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Result<Json<SendRequest>, JsonRejection>,
) -> Result<Json<SendOutcome>, AppError> {
    let Json(body) = body?;
    let outcome = state.chat.send_message(&user.id, &body.message).await?;
    Ok(Json(outcome))
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub chats: Vec<ConversationSummary>,
    pub limit: u32,
    pub total: usize,
}

/// GET /chat/history?limit=N - Active conversations, most recent first.
pub async fn history(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<HistoryResponse>, AppError> {
    let Query(query) = query?;
    let limit = clamp_history_limit(query.limit);
    let chats = state.chat.store().list_recent(&user.id, Some(limit)).await?;
    Ok(Json(HistoryResponse {
        total: chats.len(),
        chats,
        limit,
    }))
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub chat: Conversation,
}

/// Unparseable ids are reported exactly like missing ones.
fn parse_chat_id(raw: &str) -> Result<ConversationId, AppError> {
    raw.parse().map_err(|_| AppError::Chat(ChatError::NotFound))
}

/// GET /chat/{id}
pub async fn get_chat(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ChatResponse>, AppError> {
    let id = parse_chat_id(&id)?;
    let chat = state.chat.store().load_by_id(&id, &user.id).await?;
    authorize_owner(&user.id, &chat.user_id)?;
    Ok(Json(ChatResponse { chat }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub message: &'static str,
    pub chat_id: ConversationId,
}

/// DELETE /chat/{id} - Soft delete.
pub async fn delete_chat(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let id = parse_chat_id(&id)?;
    state.chat.store().soft_delete(&id, &user.id).await?;
    Ok(Json(DeleteResponse {
        message: "Chat deleted successfully",
        chat_id: id,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChat {
    pub id: ConversationId,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct NewChatResponse {
    pub message: &'static str,
    pub chat: NewChat,
}

/// POST /chat/new - Start an empty conversation titled "New Chat".
pub async fn new_chat(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<(StatusCode, Json<NewChatResponse>), AppError> {
    let conversation = state.chat.store().create_empty(&user.id).await?;
    let title = conversation.summary().title;
    Ok((
        StatusCode::CREATED,
        Json(NewChatResponse {
            message: "New chat created successfully",
            chat: NewChat {
                id: conversation.id,
                title,
                created_at: conversation.created_at,
            },
        }),
    ))
}
