//! services/api/src/web/assistant.rs
//!
//! Endpoints for the style-assistant chat.

use axum::{extract::State, http::StatusCode, Json};
use booking_core::{ChatMessage, ChatRole};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::web::rest::HandlerError;
use crate::web::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct ChatMessageResponse {
    /// `user` or `model`.
    pub role: String,
    pub text: String,
}

impl From<&ChatMessage> for ChatMessageResponse {
    fn from(message: &ChatMessage) -> Self {
        let role = match message.role {
            ChatRole::User => "user",
            ChatRole::Model => "model",
        };
        Self {
            role: role.to_string(),
            text: message.text.clone(),
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub text: String,
}

/// GET /assistant/messages - The conversation so far, greeting first
#[utoipa::path(
    get,
    path = "/assistant/messages",
    responses(
        (status = 200, description = "Chat history", body = [ChatMessageResponse]),
        (status = 401, description = "No active session"),
        (status = 409, description = "A reply is still being generated")
    )
)]
pub async fn history_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ChatMessageResponse>>, HandlerError> {
    let chat = state.assistant.try_lock().map_err(|_| busy())?;
    Ok(Json(
        chat.history().iter().map(ChatMessageResponse::from).collect(),
    ))
}

/// POST /assistant/messages - Send a message and wait for the reply
///
/// Provider failures come back as a normal reply carrying an apology.
#[utoipa::path(
    post,
    path = "/assistant/messages",
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "The assistant's reply", body = ChatMessageResponse),
        (status = 400, description = "Empty message"),
        (status = 401, description = "No active session"),
        (status = 409, description = "A reply is still being generated")
    )
)]
pub async fn send_message_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<ChatMessageResponse>, HandlerError> {
    let mut chat = state.assistant.try_lock().map_err(|_| busy())?;
    let reply = chat
        .send(&req.text)
        .await
        .ok_or((StatusCode::BAD_REQUEST, "The message is empty.".to_string()))?;
    Ok(Json(ChatMessageResponse::from(&reply)))
}

fn busy() -> HandlerError {
    (
        StatusCode::CONFLICT,
        "The assistant is still answering the previous message.".to_string(),
    )
}
