//! services/api/src/adapters/assistant_llm.rs
//!
//! This module contains the adapter for the style-assistant LLM.
//! It implements the `StyleAssistantService` port from the core crate against any
//! OpenAI-compatible chat completions endpoint (Gemini's, by default).

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use booking_core::{
    domain::{ChatMessage, ChatRole},
    ports::{PortError, PortResult, StyleAssistantService},
};
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `StyleAssistantService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiAssistantAdapter {
    client: Client<OpenAIConfig>,
    model: String,
    system_instruction: String,
}

impl OpenAiAssistantAdapter {
    /// Creates a new `OpenAiAssistantAdapter`. The instruction is sent first on every call.
    pub fn new(client: Client<OpenAIConfig>, model: String, system_instruction: String) -> Self {
        Self {
            client,
            model,
            system_instruction,
        }
    }

    fn build_messages(
        &self,
        history: &[ChatMessage],
        message: &str,
    ) -> PortResult<Vec<ChatCompletionRequestMessage>> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.system_instruction.clone())
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        );
        for turn in history {
            messages.push(to_request_message(turn)?);
        }
        messages.push(to_request_message(&ChatMessage::user(message))?);
        Ok(messages)
    }
}

/// The `model` role of the conversation is the API's assistant role.
fn to_request_message(turn: &ChatMessage) -> PortResult<ChatCompletionRequestMessage> {
    let message: ChatCompletionRequestMessage = match turn.role {
        ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(turn.text.clone())
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .into(),
        ChatRole::Model => ChatCompletionRequestAssistantMessageArgs::default()
            .content(turn.text.clone())
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .into(),
    };
    Ok(message)
}

//=========================================================================================
// `StyleAssistantService` Trait Implementation
//=========================================================================================

#[async_trait]
impl StyleAssistantService for OpenAiAssistantAdapter {
    async fn reply(&self, history: &[ChatMessage], message: &str) -> PortResult<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(self.build_messages(history, message)?)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        debug!(model = %self.model, turns = history.len(), "Calling style assistant.");
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        // An empty answer is passed through; the conversation decides what to show for it.
        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

//=========================================================================================
// Fallback
//=========================================================================================

/// Used when no API key is configured. Every call fails, so users get the apology text.
pub struct UnconfiguredAssistant;

#[async_trait]
impl StyleAssistantService for UnconfiguredAssistant {
    async fn reply(&self, _history: &[ChatMessage], _message: &str) -> PortResult<String> {
        Err(PortError::Unexpected(
            "no assistant API key is configured".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> OpenAiAssistantAdapter {
        let config = OpenAIConfig::new()
            .with_api_key("test-key")
            .with_api_base("http://127.0.0.1:9");
        OpenAiAssistantAdapter::new(
            Client::with_config(config),
            "test-model".to_string(),
            "Be brief.".to_string(),
        )
    }

    #[test]
    fn history_maps_model_turns_to_the_assistant_role() {
        let history = vec![ChatMessage::model("Hi!"), ChatMessage::user("A fade?")];
        let messages = adapter().build_messages(&history, "And a beard?").unwrap();

        assert_eq!(messages.len(), 4);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::Assistant(_)));
        assert!(matches!(messages[2], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(messages[3], ChatCompletionRequestMessage::User(_)));
    }

    #[tokio::test]
    async fn unconfigured_assistant_always_fails() {
        let result = UnconfiguredAssistant.reply(&[], "Hello").await;
        assert!(matches!(result, Err(PortError::Unexpected(_))));
    }
}
