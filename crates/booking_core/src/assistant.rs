//! crates/booking_core/src/assistant.rs
//!
//! The style-assistant conversation. Holds the chat history and turns every
//! provider failure into a friendly reply instead of an error.

use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{ChatMessage, Service};
use crate::ports::StyleAssistantService;

pub const GREETING: &str = "Hi! I'm your style assistant. Can I help you pick a cut or answer a question?";
pub const EMPTY_REPLY: &str = "Sorry, I couldn't process your answer right now.";
pub const APOLOGY: &str =
    "I'm having trouble reaching the style server. Please try again soon.";

/// Persona and catalog summary sent with every request.
pub fn system_instruction(services: &[Service]) -> String {
    let catalog = services
        .iter()
        .map(|s| format!("{} (${:.2})", s.name, s.price))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are a virtual assistant specialized in men's style and barbering for the \"Barber Styles\" app.\n\
         Your tone is friendly, professional and modern.\n\
         Help customers choose haircuts and beard styles, and explain the services.\n\
         Available services: {catalog}.\n\
         If the user asks about booking, tell them to tap the \"New Appointment\" button.\n\
         Answer concisely."
    )
}

/// One conversation. `send` takes `&mut self`, so a second message cannot be
/// sent while a reply is still outstanding.
pub struct StyleAssistant {
    service: Arc<dyn StyleAssistantService>,
    history: Vec<ChatMessage>,
}

impl StyleAssistant {
    pub fn new(service: Arc<dyn StyleAssistantService>) -> Self {
        Self {
            service,
            history: vec![ChatMessage::model(GREETING)],
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Sends one user message and waits for the reply.
    ///
    /// Blank input is ignored. The provider is called exactly once with the
    /// history so far; failures come back as the apology text. Both messages are
    /// appended only once the reply is in.
    pub async fn send(&mut self, text: &str) -> Option<ChatMessage> {
        if text.trim().is_empty() {
            return None;
        }

        let reply = match self.service.reply(&self.history, text).await {
            Ok(reply) if reply.trim().is_empty() => EMPTY_REPLY.to_string(),
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Style assistant call failed.");
                APOLOGY.to_string()
            }
        };

        let message = ChatMessage::model(reply);
        self.history.push(ChatMessage::user(text));
        self.history.push(message.clone());
        info!(turns = self.history.len(), "Assistant replied.");
        Some(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChatRole;
    use crate::catalog::default_services;
    use crate::ports::{PortError, PortResult};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Scripted {
        reply: PortResult<String>,
        seen: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl StyleAssistantService for Scripted {
        async fn reply(&self, history: &[ChatMessage], _message: &str) -> PortResult<String> {
            self.seen.lock().unwrap().push(history.len());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(PortError::Unexpected(e.to_string())),
            }
        }
    }

    fn assistant(reply: PortResult<String>) -> (Arc<Scripted>, StyleAssistant) {
        let scripted = Arc::new(Scripted {
            reply,
            seen: Mutex::new(Vec::new()),
        });
        (scripted.clone(), StyleAssistant::new(scripted))
    }

    #[tokio::test]
    async fn reply_is_appended_after_the_user_message() {
        let (scripted, mut chat) = assistant(Ok("Try a low fade.".to_string()));

        let reply = chat.send("What suits a round face?").await.unwrap();
        assert_eq!(reply.text, "Try a low fade.");
        assert_eq!(chat.history().len(), 3);
        assert_eq!(chat.history()[1], ChatMessage::user("What suits a round face?"));
        assert_eq!(
            chat.history().iter().filter(|m| m.role == ChatRole::User).count(),
            1
        );
        // the provider sees only the history before the new message
        assert_eq!(*scripted.seen.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn failures_become_the_apology() {
        let (_, mut chat) = assistant(Err(PortError::Unexpected("timeout".to_string())));
        let reply = chat.send("Hello").await.unwrap();
        assert_eq!(reply.text, APOLOGY);
        assert_eq!(chat.history().len(), 3);
    }

    #[tokio::test]
    async fn empty_replies_and_blank_input() {
        let (scripted, mut chat) = assistant(Ok("  ".to_string()));
        assert!(chat.send("   ").await.is_none());
        assert!(scripted.seen.lock().unwrap().is_empty());

        let reply = chat.send("Hi").await.unwrap();
        assert_eq!(reply.text, EMPTY_REPLY);
    }

    #[test]
    fn instruction_lists_the_catalog() {
        let text = system_instruction(&default_services());
        assert!(text.contains("Haircut ($45.00)"));
        assert!(text.contains("Pigmentation ($50.00)"));
    }
}
