use std::sync::Arc;
use tracing::{info, warn};

use crate::clients::ClientError;
use crate::clients::chat::ChatApi;
use crate::models::{ChatContext, ChatMessage, Chemical, Role};
use crate::services::chat_history::ChatHistory;
use crate::services::statistics::StatisticsStore;

/// Drives one conversation: sends messages and records both sides.
pub struct ChatSession {
    api: Arc<dyn ChatApi>,
    history: Arc<ChatHistory>,
    stats: Arc<StatisticsStore>,
    chemical: Option<Chemical>,
}

impl ChatSession {
    #[must_use]
    pub fn new(
        api: Arc<dyn ChatApi>,
        history: Arc<ChatHistory>,
        stats: Arc<StatisticsStore>,
    ) -> Self {
        Self {
            api,
            history,
            stats,
            chemical: None,
        }
    }

    /// Focuses the conversation on `chemical`.
    #[must_use]
    pub fn with_chemical(mut self, chemical: Option<Chemical>) -> Self {
        self.chemical = chemical;
        self
    }

    #[must_use]
    pub const fn chemical(&self) -> Option<&Chemical> {
        self.chemical.as_ref()
    }

    fn context(&self, conversation_history: Vec<ChatMessage>) -> ChatContext {
        ChatContext {
            chemical_name: self.chemical.as_ref().map(|c| c.name.clone()),
            chemical_formula: self.chemical.as_ref().map(|c| c.formula.clone()),
            conversation_history,
        }
    }

    /// Sends `text` and returns the assistant reply.
    ///
    /// On failure an error message is appended to the history in place of
    /// the reply and the error is returned.
    pub async fn send(&self, text: &str) -> Result<ChatMessage, ClientError> {
        let text = text.trim();
        let prior = self.history.messages().await;
        let first_message = !prior.iter().any(|m| m.role == Role::User);

        self.history.add(ChatMessage::user(text)).await;
        if first_message {
            info!("Starting a new chat");
            self.stats.increment_chat_started().await;
        }

        let context = self.context(prior);
        match self.api.send_message(text, &context).await {
            Ok(reply) => {
                self.history.add(reply.clone()).await;
                Ok(reply)
            }
            Err(e) => {
                warn!("Chat reply failed: {}", e);
                self.history.add(ChatMessage::error(e.to_string())).await;
                Err(e)
            }
        }
    }

    pub async fn clear(&self) {
        self.history.clear().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct EchoApi {
        fail: bool,
        seen_history: Mutex<Vec<usize>>,
        seen_chemical: Mutex<Option<String>>,
    }

    #[async_trait]
    impl ChatApi for EchoApi {
        async fn send_message(
            &self,
            message: &str,
            context: &ChatContext,
        ) -> Result<ChatMessage, ClientError> {
            self.seen_history
                .lock()
                .unwrap()
                .push(context.conversation_history.len());
            *self.seen_chemical.lock().unwrap() = context.chemical_label();
            if self.fail {
                return Err(ClientError::Timeout);
            }
            Ok(ChatMessage::assistant(format!("echo: {message}")))
        }
    }

    fn session(api: Arc<EchoApi>) -> (ChatSession, Arc<ChatHistory>, Arc<StatisticsStore>) {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let history = Arc::new(ChatHistory::new(store.clone()));
        let stats = Arc::new(StatisticsStore::new(store));
        (
            ChatSession::new(api, history.clone(), stats.clone()),
            history,
            stats,
        )
    }

    #[tokio::test]
    async fn records_both_sides_and_counts_the_chat_once() {
        let api = Arc::new(EchoApi::default());
        let (session, history, stats) = session(api.clone());

        session.send("hi").await.unwrap();
        let reply = session.send("again").await.unwrap();

        assert_eq!(reply.content, "echo: again");
        assert_eq!(history.len().await, 4);
        assert_eq!(stats.get().await.total_chats_started, 1);
        // The prior conversation is sent, not the message itself.
        assert_eq!(*api.seen_history.lock().unwrap(), vec![0, 2]);
    }

    #[tokio::test]
    async fn failures_are_logged_as_error_messages() {
        let api = Arc::new(EchoApi {
            fail: true,
            ..Default::default()
        });
        let (session, history, _) = session(api);

        let err = session.send("hello").await.unwrap_err();
        assert!(err.is_timeout());

        let messages = history.messages().await;
        assert_eq!(messages.len(), 2);
        assert!(messages[1].is_error());
        assert_eq!(messages[1].content, err.to_string());
    }

    #[tokio::test]
    async fn chemical_context_is_forwarded() {
        let api = Arc::new(EchoApi::default());
        let (session, _, _) = session(api.clone());
        let acetone = crate::clients::catalog::ChemicalCatalog::bundled()
            .unwrap()
            .get("1")
            .cloned();
        let session = session.with_chemical(acetone);

        session.send("Is it flammable?").await.unwrap();

        assert_eq!(
            api.seen_chemical.lock().unwrap().as_deref(),
            Some("Acetone (C3H6O)")
        );
    }
}
