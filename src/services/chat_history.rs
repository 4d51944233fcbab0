use std::sync::Arc;
use tokio::sync::RwLock;

use crate::constants::limits::MAX_CHAT_MESSAGES;
use crate::constants::storage_keys::CHAT_HISTORY;
use crate::models::ChatMessage;
use crate::storage::{KeyValueStore, Persisted};

/// Conversation log in send order, capped at [`MAX_CHAT_MESSAGES`].
pub struct ChatHistory {
    messages: RwLock<Vec<ChatMessage>>,
    persisted: Persisted<Vec<ChatMessage>>,
}

fn keep_tail(messages: &mut Vec<ChatMessage>) {
    let overflow = messages.len().saturating_sub(MAX_CHAT_MESSAGES);
    if overflow > 0 {
        messages.drain(..overflow);
    }
}

impl ChatHistory {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            messages: RwLock::new(Vec::new()),
            persisted: Persisted::new(store, CHAT_HISTORY),
        }
    }

    pub async fn load(&self) {
        let mut messages = self.persisted.load().await.unwrap_or_default();
        keep_tail(&mut messages);
        *self.messages.write().await = messages;
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.messages.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }

    /// Appends `message`, evicting the oldest entries past the cap.
    pub async fn add(&self, message: ChatMessage) {
        let mut messages = self.messages.write().await;
        messages.push(message);
        keep_tail(&mut messages);
        self.persisted.save(&messages).await;
    }

    pub async fn clear(&self) {
        self.messages.write().await.clear();
        self.persisted.clear().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FailingStore, MemoryStore};

    #[tokio::test]
    async fn evicts_oldest_first() {
        let history = ChatHistory::new(Arc::new(MemoryStore::new()));

        for i in 0..MAX_CHAT_MESSAGES + 5 {
            history.add(ChatMessage::user(format!("m{i}"))).await;
        }

        let messages = history.messages().await;
        assert_eq!(messages.len(), MAX_CHAT_MESSAGES);
        assert_eq!(messages[0].content, "m5");
        assert_eq!(
            messages.last().map(|m| m.content.as_str()),
            Some(format!("m{}", MAX_CHAT_MESSAGES + 4).as_str())
        );
    }

    #[tokio::test]
    async fn reload_keeps_order() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let history = ChatHistory::new(store.clone());
        history.add(ChatMessage::user("hi")).await;
        history.add(ChatMessage::assistant("hello")).await;

        let reloaded = ChatHistory::new(store);
        reloaded.load().await;
        let contents: Vec<_> = reloaded
            .messages()
            .await
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, vec!["hi", "hello"]);

        reloaded.clear().await;
        assert!(reloaded.is_empty().await);
    }

    #[tokio::test]
    async fn write_failures_are_swallowed() {
        let history = ChatHistory::new(Arc::new(FailingStore));
        history.add(ChatMessage::user("still here")).await;
        assert_eq!(history.len().await, 1);
        history.clear().await;
        assert!(history.is_empty().await);
    }
}
