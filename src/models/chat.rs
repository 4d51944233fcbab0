use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl ChatMessage {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            is_error: None,
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Assistant-side message shown in place of a failed reply.
    #[must_use]
    pub fn error(content: impl Into<String>) -> Self {
        Self {
            is_error: Some(true),
            ..Self::new(Role::Assistant, content)
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }
}

/// Extra context sent along with a chat request.
#[derive(Debug, Clone, Default)]
pub struct ChatContext {
    pub chemical_name: Option<String>,
    pub chemical_formula: Option<String>,
    pub conversation_history: Vec<ChatMessage>,
}

impl ChatContext {
    /// "Acetone (C3H6O)" or just "Acetone"; `None` without a chemical.
    #[must_use]
    pub fn chemical_label(&self) -> Option<String> {
        let name = self.chemical_name.as_deref()?;
        Some(match self.chemical_formula.as_deref() {
            Some(formula) if !formula.is_empty() => format!("{name} ({formula})"),
            _ => name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        let msg = ChatMessage::user("hi");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
        assert!(json.get("isError").is_none());
    }

    #[test]
    fn error_messages_are_flagged() {
        let msg = ChatMessage::error("boom");
        assert_eq!(msg.role, Role::Assistant);
        assert!(msg.is_error());
    }

    #[test]
    fn chemical_label_includes_formula_when_present() {
        let mut ctx = ChatContext {
            chemical_name: Some("Acetone".to_string()),
            chemical_formula: Some("C3H6O".to_string()),
            ..Default::default()
        };
        assert_eq!(ctx.chemical_label().as_deref(), Some("Acetone (C3H6O)"));

        ctx.chemical_formula = None;
        assert_eq!(ctx.chemical_label().as_deref(), Some("Acetone"));

        ctx.chemical_name = None;
        assert_eq!(ctx.chemical_label(), None);
    }
}
