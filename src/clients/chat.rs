//! Chemical-safety assistant backed by Gemini or OpenAI.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

use super::error::{ClientError, ensure_success};
use crate::config::ChatConfig;
use crate::constants::limits::{GEMINI_HISTORY_WINDOW, OPENAI_HISTORY_WINDOW};
use crate::models::{ChatContext, ChatMessage, Role};

pub const FALLBACK_REPLY: &str = "Sorry, I could not generate a response.";

const SYSTEM_PROMPT: &str = "You are SafeChem AI, an expert chemical safety assistant. Your role is to:

1. Provide accurate, science-based information about chemical safety
2. Help users understand Safety Data Sheets (SDS)
3. Explain proper handling, storage, and disposal procedures
4. Answer questions about chemical hazards and first aid
5. Use clear, professional language
6. Always prioritize safety and recommend consulting qualified personnel for critical decisions

Important guidelines:
- Be concise but thorough
- Use bullet points for clarity
- Cite safety standards when relevant (OSHA, NFPA, GHS)
- Never provide medical advice - recommend consulting healthcare professionals
- Emphasize the importance of proper PPE and safety protocols
- If unsure, acknowledge limitations and recommend expert consultation

Remember: Safety first, always.";

const NO_KEY_MESSAGE: &str = "No AI API key configured. Set chat.gemini_api_key \
(SAFECHEM_GEMINI_API_KEY) or chat.openai_api_key (SAFECHEM_OPENAI_API_KEY).";

const BASE_ACTIONS: [&str; 5] = [
    "What are the main hazards?",
    "How should I store this?",
    "What PPE do I need?",
    "First aid procedures?",
    "Disposal guidelines?",
];

#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Returns the assistant's reply to `message`.
    async fn send_message(
        &self,
        message: &str,
        context: &ChatContext,
    ) -> Result<ChatMessage, ClientError>;
}

#[derive(Debug, Clone)]
enum Backend {
    Gemini { url: String, key: String },
    OpenAi { url: String, key: String, model: String },
    Unconfigured,
}

pub struct ChatClient {
    client: Client,
    backend: Backend,
    temperature: f32,
    max_output_tokens: u32,
}

// Gemini wire types

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: [GeminiContent<'a>; 1],
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    parts: [GeminiPart<'a>; 1],
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize, Default)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

// OpenAI wire types

#[derive(Debug, Serialize, PartialEq, Eq)]
struct OpenAiMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage>,
    temperature: f32,
    max_tokens: u32,
    presence_penalty: f32,
    frequency_penalty: f32,
}

#[derive(Deserialize, Default)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: Option<OpenAiResponseMessage>,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

fn non_empty(key: Option<&String>) -> Option<String> {
    key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty())
}

fn history_tail(history: &[ChatMessage], window: usize) -> &[ChatMessage] {
    &history[history.len().saturating_sub(window)..]
}

fn reply_or_fallback(text: Option<String>) -> String {
    text.filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_REPLY.to_string())
}

/// Single-prompt form used for Gemini.
fn build_gemini_prompt(message: &str, context: &ChatContext) -> String {
    let mut prompt = format!("{SYSTEM_PROMPT}\n\n");

    if let Some(label) = context.chemical_label() {
        prompt.push_str(&format!("Current context: User is viewing {label}.\n\n"));
    }

    let history = history_tail(&context.conversation_history, GEMINI_HISTORY_WINDOW);
    if !history.is_empty() {
        prompt.push_str("Previous conversation:\n");
        for msg in history {
            let speaker = if msg.role == Role::User { "User" } else { "Assistant" };
            prompt.push_str(&format!("{speaker}: {}\n", msg.content));
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!("User: {message}\nAssistant:"));
    prompt
}

fn build_openai_messages(message: &str, context: &ChatContext) -> Vec<OpenAiMessage> {
    let mut messages = vec![OpenAiMessage {
        role: "system",
        content: SYSTEM_PROMPT.to_string(),
    }];

    if let Some(label) = context.chemical_label() {
        messages.push(OpenAiMessage {
            role: "system",
            content: format!("Current context: User is viewing information about {label}."),
        });
    }

    messages.extend(
        history_tail(&context.conversation_history, OPENAI_HISTORY_WINDOW)
            .iter()
            .map(|msg| OpenAiMessage {
                role: msg.role.as_str(),
                content: msg.content.clone(),
            }),
    );

    messages.push(OpenAiMessage {
        role: "user",
        content: message.to_string(),
    });
    messages
}

impl ChatClient {
    pub fn new(config: &ChatConfig) -> Result<Self, ClientError> {
        let client =
            super::build_http_client(Duration::from_secs(config.request_timeout_seconds))?;
        Ok(Self::with_client(client, config))
    }

    /// Gemini wins when both keys are present.
    #[must_use]
    pub fn with_client(client: Client, config: &ChatConfig) -> Self {
        let backend = if let Some(key) = non_empty(config.gemini_api_key.as_ref()) {
            Backend::Gemini {
                url: config.gemini_url.clone(),
                key,
            }
        } else if let Some(key) = non_empty(config.openai_api_key.as_ref()) {
            Backend::OpenAi {
                url: config.openai_url.clone(),
                key,
                model: config.openai_model.clone(),
            }
        } else {
            Backend::Unconfigured
        };

        Self {
            client,
            backend,
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        }
    }

    #[must_use]
    pub const fn is_configured(&self) -> bool {
        !matches!(self.backend, Backend::Unconfigured)
    }

    #[must_use]
    pub const fn provider(&self) -> Option<&'static str> {
        match self.backend {
            Backend::Gemini { .. } => Some("Gemini"),
            Backend::OpenAi { .. } => Some("OpenAI"),
            Backend::Unconfigured => None,
        }
    }

    async fn send_gemini(
        &self,
        url: &str,
        key: &str,
        message: &str,
        context: &ChatContext,
    ) -> Result<String, ClientError> {
        let prompt = build_gemini_prompt(message, context);
        let body = GeminiRequest {
            contents: [GeminiContent {
                parts: [GeminiPart { text: &prompt }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        };

        let mut url = Url::parse(url)?;
        url.query_pairs_mut().append_pair("key", key);

        let response = self.client.post(url).json(&body).send().await?;
        let response = ensure_success("Gemini API", response).await?;
        let data: GeminiResponse = response.json().await?;

        let text = data
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text);
        Ok(reply_or_fallback(text))
    }

    async fn send_openai(
        &self,
        url: &str,
        key: &str,
        model: &str,
        message: &str,
        context: &ChatContext,
    ) -> Result<String, ClientError> {
        let body = OpenAiRequest {
            model,
            messages: build_openai_messages(message, context),
            temperature: self.temperature,
            max_tokens: self.max_output_tokens,
            presence_penalty: 0.6,
            frequency_penalty: 0.3,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await?;
        let response = ensure_success("OpenAI API", response).await?;
        let data: OpenAiResponse = response.json().await?;

        let text = data
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content);
        Ok(reply_or_fallback(text))
    }
}

#[async_trait]
impl ChatApi for ChatClient {
    async fn send_message(
        &self,
        message: &str,
        context: &ChatContext,
    ) -> Result<ChatMessage, ClientError> {
        let reply = match &self.backend {
            Backend::Gemini { url, key } => {
                debug!("Sending chat message to Gemini");
                self.send_gemini(url, key, message, context).await
            }
            Backend::OpenAi { url, key, model } => {
                debug!("Sending chat message to OpenAI ({})", model);
                self.send_openai(url, key, model, message, context).await
            }
            Backend::Unconfigured => {
                return Err(ClientError::NotConfigured(NO_KEY_MESSAGE.to_string()));
            }
        }
        .inspect_err(|e| error!("Chat request failed: {}", e))?;

        Ok(ChatMessage::assistant(reply))
    }
}

/// Suggested follow-up questions; a chemical adds a "Tell me about" entry first.
#[must_use]
pub fn quick_actions(chemical_name: Option<&str>) -> Vec<String> {
    let mut actions = Vec::with_capacity(BASE_ACTIONS.len() + 1);
    if let Some(name) = chemical_name.filter(|n| !n.is_empty()) {
        actions.push(format!("Tell me about {name}"));
    }
    actions.extend(BASE_ACTIONS.iter().map(ToString::to_string));
    actions
}

/// Replaces the first "this" in `action` with the chemical name.
#[must_use]
pub fn context_prompt(action: &str, chemical_name: Option<&str>) -> String {
    match chemical_name {
        Some(name) if !name.is_empty() && action.contains("this") => {
            action.replacen("this", name, 1)
        }
        _ => action.to_string(),
    }
}
