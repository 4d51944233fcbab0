//! Chat client against local stand-ins for the Gemini and OpenAI endpoints.

use axum::{
    Json, Router,
    extract::Query,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use safechem::clients::chat::{ChatApi, ChatClient, FALLBACK_REPLY};
use safechem::clients::{ClientError, build_http_client};
use safechem::config::ChatConfig;
use safechem::models::{ChatContext, ChatMessage, Role};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Captured = Arc<Mutex<Vec<Value>>>;

fn router(captured: Captured) -> Router {
    let gemini_log = captured.clone();
    let openai_log = captured;

    Router::new()
        .route(
            "/gemini",
            post(
                move |Query(params): Query<HashMap<String, String>>, Json(body): Json<Value>| {
                    let log = gemini_log.clone();
                    async move {
                        if params.get("key").map(String::as_str) != Some("gemini-key") {
                            return (
                                StatusCode::FORBIDDEN,
                                Json(json!({ "error": { "message": "API key not valid" } })),
                            )
                                .into_response();
                        }
                        log.lock().unwrap().push(body);
                        Json(json!({
                            "candidates": [{
                                "content": { "parts": [{ "text": "Wear nitrile gloves." }] }
                            }]
                        }))
                        .into_response()
                    }
                },
            ),
        )
        .route(
            "/gemini-empty",
            post(|| async { Json(json!({ "candidates": [] })) }),
        )
        .route(
            "/openai",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let log = openai_log.clone();
                async move {
                    let authorized = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        == Some("Bearer openai-key");
                    if !authorized {
                        return (
                            StatusCode::UNAUTHORIZED,
                            Json(json!({ "error": { "message": "Incorrect API key provided" } })),
                        )
                            .into_response();
                    }
                    log.lock().unwrap().push(body);
                    Json(json!({
                        "choices": [{ "message": { "role": "assistant", "content": "Store below 25 C." } }]
                    }))
                    .into_response()
                }
            }),
        )
        .route(
            "/quota",
            post(|| async {
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({ "error": { "message": "Quota exceeded" } })),
                )
            }),
        )
}

async fn spawn_server() -> (String, Captured) {
    let captured: Captured = Arc::default();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().expect("listener has no address");
    let app = router(captured.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    (format!("http://{addr}"), captured)
}

fn client(config: &ChatConfig) -> ChatClient {
    let http = build_http_client(Duration::from_secs(5)).expect("failed to build client");
    ChatClient::with_client(http, config)
}

fn acetone_context() -> ChatContext {
    ChatContext {
        chemical_name: Some("Acetone".to_string()),
        chemical_formula: Some("C3H6O".to_string()),
        conversation_history: vec![
            ChatMessage::user("Is it flammable?"),
            ChatMessage::assistant("Yes, highly."),
        ],
    }
}

#[tokio::test]
async fn test_gemini_reply_and_prompt() {
    let (base, captured) = spawn_server().await;
    let chat = client(&ChatConfig {
        gemini_api_key: Some("gemini-key".to_string()),
        openai_api_key: Some("openai-key".to_string()),
        gemini_url: format!("{base}/gemini"),
        ..ChatConfig::default()
    });
    assert_eq!(chat.provider(), Some("Gemini"));

    let reply = chat
        .send_message("What gloves?", &acetone_context())
        .await
        .unwrap();

    assert_eq!(reply.role, Role::Assistant);
    assert_eq!(reply.content, "Wear nitrile gloves.");
    assert!(!reply.is_error());

    let requests = captured.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let prompt = requests[0]["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap();
    assert!(prompt.starts_with("You are SafeChem AI"));
    assert!(prompt.contains("Current context: User is viewing Acetone (C3H6O)."));
    assert!(prompt.contains("User: Is it flammable?\nAssistant: Yes, highly.\n"));
    assert!(prompt.ends_with("User: What gloves?\nAssistant:"));
    assert_eq!(requests[0]["generationConfig"]["maxOutputTokens"], 500);
}

#[tokio::test]
async fn test_empty_candidates_use_fallback_reply() {
    let (base, _) = spawn_server().await;
    let chat = client(&ChatConfig {
        gemini_api_key: Some("gemini-key".to_string()),
        gemini_url: format!("{base}/gemini-empty"),
        ..ChatConfig::default()
    });

    let reply = chat
        .send_message("Hello", &ChatContext::default())
        .await
        .unwrap();
    assert_eq!(reply.content, FALLBACK_REPLY);
}

#[tokio::test]
async fn test_openai_reply_and_messages() {
    let (base, captured) = spawn_server().await;
    let chat = client(&ChatConfig {
        gemini_api_key: Some("   ".to_string()),
        openai_api_key: Some("openai-key".to_string()),
        openai_url: format!("{base}/openai"),
        ..ChatConfig::default()
    });
    assert_eq!(chat.provider(), Some("OpenAI"));

    let reply = chat
        .send_message("How do I store it?", &acetone_context())
        .await
        .unwrap();
    assert_eq!(reply.content, "Store below 25 C.");

    let requests = captured.lock().unwrap();
    let body = &requests[0];
    assert_eq!(body["model"], "gpt-4o-mini");
    let roles: Vec<&str> = body["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["role"].as_str().unwrap())
        .collect();
    assert_eq!(roles, ["system", "system", "user", "assistant", "user"]);
    assert_eq!(body["messages"][4]["content"], "How do I store it?");
}

#[tokio::test]
async fn test_error_bodies_become_upstream_errors() {
    let (base, _) = spawn_server().await;

    let chat = client(&ChatConfig {
        openai_api_key: Some("openai-key".to_string()),
        openai_url: format!("{base}/quota"),
        ..ChatConfig::default()
    });
    let err = chat
        .send_message("Hi", &ChatContext::default())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(429));
    assert_eq!(err.to_string(), "OpenAI API error: Quota exceeded");

    let chat = client(&ChatConfig {
        gemini_api_key: Some("wrong-key".to_string()),
        gemini_url: format!("{base}/gemini"),
        ..ChatConfig::default()
    });
    let err = chat
        .send_message("Hi", &ChatContext::default())
        .await
        .unwrap_err();
    assert!(
        matches!(err, ClientError::Upstream { status: 403, ref message, .. } if message == "API key not valid")
    );
}
