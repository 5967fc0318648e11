//! Shared fakes for unit tests.

use crate::config::LlmSettings;
use crate::error::Result;
use crate::wikipedia::Encyclopedia;
use async_trait::async_trait;
use axum::{routing::post, Json, Router};
use serde_json::{json, Value};

/// Encyclopedia that answers every query without network access.
pub struct StubEncyclopedia;

#[async_trait]
impl Encyclopedia for StubEncyclopedia {
    async fn lookup(&self, query: &str) -> Result<String> {
        Ok(format!("Page: {}\nSummary: stub summary", query))
    }
}

/// Wrap an assistant message in a chat completion response body.
pub fn completion(message: Value) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1_700_000_000u32,
        "model": "fake-model",
        "choices": [{
            "index": 0,
            "message": message,
            "finish_reason": "stop",
            "logprobs": null
        }]
    })
}

/// A tool call entry as returned by the model.
pub fn tool_call(id: &str, name: &str, arguments: Value) -> Value {
    json!({
        "id": id,
        "type": "function",
        "function": { "name": name, "arguments": arguments.to_string() }
    })
}

/// Spawn a fake chat completions server; `handler` maps request body to response body.
pub async fn spawn_fake_model<F>(handler: F) -> String
where
    F: Fn(Value) -> Value + Clone + Send + Sync + 'static,
{
    let app = Router::new().route(
        "/chat/completions",
        post(move |Json(body): Json<Value>| {
            let handler = handler.clone();
            async move { Json(handler(body)) }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// LLM settings pointed at a fake server, with an explicit key.
pub fn fake_llm_settings(api_base: String) -> LlmSettings {
    LlmSettings {
        api_base,
        api_key: Some("test-key".to_string()),
        model: "fake-model".to_string(),
        ..Default::default()
    }
}
