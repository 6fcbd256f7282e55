use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use heron::chat::generate_reply;
use heron::errors::AgentError;

// Types matching the incoming JSON structure
#[derive(Debug, Deserialize)]
struct ChatRequest {
    model: String,
    messages: Vec<String>,
    #[serde(default)]
    allow_search: bool,
    #[serde(default)]
    system_prompt: String,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    answer: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Response {
    // The allow-list check happens before any external call
    if !state.registry.contains(&request.model) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "model not in allow-list".to_string(),
            }),
        )
            .into_response();
    }

    tracing::info!(
        model = %request.model,
        allow_search = request.allow_search,
        turns = request.messages.len(),
        "handling chat request"
    );

    match generate_reply(
        &state.registry,
        state.search.as_ref(),
        &request.model,
        &request.messages,
        request.allow_search,
        &request.system_prompt,
    )
    .await
    {
        Ok(answer) => (StatusCode::OK, Json(ChatResponse { answer })).into_response(),
        Err(AgentError::Configuration(message)) => {
            tracing::warn!("rejected chat request: {}", message);
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse { error: message }),
            )
                .into_response()
        }
        Err(err) => {
            // Log the cause, return a generic body
            tracing::error!("agent execution failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "agent execution failed".to_string(),
                }),
            )
                .into_response()
        }
    }
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(handle_chat))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use heron::providers::configs::{GroqProviderConfig, ProviderConfig};
    use heron::registry::ModelRegistry;
    use heron::search::SearchConfig;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL: &str = "llama-3.3-70b-versatile";

    fn test_state(provider_host: &str, search: Option<SearchConfig>) -> AppState {
        let mut registry = ModelRegistry::new();
        registry.register(
            MODEL,
            ProviderConfig::Groq(GroqProviderConfig {
                host: provider_host.to_string(),
                api_key: "test_api_key".to_string(),
                model: MODEL.to_string(),
                temperature: Some(0.2),
                max_tokens: None,
            }),
        );
        AppState::new(registry, search)
    }

    fn chat_request(body: Value) -> Request<Body> {
        Request::builder()
            .uri("/chat")
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn response_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn completion_body(text: &str) -> Value {
        json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": text,
                    "tool_calls": null
                },
                "finish_reason": "stop"
            }],
            "usage": {
                "prompt_tokens": 10,
                "completion_tokens": 5,
                "total_tokens": 15
            }
        })
    }

    #[tokio::test]
    async fn test_rejects_model_not_in_allow_list() {
        let mock_server = MockServer::start().await;
        // The provider must never be called for an unlisted model
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("nope")))
            .expect(0)
            .mount(&mock_server)
            .await;

        let app = routes(test_state(&mock_server.uri(), None));
        let response = app
            .oneshot(chat_request(json!({
                "model": "gpt-oss",
                "messages": ["hello"],
                "allow_search": false,
                "system_prompt": ""
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response_json(response).await;
        assert_eq!(body["error"], "model not in allow-list");
    }

    #[tokio::test]
    async fn test_end_to_end_chat() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Paris.")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let app = routes(test_state(&mock_server.uri(), None));
        let response = app
            .oneshot(chat_request(json!({
                "model": MODEL,
                "messages": ["What is the capital of France?"],
                "allow_search": false,
                "system_prompt": "Be concise."
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body, json!({"answer": "Paris."}));

        // No search capability rides along when the toggle is off
        let requests = mock_server.received_requests().await.unwrap();
        let payload: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(payload.get("tools").is_none());
    }

    #[tokio::test]
    async fn test_identical_requests_get_identical_responses() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Hello!")))
            .expect(2)
            .mount(&mock_server)
            .await;

        let app = routes(test_state(&mock_server.uri(), None));
        let request_body = json!({
            "model": MODEL,
            "messages": ["hello"],
            "allow_search": false,
            "system_prompt": ""
        });

        let first = app
            .clone()
            .oneshot(chat_request(request_body.clone()))
            .await
            .unwrap();
        let second = app.oneshot(chat_request(request_body)).await.unwrap();

        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(response_json(first).await, response_json(second).await);
    }

    #[tokio::test]
    async fn test_provider_failure_returns_generic_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("secret provider detail"))
            .mount(&mock_server)
            .await;

        let app = routes(test_state(&mock_server.uri(), None));
        let response = app
            .oneshot(chat_request(json!({
                "model": MODEL,
                "messages": ["hello"],
                "allow_search": false,
                "system_prompt": ""
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response_json(response).await;
        assert_eq!(body["error"], "agent execution failed");
        // Provider detail stays in the logs, never in the response
        assert!(!body["error"].as_str().unwrap().contains("secret"));
    }

    #[tokio::test]
    async fn test_search_toggle_attaches_single_bounded_tool() {
        let provider_server = MockServer::start().await;
        let search_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_1",
                            "type": "function",
                            "function": {
                                "name": "search__web_search",
                                "arguments": "{\"query\":\"latest rust release\"}"
                            }
                        }]
                    },
                    "finish_reason": "tool_calls"
                }],
                "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
            })))
            .up_to_n_times(1)
            .mount(&provider_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(completion_body("Rust 1.80 is out.")),
            )
            .mount(&provider_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "answer": "Rust 1.80 was released.",
                "results": []
            })))
            .expect(1)
            .mount(&search_server)
            .await;

        let search = SearchConfig {
            host: search_server.uri(),
            api_key: "test_search_key".to_string(),
            max_results: 2,
        };
        let app = routes(test_state(&provider_server.uri(), Some(search)));

        let response = app
            .oneshot(chat_request(json!({
                "model": MODEL,
                "messages": ["What is the latest Rust release?"],
                "allow_search": true,
                "system_prompt": ""
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body["answer"], "Rust 1.80 is out.");

        // Exactly one search tool was offered to the model
        let provider_requests = provider_server.received_requests().await.unwrap();
        let first: Value = serde_json::from_slice(&provider_requests[0].body).unwrap();
        let tools = first["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["function"]["name"], "search__web_search");

        // The search request carried the configured bound
        let search_requests = search_server.received_requests().await.unwrap();
        let search_payload: Value = serde_json::from_slice(&search_requests[0].body).unwrap();
        assert_eq!(search_payload["max_results"], 2);
    }

    #[tokio::test]
    async fn test_search_toggle_without_credentials() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("nope")))
            .expect(0)
            .mount(&mock_server)
            .await;

        let app = routes(test_state(&mock_server.uri(), None));
        let response = app
            .oneshot(chat_request(json!({
                "model": MODEL,
                "messages": ["hello"],
                "allow_search": true,
                "system_prompt": ""
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("search"));
    }
}
