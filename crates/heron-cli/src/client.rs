use anyhow::{anyhow, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP client for the heron chat service
pub struct ChatClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [String],
    pub allow_search: bool,
    pub system_prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    answer: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<String>,
}

impl ChatClient {
    pub fn new<S: Into<String>>(base_url: S) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // agent replies can take a while
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the service's model allow-list
    pub async fn models(&self) -> Result<Vec<String>> {
        let url = format!("{}/models", self.base_url);
        let response = self.client.get(&url).send().await?;

        if response.status() != StatusCode::OK {
            return Err(anyhow!("service returned {}", response.status()));
        }

        Ok(response.json::<ModelsResponse>().await?.models)
    }

    /// Send the full conversation and return the agent's answer
    pub async fn chat(&self, request: &ChatRequest<'_>) -> Result<String> {
        let url = format!("{}/chat", self.base_url);
        let response = self.client.post(&url).json(request).send().await?;
        let status = response.status();

        if status == StatusCode::OK {
            Ok(response.json::<ChatResponse>().await?.answer)
        } else {
            let error = response
                .json::<ErrorResponse>()
                .await
                .map(|e| e.error)
                .unwrap_or_else(|_| format!("service returned {}", status));
            Err(anyhow!(error))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_chat_success() -> Result<()> {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat")
            .match_body(mockito::Matcher::PartialJson(json!({
                "model": "llama-3.3-70b-versatile",
                "messages": ["hello", "and again"],
                "allow_search": false,
                "system_prompt": "Be concise."
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"answer":"Hi!"}"#)
            .create_async()
            .await;

        let client = ChatClient::new(server.url())?;
        let messages = vec!["hello".to_string(), "and again".to_string()];
        let answer = client
            .chat(&ChatRequest {
                model: "llama-3.3-70b-versatile",
                messages: &messages,
                allow_search: false,
                system_prompt: "Be concise.",
            })
            .await?;

        assert_eq!(answer, "Hi!");
        mock.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_chat_error_body_is_surfaced() -> Result<()> {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"model not in allow-list"}"#)
            .create_async()
            .await;

        let client = ChatClient::new(server.url())?;
        let messages = vec!["hello".to_string()];
        let err = client
            .chat(&ChatRequest {
                model: "gpt-oss",
                messages: &messages,
                allow_search: false,
                system_prompt: "",
            })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "model not in allow-list");
        Ok(())
    }

    #[tokio::test]
    async fn test_chat_error_without_body() -> Result<()> {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat")
            .with_status(502)
            .create_async()
            .await;

        let client = ChatClient::new(server.url())?;
        let messages = vec!["hello".to_string()];
        let err = client
            .chat(&ChatRequest {
                model: "llama-3.3-70b-versatile",
                messages: &messages,
                allow_search: false,
                system_prompt: "",
            })
            .await
            .unwrap_err();

        assert!(err.to_string().contains("502"));
        Ok(())
    }

    #[tokio::test]
    async fn test_models() -> Result<()> {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/models")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"models":["llama-3.1-8b-instant","llama-3.3-70b-versatile"]}"#)
            .create_async()
            .await;

        let client = ChatClient::new(server.url())?;
        let models = client.models().await?;

        assert_eq!(
            models,
            vec!["llama-3.1-8b-instant", "llama-3.3-70b-versatile"]
        );
        Ok(())
    }
}
