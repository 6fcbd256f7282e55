use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

use crate::errors::{AgentError, AgentResult};
use crate::models::content::Content;
use crate::models::tool::{Tool, ToolCall};
use crate::toolkit::Toolkit;

pub const TAVILY_HOST: &str = "https://api.tavily.com";
pub const DEFAULT_MAX_RESULTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub host: String,
    pub api_key: String,
    /// Upper bound on returned results, fixed at configuration time
    pub max_results: u32,
}

impl SearchConfig {
    pub fn new<S: Into<String>>(api_key: S) -> Self {
        Self {
            host: TAVILY_HOST.to_string(),
            api_key: api_key.into(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

/// Web search capability backed by the Tavily search API
pub struct SearchToolkit {
    client: Client,
    config: SearchConfig,
    tools: Vec<Tool>,
}

impl SearchToolkit {
    pub fn new(config: SearchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        let search_tool = Tool::new(
            "web_search",
            "Search the web for current information. Returns a short list of result snippets with source URLs.",
            json!({
                "type": "object",
                "required": ["query"],
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    }
                }
            }),
        );

        Ok(Self {
            client,
            config,
            tools: vec![search_tool],
        })
    }

    async fn search(&self, query: &str) -> AgentResult<Vec<Content>> {
        let url = format!("{}/search", self.config.host.trim_end_matches('/'));
        let payload = json!({
            "api_key": self.config.api_key,
            "query": query,
            "max_results": self.config.max_results,
            "search_depth": "advanced",
            "include_answer": true,
            "include_raw_content": false,
        });

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AgentError::ToolExecution(format!("search request failed: {}", e)))?;

        if response.status() != StatusCode::OK {
            return Err(AgentError::ToolExecution(format!(
                "search request failed: {}",
                response.status()
            )));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| AgentError::ToolExecution(format!("malformed search response: {}", e)))?;

        Ok(render_results(&data))
    }
}

/// Render a search response into text blocks the model can ground on
fn render_results(data: &Value) -> Vec<Content> {
    let mut contents = Vec::new();

    if let Some(answer) = data.get("answer").and_then(|a| a.as_str()) {
        if !answer.is_empty() {
            contents.push(Content::text(answer));
        }
    }

    if let Some(results) = data.get("results").and_then(|r| r.as_array()) {
        for result in results {
            let title = result
                .get("title")
                .and_then(|t| t.as_str())
                .unwrap_or("untitled");
            let url = result.get("url").and_then(|u| u.as_str()).unwrap_or("");
            let snippet = result
                .get("content")
                .and_then(|c| c.as_str())
                .unwrap_or("");
            contents.push(Content::text(format!("{} ({})\n{}", title, url, snippet)));
        }
    }

    if contents.is_empty() {
        contents.push(Content::text("No results found."));
    }

    contents
}

#[async_trait]
impl Toolkit for SearchToolkit {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Web search via a hosted search API"
    }

    fn instructions(&self) -> &str {
        "You can use the web_search tool to look up current information. \
         Ground web-based answers in the returned snippets and cite source URLs."
    }

    fn tools(&self) -> &[Tool] {
        &self.tools
    }

    async fn call(&self, tool_call: ToolCall) -> AgentResult<Vec<Content>> {
        match tool_call.name.as_str() {
            "web_search" => {
                let query = tool_call
                    .arguments
                    .get("query")
                    .and_then(|q| q.as_str())
                    .ok_or_else(|| {
                        AgentError::InvalidParameters(
                            "web_search requires a 'query' string".to_string(),
                        )
                    })?;
                self.search(query).await
            }
            _ => Err(AgentError::ToolNotFound(tool_call.name)),
        }
    }
}
