use anyhow::Result;
use futures::stream::BoxStream;

use crate::errors::{AgentError, AgentResult};
use crate::models::content::Content;
use crate::models::message::{Message, ToolRequest};
use crate::models::tool::{Tool, ToolCall};
use crate::providers::base::Provider;
use crate::toolkit::Toolkit;

/// Upper bound on provider round-trips within a single reply
const MAX_TOOL_TURNS: usize = 8;

/// Agent integrates a foundational LLM with the toolkits it needs to pilot
pub struct Agent {
    toolkits: Vec<Box<dyn Toolkit>>,
    provider: Box<dyn Provider>,
}

impl Agent {
    /// Create a new Agent with the specified provider
    pub fn new(provider: Box<dyn Provider>) -> Self {
        Self {
            toolkits: Vec::new(),
            provider,
        }
    }

    /// Add a toolkit to the agent
    pub fn add_toolkit(&mut self, toolkit: Box<dyn Toolkit>) {
        self.toolkits.push(toolkit);
    }

    /// Get all tools from all toolkits with proper toolkit prefixing
    fn get_prefixed_tools(&self) -> Vec<Tool> {
        let mut tools = Vec::new();
        for toolkit in &self.toolkits {
            for tool in toolkit.tools() {
                tools.push(Tool::new(
                    format!("{}__{}", toolkit.name(), tool.name),
                    &tool.description,
                    tool.input_schema.clone(),
                ));
            }
        }
        tools
    }

    /// Find the appropriate toolkit for a tool call based on the prefixed name
    fn get_toolkit_for_tool(&self, prefixed_name: &str) -> Option<&dyn Toolkit> {
        let parts: Vec<&str> = prefixed_name.split("__").collect();
        if parts.len() != 2 {
            return None;
        }
        let toolkit_name = parts[0];
        self.toolkits
            .iter()
            .find(|toolkit| toolkit.name() == toolkit_name)
            .map(|v| &**v)
    }

    /// Dispatch a single tool call to the appropriate toolkit
    async fn dispatch_tool_call(
        &self,
        tool_call: AgentResult<ToolCall>,
    ) -> AgentResult<Vec<Content>> {
        let call = tool_call?;
        let toolkit = self
            .get_toolkit_for_tool(&call.name)
            .ok_or_else(|| AgentError::ToolNotFound(call.name.clone()))?;

        let tool_name = call
            .name
            .split("__")
            .nth(1)
            .ok_or_else(|| AgentError::InvalidParameters(call.name.clone()))?;
        let toolkit_tool_call = ToolCall::new(tool_name, call.arguments);

        toolkit.call(toolkit_tool_call).await
    }

    /// The caller's system prompt with toolkit instructions appended
    fn build_system_prompt(&self, system_prompt: &str) -> String {
        let mut prompt = system_prompt.trim().to_string();
        for toolkit in &self.toolkits {
            let instructions = toolkit.instructions();
            if instructions.is_empty() {
                continue;
            }
            if !prompt.is_empty() {
                prompt.push_str("\n\n");
            }
            prompt.push_str(instructions);
        }
        prompt
    }

    /// Create a stream that yields each message as it's generated by the agent.
    /// This includes both the assistant's responses and any tool responses.
    pub fn reply(
        &self,
        messages: &[Message],
        system_prompt: &str,
    ) -> BoxStream<'_, Result<Message>> {
        let mut messages = messages.to_vec();
        let system_prompt = self.build_system_prompt(system_prompt);
        let tools = self.get_prefixed_tools();

        Box::pin(async_stream::try_stream! {
            let mut completed = false;

            for _turn in 0..MAX_TOOL_TURNS {
                // Get completion from provider
                let (response, _usage) = self
                    .provider
                    .complete(&system_prompt, &messages, &tools)
                    .await?;

                // Yield the assistant's response
                yield response.clone();

                // This ensures that the above message is yielded before the
                // following potentially long-running tool calls start processing
                tokio::task::yield_now().await;

                // First collect any tool requests
                let tool_requests: Vec<&ToolRequest> = response
                    .content
                    .iter()
                    .filter_map(|content| content.as_tool_request())
                    .collect();

                if tool_requests.is_empty() {
                    // No more tool calls, end the reply loop
                    completed = true;
                    break;
                }

                // Then dispatch each in parallel
                let futures: Vec<_> = tool_requests
                    .iter()
                    .map(|request| self.dispatch_tool_call(request.tool_call.clone()))
                    .collect();

                // Process all the futures in parallel but wait until all are finished
                let outputs = futures::future::join_all(futures).await;

                // Combine the results into MessageContent::ToolResponse using the original ID
                let mut message_tool_response = Message::user();
                for (request, output) in tool_requests.iter().zip(outputs.into_iter()) {
                    message_tool_response =
                        message_tool_response.with_tool_response(request.id.clone(), output);
                }

                yield message_tool_response.clone();

                messages.push(response);
                messages.push(message_tool_response);
            }

            if !completed {
                Err(AgentError::Execution(format!(
                    "no final answer after {} tool turns",
                    MAX_TOOL_TURNS
                )))?;
            }
        })
    }
}
