//! One-shot chat orchestration: build an agent for a request, run it to
//! completion, and extract the final answer.

use futures::TryStreamExt;

use crate::agent::Agent;
use crate::errors::{AgentError, AgentResult};
use crate::models::message::Message;
use crate::models::role::Role;
use crate::registry::ModelRegistry;
use crate::search::{SearchConfig, SearchToolkit};

/// Run one chat exchange to completion and return the agent's final answer.
///
/// The conversation is the caller's running transcript, oldest first; it is
/// forwarded as user messages in order. Nothing is cached or reused across
/// invocations.
pub async fn generate_reply(
    registry: &ModelRegistry,
    search: Option<&SearchConfig>,
    model: &str,
    conversation: &[String],
    allow_search: bool,
    system_prompt: &str,
) -> AgentResult<String> {
    let provider = registry.resolve(model)?;
    let mut agent = Agent::new(provider);

    if allow_search {
        let config = search.ok_or_else(|| {
            AgentError::Configuration(
                "web search requested but no search provider is configured".to_string(),
            )
        })?;
        let toolkit = SearchToolkit::new(config.clone())
            .map_err(|e| AgentError::Internal(e.to_string()))?;
        agent.add_toolkit(Box::new(toolkit));
    }

    let messages: Vec<Message> = conversation
        .iter()
        .map(|text| Message::user().with_text(text))
        .collect();

    let mut stream = agent.reply(&messages, system_prompt);
    let mut transcript = Vec::new();
    while let Some(message) = stream
        .try_next()
        .await
        .map_err(|e| AgentError::Execution(e.to_string()))?
    {
        transcript.push(message);
    }

    extract_answer(&transcript)
}

/// The final answer is the text of the last message in the transcript
fn extract_answer(transcript: &[Message]) -> AgentResult<String> {
    let last = transcript
        .last()
        .ok_or_else(|| AgentError::Extraction("agent produced no messages".to_string()))?;

    if last.role != Role::Assistant {
        return Err(AgentError::Extraction(
            "last message was not an assistant reply".to_string(),
        ));
    }

    let text: Vec<&str> = last
        .content
        .iter()
        .filter_map(|content| content.as_text())
        .collect();

    if text.is_empty() {
        return Err(AgentError::Extraction(
            "last assistant message had no text content".to_string(),
        ));
    }

    Ok(text.join("\n"))
}
