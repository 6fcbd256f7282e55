use anyhow::Result;
use bat::PrettyPrinter;
use cliclack::{input, spinner};
use console::style;

use crate::client::{ChatClient, ChatRequest};

/// Interactive chat session. The transcript lives only in this process and
/// the full conversation is resent on every request, so the service stays
/// stateless.
pub struct Session {
    client: ChatClient,
    model: String,
    system_prompt: String,
    allow_search: bool,
    transcript: Vec<String>,
}

impl Session {
    pub fn new(client: ChatClient, model: String, system_prompt: String, allow_search: bool) -> Self {
        Session {
            client,
            model,
            system_prompt,
            allow_search,
            transcript: Vec::new(),
        }
    }

    pub async fn start(&mut self) -> Result<()> {
        println!(
            "{} {}",
            style(format!("heron chat ({})", self.model)).bold(),
            style("- type \"exit\" to end the session").dim()
        );
        println!();

        loop {
            let message: String = input("Message:").placeholder("").multiline().interact()?;

            if message.trim().eq_ignore_ascii_case("exit") {
                break;
            }
            if message.trim().is_empty() {
                continue;
            }

            self.transcript.push(message);

            // One request in flight at a time; input is blocked until it returns
            let spin = spinner();
            spin.start("awaiting reply");
            let request = ChatRequest {
                model: &self.model,
                messages: &self.transcript,
                allow_search: self.allow_search,
                system_prompt: &self.system_prompt,
            };
            let result = self.client.chat(&request).await;
            spin.stop("");

            match result {
                Ok(answer) => render_markdown(&answer),
                // The submitted message stays in the transcript so it can be resent
                Err(err) => println!("{}", style(format!("error: {}", err)).red()),
            }

            println!();
        }

        Ok(())
    }
}

fn render_markdown(content: &str) {
    let _ = PrettyPrinter::new()
        .input_from_bytes(content.as_bytes())
        .language("markdown")
        .print();
}
