mod client;
mod session;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cliclack::{confirm, input, select};

use client::ChatClient;
use session::Session;

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base URL of the chat service
    #[arg(long, default_value = "http://127.0.0.1:9999")]
    service: String,

    /// Model to use; picked from the service allow-list when omitted
    #[arg(short, long)]
    model: Option<String>,

    /// Agent persona / system prompt
    #[arg(short, long)]
    system_prompt: Option<String>,

    /// Enable web-powered answers
    #[arg(long)]
    search: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = ChatClient::new(&cli.service)?;

    let model = match cli.model {
        Some(model) => model,
        None => {
            let models = client
                .models()
                .await
                .context("failed to fetch the model list from the service")?;
            if models.is_empty() {
                bail!("the service reports no available models");
            }

            let mut prompt = select("Model");
            for model in &models {
                prompt = prompt.item(model.clone(), model, "");
            }
            prompt.interact()?
        }
    };

    let system_prompt = match cli.system_prompt {
        Some(prompt) => prompt,
        None => input("Agent persona")
            .default_input(DEFAULT_SYSTEM_PROMPT)
            .interact()?,
    };

    let allow_search = if cli.search {
        true
    } else {
        confirm("Enable web search?").initial_value(false).interact()?
    };

    let mut session = Session::new(client, model, system_prompt, allow_search);
    session.start().await
}
