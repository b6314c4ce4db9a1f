//! Stream a chat reply to stdout
//!
//! Reads provider credentials from the environment (`GEMINI_API_KEY`,
//! `ANTHROPIC_API_KEY`, optional `AI_CHAT_PROVIDER`).
//!
//! ```text
//! RUST_LOG=chatrelay_core=debug cargo run --example stream_chat -- "Explain SSE in one sentence"
//! ```

use anyhow::{bail, Context, Result};
use chatrelay_core::{ChatGateway, ChatMessage, GatewayConfig, StreamChunk};
use futures::StreamExt;
use std::io::Write;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let prompt = std::env::args()
        .skip(1)
        .collect::<Vec<_>>()
        .join(" ");
    let prompt = if prompt.is_empty() {
        "Say hello in three languages.".to_string()
    } else {
        prompt
    };

    let config = GatewayConfig::from_env().context("Failed to read gateway configuration")?;
    let gateway = ChatGateway::from_config(&config)?;

    if !gateway.is_available() {
        bail!("No AI chat provider available. Configure GEMINI_API_KEY or ANTHROPIC_API_KEY.");
    }
    println!("Providers: {:?}", gateway.available_providers());

    let mut stream = gateway.stream_chat(
        vec![ChatMessage::user(prompt)],
        Some("You are a concise assistant.".to_string()),
        None,
    );

    let mut stdout = std::io::stdout();
    while let Some(chunk) = stream.next().await {
        match chunk {
            StreamChunk::MessageStart { provider_used, .. } => {
                println!("--- {} ---", provider_used.as_deref().unwrap_or("unknown"));
            }
            StreamChunk::ContentDelta { delta } => {
                print!("{}", delta);
                stdout.flush()?;
            }
            StreamChunk::MessageStop { metadata } => {
                let tokens = metadata
                    .and_then(|m| m.usage)
                    .map(|u| u.output_tokens)
                    .unwrap_or_default();
                println!("\n--- done ({} tokens) ---", tokens);
            }
            StreamChunk::Error { error } => bail!("Stream failed: {}", error),
        }
    }

    Ok(())
}
