//! ChatRelay Core Library
//!
//! A multi-provider streaming chat gateway. Requests go to one of several
//! vendor streaming APIs, their SSE event grammars are normalized into one
//! chunk taxonomy, and a failed provider is replaced by an alternate one.
//!
//! ```no_run
//! use chatrelay_core::{ChatGateway, ChatMessage, GatewayConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewayConfig::from_env()?;
//! let gateway = ChatGateway::from_config(&config)?;
//! let response = gateway
//!     .chat(&[ChatMessage::user("Hello")], Some("Be concise"), None)
//!     .await?;
//! println!("{} ({})", response.content, response.provider_used);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod gateway;
pub mod http;
pub mod protocol;
pub mod providers;

pub use config::{ConfigError, GatewayConfig};
pub use gateway::ChatGateway;
pub use protocol::{ChatMessage, ChatResponse, MessageRole, StreamChunk};
pub use providers::{ChatProvider, ProviderError, ProviderPreference, ProviderType};

/// Returns the version of the ChatRelay Core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
