//! Provider adapters, stream decoding and provider selection
//!
//! Each vendor adapter combines the shared SSE decoder, its own event
//! normalizer and the outbound HTTP call behind [`ChatProvider`].

pub mod adapter;
pub mod claude;
pub mod error;
pub mod gemini;
pub mod registry;
pub mod sse;

pub use adapter::{ChatProvider, ChunkStream, ProviderAdapter, ProviderType};
pub use error::{ProviderError, ProviderResult};
pub use registry::{ProviderDescriptor, ProviderPreference, ProviderRegistry, Selection};

// Re-export concrete providers
pub use claude::ClaudeProvider;
pub use gemini::GeminiProvider;
