pub mod adapter;
pub mod anthropic;
pub mod gemini;
pub mod openai;
pub mod types;


pub use adapter::{build_providers, ProviderAdapter, ProviderDescriptor};
pub use anthropic::AnthropicAdapter;
pub use gemini::GeminiAdapter;
pub use openai::OpenAiAdapter;
pub use types::*;
