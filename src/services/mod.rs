pub mod ai_service;
pub mod anthropic; // Anthropic Messages API
pub mod prompts;

pub use ai_service::FoodAnalyzer;
pub use anthropic::AnthropicClient;
