pub mod classifier;
pub mod client;
pub mod prompts;

pub use classifier::Classifier;
pub use client::{ChatCompletion, ChatRequest, LlmError, OpenAiCompatibleClient};
pub use prompts::PromptSettings;
