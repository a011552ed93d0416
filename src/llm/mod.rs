pub mod gemini;
pub mod insights;
pub mod parser;
pub mod prompts;
pub mod provider;

pub use gemini::GeminiProvider;
pub use insights::InsightGenerator;
pub use prompts::PromptContext;
pub use provider::LLMProvider;
