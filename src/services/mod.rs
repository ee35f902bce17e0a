pub mod llm;
pub mod progress;
pub mod prompts;
pub mod retry;
pub mod setup;
pub mod workflow;
