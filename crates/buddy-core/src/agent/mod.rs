pub mod orchestrator;
pub mod prompt;
