pub mod orchestrator;
pub mod repl;

pub use orchestrator::ChatOrchestrator;
