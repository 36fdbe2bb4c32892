//! Answer-generation orchestration for docqa.
//!
//! This crate is the decision core of the system: given a question, it either
//! runs a fixed two-stage retrieve-then-generate pipeline or a bounded
//! tool-using reasoning agent, and returns the final [`WorkflowState`].
//!
//! The orchestrators consume three external capabilities as ports:
//! - [`ports::Retriever`] — similarity search over the ingested documents
//! - [`docqa_llm::LlmClient`] — text generation
//! - [`ports::Knowledge`] — general-knowledge lookup (agent mode only)
//!
//! Entry point is [`Workflow`], which builds the chosen orchestrator once and
//! reuses it for every question.

pub mod agent;
pub mod pipeline;
pub mod ports;
pub mod runner;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export the caller-facing surface
pub use agent::AgentOrchestrator;
pub use pipeline::PipelineOrchestrator;
pub use ports::{Knowledge, Retriever};
pub use runner::{Mode, Workflow};
pub use state::{Passage, WorkflowState};
