//! Workflow runner: single entry point for answering questions.
//!
//! Builds the chosen orchestrator exactly once at construction time as an
//! immutable value, then reuses it for every question. State lives only for
//! the duration of one `run` call; nothing persists across runs.

use crate::agent::AgentOrchestrator;
use crate::pipeline::PipelineOrchestrator;
use crate::ports::{Knowledge, Retriever};
use crate::state::WorkflowState;
use docqa_core::{AppError, AppResult};
use docqa_llm::LlmClient;
use std::sync::Arc;

/// Which orchestrator a workflow runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Fixed retrieve-then-generate pipeline
    Pipeline,
    /// Bounded tool-using reasoning agent
    Agent,
}

enum Orchestrator {
    Pipeline(PipelineOrchestrator),
    Agent(AgentOrchestrator),
}

/// A built workflow, ready to answer questions.
pub struct Workflow {
    orchestrator: Orchestrator,
}

impl Workflow {
    /// Build a fixed-pipeline workflow.
    pub fn pipeline(
        retriever: Arc<dyn Retriever>,
        llm: Arc<dyn LlmClient>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            orchestrator: Orchestrator::Pipeline(PipelineOrchestrator::new(retriever, llm, model)),
        }
    }

    /// Build an agentic workflow with both information-gathering tools.
    pub fn agent(
        retriever: Arc<dyn Retriever>,
        knowledge: Arc<dyn Knowledge>,
        llm: Arc<dyn LlmClient>,
        model: impl Into<String>,
        max_steps: usize,
    ) -> Self {
        Self {
            orchestrator: Orchestrator::Agent(AgentOrchestrator::new(
                retriever, knowledge, llm, model, max_steps,
            )),
        }
    }

    /// The mode this workflow was built with.
    pub fn mode(&self) -> Mode {
        match self.orchestrator {
            Orchestrator::Pipeline(_) => Mode::Pipeline,
            Orchestrator::Agent(_) => Mode::Agent,
        }
    }

    /// Answer one question, returning the final state.
    pub async fn run(&self, question: &str) -> AppResult<WorkflowState> {
        if question.trim().is_empty() {
            return Err(AppError::Workflow("question must not be empty".to_string()));
        }

        tracing::info!(mode = ?self.mode(), "Running workflow");
        let state = WorkflowState::new(question);

        match &self.orchestrator {
            Orchestrator::Pipeline(pipeline) => pipeline.run(state).await,
            Orchestrator::Agent(agent) => agent.run(state).await,
        }
    }
}
