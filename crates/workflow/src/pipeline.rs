//! Fixed two-stage retrieve-then-generate orchestrator.
//!
//! The baseline behavior when no agentic tool selection is required:
//! retrieve passages for the question, build a single context prompt, and
//! generate the answer. Strictly sequential, no branching, no retries.

use crate::ports::Retriever;
use crate::state::{Passage, WorkflowState};
use docqa_core::AppResult;
use docqa_llm::{LlmClient, LlmRequest};
use std::sync::Arc;

/// Sampling temperature for context-grounded answers.
const ANSWER_TEMPERATURE: f32 = 0.3;

/// Two-stage pipeline: retrieve, then generate.
pub struct PipelineOrchestrator {
    retriever: Arc<dyn Retriever>,
    llm: Arc<dyn LlmClient>,
    model: String,
}

impl PipelineOrchestrator {
    /// Create a pipeline over the given ports.
    pub fn new(retriever: Arc<dyn Retriever>, llm: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            retriever,
            llm,
            model: model.into(),
        }
    }

    /// Run both stages for one question.
    ///
    /// A retrieval failure fails the run; there is no fallback path.
    pub async fn run(&self, state: WorkflowState) -> AppResult<WorkflowState> {
        let state = self.retrieve_stage(state).await?;
        self.generate_stage(state).await
    }

    /// Stage 1: fetch passages for the question and replace the state's
    /// passage list wholesale.
    async fn retrieve_stage(&self, state: WorkflowState) -> AppResult<WorkflowState> {
        let passages = self.retriever.retrieve(&state.question).await?;
        tracing::info!("Retrieved {} passages", passages.len());
        Ok(state.with_passages(passages))
    }

    /// Stage 2: build the context prompt and generate the answer.
    async fn generate_stage(&self, state: WorkflowState) -> AppResult<WorkflowState> {
        let prompt = build_prompt(&state.question, &state.retrieved_passages);

        let request = LlmRequest::new(prompt, &self.model).with_temperature(ANSWER_TEMPERATURE);
        let response = self.llm.complete(&request).await?;

        tracing::info!("Generated answer ({} chars)", response.content.len());
        Ok(state.with_answer(response.content))
    }
}

/// Build the generation prompt from the question and retrieved passages.
///
/// Passage bodies are concatenated in retriever order, separated by blank
/// lines. The context section is present (but empty) when nothing was
/// retrieved, so the question always reaches the model.
pub(crate) fn build_prompt(question: &str, passages: &[Passage]) -> String {
    let context = passages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Answer the question based on the context.\n\nContext:\n{}\n\nQuestion:\n{}",
        context, question
    )
}
