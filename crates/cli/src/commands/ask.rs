//! Ask command handler.
//!
//! Wires the configured ports into a workflow and answers one question.

use clap::Args;
use docqa_core::{AppError, AppResult, config::AppConfig};
use docqa_llm::create_client;
use docqa_retrieval::MemoryRetriever;
use docqa_wiki::WikipediaClient;
use docqa_workflow::{Workflow, WorkflowState};
use std::sync::Arc;

/// Ask a question over the document collection
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Use the agentic orchestrator (tool-selecting reasoning loop)
    #[arg(short, long)]
    pub agent: bool,

    /// Passages to fetch per retrieval call
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Maximum reasoning steps in agent mode
    #[arg(long)]
    pub max_steps: Option<usize>,

    /// Output the full final state as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command (agent: {})", self.agent);

        let top_k = self.top_k.unwrap_or(config.top_k);
        let max_steps = self.max_steps.unwrap_or(config.agent_max_steps);

        let retriever = Arc::new(MemoryRetriever::from_dir(&config.docs_dir, top_k)?);
        if retriever.is_empty() {
            tracing::warn!("No passages indexed from {:?}", config.docs_dir);
        }

        let llm = create_client(&config.provider, config.endpoint.as_deref())?;

        let workflow = if self.agent {
            Workflow::agent(
                retriever,
                Arc::new(WikipediaClient::new()),
                llm,
                &config.model,
                max_steps,
            )
        } else {
            Workflow::pipeline(retriever, llm, &config.model)
        };

        let state = workflow.run(&self.question).await?;
        self.print_state(&state)
    }

    fn print_state(&self, state: &WorkflowState) -> AppResult<()> {
        if self.json {
            let json = serde_json::to_string_pretty(state)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!("{}", state.answer);

            if !state.retrieved_passages.is_empty() {
                eprintln!();
                eprintln!("Sources:");
                for passage in &state.retrieved_passages {
                    let label = passage.title.as_deref().unwrap_or(&passage.source);
                    match passage.score {
                        Some(score) => eprintln!("  - {} ({:.3})", label, score),
                        None => eprintln!("  - {}", label),
                    }
                }
            }
        }

        Ok(())
    }
}
