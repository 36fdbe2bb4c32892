//! Agentic orchestrator: a bounded tool-using reasoning loop.
//!
//! The agent answers a question by repeatedly asking the generation port for
//! its next move, dispatching the named tool, and feeding the observation
//! back, until the model emits a final answer or the step cap is hit. Tool
//! dispatch is a closed set of tagged variants, not free-text matching.

use crate::ports::{Knowledge, Retriever};
use crate::state::{Passage, WorkflowState};
use docqa_core::AppResult;
use docqa_llm::{LlmClient, LlmRequest};
use std::sync::Arc;

/// Maximum passages the retriever tool renders into one observation.
const MAX_TOOL_PASSAGES: usize = 8;

/// Sentinel observation when the retriever finds nothing. Distinguishes
/// "tool ran but found nothing" from a missing tool call.
pub const NO_DOCUMENTS_SENTINEL: &str = "No documents found.";

/// Substitute answer when the reasoning loop ends without usable text.
pub const FALLBACK_ANSWER: &str = "Could not generate answer";

/// Identifies a tool in the closed tool set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolTag {
    Retriever,
    Knowledge,
}

impl ToolTag {
    /// Parse the tag the model named in its Action line.
    fn parse(name: &str) -> Option<Self> {
        match name.trim().trim_matches('`').to_lowercase().as_str() {
            "retriever" => Some(Self::Retriever),
            "knowledge" | "wikipedia" => Some(Self::Knowledge),
            _ => None,
        }
    }
}

/// A tool the reasoning loop can invoke: name, capability description, and
/// the port it wraps. Constructed once per orchestrator and immutable
/// afterwards.
enum Tool {
    Retriever(Arc<dyn Retriever>),
    Knowledge(Arc<dyn Knowledge>),
}

/// What a tool invocation produced: the text observation for the transcript,
/// plus any passages to surface in the workflow state.
struct ToolOutput {
    observation: String,
    passages: Vec<Passage>,
}

impl Tool {
    fn tag(&self) -> ToolTag {
        match self {
            Self::Retriever(_) => ToolTag::Retriever,
            Self::Knowledge(_) => ToolTag::Knowledge,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Retriever(_) => "retriever",
            Self::Knowledge(_) => "knowledge",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Self::Retriever(_) => "Fetch passages from the indexed document collection.",
            Self::Knowledge(_) => "Search an encyclopedia for general knowledge.",
        }
    }

    async fn invoke(&self, query: &str) -> AppResult<ToolOutput> {
        match self {
            Self::Retriever(port) => {
                let passages = port.retrieve(query).await?;
                let included: Vec<Passage> =
                    passages.into_iter().take(MAX_TOOL_PASSAGES).collect();
                Ok(ToolOutput {
                    observation: render_passages(&included),
                    passages: included,
                })
            }
            Self::Knowledge(port) => Ok(ToolOutput {
                observation: port.search(query).await?,
                passages: Vec::new(),
            }),
        }
    }
}

/// Render passages as numbered blocks for a tool observation.
///
/// Each passage becomes `"[i] <title>\n<body>"`, blank-line separated.
/// Title resolution: explicit title, else source label, else `doc_<i>`.
fn render_passages(passages: &[Passage]) -> String {
    if passages.is_empty() {
        return NO_DOCUMENTS_SENTINEL.to_string();
    }

    passages
        .iter()
        .enumerate()
        .map(|(idx, passage)| {
            let i = idx + 1;
            let title = passage
                .title
                .as_deref()
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .or_else(|| {
                    if passage.source.is_empty() {
                        None
                    } else {
                        Some(passage.source.clone())
                    }
                })
                .unwrap_or_else(|| format!("doc_{}", i));
            format!("[{}] {}\n{}", i, title, passage.text)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// One parsed model reply.
enum Reply {
    /// The model finished with an answer.
    Final(String),
    /// The model asked for a tool call.
    Call { action: String, input: String },
}

/// Parse a model reply into a tool call or a final answer.
///
/// A reply that names no action is treated as the final answer; the loop
/// always extracts *something* from the last message.
fn parse_reply(text: &str) -> Reply {
    if let Some(pos) = text.find("Final Answer:") {
        let answer = text[pos + "Final Answer:".len()..].trim();
        return Reply::Final(answer.to_string());
    }

    let mut action = None;
    let mut input = None;
    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("Action Input:") {
            input = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("Action:") {
            action = Some(rest.trim().to_string());
        }
    }

    match action {
        Some(action) => Reply::Call {
            action,
            input: input.unwrap_or_default(),
        },
        None => Reply::Final(text.trim().to_string()),
    }
}

/// Bounded reasoning loop over the fixed tool set.
///
/// Immutable after construction; safe to share across runs.
pub struct AgentOrchestrator {
    llm: Arc<dyn LlmClient>,
    model: String,
    tools: Vec<Tool>,
    system_prompt: String,
    max_steps: usize,
}

impl AgentOrchestrator {
    /// Build the agent with its full tool set. Tools are constructed here,
    /// eagerly, and never replaced.
    pub fn new(
        retriever: Arc<dyn Retriever>,
        knowledge: Arc<dyn Knowledge>,
        llm: Arc<dyn LlmClient>,
        model: impl Into<String>,
        max_steps: usize,
    ) -> Self {
        let tools = vec![Tool::Retriever(retriever), Tool::Knowledge(knowledge)];
        let system_prompt = build_system_prompt(&tools);

        Self {
            llm,
            model: model.into(),
            tools,
            system_prompt,
            max_steps: max_steps.max(1),
        }
    }

    fn tool(&self, tag: ToolTag) -> Option<&Tool> {
        self.tools.iter().find(|t| t.tag() == tag)
    }

    fn tool_names(&self) -> String {
        self.tools
            .iter()
            .map(Tool::name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Run the reasoning loop for one question.
    ///
    /// Tool failures become observations the model can react to; a failure
    /// of the generation port itself is not retried and propagates. The
    /// returned answer is never empty.
    pub async fn run(&self, state: WorkflowState) -> AppResult<WorkflowState> {
        let mut scratchpad = String::new();
        let mut passages: Vec<Passage> = Vec::new();
        let mut answer: Option<String> = None;

        for step in 1..=self.max_steps {
            let request = LlmRequest::new(
                self.render_prompt(&state.question, &scratchpad),
                &self.model,
            )
            .with_system(self.system_prompt.clone());

            let response = self.llm.complete(&request).await?;

            match parse_reply(&response.content) {
                Reply::Final(text) => {
                    tracing::info!("Agent finished after {} step(s)", step);
                    answer = Some(text);
                    break;
                }
                Reply::Call { action, input } => {
                    let observation = match ToolTag::parse(&action) {
                        Some(tag) => {
                            // Tools exist for every tag; lookup cannot miss.
                            let tool = match self.tool(tag) {
                                Some(tool) => tool,
                                None => continue,
                            };
                            tracing::debug!("Step {}: {} <- {:?}", step, tool.name(), input);
                            match tool.invoke(&input).await {
                                Ok(output) => {
                                    if !output.passages.is_empty() {
                                        passages = output.passages;
                                    }
                                    output.observation
                                }
                                // Absorbed as a negative observation, not a
                                // run-level failure
                                Err(e) => format!("Tool '{}' failed: {}", action.trim(), e),
                            }
                        }
                        None => format!(
                            "Unknown tool '{}'. Available tools: {}",
                            action.trim(),
                            self.tool_names()
                        ),
                    };

                    scratchpad.push_str(response.content.trim());
                    scratchpad.push_str("\nObservation: ");
                    scratchpad.push_str(&observation);
                    scratchpad.push_str("\n\n");
                }
            }
        }

        // Step cap hit without a final answer: one best-effort synthesis
        // call over the accumulated observations.
        let answer = match answer {
            Some(text) => text,
            None => self.synthesize(&state.question, &scratchpad).await?,
        };

        let answer = if answer.trim().is_empty() {
            FALLBACK_ANSWER.to_string()
        } else {
            answer
        };

        Ok(state.with_passages(passages).with_answer(answer))
    }

    fn render_prompt(&self, question: &str, scratchpad: &str) -> String {
        if scratchpad.is_empty() {
            format!("Question: {}", question)
        } else {
            format!("Question: {}\n\n{}", question, scratchpad)
        }
    }

    async fn synthesize(&self, question: &str, scratchpad: &str) -> AppResult<String> {
        tracing::warn!(
            "Agent hit the {}-step cap; forcing a final answer",
            self.max_steps
        );

        let prompt = format!(
            "Question: {}\n\n{}You have no tool calls left. \
             Give your best final answer from the observations above.\nFinal Answer:",
            question, scratchpad
        );
        let request =
            LlmRequest::new(prompt, &self.model).with_system(self.system_prompt.clone());
        let response = self.llm.complete(&request).await?;

        let text = response.content;
        let answer = match text.find("Final Answer:") {
            Some(pos) => text[pos + "Final Answer:".len()..].trim().to_string(),
            None => text.trim().to_string(),
        };
        Ok(answer)
    }
}

/// Build the reasoning directive listing the tool set and the reply formats.
fn build_system_prompt(tools: &[Tool]) -> String {
    let mut prompt =
        String::from("You are a question answering agent for a document collection.\n\nTools:\n");

    for tool in tools {
        prompt.push_str(&format!("- {}: {}\n", tool.name(), tool.description()));
    }

    prompt.push_str(
        "\nPrefer 'retriever' for questions about the ingested documents; \
         use 'knowledge' only for general-world questions the documents cannot answer.\n\n\
         Use exactly one of these two reply formats.\n\n\
         To call a tool:\n\
         Thought: <your reasoning>\n\
         Action: <tool name>\n\
         Action Input: <tool query>\n\n\
         To finish:\n\
         Final Answer: <answer>\n",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FailingRetriever, StubKnowledge, StubLlm, StubRetriever};

    fn numbered_passages(n: usize) -> Vec<Passage> {
        (1..=n)
            .map(|i| Passage::new(format!("body {}", i), format!("src_{}.md", i)))
            .collect()
    }

    fn agent(
        retriever: Arc<dyn Retriever>,
        knowledge: Arc<dyn Knowledge>,
        llm: Arc<StubLlm>,
        max_steps: usize,
    ) -> AgentOrchestrator {
        AgentOrchestrator::new(retriever, knowledge, llm, "test-model", max_steps)
    }

    #[test]
    fn test_render_numbers_in_input_order() {
        let rendered = render_passages(&numbered_passages(3));

        assert!(rendered.contains("[1] src_1.md\nbody 1"));
        assert!(rendered.contains("[2] src_2.md\nbody 2"));
        assert!(rendered.contains("[3] src_3.md\nbody 3"));
    }

    #[tokio::test]
    async fn test_retriever_tool_renders_first_eight_of_ten() {
        let tool = Tool::Retriever(Arc::new(StubRetriever::with_passages(numbered_passages(10))));
        let output = tool.invoke("q").await.unwrap();

        assert_eq!(output.passages.len(), MAX_TOOL_PASSAGES);
        assert!(output.observation.contains("[1] src_1.md\nbody 1"));
        assert!(output.observation.contains("[8] src_8.md\nbody 8"));
        assert!(!output.observation.contains("[9]"));
        assert!(!output.observation.contains("body 10"));
    }

    #[test]
    fn test_render_empty_is_sentinel() {
        assert_eq!(render_passages(&[]), NO_DOCUMENTS_SENTINEL);
    }

    #[test]
    fn test_render_title_resolution_order() {
        let passages = vec![
            Passage::new("a", "src.md").with_title("Explicit"),
            Passage::new("b", "src.md"),
            Passage::new("c", ""),
        ];
        let rendered = render_passages(&passages);

        assert!(rendered.contains("[1] Explicit\na"));
        assert!(rendered.contains("[2] src.md\nb"));
        // No title, no source: synthetic 1-based label
        assert!(rendered.contains("[3] doc_3\nc"));
    }

    #[test]
    fn test_parse_reply_tool_call() {
        let reply = parse_reply(
            "Thought: need docs\nAction: retriever\nAction Input: agent planning",
        );
        match reply {
            Reply::Call { action, input } => {
                assert_eq!(action, "retriever");
                assert_eq!(input, "agent planning");
            }
            Reply::Final(_) => panic!("expected tool call"),
        }
    }

    #[test]
    fn test_parse_reply_final_answer() {
        match parse_reply("Thought: done\nFinal Answer: Paris.") {
            Reply::Final(answer) => assert_eq!(answer, "Paris."),
            Reply::Call { .. } => panic!("expected final answer"),
        }
    }

    #[test]
    fn test_parse_reply_plain_text_is_final() {
        match parse_reply("Paris is the capital of France.") {
            Reply::Final(answer) => assert_eq!(answer, "Paris is the capital of France."),
            Reply::Call { .. } => panic!("expected final answer"),
        }
    }

    #[tokio::test]
    async fn test_agent_prefers_knowledge_for_world_questions() {
        let llm = Arc::new(StubLlm::with_replies([
            "Thought: not in the docs\nAction: knowledge\nAction Input: capital of France",
            "Final Answer: Paris is the capital of France.",
        ]));
        let agent = agent(
            Arc::new(StubRetriever::with_passages(Vec::new())),
            Arc::new(StubKnowledge::with_summary("Paris is the capital of France.")),
            llm.clone(),
            6,
        );

        let state = agent.run(WorkflowState::new("Capital of France?")).await.unwrap();
        assert!(state.answer.contains("Paris"));
        // Knowledge-only run: no passages were retrieved
        assert!(state.retrieved_passages.is_empty());
        // The observation reached the second model call
        assert!(llm.last_prompt().contains("Observation: Paris is the capital of France."));
    }

    #[tokio::test]
    async fn test_agent_records_retriever_passages() {
        let llm = Arc::new(StubLlm::with_replies([
            "Action: retriever\nAction Input: agents",
            "Final Answer: An agent plans and acts.",
        ]));
        let agent = agent(
            Arc::new(StubRetriever::with_passages(numbered_passages(2))),
            Arc::new(StubKnowledge::with_summary("unused")),
            llm,
            6,
        );

        let state = agent.run(WorkflowState::new("What is an agent?")).await.unwrap();
        assert_eq!(state.retrieved_passages.len(), 2);
        assert_eq!(state.answer, "An agent plans and acts.");
    }

    #[tokio::test]
    async fn test_step_cap_bounds_tool_invocations() {
        // The model never finishes on its own
        let llm = Arc::new(StubLlm::with_replies([
            "Action: retriever\nAction Input: anything",
        ]));
        let agent = agent(
            Arc::new(StubRetriever::with_passages(numbered_passages(1))),
            Arc::new(StubKnowledge::with_summary("s")),
            llm.clone(),
            3,
        );

        let state = agent.run(WorkflowState::new("q")).await.unwrap();
        // 3 loop calls plus the single forced synthesis call
        assert_eq!(llm.call_count(), 4);
        // The scripted reply becomes the best-effort answer text
        assert!(!state.answer.is_empty());
    }

    #[tokio::test]
    async fn test_blank_final_message_yields_fallback() {
        let llm = Arc::new(StubLlm::with_replies(["Final Answer:"]));
        let agent = agent(
            Arc::new(StubRetriever::with_passages(Vec::new())),
            Arc::new(StubKnowledge::with_summary("s")),
            llm,
            6,
        );

        let state = agent.run(WorkflowState::new("q")).await.unwrap();
        assert_eq!(state.answer, FALLBACK_ANSWER);
    }

    #[tokio::test]
    async fn test_tool_failure_becomes_observation() {
        let llm = Arc::new(StubLlm::with_replies([
            "Action: retriever\nAction Input: agents",
            "Final Answer: recovered",
        ]));
        let agent = agent(
            Arc::new(FailingRetriever),
            Arc::new(StubKnowledge::with_summary("s")),
            llm.clone(),
            6,
        );

        let state = agent.run(WorkflowState::new("q")).await.unwrap();
        assert_eq!(state.answer, "recovered");
        assert!(llm.last_prompt().contains("Tool 'retriever' failed"));
    }

    #[tokio::test]
    async fn test_unknown_tool_gets_corrective_observation() {
        let llm = Arc::new(StubLlm::with_replies([
            "Action: calculator\nAction Input: 2+2",
            "Final Answer: ok",
        ]));
        let agent = agent(
            Arc::new(StubRetriever::with_passages(Vec::new())),
            Arc::new(StubKnowledge::with_summary("s")),
            llm.clone(),
            6,
        );

        let state = agent.run(WorkflowState::new("q")).await.unwrap();
        assert_eq!(state.answer, "ok");
        let prompt = llm.last_prompt();
        assert!(prompt.contains("Unknown tool 'calculator'"));
        assert!(prompt.contains("retriever, knowledge"));
    }

    #[test]
    fn test_system_prompt_lists_tools() {
        let agent = agent(
            Arc::new(StubRetriever::with_passages(Vec::new())),
            Arc::new(StubKnowledge::with_summary("s")),
            Arc::new(StubLlm::with_replies(["x"])),
            6,
        );

        assert!(agent.system_prompt.contains("- retriever:"));
        assert!(agent.system_prompt.contains("- knowledge:"));
        assert!(agent.system_prompt.contains("Final Answer:"));
    }
}
