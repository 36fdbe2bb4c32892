//! Stub ports shared by the orchestrator tests.

use crate::ports::{Knowledge, Retriever};
use crate::state::Passage;
use docqa_core::{AppError, AppResult};
use docqa_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Retriever returning a fixed passage list.
pub(crate) struct StubRetriever {
    passages: Vec<Passage>,
}

impl StubRetriever {
    pub(crate) fn with_passages(passages: Vec<Passage>) -> Self {
        Self { passages }
    }
}

#[async_trait::async_trait]
impl Retriever for StubRetriever {
    async fn retrieve(&self, _query: &str) -> AppResult<Vec<Passage>> {
        Ok(self.passages.clone())
    }
}

/// Retriever that always fails.
pub(crate) struct FailingRetriever;

#[async_trait::async_trait]
impl Retriever for FailingRetriever {
    async fn retrieve(&self, _query: &str) -> AppResult<Vec<Passage>> {
        Err(AppError::Retrieval("index unavailable".to_string()))
    }
}

/// Knowledge port returning a fixed summary.
pub(crate) struct StubKnowledge {
    summary: String,
}

impl StubKnowledge {
    pub(crate) fn with_summary(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
        }
    }
}

#[async_trait::async_trait]
impl Knowledge for StubKnowledge {
    async fn search(&self, _query: &str) -> AppResult<String> {
        Ok(self.summary.clone())
    }
}

/// Scripted LLM: returns canned replies in order, repeating the last reply
/// once the script runs out. Records every prompt it sees.
pub(crate) struct StubLlm {
    replies: Vec<String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl StubLlm {
    pub(crate) fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_prompt(&self) -> String {
        self.prompts
            .lock()
            .unwrap()
            .last()
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl LlmClient for StubLlm {
    fn provider_name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.prompt.clone());

        let content = self
            .replies
            .get(call.min(self.replies.len().saturating_sub(1)))
            .cloned()
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::default(),
        })
    }
}
