//! External capabilities the orchestrators depend on but do not implement.
//!
//! The generation port is [`docqa_llm::LlmClient`]; the two ports defined
//! here cover document retrieval and general-knowledge lookup. Adapters live
//! in their own crates (`docqa-retrieval`, `docqa-wiki`).

use crate::state::Passage;
use docqa_core::AppResult;

/// Similarity-based retrieval over the ingested document collection.
///
/// Implementations must be idempotent per call. Ordering of the returned
/// passages is preserved by the orchestrators and treated as
/// relevance-descending.
#[async_trait::async_trait]
pub trait Retriever: Send + Sync {
    /// Retrieve passages relevant to the query, best match first.
    async fn retrieve(&self, query: &str) -> AppResult<Vec<Passage>>;
}

/// General-knowledge lookup (e.g., an encyclopedia search).
///
/// Implementations return a short text summary and are expected to cap
/// their own result count to bound prompt size.
#[async_trait::async_trait]
pub trait Knowledge: Send + Sync {
    /// Search the knowledge source and return a text summary.
    async fn search(&self, query: &str) -> AppResult<String>;
}
