//! Workflow state threaded through a single question-answering run.

use serde::{Deserialize, Serialize};

/// A retrieved unit of text plus its source metadata.
///
/// Passages are produced by the retriever port and owned by the workflow
/// state for the duration of one run. They are never mutated after creation;
/// orchestrators only filter or truncate them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Passage body text
    pub text: String,

    /// Source label (e.g., a file path or document name)
    pub source: String,

    /// Explicit title, when the source provides one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Relevance score assigned by the retriever
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl Passage {
    /// Create a passage with body text and a source label.
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            title: None,
            score: None,
        }
    }

    /// Attach an explicit title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Attach a relevance score.
    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }
}

/// The single record threaded through every stage of a run.
///
/// State follows an immutable-replacement discipline: stages consume the
/// current state and return a fresh value rather than mutating in place.
/// At any inspection point exactly one of {not-yet-retrieved, retrieved,
/// answered} holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    /// The question being answered; set once at entry, immutable afterwards
    pub question: String,

    /// Passages from the most recent retrieval; replaced wholesale, never
    /// mutated incrementally
    pub retrieved_passages: Vec<Passage>,

    /// Final answer; empty until the terminal stage runs
    pub answer: String,
}

impl WorkflowState {
    /// Create the initial state for a question.
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            retrieved_passages: Vec::new(),
            answer: String::new(),
        }
    }

    /// Replace the retrieved passages wholesale, returning a fresh state.
    pub fn with_passages(self, passages: Vec<Passage>) -> Self {
        Self {
            retrieved_passages: passages,
            ..self
        }
    }

    /// Set the final answer, returning a fresh state.
    pub fn with_answer(self, answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            ..self
        }
    }

    /// Whether a terminal stage has produced an answer.
    pub fn is_answered(&self) -> bool {
        !self.answer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_empty() {
        let state = WorkflowState::new("What is an agent?");
        assert_eq!(state.question, "What is an agent?");
        assert!(state.retrieved_passages.is_empty());
        assert!(!state.is_answered());
    }

    #[test]
    fn test_stage_transitions_replace_state() {
        let state = WorkflowState::new("q");
        let state = state.with_passages(vec![Passage::new("body", "a.md")]);
        assert_eq!(state.retrieved_passages.len(), 1);
        assert!(!state.is_answered());

        let state = state.with_answer("done");
        assert!(state.is_answered());
        // Question survives every transition untouched
        assert_eq!(state.question, "q");
        assert_eq!(state.retrieved_passages.len(), 1);
    }

    #[test]
    fn test_passages_replaced_wholesale() {
        let state = WorkflowState::new("q")
            .with_passages(vec![Passage::new("first", "a.md")])
            .with_passages(vec![Passage::new("second", "b.md")]);
        assert_eq!(state.retrieved_passages.len(), 1);
        assert_eq!(state.retrieved_passages[0].text, "second");
    }

    #[test]
    fn test_passage_builder() {
        let passage = Passage::new("body", "a.md").with_title("Title").with_score(0.9);
        assert_eq!(passage.title.as_deref(), Some("Title"));
        assert_eq!(passage.score, Some(0.9));
    }
}
