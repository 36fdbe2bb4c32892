//! In-memory retriever adapter for docqa.
//!
//! Implements the [`Retriever`] port over a directory of plain-text and
//! markdown files. Files are split into paragraph passages at load time and
//! ranked at query time by stop-word-filtered token overlap. Deterministic
//! and dependency-free, it stands in for a vector index the same way a
//! lexical scorer stands in for embeddings; index construction and
//! persistence stay out of scope.

use docqa_core::{AppError, AppResult};
use docqa_workflow::{Passage, Retriever};
use std::collections::HashSet;
use std::path::Path;
use walkdir::WalkDir;

/// Minimum characters for a paragraph to become a passage.
const MIN_PASSAGE_CHARS: usize = 40;

/// Common words ignored when scoring.
const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "what", "how", "why", "when", "where", "who", "does",
    "can", "will", "about",
];

struct IndexedPassage {
    text: String,
    source: String,
    title: Option<String>,
    tokens: HashSet<String>,
}

/// Lexical in-memory retriever over paragraph passages.
pub struct MemoryRetriever {
    entries: Vec<IndexedPassage>,
    top_k: usize,
}

impl MemoryRetriever {
    /// Load all `.txt` and `.md` files under `dir` into passages.
    pub fn from_dir(dir: &Path, top_k: usize) -> AppResult<Self> {
        if !dir.is_dir() {
            return Err(AppError::Retrieval(format!(
                "Document directory does not exist: {:?}",
                dir
            )));
        }

        let mut documents = Vec::new();

        for entry in WalkDir::new(dir).into_iter().filter_map(Result::ok) {
            let path = entry.path();
            let is_text = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| matches!(e, "txt" | "md"))
                .unwrap_or(false);

            if !entry.file_type().is_file() || !is_text {
                continue;
            }

            let contents = std::fs::read_to_string(path)?;
            let source = path
                .strip_prefix(dir)
                .unwrap_or(path)
                .to_string_lossy()
                .to_string();
            documents.push((source, contents));
        }

        tracing::info!("Loaded {} document(s) from {:?}", documents.len(), dir);
        Ok(Self::from_documents(documents, top_k))
    }

    /// Build a retriever from (source label, document text) pairs.
    pub fn from_documents(documents: Vec<(String, String)>, top_k: usize) -> Self {
        let mut entries = Vec::new();

        for (source, contents) in documents {
            let title = first_heading(&contents);

            for paragraph in contents.split("\n\n") {
                let paragraph = paragraph.trim();
                if paragraph.len() < MIN_PASSAGE_CHARS {
                    continue;
                }

                entries.push(IndexedPassage {
                    text: paragraph.to_string(),
                    source: source.clone(),
                    title: title.clone(),
                    tokens: tokenize(paragraph),
                });
            }
        }

        tracing::debug!("Indexed {} passage(s)", entries.len());
        Self {
            entries,
            top_k: top_k.max(1),
        }
    }

    /// Number of indexed passages.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no passages.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait::async_trait]
impl Retriever for MemoryRetriever {
    async fn retrieve(&self, query: &str) -> AppResult<Vec<Passage>> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(f32, &IndexedPassage)> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let matches = entry.tokens.intersection(&query_tokens).count();
                if matches == 0 {
                    return None;
                }
                // Overlap normalized by passage vocabulary, so short
                // passages are not drowned out by long ones
                let score = matches as f32 / (entry.tokens.len() as f32).sqrt();
                Some((score, entry))
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(self.top_k);

        Ok(scored
            .into_iter()
            .map(|(score, entry)| {
                let mut passage =
                    Passage::new(entry.text.clone(), entry.source.clone()).with_score(score);
                if let Some(ref title) = entry.title {
                    passage = passage.with_title(title.clone());
                }
                passage
            })
            .collect())
    }
}

/// Lowercase alphanumeric tokens with stop words removed.
fn tokenize(text: &str) -> HashSet<String> {
    let stop_words: HashSet<&str> = STOP_WORDS.iter().copied().collect();

    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2 && !stop_words.contains(w))
        .map(str::to_string)
        .collect()
}

/// First markdown heading of a document, if any.
fn first_heading(contents: &str) -> Option<String> {
    contents
        .lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(|h| h.trim().to_string())
}
