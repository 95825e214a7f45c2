//! Local corpus retrieval.
//!
//! The corpus is a JSON array of pre-chunked passages:
//!
//! ```json
//! [
//!   {"text": "Walk 30 minutes daily from week two.", "source": "Spinal Fusion Guide", "section": "Rehabilitation"}
//! ]
//! ```
//!
//! Ranking is keyword overlap: the number of distinct query terms that occur
//! in the chunk. Ties keep corpus order; chunks with no overlap are dropped.

use agora_application::{RetrievalPort, RetrievalRequest};
use agora_domain::ReferenceSnippet;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Failed to read corpus {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid corpus {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One pre-chunked passage
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CorpusChunk {
    pub text: String,
    pub source: String,
    #[serde(default)]
    pub section: Option<String>,
}

struct IndexedChunk {
    chunk: CorpusChunk,
    terms: HashSet<String>,
}

/// [`RetrievalPort`] over an in-memory keyword index.
pub struct CorpusRetrieval {
    chunks: Vec<IndexedChunk>,
}

fn terms(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_lowercase)
}

impl CorpusRetrieval {
    pub fn new(chunks: Vec<CorpusChunk>) -> Self {
        let chunks = chunks
            .into_iter()
            .map(|chunk| IndexedChunk {
                terms: terms(&chunk.text).collect(),
                chunk,
            })
            .collect();
        Self { chunks }
    }

    /// Load a corpus file. Unlike retrieval itself, a bad corpus is a
    /// startup error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CorpusError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CorpusError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let chunks: Vec<CorpusChunk> =
            serde_json::from_str(&raw).map_err(|source| CorpusError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        info!("Loaded {} corpus chunks from {}", chunks.len(), path.display());
        Ok(Self::new(chunks))
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Rank chunks against `query`, best first, at most `max_results`.
    pub fn search(&self, query: &str, max_results: usize) -> Vec<&CorpusChunk> {
        let query_terms: HashSet<String> = terms(query).collect();
        if query_terms.is_empty() || max_results == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(usize, usize)> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(i, indexed)| (i, query_terms.intersection(&indexed.terms).count()))
            .filter(|(_, score)| *score > 0)
            .collect();

        // Stable sort keeps corpus order among equal scores
        scored.sort_by(|a, b| b.1.cmp(&a.1));

        scored
            .into_iter()
            .take(max_results)
            .map(|(i, _)| &self.chunks[i].chunk)
            .collect()
    }
}

#[async_trait]
impl RetrievalPort for CorpusRetrieval {
    async fn retrieve(&self, request: &RetrievalRequest) -> Vec<ReferenceSnippet> {
        if request.is_disabled() {
            return Vec::new();
        }

        let snippets: Vec<ReferenceSnippet> = self
            .search(&request.query, request.max_results)
            .into_iter()
            .map(|chunk| {
                let snippet = ReferenceSnippet::new(&chunk.text, &chunk.source);
                match &chunk.section {
                    Some(section) => snippet.with_section(section),
                    None => snippet,
                }
            })
            .collect();

        debug!(
            session_id = %request.session_id,
            role = %request.role,
            found = snippets.len(),
            "Corpus retrieval finished"
        );
        snippets
    }
}
