//! Static knowledge base: loaded once, chunked, and searched in memory.

use service_core::error::AppError;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use text_splitter::{ChunkConfig, TextSplitter};

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "can", "do", "does", "for", "from", "how",
    "i", "in", "is", "it", "me", "my", "of", "on", "or", "that", "the", "this", "to", "was",
    "what", "when", "where", "which", "who", "why", "with", "you", "your",
];

/// A retrievable slice of the corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub position: usize,
    pub text: String,
}

/// A chunk with its retrieval score.
#[derive(Debug, Clone)]
pub struct ScoredChunk<'a> {
    pub chunk: &'a Chunk,
    pub score: f64,
}

/// In-memory lexical index over the knowledge base.
#[derive(Debug)]
pub struct KnowledgeBase {
    chunks: Vec<Chunk>,
    /// Term frequencies per chunk, parallel to `chunks`.
    term_freqs: Vec<HashMap<String, usize>>,
    /// Number of chunks containing each term.
    doc_freqs: HashMap<String, usize>,
}

impl KnowledgeBase {
    /// Read and index the corpus file.
    pub async fn load(
        path: impl AsRef<Path>,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Result<Self, AppError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            tracing::error!(path = %path.display(), "Knowledge base file not readable: {}", e);
            AppError::InternalError(anyhow::anyhow!(
                "Failed to read knowledge base at {}: {}",
                path.display(),
                e
            ))
        })?;

        let kb = Self::from_text(&text, chunk_size, chunk_overlap)?;
        tracing::info!(
            path = %path.display(),
            chunks = kb.len(),
            "Loaded knowledge base"
        );
        Ok(kb)
    }

    /// Index an in-memory corpus. Fails when it yields no chunks.
    pub fn from_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Result<Self, AppError> {
        let chunks: Vec<Chunk> = chunk_text(text, chunk_size, chunk_overlap)?
            .into_iter()
            .enumerate()
            .map(|(position, text)| Chunk { position, text })
            .collect();

        if chunks.is_empty() {
            return Err(AppError::InternalError(anyhow::anyhow!(
                "Knowledge base is empty"
            )));
        }

        let term_freqs: Vec<HashMap<String, usize>> = chunks
            .iter()
            .map(|chunk| {
                let mut freqs = HashMap::new();
                for term in tokenize(&chunk.text) {
                    *freqs.entry(term).or_insert(0) += 1;
                }
                freqs
            })
            .collect();

        let mut doc_freqs: HashMap<String, usize> = HashMap::new();
        for freqs in &term_freqs {
            for term in freqs.keys() {
                *doc_freqs.entry(term.clone()).or_insert(0) += 1;
            }
        }

        Ok(Self {
            chunks,
            term_freqs,
            doc_freqs,
        })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Top `k` chunks by TF-IDF overlap with the query, best first.
    ///
    /// Chunks sharing no term with the query are never returned.
    pub fn search(&self, query: &str, k: usize) -> Vec<ScoredChunk<'_>> {
        let terms: HashSet<String> = tokenize(query).collect();
        if terms.is_empty() || k == 0 {
            return Vec::new();
        }

        let n = self.chunks.len() as f64;
        let mut scored: Vec<ScoredChunk<'_>> = self
            .chunks
            .iter()
            .zip(&self.term_freqs)
            .filter_map(|(chunk, freqs)| {
                let score: f64 = terms
                    .iter()
                    .filter_map(|term| {
                        let tf = *freqs.get(term)? as f64;
                        let df = *self.doc_freqs.get(term)? as f64;
                        Some((1.0 + tf.ln()) * (1.0 + n / df).ln())
                    })
                    .sum();
                (score > 0.0).then_some(ScoredChunk { chunk, score })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.chunk.position.cmp(&b.chunk.position))
        });
        scored.truncate(k);
        scored
    }
}

/// Lowercased alphanumeric terms with stopwords and single characters removed.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 1)
        .map(|w| w.to_lowercase())
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
}

/// Split text into chunks of at most `chunk_size` characters, overlapping
/// by up to `chunk_overlap` characters.
///
/// Paragraph boundaries are preferred over sentence and word boundaries, so
/// blank-line separated sections stay whole whenever they fit.
pub fn chunk_text(
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<Vec<String>, AppError> {
    if chunk_size == 0 {
        return Err(AppError::ConfigError(anyhow::anyhow!(
            "Chunk size must be greater than zero"
        )));
    }

    let config = ChunkConfig::new(chunk_size)
        .with_overlap(chunk_overlap)
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid chunk settings: {}", e)))?;
    let splitter = TextSplitter::new(config);

    let chunks: Vec<String> = splitter
        .chunks(text)
        .filter(|chunk| !chunk.trim().is_empty())
        .map(str::to_string)
        .collect();

    tracing::debug!(
        chunks = chunks.len(),
        chars = text.chars().count(),
        "Split knowledge base"
    );

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORPUS: &str = "\
Domestic transfers cost 0.5% per transaction with a minimum fee of $1.

International transfers cost 1.5% plus a fixed $3 fee.

To reset your password, open Settings and choose Security, then Reset password.

Verified accounts have a daily transfer limit of $10,000.";

    #[test]
    fn small_sections_are_packed_into_one_chunk() {
        let chunks = chunk_text("alpha\n\nbeta\n\ngamma", 100, 10).unwrap();
        assert_eq!(chunks, vec!["alpha\n\nbeta\n\ngamma"]);
    }

    #[test]
    fn sections_stay_whole_when_they_fit() {
        let chunks = chunk_text(CORPUS, 90, 0).unwrap();

        assert_eq!(chunks.len(), 4);
        assert!(chunks[2].starts_with("To reset your password"));
        assert!(chunks[2].ends_with("Reset password."));
    }

    #[test]
    fn long_text_is_split_within_capacity() {
        let text = "Transfers settle quickly. ".repeat(40);
        let chunks = chunk_text(&text, 60, 10).unwrap();

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 60));
        assert!(chunks.iter().all(|c| !c.trim().is_empty()));
    }

    #[test]
    fn capacity_is_counted_in_characters() {
        let text = "переводы быстрые ".repeat(10);
        let chunks = chunk_text(&text, 20, 4).unwrap();
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 20));
    }

    #[test]
    fn overlap_not_below_size_is_rejected() {
        assert!(chunk_text("text", 10, 10).is_err());
        assert!(chunk_text("text", 0, 0).is_err());
    }

    #[test]
    fn empty_corpus_is_rejected() {
        assert!(KnowledgeBase::from_text("\n\n  \n\n", 512, 50).is_err());
    }

    #[test]
    fn search_ranks_relevant_chunk_first() {
        let kb = KnowledgeBase::from_text(CORPUS, 90, 0).unwrap();
        assert_eq!(kb.len(), 4);

        let hits = kb.search("How do I reset my password?", 3);
        assert!(!hits.is_empty());
        assert!(hits[0].chunk.text.contains("reset your password"));
    }

    #[test]
    fn search_respects_top_k_and_skips_unrelated_chunks() {
        let kb = KnowledgeBase::from_text(CORPUS, 90, 0).unwrap();

        let hits = kb.search("transfers", 1);
        assert_eq!(hits.len(), 1);

        assert!(kb.search("capital of France", 3).is_empty());
        assert!(kb.search("the of and", 3).is_empty());
    }
}
