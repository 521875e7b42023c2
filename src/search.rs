//! Keyword retrieval over the breed corpus.
//!
//! The [`Retriever`] holds an immutable, in-memory list of
//! [`BreedDocument`]s loaded from the scraped JSON file or, when that is
//! unavailable, from an injected fallback set. Queries are scored with
//! Okapi BM25 over lower-cased alphanumeric tokens.
//!
//! # Ranking
//!
//! 1. Tokenize the query, drop stopwords, de-duplicate terms.
//! 2. Score each document's `title + content` (title tokens count twice).
//! 3. Sort by score (desc), then insertion order (asc).
//! 4. Truncate to `k`, clamped to the corpus size.
//!
//! The same query against the same corpus always yields the same order.

use anyhow::Result;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::fallback::{self, FallbackBreed};
use crate::models::BreedDocument;
use crate::store;

/// BM25 term-frequency saturation.
const K1: f64 = 1.2;
/// BM25 length normalization.
const B: f64 = 0.75;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "i", "if", "in", "into",
    "is", "it", "its", "me", "my", "of", "on", "or", "so", "that", "the", "their", "them", "they",
    "this", "to", "was", "we", "what", "which", "who", "will", "with", "you", "your",
];

/// Where the retriever's documents came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Fallback,
    /// Handed in by the caller via [`Retriever::from_documents`].
    Memory,
}

/// A document with its relevance for one query.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredDocument {
    /// Raw BM25 score; `0.0` when no query term matches.
    pub score: f64,
    /// Score min-max normalized over the returned set, in `[0.0, 1.0]`.
    pub normalized: f64,
    /// Position of the document in the loaded collection.
    pub index: usize,
    pub document: BreedDocument,
}

struct IndexedDoc {
    /// Term frequencies, title tokens weighted double.
    tf: HashMap<String, u32>,
    len: f64,
}

pub struct Retriever {
    documents: Vec<BreedDocument>,
    index: Vec<IndexedDoc>,
    doc_freq: HashMap<String, usize>,
    avg_len: f64,
    source: DataSource,
}

impl Retriever {
    /// Load documents from `path`, falling back to `fallback` when the file
    /// is missing, unreadable, malformed, or empty. Never fails.
    pub fn load(path: &Path, fallback: &[FallbackBreed]) -> Self {
        match store::load_documents(path) {
            Ok(docs) if !docs.is_empty() => {
                tracing::info!(path = %path.display(), count = docs.len(), "loaded scraped breeds");
                Self::build(docs, DataSource::File(path.to_path_buf()))
            }
            Ok(_) => {
                tracing::info!(path = %path.display(), "breed file is empty; using built-in breeds");
                Self::build(fallback::to_documents(fallback), DataSource::Fallback)
            }
            Err(e) => {
                tracing::info!(path = %path.display(), error = %format!("{:#}", e), "using built-in breeds");
                Self::build(fallback::to_documents(fallback), DataSource::Fallback)
            }
        }
    }

    /// Build directly from an owned collection.
    pub fn from_documents(documents: Vec<BreedDocument>) -> Self {
        Self::build(documents, DataSource::Memory)
    }

    fn build(documents: Vec<BreedDocument>, source: DataSource) -> Self {
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        let index: Vec<IndexedDoc> = documents
            .iter()
            .map(|doc| {
                let mut tf: HashMap<String, u32> = HashMap::new();
                let mut len = 0u32;
                for token in tokenize(&doc.title) {
                    *tf.entry(token).or_insert(0) += 2;
                    len += 2;
                }
                for token in tokenize(&doc.content) {
                    *tf.entry(token).or_insert(0) += 1;
                    len += 1;
                }
                for term in tf.keys() {
                    *doc_freq.entry(term.clone()).or_insert(0) += 1;
                }
                IndexedDoc {
                    tf,
                    len: len as f64,
                }
            })
            .collect();

        let avg_len = if index.is_empty() {
            0.0
        } else {
            index.iter().map(|d| d.len).sum::<f64>() / index.len() as f64
        };

        Self {
            documents,
            index,
            doc_freq,
            avg_len,
            source,
        }
    }

    pub fn documents(&self) -> &[BreedDocument] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    /// The `k` most relevant documents for `query`, best first.
    ///
    /// `k` larger than the corpus returns every document. Documents that
    /// match nothing still appear, after all matches, in insertion order.
    pub fn top_k(&self, query: &str, k: usize) -> Vec<ScoredDocument> {
        let terms = query_terms(query);

        let mut scored: Vec<(usize, f64)> = self
            .index
            .iter()
            .enumerate()
            .map(|(i, doc)| (i, self.bm25(doc, &terms)))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k.min(self.documents.len()));

        let normalized = normalize_scores(&scored.iter().map(|(_, s)| *s).collect::<Vec<_>>());

        scored
            .into_iter()
            .zip(normalized)
            .map(|((index, score), normalized)| ScoredDocument {
                score,
                normalized,
                index,
                document: self.documents[index].clone(),
            })
            .collect()
    }

    fn bm25(&self, doc: &IndexedDoc, terms: &[String]) -> f64 {
        if terms.is_empty() || self.avg_len <= 0.0 {
            return 0.0;
        }
        let n = self.documents.len() as f64;
        terms
            .iter()
            .map(|term| {
                let tf = doc.tf.get(term).copied().unwrap_or(0) as f64;
                if tf == 0.0 {
                    return 0.0;
                }
                let df = self.doc_freq.get(term).copied().unwrap_or(0) as f64;
                let idf = (1.0 + (n - df + 0.5) / (df + 0.5)).ln();
                let norm = K1 * (1.0 - B + B * doc.len / self.avg_len);
                idf * (tf * (K1 + 1.0)) / (tf + norm)
            })
            .sum()
    }
}

/// Lower-cased alphanumeric tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Query tokens minus stopwords, first occurrence kept.
pub fn query_terms(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(query)
        .into_iter()
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Min-max normalize raw scores to `[0.0, 1.0]`.
///
/// If all scores are equal, they are normalized to `1.0` when positive
/// and `0.0` when every score is zero.
pub fn normalize_scores(scores: &[f64]) -> Vec<f64> {
    if scores.is_empty() {
        return Vec::new();
    }

    let s_min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let s_max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    scores
        .iter()
        .map(|s| {
            if (s_max - s_min).abs() < f64::EPSILON {
                if s_max > 0.0 {
                    1.0
                } else {
                    0.0
                }
            } else {
                (s - s_min) / (s_max - s_min)
            }
        })
        .collect()
}

/// Entry point for `scout search`.
pub fn run_search(
    config: &Config,
    query: &str,
    limit: Option<usize>,
    data: Option<PathBuf>,
) -> Result<()> {
    let path = data.unwrap_or_else(|| config.store.path.clone());
    let retriever = Retriever::load(&path, fallback::BUILTIN_BREEDS);
    let k = limit.unwrap_or(config.retrieval.top_k);

    let results = retriever.top_k(query, k);
    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    print_results(&results);
    Ok(())
}

pub fn print_results(results: &[ScoredDocument]) {
    for (i, result) in results.iter().enumerate() {
        let doc = &result.document;
        println!(
            "{}. [{:.2}] {} / {}",
            i + 1,
            result.normalized,
            doc.source,
            doc.title
        );
        println!("    score: {:.4}", result.score);
        if !doc.url.is_empty() {
            println!("    url: {}", doc.url);
        }
        let excerpt: String = doc.content.chars().take(240).collect();
        println!("    excerpt: \"{}\"", excerpt.replace('\n', " ").trim());
        println!();
    }
}
