use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use tqa_core::domain::Document;
use tqa_core::error::AppError;

use crate::tokenize::tokenize;

pub mod snapshot;

/// BM25 smoothing constants. The defaults are the standard values; both are
/// configurable at index build time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Bm25Params {
    pub k1: f64,
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct IndexedDoc {
    pub nct_id: String,
    pub term_freq: BTreeMap<String, u32>,
    pub len: u32,
}

/// Term-frequency model over the full document set.
///
/// Built once, read-only afterwards: scoring is a pure function of the query
/// tokens and the frozen index state, so a built index may be shared across
/// concurrent readers without locking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LexicalIndex {
    params: Bm25Params,
    docs: Vec<IndexedDoc>,
    doc_freq: BTreeMap<String, u32>,
    avg_doc_len: f64,
}

/// One document's score, tagged with its corpus position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredDoc {
    pub ordinal: usize,
    pub nct_id: String,
    pub score: f64,
}

impl LexicalIndex {
    /// Build the index from documents in corpus order. Corpus position is
    /// the ranking tie-break key, so the input order must be the stable
    /// corpus order.
    pub fn build(documents: &[Document], params: Bm25Params) -> Result<Self, AppError> {
        if !params.k1.is_finite() || params.k1 <= 0.0 {
            return Err(AppError::new("INDEX_BUILD_FAILED", "BM25 k1 must be positive")
                .with_details(format!("k1={}", params.k1)));
        }
        if !params.b.is_finite() || !(0.0..=1.0).contains(&params.b) {
            return Err(AppError::new("INDEX_BUILD_FAILED", "BM25 b must be within [0, 1]")
                .with_details(format!("b={}", params.b)));
        }

        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut docs: Vec<IndexedDoc> = Vec::with_capacity(documents.len());
        let mut doc_freq: BTreeMap<String, u32> = BTreeMap::new();
        let mut total_len: u64 = 0;

        for document in documents {
            let id = document.nct_id.trim();
            if id.is_empty() {
                return Err(AppError::new(
                    "INDEX_BUILD_FAILED",
                    "Document is missing its identifier",
                ));
            }
            if !seen.insert(id) {
                return Err(AppError::new(
                    "INDEX_BUILD_FAILED",
                    "Duplicate document identifier",
                )
                .with_details(format!("nct_id={id}")));
            }

            let tokens = tokenize(&document.search_text);
            let mut term_freq: BTreeMap<String, u32> = BTreeMap::new();
            for token in tokens {
                *term_freq.entry(token).or_insert(0) += 1;
            }
            for term in term_freq.keys() {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
            let len: u32 = term_freq.values().sum();
            total_len += u64::from(len);

            docs.push(IndexedDoc {
                nct_id: id.to_string(),
                term_freq,
                len,
            });
        }

        let avg_doc_len = if docs.is_empty() {
            0.0
        } else {
            total_len as f64 / docs.len() as f64
        };

        info!(
            docs = docs.len(),
            terms = doc_freq.len(),
            avg_doc_len,
            "built lexical index"
        );

        Ok(Self {
            params,
            docs,
            doc_freq,
            avg_doc_len,
        })
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn params(&self) -> Bm25Params {
        self.params
    }

    pub fn avg_doc_len(&self) -> f64 {
        self.avg_doc_len
    }

    /// BM25 score of every document for the given query tokens, in corpus
    /// order. Documents sharing no term with the query score 0 and remain
    /// in the output; an empty query scores every document 0.
    pub fn scores(&self, query_tokens: &[String]) -> Vec<f64> {
        if query_tokens.is_empty() {
            return vec![0.0; self.docs.len()];
        }

        let n = self.docs.len() as f64;
        let avgdl = self.avg_doc_len.max(1.0);
        let k1 = self.params.k1;
        let b = self.params.b;

        // IDF is a per-term corpus statistic; compute it once per query.
        // Repeated query terms contribute once per occurrence.
        let terms: Vec<(&str, f64)> = query_tokens
            .iter()
            .map(|t| {
                let df = self.doc_freq.get(t.as_str()).copied().unwrap_or(0) as f64;
                let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
                (t.as_str(), idf)
            })
            .collect();

        let mut out = Vec::with_capacity(self.docs.len());
        for doc in &self.docs {
            let dl = f64::from(doc.len);
            let norm = k1 * (1.0 - b + b * dl / avgdl);
            let mut score = 0.0;
            for (term, idf) in &terms {
                let tf = doc.term_freq.get(*term).copied().unwrap_or(0) as f64;
                if tf == 0.0 {
                    continue;
                }
                score += idf * (tf * (k1 + 1.0)) / (tf + norm);
            }
            out.push(score);
        }
        out
    }

    /// Full ranking over the corpus: score descending, equal scores keep
    /// corpus insertion order (stable sort). Empty index and empty query
    /// both yield an empty ranking rather than an error.
    pub fn rank(&self, query_tokens: &[String]) -> Vec<ScoredDoc> {
        if self.docs.is_empty() || query_tokens.is_empty() {
            return Vec::new();
        }

        let scores = self.scores(query_tokens);
        let mut out: Vec<ScoredDoc> = scores
            .into_iter()
            .enumerate()
            .map(|(ordinal, score)| ScoredDoc {
                ordinal,
                nct_id: self.docs[ordinal].nct_id.clone(),
                score,
            })
            .collect();
        out.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        out
    }
}
