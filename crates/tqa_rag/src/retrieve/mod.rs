use serde::{Deserialize, Serialize};
use tracing::debug;

use tqa_core::domain::Document;
use tqa_core::error::AppError;

use crate::index::LexicalIndex;
use crate::tokenize::tokenize;

/// One citation-ready retrieval hit. `ordinal` is the document's corpus
/// position; `rank` starts at 1 for the best hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedTrial {
    pub nct_id: String,
    pub title: String,
    pub score: f64,
    pub rank: u32,
    pub ordinal: usize,
}

const MAX_TOP_K: u32 = 50;

/// Score the full corpus for a query and return the top-K hits.
///
/// Ranking is exact BM25 over every document (no partial scans), so results
/// match the corpus-wide ordering. The result length is at most
/// `min(k, corpus size)`; an empty or stop-word-only query retrieves
/// nothing. `k` is clamped to `1..=50`.
pub fn retrieve(
    index: &LexicalIndex,
    documents: &[Document],
    query: &str,
    top_k: u32,
) -> Result<Vec<RetrievedTrial>, AppError> {
    if documents.len() != index.len() {
        return Err(AppError::new(
            "RETRIEVAL_FAILED",
            "Index and document set disagree on document count",
        )
        .with_details(format!(
            "index={}; documents={}",
            index.len(),
            documents.len()
        )));
    }

    let top_k = top_k.clamp(1, MAX_TOP_K) as usize;
    let query_tokens = tokenize(query);
    debug!(terms = query_tokens.len(), top_k, "retrieving");

    let mut ranked = index.rank(&query_tokens);
    ranked.truncate(top_k);

    let mut out = Vec::with_capacity(ranked.len());
    for (i, scored) in ranked.into_iter().enumerate() {
        let document = documents.get(scored.ordinal).ok_or_else(|| {
            AppError::new("RETRIEVAL_FAILED", "Ranked ordinal outside document set")
                .with_details(format!("ordinal={}", scored.ordinal))
        })?;
        out.push(RetrievedTrial {
            nct_id: scored.nct_id,
            title: document.title.clone(),
            score: scored.score,
            rank: (i + 1) as u32,
            ordinal: scored.ordinal,
        });
    }
    Ok(out)
}
