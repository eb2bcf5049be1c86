use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use tqa_core::domain::Document;
use tqa_core::error::AppError;

use crate::retrieve::RetrievedTrial;

/// Bounded generation context assembled from retrieval hits.
///
/// `citations` maps each included identifier to its display snippet; hits
/// dropped for budget never appear in it, so the identifier set always
/// matches the text the model actually sees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextWindow {
    pub text: String,
    pub citations: BTreeMap<String, String>,
    pub included: u32,
    pub dropped: u32,
}

const BLOCK_SEPARATOR: &str = "\n\n";
const SNIPPET_CHARS: usize = 280;

/// Render hits into labeled blocks, best-ranked first, until the character
/// budget is reached. Once a block does not fit, it and everything ranked
/// below it are dropped: rank order is how relevance priority reaches the
/// generation step, so no lower-ranked block may jump the budget.
pub fn build_context(
    hits: &[RetrievedTrial],
    documents: &[Document],
    budget_chars: usize,
) -> Result<ContextWindow, AppError> {
    let mut text = String::new();
    let mut citations = BTreeMap::new();
    let mut included: u32 = 0;
    let mut dropped: u32 = 0;

    for hit in hits {
        let document = documents.get(hit.ordinal).ok_or_else(|| {
            AppError::new("CONTEXT_BUILD_FAILED", "Hit ordinal outside document set")
                .with_details(format!("nct_id={}; ordinal={}", hit.nct_id, hit.ordinal))
        })?;

        if dropped > 0 {
            dropped += 1;
            continue;
        }

        let block = format!(
            "[Trial {} - {}]\n{}",
            hit.rank, document.nct_id, document.display_text
        );
        let cost = if text.is_empty() {
            block.len()
        } else {
            BLOCK_SEPARATOR.len() + block.len()
        };
        if text.len() + cost > budget_chars {
            dropped += 1;
            continue;
        }

        if !text.is_empty() {
            text.push_str(BLOCK_SEPARATOR);
        }
        text.push_str(&block);
        citations.insert(
            document.nct_id.clone(),
            snippet_first_chars(&document.display_text, SNIPPET_CHARS),
        );
        included += 1;
    }

    debug!(included, dropped, chars = text.len(), "built context window");
    Ok(ContextWindow {
        text,
        citations,
        included,
        dropped,
    })
}

fn snippet_first_chars(text: &str, max_chars: usize) -> String {
    let t = text.trim();
    if t.chars().count() <= max_chars {
        return t.to_string();
    }
    let mut s: String = t.chars().take(max_chars).collect();
    s.push_str("...");
    s
}
