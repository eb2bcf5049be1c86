use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::prompts::REFUSAL_ANSWER;

/// Outcome of citation verification for one answer.
///
/// `cited_ids` are identifiers present in the retrieved set; `unknown_ids`
/// are well-formed identifiers the answer cites that were NOT retrieved
/// (hallucinated citations) — a distinct condition from citing nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroundingReport {
    pub grounded: bool,
    pub cited_ids: BTreeSet<String>,
    pub unknown_ids: BTreeSet<String>,
    pub refusal: bool,
}

/// Registry identifiers are `NCT` followed by exactly eight digits.
const NCT_DIGITS: usize = 8;

/// Extract every well-formed trial identifier from free text. Digit runs
/// shorter or longer than the registry format are not candidates.
pub fn extract_trial_ids(text: &str) -> BTreeSet<String> {
    let bytes = text.as_bytes();
    let mut out = BTreeSet::new();
    let mut i = 0usize;
    while i + 3 <= bytes.len() {
        if bytes[i..].starts_with(b"NCT") {
            let start = i + 3;
            let mut end = start;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
            if end - start == NCT_DIGITS {
                out.insert(text[i..end].to_string());
            }
            i = if end > start { end } else { start };
            continue;
        }
        i += 1;
    }
    out
}

/// Check an answer against the identifiers that were actually retrieved.
///
/// Grounded means: at least one cited identifier is in `known_ids`, or the
/// answer is the canonical explicit refusal — and no hallucinated
/// identifier appears. An answer citing an identifier outside `known_ids`
/// is flagged ungrounded even if it also cites a real one.
pub fn verify(answer: &str, known_ids: &BTreeSet<String>) -> GroundingReport {
    let refusal = answer.contains(REFUSAL_ANSWER);

    let mut cited_ids = BTreeSet::new();
    let mut unknown_ids = BTreeSet::new();
    for id in extract_trial_ids(answer) {
        if known_ids.contains(&id) {
            cited_ids.insert(id);
        } else {
            unknown_ids.insert(id);
        }
    }

    let grounded = (!cited_ids.is_empty() || refusal) && unknown_ids.is_empty();
    GroundingReport {
        grounded,
        cited_ids,
        unknown_ids,
        refusal,
    }
}
