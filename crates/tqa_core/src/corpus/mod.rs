use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::info;

use crate::domain::{build_document, Document, TrialRecord};
use crate::error::AppError;

/// Load the trial corpus from a JSON array file.
///
/// The corpus is static for the process lifetime; validation failures here
/// are fatal and must stop startup before any query is served.
pub fn load_trials(path: &Path) -> Result<Vec<TrialRecord>, AppError> {
    let bytes = fs::read(path).map_err(|e| {
        AppError::new("CORPUS_LOAD_FAILED", "Failed to read corpus file")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    let trials: Vec<TrialRecord> = serde_json::from_slice(&bytes).map_err(|e| {
        AppError::new("CORPUS_LOAD_FAILED", "Failed to decode corpus file")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    validate_trials(&trials)?;
    info!(count = trials.len(), "loaded trial corpus");
    Ok(trials)
}

/// Identifier checks shared by every corpus entry point: identifiers are
/// mandatory and must be unique across the corpus.
pub fn validate_trials(trials: &[TrialRecord]) -> Result<(), AppError> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for trial in trials {
        let id = trial.nct_id.trim();
        if id.is_empty() {
            return Err(AppError::new(
                "CORPUS_RECORD_INVALID",
                "Trial record is missing its NCT identifier",
            ));
        }
        if !seen.insert(id) {
            return Err(AppError::new(
                "CORPUS_DUPLICATE_ID",
                "Duplicate NCT identifier in corpus",
            )
            .with_details(format!("nct_id={id}")));
        }
    }
    Ok(())
}

/// Validate and flatten a corpus into index-ready documents, preserving
/// corpus order (document position is the scoring tie-break key).
pub fn build_documents(trials: &[TrialRecord]) -> Result<Vec<Document>, AppError> {
    validate_trials(trials)?;
    Ok(trials.iter().map(build_document).collect())
}

/// Fingerprint of the raw corpus bytes; a snapshot built from different
/// bytes is stale and must be rebuilt.
pub fn corpus_fingerprint(bytes: &[u8]) -> String {
    sha256_hex(bytes)
}

pub fn fingerprint_file(path: &Path) -> Result<String, AppError> {
    let bytes = fs::read(path).map_err(|e| {
        AppError::new("CORPUS_LOAD_FAILED", "Failed to read corpus file for fingerprint")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    Ok(corpus_fingerprint(&bytes))
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(digest)
}
