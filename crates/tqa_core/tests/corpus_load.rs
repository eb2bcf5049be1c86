use std::fs;

use tqa_core::corpus::{fingerprint_file, load_trials};

#[test]
fn loads_a_json_corpus_and_fingerprints_it() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("trials.json");
    fs::write(
        &path,
        r#"[
            {"NCTId": "NCT00000001", "BriefTitle": "Diabetes Type 2 Trial", "OverallStatus": "RECRUITING"},
            {"NCTId": "NCT00000002", "Conditions": "Asthma"}
        ]"#,
    )
    .expect("write corpus");

    let trials = load_trials(&path).expect("load");
    assert_eq!(trials.len(), 2);
    assert_eq!(trials[0].nct_id, "NCT00000001");
    assert_eq!(trials[0].brief_title.as_deref(), Some("Diabetes Type 2 Trial"));
    assert_eq!(trials[1].brief_title, None);

    let fp1 = fingerprint_file(&path).expect("fingerprint");
    let fp2 = fingerprint_file(&path).expect("fingerprint");
    assert_eq!(fp1, fp2);

    fs::write(&path, "[]").expect("rewrite corpus");
    let fp3 = fingerprint_file(&path).expect("fingerprint");
    assert_ne!(fp1, fp3);
}

#[test]
fn rejects_corpus_with_duplicate_identifiers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("trials.json");
    fs::write(
        &path,
        r#"[{"NCTId": "NCT00000001"}, {"NCTId": "NCT00000001"}]"#,
    )
    .expect("write corpus");

    let err = load_trials(&path).expect_err("duplicates must fail");
    assert_eq!(err.code, "CORPUS_DUPLICATE_ID");
}

#[test]
fn missing_file_reports_load_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = load_trials(&dir.path().join("absent.json")).expect_err("must fail");
    assert_eq!(err.code, "CORPUS_LOAD_FAILED");
}
