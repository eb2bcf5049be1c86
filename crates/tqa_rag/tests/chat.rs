use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tqa_core::corpus::build_documents;
use tqa_core::demo::demo_trials;
use tqa_core::domain::Document;
use tqa_core::error::AppError;

use tqa_rag::chat::{ChatConfig, ChatStage, Chatbot};
use tqa_rag::llm::ChatModel;
use tqa_rag::prompts::{REFUSAL_ANSWER, UNAVAILABLE_ANSWER};

struct FixedModel {
    out: String,
    calls: Arc<AtomicUsize>,
}

impl FixedModel {
    fn new(out: &str) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                out: out.to_string(),
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

impl ChatModel for FixedModel {
    fn complete(&self, _system: &str, _user: &str) -> Result<String, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.out.clone())
    }
}

struct FailingModel;

impl ChatModel for FailingModel {
    fn complete(&self, _system: &str, _user: &str) -> Result<String, AppError> {
        Err(
            AppError::new("GENERATION_UNAVAILABLE", "simulated timeout")
                .with_retryable(true),
        )
    }
}

fn diabetes_doc() -> Document {
    Document {
        nct_id: "NCT00000001".to_string(),
        title: "Diabetes Type 2 Trial".to_string(),
        display_text: "Title: Diabetes Type 2 Trial\nStatus: RECRUITING".to_string(),
        search_text: "diabetes type 2 trial".to_string(),
    }
}

#[test]
fn answers_from_a_single_document_corpus_with_grounded_citation() {
    let (model, _calls) = FixedModel::new("Trial NCT00000001 studies type 2 diabetes.");
    let bot = Chatbot::build(vec![diabetes_doc()], ChatConfig::default(), Box::new(model))
        .expect("build");

    let result = bot.chat("diabetes trial");
    assert_eq!(result.stage, ChatStage::Done);
    assert_eq!(result.sources.len(), 1);
    assert_eq!(result.sources[0].nct_id, "NCT00000001");
    assert!(result.sources[0].score > 0.0);
    assert!(result.grounding.grounded);
    assert!(result.grounding.cited_ids.contains("NCT00000001"));
}

#[test]
fn stop_word_query_refuses_without_invoking_generation() {
    let (model, calls) = FixedModel::new("should never be used");
    let bot = Chatbot::build(vec![diabetes_doc()], ChatConfig::default(), Box::new(model))
        .expect("build");

    let result = bot.chat("the, and!");
    assert_eq!(result.stage, ChatStage::Done);
    assert_eq!(result.answer, REFUSAL_ANSWER);
    assert!(result.sources.is_empty());
    assert!(result.grounding.grounded);
    assert!(result.grounding.refusal);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn generation_failure_is_recovered_with_sources_preserved() {
    let bot = Chatbot::build(
        vec![diabetes_doc()],
        ChatConfig::default(),
        Box::new(FailingModel),
    )
    .expect("build");

    let result = bot.chat("diabetes trial");
    assert_eq!(result.stage, ChatStage::Failed);
    assert_eq!(result.answer, UNAVAILABLE_ANSWER);
    assert_eq!(result.sources.len(), 1);
    assert_eq!(result.sources[0].nct_id, "NCT00000001");
    assert!(!result.grounding.grounded);
    // Timing stays populated on the failure path.
    assert!(result.timing.total_ms >= result.timing.generation_ms);
}

#[test]
fn hallucinated_citation_is_flagged_not_silently_accepted() {
    let (model, _calls) =
        FixedModel::new("Trial NCT99999999 is the best match for this question.");
    let bot = Chatbot::build(vec![diabetes_doc()], ChatConfig::default(), Box::new(model))
        .expect("build");

    let result = bot.chat("diabetes trial");
    assert_eq!(result.stage, ChatStage::Done);
    assert!(!result.grounding.grounded);
    assert!(result.grounding.unknown_ids.contains("NCT99999999"));
}

#[test]
fn empty_corpus_refuses_cleanly() {
    let (model, calls) = FixedModel::new("unused");
    let bot = Chatbot::build(Vec::new(), ChatConfig::default(), Box::new(model)).expect("build");

    let result = bot.chat("diabetes trial");
    assert_eq!(result.stage, ChatStage::Done);
    assert_eq!(result.answer, REFUSAL_ANSWER);
    assert!(result.sources.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn stats_accumulate_across_queries() {
    let (model, _calls) = FixedModel::new("Trial NCT00000001 applies.");
    let bot = Chatbot::build(vec![diabetes_doc()], ChatConfig::default(), Box::new(model))
        .expect("build");

    bot.chat("diabetes trial");
    bot.chat("the, and!");
    let stats = bot.stats();
    assert_eq!(stats.total_queries, 2);
    assert!(stats.total_ms >= stats.total_retrieval_ms);
}

#[test]
fn demo_corpus_retrieves_the_expected_trial_for_an_identifier_query() {
    let docs = build_documents(&demo_trials()).expect("demo docs");
    let (model, _calls) = FixedModel::new("Trial NCT00000002 is ACTIVE_NOT_RECRUITING.");
    let bot = Chatbot::build(docs, ChatConfig::default(), Box::new(model)).expect("build");

    let result = bot.chat("What is the status of trial NCT00000002?");
    assert_eq!(result.stage, ChatStage::Done);
    assert_eq!(result.sources[0].nct_id, "NCT00000002");
    assert!(result.grounding.grounded);
}
