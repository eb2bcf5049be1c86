use std::collections::BTreeSet;
use std::sync::Mutex;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use tqa_core::domain::Document;
use tqa_core::error::AppError;

use crate::context::build_context;
use crate::grounding::{verify, GroundingReport};
use crate::index::{Bm25Params, LexicalIndex};
use crate::llm::ChatModel;
use crate::prompts;
use crate::retrieve::{retrieve, RetrievedTrial};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatConfig {
    pub top_k: u32,
    pub context_budget_chars: usize,
    pub bm25: Bm25Params,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            context_budget_chars: 8000,
            bm25: Bm25Params::default(),
        }
    }
}

/// Pipeline stages, strictly sequential: each stage consumes the previous
/// stage's output. `Failed` is terminal; a generation failure is recovered
/// into a well-formed result but still reports `Failed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatStage {
    Received,
    Retrieving,
    ContextBuilt,
    Generating,
    Verifying,
    Done,
    Failed,
}

/// Wall-clock stage timings. Populated on every path, including failures.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatTiming {
    pub retrieval_ms: u64,
    pub generation_ms: u64,
    pub total_ms: u64,
}

/// One chat turn's result. Every failure path still produces one of these —
/// a caller never sees a raw error for a query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub answer: String,
    pub sources: Vec<RetrievedTrial>,
    pub grounding: GroundingReport,
    pub timing: ChatTiming,
    pub stage: ChatStage,
}

/// Cumulative per-process counters, the only mutable state shared between
/// concurrent queries.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatStats {
    pub total_queries: u64,
    pub total_retrieval_ms: u64,
    pub total_generation_ms: u64,
    pub total_ms: u64,
}

/// Explicit pipeline context: documents, the built index, configuration,
/// and the generation boundary, assembled at construction instead of held
/// in process-wide state so tests can run against fixture corpora.
pub struct Chatbot {
    documents: Vec<Document>,
    index: LexicalIndex,
    config: ChatConfig,
    model: Box<dyn ChatModel + Send + Sync>,
    stats: Mutex<ChatStats>,
}

impl Chatbot {
    /// Build the index from documents in corpus order and assemble the
    /// pipeline. Index build failures are fatal: the caller must not serve
    /// queries without a built index.
    pub fn build(
        documents: Vec<Document>,
        config: ChatConfig,
        model: Box<dyn ChatModel + Send + Sync>,
    ) -> Result<Self, AppError> {
        let index = LexicalIndex::build(&documents, config.bm25)?;
        Self::from_parts(documents, index, config, model)
    }

    /// Assemble the pipeline from a pre-built (for example snapshot-loaded)
    /// index and its matching document set.
    pub fn from_parts(
        documents: Vec<Document>,
        index: LexicalIndex,
        config: ChatConfig,
        model: Box<dyn ChatModel + Send + Sync>,
    ) -> Result<Self, AppError> {
        if documents.len() != index.len() {
            return Err(AppError::new(
                "INDEX_BUILD_FAILED",
                "Index and document set disagree on document count",
            )
            .with_details(format!(
                "index={}; documents={}",
                index.len(),
                documents.len()
            )));
        }
        Ok(Self {
            documents,
            index,
            config,
            model,
            stats: Mutex::new(ChatStats::default()),
        })
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn corpus_size(&self) -> usize {
        self.documents.len()
    }

    /// Answer one question. Stages run strictly in order; all per-query
    /// failures are converted into a well-formed refusal or recovery
    /// result, never surfaced as an error.
    pub fn chat(&self, question: &str) -> QueryResult {
        let total_start = Instant::now();
        let mut stage = ChatStage::Received;
        let mut timing = ChatTiming::default();
        debug!(stage = ?stage, "chat turn started");

        stage = ChatStage::Retrieving;
        debug!(stage = ?stage, "retrieving");
        let retrieval_start = Instant::now();
        let sources = match retrieve(&self.index, &self.documents, question, self.config.top_k) {
            Ok(hits) => hits,
            Err(e) => {
                // Should not occur against a built index; refuse rather
                // than crash the turn.
                warn!(code = %e.code, "retrieval failed");
                timing.retrieval_ms = elapsed_ms(retrieval_start);
                timing.total_ms = elapsed_ms(total_start);
                return self.finish(QueryResult {
                    answer: prompts::REFUSAL_ANSWER.to_string(),
                    sources: Vec::new(),
                    grounding: verify(prompts::REFUSAL_ANSWER, &BTreeSet::new()),
                    timing,
                    stage: ChatStage::Failed,
                });
            }
        };
        timing.retrieval_ms = elapsed_ms(retrieval_start);

        if sources.is_empty() {
            // Nothing is relevant to no terms: refuse without invoking the
            // generation capability at all.
            timing.total_ms = elapsed_ms(total_start);
            return self.finish(QueryResult {
                answer: prompts::REFUSAL_ANSWER.to_string(),
                sources,
                grounding: verify(prompts::REFUSAL_ANSWER, &BTreeSet::new()),
                timing,
                stage: ChatStage::Done,
            });
        }

        let context = match build_context(&sources, &self.documents, self.config.context_budget_chars)
        {
            Ok(c) => c,
            Err(e) => {
                warn!(code = %e.code, "context build failed");
                timing.total_ms = elapsed_ms(total_start);
                return self.finish(QueryResult {
                    answer: prompts::REFUSAL_ANSWER.to_string(),
                    sources,
                    grounding: GroundingReport::default(),
                    timing,
                    stage: ChatStage::Failed,
                });
            }
        };
        stage = ChatStage::ContextBuilt;
        debug!(stage = ?stage, included = context.included, "context built");

        stage = ChatStage::Generating;
        debug!(stage = ?stage, "generating");
        let system = prompts::system_instructions();
        let user = prompts::question_prompt(&context.text, question);
        let generation_start = Instant::now();
        match self.model.complete(&system, &user) {
            Ok(answer) => {
                timing.generation_ms = elapsed_ms(generation_start);

                stage = ChatStage::Verifying;
                debug!(stage = ?stage, "verifying grounding");
                let known: BTreeSet<String> =
                    sources.iter().map(|s| s.nct_id.clone()).collect();
                let grounding = verify(&answer, &known);
                if !grounding.unknown_ids.is_empty() {
                    warn!(
                        unknown = grounding.unknown_ids.len(),
                        "answer cites identifiers outside the retrieved set"
                    );
                }

                timing.total_ms = elapsed_ms(total_start);
                self.finish(QueryResult {
                    answer,
                    sources,
                    grounding,
                    timing,
                    stage: ChatStage::Done,
                })
            }
            Err(e) => {
                timing.generation_ms = elapsed_ms(generation_start);
                // Recoverable: retrieval value is preserved and the caller
                // gets the fixed unavailable message instead of an error.
                warn!(code = %e.code, retryable = e.retryable, "generation unavailable");
                timing.total_ms = elapsed_ms(total_start);
                self.finish(QueryResult {
                    answer: prompts::UNAVAILABLE_ANSWER.to_string(),
                    sources,
                    grounding: GroundingReport::default(),
                    timing,
                    stage: ChatStage::Failed,
                })
            }
        }
    }

    pub fn stats(&self) -> ChatStats {
        self.stats.lock().map(|s| *s).unwrap_or_default()
    }

    fn finish(&self, result: QueryResult) -> QueryResult {
        if let Ok(mut stats) = self.stats.lock() {
            stats.total_queries += 1;
            stats.total_retrieval_ms += result.timing.retrieval_ms;
            stats.total_generation_ms += result.timing.generation_ms;
            stats.total_ms += result.timing.total_ms;
        }
        result
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
