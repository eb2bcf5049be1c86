use std::path::PathBuf;

use clap::{Parser, Subcommand};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::info;

use tqa_core::corpus::{build_documents, fingerprint_file, load_trials};
use tqa_core::demo::demo_trials;
use tqa_core::error::AppError;
use tqa_rag::chat::{ChatConfig, Chatbot};
use tqa_rag::eval::{demo_cases, run_evaluation};
use tqa_rag::index::snapshot::SnapshotStore;
use tqa_rag::index::LexicalIndex;
use tqa_rag::llm::openai_http::OpenAiHttpModel;
use tqa_rag::llm::ChatModel;

/// API key is read from the environment, never from the command line.
const API_KEY_ENV: &str = "TQA_API_KEY";

#[derive(Debug, Parser)]
#[command(
    name = "tqa",
    about = "Clinical trial question answering over a BM25-indexed corpus"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the lexical index from a corpus file and persist a snapshot.
    Index {
        /// JSON array of trial records.
        #[arg(long)]
        corpus: PathBuf,
        /// Snapshot directory to write.
        #[arg(long, default_value = "snapshot")]
        snapshot: PathBuf,
    },
    /// Ask a single question against a corpus (uses a fresh snapshot when
    /// available, rebuilds otherwise).
    Chat {
        #[arg(long)]
        corpus: PathBuf,
        #[arg(long, default_value = "snapshot")]
        snapshot: PathBuf,
        /// OpenAI-compatible endpoint base URL.
        #[arg(long)]
        base_url: String,
        /// Generation model name.
        #[arg(long)]
        model: String,
        #[arg(long, default_value_t = 10)]
        top_k: u32,
        question: String,
    },
    /// Run the demo evaluation suite against the built-in demo corpus.
    Eval {
        #[arg(long)]
        base_url: String,
        #[arg(long)]
        model: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        if let Some(details) = &e.details {
            eprintln!("  {details}");
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Command::Index { corpus, snapshot } => {
            let trials = load_trials(&corpus)?;
            let documents = build_documents(&trials)?;
            let config = ChatConfig::default();
            let index = LexicalIndex::build(&documents, config.bm25)?;

            let fingerprint = fingerprint_file(&corpus)?;
            let store = SnapshotStore::open(snapshot);
            let status = store.save(&index, &documents, &fingerprint, &now_rfc3339_utc()?)?;
            println!(
                "indexed {} trials into {}",
                status.doc_count,
                store.root().display()
            );
            Ok(())
        }
        Command::Chat {
            corpus,
            snapshot,
            base_url,
            model,
            top_k,
            question,
        } => {
            let generation = generation_model(&base_url, &model)?;
            let config = ChatConfig {
                top_k,
                ..ChatConfig::default()
            };

            let fingerprint = fingerprint_file(&corpus)?;
            let store = SnapshotStore::open(snapshot);
            let bot = match store.load_fresh(&fingerprint) {
                Ok((index, documents)) => {
                    info!("using persisted snapshot");
                    Chatbot::from_parts(documents, index, config, generation)?
                }
                Err(_) => {
                    info!("snapshot missing or stale; rebuilding index");
                    let trials = load_trials(&corpus)?;
                    let documents = build_documents(&trials)?;
                    Chatbot::build(documents, config, generation)?
                }
            };

            let result = bot.chat(&question);
            println!("{}", result.answer);
            println!();
            println!("Sources:");
            for source in &result.sources {
                println!(
                    "  {}. {} - {} (score {:.2})",
                    source.rank, source.nct_id, source.title, source.score
                );
            }
            println!();
            println!(
                "Timing: retrieval {} ms, generation {} ms, total {} ms",
                result.timing.retrieval_ms, result.timing.generation_ms, result.timing.total_ms
            );
            if !result.grounding.grounded {
                println!("Warning: answer is not grounded in the retrieved trials.");
            }
            Ok(())
        }
        Command::Eval { base_url, model } => {
            let generation = generation_model(&base_url, &model)?;
            let documents = build_documents(&demo_trials())?;
            let bot = Chatbot::build(documents, ChatConfig::default(), generation)?;

            let report = run_evaluation(&bot, &demo_cases());
            let json = serde_json::to_string_pretty(&report).map_err(|e| {
                AppError::new("EVAL_REPORT_FAILED", "Failed to encode evaluation report")
                    .with_details(e.to_string())
            })?;
            println!("{json}");
            if !report.passed {
                return Err(AppError::new(
                    "EVAL_THRESHOLD_FAILED",
                    "Evaluation did not meet grounding/latency thresholds",
                ));
            }
            Ok(())
        }
    }
}

fn generation_model(base_url: &str, model: &str) -> Result<Box<dyn ChatModel + Send + Sync>, AppError> {
    let api_key = std::env::var(API_KEY_ENV).unwrap_or_default();
    Ok(Box::new(OpenAiHttpModel::new(base_url, &api_key, model)?))
}

fn now_rfc3339_utc() -> Result<String, AppError> {
    OffsetDateTime::now_utc().format(&Rfc3339).map_err(|e| {
        AppError::new("SNAPSHOT_WRITE_FAILED", "Failed to format build timestamp")
            .with_details(e.to_string())
    })
}
