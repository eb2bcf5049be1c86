use tqa_core::error::AppError;

/// Boundary to the external answer-generation capability. Implementations
/// must convert every transport failure into a `GENERATION_UNAVAILABLE`
/// error rather than panicking, so the pipeline can recover per query.
pub trait ChatModel {
    fn complete(&self, system: &str, user: &str) -> Result<String, AppError>;
}

pub mod openai_http;
