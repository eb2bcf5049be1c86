pub mod corpus;
pub mod demo;
pub mod domain;
pub mod error;

#[cfg(test)]
mod tests {
    use super::error::AppError;

    #[test]
    fn app_error_is_structured() {
        let err = AppError::new("CORPUS_LOAD_FAILED", "corpus unreadable").with_retryable(false);
        assert_eq!(err.code, "CORPUS_LOAD_FAILED");
        assert_eq!(err.message, "corpus unreadable");
        assert_eq!(err.retryable, false);
    }
}
