pub mod chat;
pub mod context;
pub mod eval;
pub mod grounding;
pub mod index;
pub mod llm;
pub mod prompts;
pub mod retrieve;
pub mod tokenize;

#[cfg(test)]
mod tests {
    use super::grounding::verify;
    use super::tokenize::tokenize;
    use std::collections::BTreeSet;

    #[test]
    fn tokenizer_and_verifier_agree_on_identifiers() {
        // An identifier survives tokenization lowercased, but citation
        // scanning works on the raw answer text, not on tokens.
        let answer = "Trial NCT00000001 is recruiting.";
        assert!(tokenize(answer).contains(&"nct00000001".to_string()));

        let known: BTreeSet<String> = ["NCT00000001".to_string()].into_iter().collect();
        assert!(verify(answer, &known).grounded);
    }
}
