/// Canonical refusal sentence. The system instructions require the model to
/// use exactly this sentence when the context cannot answer the question,
/// and the orchestrator emits it verbatim for empty queries, so grounding
/// verification can match it as an exact substring.
pub const REFUSAL_ANSWER: &str =
    "Based on the provided data, I cannot find relevant information.";

/// Fixed best-effort answer when the generation call fails or times out.
/// Retrieval results are still returned alongside it.
pub const UNAVAILABLE_ANSWER: &str =
    "Answer generation is currently unavailable. The most relevant trials retrieved for this question are listed as sources.";

pub fn system_instructions() -> String {
    format!(
        r#"You are a professional clinical trial information assistant.

Rules (non-negotiable):
1) Answer ONLY from the clinical trial data provided in the context.
2) Cite the specific trial identifier (for example NCT01234567) for every factual claim.
3) If the provided data does not contain relevant information, reply exactly: "{REFUSAL_ANSWER}"
4) Never fabricate or speculate about trials, identifiers, or facts.
5) Use concise, professional language.
6) When the question involves multiple trials, list each relevant trial with its identifier.
"#
    )
}

pub fn question_prompt(context: &str, question: &str) -> String {
    format!(
        r#"Answer the question using only the clinical trial data below.

Clinical trial data:
{context}

Question: {question}

Cite the specific trial identifiers your answer relies on. If the data does not contain relevant information, say so exactly as instructed.
"#
    )
}
