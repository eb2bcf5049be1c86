/// Stop-words removed on both the index and query paths. Sorted; looked up
/// via binary search.
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "has", "have", "if",
    "in", "into", "is", "it", "its", "no", "not", "of", "on", "or", "that", "the", "their",
    "then", "there", "these", "they", "this", "to", "was", "were", "which", "will", "with",
];

/// Deterministic text-to-token transform shared by index construction and
/// query scoring. Indexing and querying MUST go through this same function:
/// any asymmetry between the two paths silently degrades ranking quality.
///
/// Lowercases, strips non-alphanumeric characters inside whitespace-split
/// words, and drops empties and stop-words. Empty input yields an empty
/// sequence. Idempotent: retokenizing the joined output is a fixed point.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    for word in text.split_whitespace() {
        let token: String = word
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        if token.is_empty() {
            continue;
        }
        if STOP_WORDS.binary_search(&token.as_str()).is_ok() {
            continue;
        }
        out.push(token);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn stop_word_table_is_sorted() {
        let mut sorted = STOP_WORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(STOP_WORDS, sorted.as_slice());
    }

    #[test]
    fn lowercases_and_strips_punctuation() {
        assert_eq!(
            tokenize("Diabetes, Type-2 (Trial)!"),
            vec!["diabetes", "type2", "trial"]
        );
    }

    #[test]
    fn empty_and_punctuation_only_input_yield_nothing() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t\n").is_empty());
        assert!(tokenize("... !!! ---").is_empty());
    }

    #[test]
    fn stop_words_are_dropped_on_both_paths() {
        assert!(tokenize("the, and!").is_empty());
        assert_eq!(tokenize("trials for the PTSD"), vec!["trials", "ptsd"]);
    }

    #[test]
    fn tokenization_is_idempotent_under_rejoin() {
        let inputs = [
            "Diabetes Type 2 trial, recruiting ADULTS!",
            "the quick (brown) fox",
            "NCT00000001: eligibility criteria",
        ];
        for input in inputs {
            let once = tokenize(input);
            let again = tokenize(&once.join(" "));
            assert_eq!(once, again);
        }
    }

    #[test]
    fn repeated_terms_are_preserved_in_order() {
        assert_eq!(
            tokenize("pain pain relief"),
            vec!["pain", "pain", "relief"]
        );
    }
}
