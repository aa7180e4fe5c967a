//! Answer extraction from raw generated text.

/// Keep only what follows the last occurrence of `cue`, trimmed.
///
/// Backends that echo the prompt before answering produce text like
/// `"...Question: q\nAnswer: 42"`; splitting on the final cue recovers `"42"`.
/// Without the cue (or with an empty cue) the whole text is returned trimmed.
pub fn extract_answer(raw: &str, cue: &str) -> String {
    if cue.is_empty() {
        return raw.trim().to_string();
    }

    match raw.rfind(cue) {
        Some(at) => raw[at + cue.len()..].trim().to_string(),
        None => raw.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_after_cue() {
        assert_eq!(extract_answer("...blah Answer: 42", "Answer:"), "42");
    }

    #[test]
    fn test_without_cue_returns_trimmed_text() {
        assert_eq!(
            extract_answer("  Stay indoors and away from windows.\n", "Answer:"),
            "Stay indoors and away from windows."
        );
    }

    #[test]
    fn test_last_cue_wins() {
        let echoed = "Question: what?\nAnswer: first\nAnswer:  second  ";
        assert_eq!(extract_answer(echoed, "Answer:"), "second");
    }

    #[test]
    fn test_cue_at_end_yields_empty() {
        assert_eq!(extract_answer("Question: q\nAnswer:", "Answer:"), "");
    }

    #[test]
    fn test_padded_configured_cue_still_splits_echo() {
        let prompts = relief_prompt::PromptSet::new(
            relief_prompt::DEFAULT_GROUNDED,
            relief_prompt::DEFAULT_FALLBACK,
            "Answer: ",
        )
        .unwrap();
        let echoed = "Context:\nflood\n\nQuestion: what now?\nAnswer:\nMove inland";

        assert_eq!(extract_answer(echoed, prompts.answer_cue()), "Move inland");
    }

    #[test]
    fn test_empty_cue() {
        assert_eq!(extract_answer(" raw ", ""), "raw");
    }

    #[test]
    fn test_multibyte_text_around_cue() {
        assert_eq!(
            extract_answer("Réponse précédente. Answer: évacuez 🚨", "Answer:"),
            "évacuez 🚨"
        );
    }
}
