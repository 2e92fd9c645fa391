use crate::api::SpellMatch;
use crate::tokens::Token;

/// For each token, whether a reported span covers it entirely.
///
/// Spans and tokens share UTF-16 offsets, so a repeated word is judged at
/// its own position, not at its first occurrence.
pub(crate) fn error_mask(tokens: &[Token], matches: &[SpellMatch]) -> Vec<bool> {
    tokens
        .iter()
        .map(|t| {
            matches
                .iter()
                .any(|m| m.offset <= t.start && m.offset + m.length >= t.end)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::tokenize;

    #[test]
    fn test_span_marks_covered_word_only() {
        let tokens = tokenize("I havv a cat");
        let mask = error_mask(&tokens, &[SpellMatch { offset: 2, length: 4 }]);
        assert_eq!(mask, vec![false, true, false, false]);
    }

    #[test]
    fn test_repeated_word_is_judged_by_position() {
        // Only the second "teh" is flagged.
        let tokens = tokenize("teh cat and teh dog");
        let mask = error_mask(&tokens, &[SpellMatch { offset: 12, length: 3 }]);
        assert_eq!(mask, vec![false, false, false, true, false]);
    }

    #[test]
    fn test_span_covering_several_tokens() {
        let tokens = tokenize("a b c");
        let mask = error_mask(&tokens, &[SpellMatch { offset: 0, length: 3 }]);
        assert_eq!(mask, vec![true, true, false]);
    }

    #[test]
    fn test_partial_overlap_does_not_mark() {
        let tokens = tokenize("hello");
        let mask = error_mask(&tokens, &[SpellMatch { offset: 1, length: 2 }]);
        assert_eq!(mask, vec![false]);
        assert_eq!(error_mask(&tokens, &[]), vec![false]);
    }
}
