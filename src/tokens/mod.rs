/// One word or punctuation mark from a note's text.
///
/// Offsets are in UTF-16 code units: both the browser's speech `charIndex`
/// and LanguageTool's `offset` count that way.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Token {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '\''
}

fn is_punct(c: char) -> bool {
    matches!(c, '.' | ',' | '!' | '?' | ';')
}

/// Split text into word runs (`[\w']+`) and single punctuation marks
/// (`.,!?;`). Everything else separates tokens and is dropped.
pub(crate) fn tokenize(input: &str) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::new();
    let mut word: Option<(usize, String)> = None;
    let mut pos: usize = 0;

    for c in input.chars() {
        let width = c.len_utf16();

        if is_word_char(c) {
            match word.as_mut() {
                Some((_, text)) => text.push(c),
                None => word = Some((pos, c.to_string())),
            }
        } else {
            if let Some((start, text)) = word.take() {
                out.push(Token { text, start, end: pos });
            }
            if is_punct(c) {
                out.push(Token {
                    text: c.to_string(),
                    start: pos,
                    end: pos + width,
                });
            }
        }

        pos += width;
    }

    if let Some((start, text)) = word {
        out.push(Token { text, start, end: pos });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_tokenize_words_and_punctuation() {
        let t = tokenize("Hello, world! It's fine.");
        assert_eq!(texts(&t), vec!["Hello", ",", "world", "!", "It's", "fine", "."]);
        assert_eq!((t[0].start, t[0].end), (0, 5));
        assert_eq!((t[1].start, t[1].end), (5, 6));
        assert_eq!((t[2].start, t[2].end), (7, 12));
        assert_eq!((t[4].start, t[4].end), (14, 18));
    }

    #[test]
    fn test_tokenize_drops_other_symbols() {
        let t = tokenize("a - b (c) \"d\"");
        assert_eq!(texts(&t), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_tokenize_counts_utf16_units() {
        // U+1F600 is two UTF-16 units.
        let t = tokenize("😀 ok");
        assert_eq!(texts(&t), vec!["ok"]);
        assert_eq!((t[0].start, t[0].end), (3, 5));

        let t = tokenize("café au lait");
        assert_eq!((t[1].start, t[1].end), (5, 7));
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  \n\t ").is_empty());
    }
}
