//! Text canonicalization applied before caching and synthesis.

use std::borrow::Cow;

/// Sentence punctuation removed by the fallback retry.
const SENTENCE_PUNCTUATION: [char; 4] = ['.', '?', '!', ','];

/// Normalizes text for cache keys and synthesis requests.
///
/// All-caps text longer than one character that contains a letter is
/// converted to sentence case; anything else is returned unchanged.
///
/// ```
/// use speakboard_speech::normalize;
///
/// assert_eq!(normalize("HELLO WORLD"), "Hello world");
/// assert_eq!(normalize("Hello"), "Hello");
/// assert_eq!(normalize("I"), "I");
/// assert_eq!(normalize("123"), "123");
/// ```
pub fn normalize(text: &str) -> Cow<'_, str> {
    if text.chars().count() <= 1 || !text.chars().any(char::is_alphabetic) {
        return Cow::Borrowed(text);
    }
    if text != text.to_uppercase() {
        return Cow::Borrowed(text);
    }

    let mut chars = text.chars();
    match chars.next() {
        Some(first) => {
            let mut out: String = first.to_uppercase().collect();
            out.push_str(&chars.as_str().to_lowercase());
            Cow::Owned(out)
        }
        None => Cow::Borrowed(text),
    }
}

/// Returns true if the text contains `.`, `?`, `!` or `,`.
pub fn has_sentence_punctuation(text: &str) -> bool {
    text.contains(SENTENCE_PUNCTUATION)
}

/// Removes sentence punctuation and collapses the whitespace left behind.
pub fn strip_punctuation(text: &str) -> String {
    text.replace(SENTENCE_PUNCTUATION, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_caps_to_sentence_case() {
        assert_eq!(normalize("HELLO"), "Hello");
        assert_eq!(normalize("I WANT WATER!"), "I want water!");
        assert_eq!(normalize("OK"), "Ok");
    }

    #[test]
    fn test_unchanged_inputs() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("A"), "A");
        assert_eq!(normalize("Hello"), "Hello");
        assert_eq!(normalize("hello"), "hello");
        assert_eq!(normalize("42!"), "42!");
        assert!(matches!(normalize("Mixed Case"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_non_ascii_letters() {
        assert_eq!(normalize("ÉCOLE"), "École");
    }

    #[test]
    fn test_strip_punctuation() {
        assert!(has_sentence_punctuation("Hi, there."));
        assert!(!has_sentence_punctuation("Hi there"));
        assert_eq!(strip_punctuation("Hi, there. How are you?"), "Hi there How are you");
        assert_eq!(strip_punctuation("Wait!"), "Wait");
        assert_eq!(strip_punctuation("..."), "");
    }
}
