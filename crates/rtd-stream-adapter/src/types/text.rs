/*
[INPUT]:  Operator-supplied symbol and topic text
[OUTPUT]: Length-bounded text newtypes
[POS]:    Data layer - bounded identifiers passed to providers
[UPDATE]: When provider field limits change
*/

use std::fmt;

/// Maximum symbol length in characters.
pub const MAX_SYMBOL_LEN: usize = 31;
/// Maximum topic length in characters.
pub const MAX_TOPIC_LEN: usize = 31;

/// Text holding at most `N` characters. Longer input is truncated on a char boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BoundedText<const N: usize>(String);

pub type Symbol = BoundedText<MAX_SYMBOL_LEN>;
pub type Topic = BoundedText<MAX_TOPIC_LEN>;

impl<const N: usize> BoundedText<N> {
    pub fn new(text: &str) -> Self {
        Self(truncate_chars(text, N))
    }

    pub const fn capacity() -> usize {
        N
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<const N: usize> From<&str> for BoundedText<N> {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl<const N: usize> AsRef<str> for BoundedText<N> {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<const N: usize> PartialEq<str> for BoundedText<N> {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl<const N: usize> PartialEq<&str> for BoundedText<N> {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl<const N: usize> fmt::Display for BoundedText<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Truncate `text` to at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_kept() {
        let symbol = Symbol::new("AAPL");
        assert_eq!(symbol, "AAPL");
        assert!(!symbol.is_empty());
    }

    #[test]
    fn long_text_is_truncated_to_capacity() {
        let long = "X".repeat(64);
        let symbol = Symbol::new(&long);
        assert_eq!(symbol.as_str().len(), MAX_SYMBOL_LEN);
        assert_eq!(Symbol::capacity(), 31);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "é".repeat(40);
        let topic = Topic::new(&text);
        assert_eq!(topic.as_str().chars().count(), MAX_TOPIC_LEN);
        assert_eq!(truncate_chars("añb", 2), "añ");
    }
}
