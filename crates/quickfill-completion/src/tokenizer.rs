//! Identifier extraction from raw buffer text

use crate::language::Language;
use crate::prefix_index::{PrefixIndex, MIN_WORD_LEN};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

/// Maximal runs of ASCII word characters. Runs starting with a digit are
/// rejected afterwards, which leaves exactly the identifiers bounded by
/// ASCII word boundaries.
static WORD_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9_]+").expect("word-run pattern is valid"));

const CPP_RESERVED: &[&str] = &[
    "int", "float", "double", "char", "void", "bool", "long", "short", "if", "else", "for",
    "while", "do", "switch", "case", "break", "continue", "return", "class", "struct", "public",
    "private", "protected", "namespace", "using", "const", "static", "auto", "vector", "map",
    "set", "queue", "stack", "string", "pair",
];

const JAVA_RESERVED: &[&str] = &[
    "int", "float", "double", "char", "void", "boolean", "long", "short", "if", "else", "for",
    "while", "do", "switch", "case", "break", "continue", "return", "class", "interface",
    "extends", "implements", "public", "private", "protected", "static", "final", "abstract",
];

const PYTHON_RESERVED: &[&str] = &[
    "if", "else", "elif", "for", "while", "def", "class", "return", "import", "from", "as",
    "try", "except", "finally", "with", "lambda", "pass", "break", "continue", "True", "False",
    "None",
];

static CPP_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| CPP_RESERVED.iter().copied().collect());
static JAVA_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| JAVA_RESERVED.iter().copied().collect());
static PYTHON_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| PYTHON_RESERVED.iter().copied().collect());

/// Reserved words excluded from identifier suggestions (case-sensitive)
pub fn reserved_words(language: Language) -> &'static HashSet<&'static str> {
    match language {
        Language::Cpp => &*CPP_SET,
        Language::Java => &*JAVA_SET,
        Language::Python => &*PYTHON_SET,
    }
}

/// Splits source text into candidate identifiers for the prefix index
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentifierTokenizer;

impl IdentifierTokenizer {
    pub fn new() -> Self {
        Self
    }

    /// Candidate identifiers in order of appearance, duplicates included
    pub fn identifiers<'a>(
        &self,
        source: &'a str,
        language: Language,
    ) -> impl Iterator<Item = &'a str> + 'a {
        let reserved = reserved_words(language);
        WORD_RUN
            .find_iter(source)
            .map(|m| m.as_str())
            .filter(move |token| Self::accept(token, reserved))
    }

    /// Insert every surviving identifier of `source` into `index`
    ///
    /// This is one half of a rebuild: the caller hands in a fresh or cleared
    /// index. Returns the number of tokens inserted.
    pub fn extract_identifiers(
        &self,
        source: &str,
        language: Language,
        index: &mut PrefixIndex,
    ) -> usize {
        let mut inserted = 0;
        for token in self.identifiers(source, language) {
            index.insert(token);
            inserted += 1;
        }

        debug!(
            language = %language,
            bytes = source.len(),
            inserted,
            "Tokenized buffer"
        );
        inserted
    }

    /// Build a fresh index from `source`
    pub fn build_index(&self, source: &str, language: Language) -> PrefixIndex {
        let mut index = PrefixIndex::new();
        self.extract_identifiers(source, language, &mut index);
        index
    }

    fn accept(token: &str, reserved: &HashSet<&'static str>) -> bool {
        let starts_like_identifier = token
            .bytes()
            .next()
            .map(|b| b.is_ascii_alphabetic() || b == b'_')
            .unwrap_or(false);

        starts_like_identifier
            && token.len() >= MIN_WORD_LEN
            && !token.bytes().all(|b| b.is_ascii_digit())
            && !reserved.contains(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str, language: Language) -> Vec<&str> {
        IdentifierTokenizer::new().identifiers(source, language).collect()
    }

    #[test]
    fn test_reserved_words_are_filtered() {
        assert_eq!(
            tokens("int sum = sum + count; sum", Language::Cpp),
            vec!["sum", "sum", "count", "sum"]
        );
    }

    #[test]
    fn test_counts_accumulate_in_index() {
        let index = IdentifierTokenizer::new()
            .build_index("int sum = sum + count; sum", Language::Cpp);

        assert_eq!(index.count("sum"), 3);
        assert_eq!(index.count("count"), 1);
        assert_eq!(index.count("int"), 0);
        assert_eq!(index.query("s"), vec!["sum"]);
    }

    #[test]
    fn test_short_tokens_and_numbers_dropped() {
        assert_eq!(
            tokens("x = 42 + y1 * 7e3 + _", Language::Cpp),
            vec!["y1"]
        );
    }

    #[test]
    fn test_tokens_glued_to_digits_are_not_identifiers() {
        // `9lives` is one word run starting with a digit
        assert_eq!(tokens("9lives lives9", Language::Cpp), vec!["lives9"]);
    }

    #[test]
    fn test_non_ascii_separates_tokens() {
        assert_eq!(tokens("héllo wörld", Language::Cpp), vec!["llo", "rld"]);
    }

    #[test]
    fn test_reserved_sets_are_language_specific() {
        assert_eq!(tokens("boolean vector", Language::Cpp), vec!["boolean"]);
        assert_eq!(tokens("boolean vector", Language::Java), vec!["vector"]);
        assert_eq!(tokens("def None none", Language::Python), vec!["none"]);
    }

    #[test]
    fn test_reserved_match_is_case_sensitive() {
        assert_eq!(tokens("Int INT int", Language::Cpp), vec!["Int", "INT"]);
    }

    #[test]
    fn test_underscore_identifiers() {
        assert_eq!(
            tokens("__init__ _private my_var", Language::Python),
            vec!["__init__", "_private", "my_var"]
        );
    }

    #[test]
    fn test_extract_returns_inserted_count() {
        let mut index = PrefixIndex::new();
        let inserted = IdentifierTokenizer::new().extract_identifiers(
            "for (auto it : items) it++;",
            Language::Cpp,
            &mut index,
        );

        assert_eq!(inserted, 3);
        assert_eq!(index.count("it"), 2);
        assert_eq!(index.count("items"), 1);
    }
}
