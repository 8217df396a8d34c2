/// Multi-source merge and ranking of completion candidates
use crate::language::Language;
use crate::remote::RemoteEntry;
use crate::snippets::StaticSnippetCatalog;
use crate::types::{SourceKind, Suggestion};
use std::collections::HashSet;
use std::sync::Arc;

/// Priority of suggestions delivered by the remote backend
pub const REMOTE_PRIORITY: i32 = 20;
/// Priority of identifiers found in the buffer
pub const LOCAL_PRIORITY: i32 = 15;

/// Combines remote, local and catalog candidates into one ranked list
///
/// Sources are visited in a fixed order (remote, local, catalog) and the
/// first source to produce a given text owns it.
#[derive(Debug, Clone)]
pub struct SuggestionMerger {
    catalog: Arc<StaticSnippetCatalog>,
    max_suggestions: usize,
}

impl SuggestionMerger {
    pub fn new(catalog: Arc<StaticSnippetCatalog>, max_suggestions: usize) -> Self {
        Self {
            catalog,
            max_suggestions,
        }
    }

    pub fn catalog(&self) -> &StaticSnippetCatalog {
        &self.catalog
    }

    pub fn max_suggestions(&self) -> usize {
        self.max_suggestions
    }

    /// Merge all sources for `prefix`
    ///
    /// `local_words` is taken as already filtered by the prefix index. The
    /// remote batch is re-filtered here because it may belong to an older
    /// query.
    pub fn merge(
        &self,
        prefix: &str,
        remote_batch: &[RemoteEntry],
        local_words: &[String],
        language: Language,
    ) -> Vec<Suggestion> {
        let prefix_lower = prefix.to_lowercase();
        let mut seen: HashSet<String> = HashSet::new();
        let mut combined = Vec::new();

        for text in remote_batch.iter().filter_map(RemoteEntry::display_text) {
            if text.to_lowercase().starts_with(&prefix_lower) && seen.insert(text.to_string()) {
                combined.push(Suggestion::plain(text, SourceKind::Remote, REMOTE_PRIORITY));
            }
        }

        for word in local_words {
            if word != prefix && seen.insert(word.clone()) {
                combined.push(Suggestion::plain(
                    word.as_str(),
                    SourceKind::Local,
                    LOCAL_PRIORITY,
                ));
            }
        }

        for entry in self.catalog.filter(prefix, language) {
            if seen.insert(entry.token.clone()) {
                combined.push(entry.to_suggestion());
            }
        }

        rank(&mut combined);
        combined.truncate(self.max_suggestions);
        combined
    }
}

/// Sort by priority (descending), then by text (ascending)
pub fn rank(suggestions: &mut [Suggestion]) {
    suggestions.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| a.text.cmp(&b.text))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merger(max: usize) -> SuggestionMerger {
        SuggestionMerger::new(Arc::new(StaticSnippetCatalog::builtin()), max)
    }

    fn words(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn texts(suggestions: &[Suggestion]) -> Vec<&str> {
        suggestions.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn test_local_words_sorted_lexicographically() {
        let merged = merger(10).merge("su", &[], &words(&["sum", "summary"]), Language::Cpp);

        assert_eq!(texts(&merged), vec!["sum", "summary"]);
        assert!(merged.iter().all(|s| s.source_kind == SourceKind::Local));
    }

    #[test]
    fn test_remote_beats_local_and_dedups_snippet() {
        let remote = vec![RemoteEntry::Text("vector".to_string())];
        let merged = merger(10).merge("v", &remote, &words(&["varX"]), Language::Cpp);

        assert_eq!(texts(&merged), vec!["vector", "varX"]);
        assert_eq!(merged[0].source_kind, SourceKind::Remote);
        assert_eq!(merged[0].priority, REMOTE_PRIORITY);
        assert_eq!(merged[1].priority, LOCAL_PRIORITY);
    }

    #[test]
    fn test_word_equal_to_prefix_is_skipped() {
        let merged = merger(10).merge("count", &[], &words(&["count", "counter"]), Language::Cpp);
        assert_eq!(texts(&merged), vec!["counter"]);
    }

    #[test]
    fn test_remote_entries_refiltered_by_prefix() {
        let remote = vec![
            RemoteEntry::Text("Vector".to_string()),
            RemoteEntry::Text("deque".to_string()),
        ];
        let merged = merger(10).merge("ve", &remote, &[], Language::Java);
        assert_eq!(texts(&merged), vec!["Vector"]);
    }

    #[test]
    fn test_remote_entries_without_text_are_ignored() {
        let remote = vec![
            RemoteEntry::Other(serde_json::json!(42)),
            RemoteEntry::Object {
                text: None,
                t: Some("sort_by".to_string()),
            },
        ];
        let merged = merger(10).merge("so", &remote, &[], Language::Cpp);

        assert_eq!(texts(&merged), vec!["sort_by", "sort"]);
        assert_eq!(merged[1].source_kind, SourceKind::SnippetAlgo);
    }

    #[test]
    fn test_catalog_priority_ordering() {
        let merged = merger(10).merge("s", &[], &[], Language::Cpp);
        assert_eq!(texts(&merged), vec!["sort", "set", "stack"]);
    }

    #[test]
    fn test_truncates_to_max() {
        let local = words(&["aa", "ab", "ac", "ad", "ae"]);
        let merged = merger(3).merge("a", &[], &local, Language::Cpp);
        assert_eq!(texts(&merged), vec!["aa", "ab", "ac"]);
    }

    #[test]
    fn test_unknown_language_uses_cpp_table() {
        let merged = merger(10).merge("#", &[], &[], Language::from_tag("rust"));
        assert_eq!(texts(&merged), vec!["#include"]);
    }
}
