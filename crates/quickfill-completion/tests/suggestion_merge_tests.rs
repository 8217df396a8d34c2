/// Tests for merging remote, local and snippet suggestions
use proptest::prelude::*;
use quickfill_completion::merger::{LOCAL_PRIORITY, REMOTE_PRIORITY};
use quickfill_completion::{
    Language, RemoteEntry, SnippetCategory, SnippetEntry, SourceKind, StaticSnippetCatalog,
    SuggestionMerger,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

fn merger(max: usize) -> SuggestionMerger {
    SuggestionMerger::new(Arc::new(StaticSnippetCatalog::builtin()), max)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn remote(items: &[&str]) -> Vec<RemoteEntry> {
    items.iter().map(|s| RemoteEntry::Text(s.to_string())).collect()
}

#[test]
fn test_local_only_is_lexicographic() {
    let merged = merger(10).merge("su", &[], &strings(&["sum", "summary"]), Language::Cpp);

    let texts: Vec<_> = merged.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["sum", "summary"]);
    assert!(merged.iter().all(|s| s.source_kind == SourceKind::Local));
}

#[test]
fn test_remote_ranks_above_local_and_hides_snippet() {
    let merged = merger(10).merge("v", &remote(&["vector"]), &strings(&["varX"]), Language::Cpp);

    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0].text, "vector");
    assert_eq!(merged[0].source_kind, SourceKind::Remote);
    assert_eq!(merged[0].insert_text, "vector");
    assert_eq!(merged[1].text, "varX");
    assert_eq!(merged[1].source_kind, SourceKind::Local);
}

#[test]
fn test_local_word_shadows_snippet_with_same_token() {
    let merged = merger(10).merge("ma", &[], &strings(&["map"]), Language::Cpp);

    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].source_kind, SourceKind::Local);
    assert_eq!(merged[0].insert_text, "map");
}

#[test]
fn test_snippet_keeps_insert_text_and_description() {
    let merged = merger(10).merge("pri", &[], &[], Language::Cpp);

    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].text, "priority_queue");
    assert_eq!(merged[0].description, "Max Heap");
    assert_eq!(merged[0].insert_text, "std::priority_queue<int> pq;");
    assert_eq!(merged[0].source_kind.label(), "STL");
}

#[test]
fn test_java_snippets_match_case_insensitively() {
    let merged = merger(10).merge("sc", &[], &[], Language::Java);

    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].text, "Scanner");
    assert_eq!(merged[0].source_kind, SourceKind::SnippetClass);
}

#[test]
fn test_overridden_catalog_is_used() {
    let mut overrides = HashMap::new();
    overrides.insert(
        Language::Cpp,
        vec![SnippetEntry::new(
            "vecsum",
            "Sum a vector",
            "std::accumulate(v.begin(), v.end(), 0LL);",
            SnippetCategory::Algo,
            12,
        )],
    );
    let catalog = StaticSnippetCatalog::builtin().with_overrides(overrides);
    let merger = SuggestionMerger::new(Arc::new(catalog), 10);

    let merged = merger.merge("ve", &[], &[], Language::Cpp);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].text, "vecsum");
    assert_eq!(merged[0].priority, 12);
}

fn word_strategy() -> impl Strategy<Value = String> {
    "[a-dA-D][a-d0-9_]{0,5}".prop_map(|s| s.to_string())
}

proptest! {
    /// Property: merged output never repeats a text and never exceeds the cap
    #[test]
    fn prop_merge_dedups_and_caps(
        remote_words in prop::collection::vec(word_strategy(), 0..15),
        local_words in prop::collection::vec(word_strategy(), 0..15),
        prefix in "[a-d]{1,2}",
        max in 1usize..12
    ) {
        let batch: Vec<RemoteEntry> = remote_words.into_iter().map(RemoteEntry::Text).collect();
        let merged = merger(max).merge(&prefix, &batch, &local_words, Language::Cpp);

        prop_assert!(merged.len() <= max);
        let mut seen = HashSet::new();
        for suggestion in &merged {
            prop_assert!(seen.insert(suggestion.text.clone()), "duplicate {}", suggestion.text);
        }
    }

    /// Property: output is sorted by priority then text
    #[test]
    fn prop_merge_is_ranked(
        remote_words in prop::collection::vec(word_strategy(), 0..15),
        local_words in prop::collection::vec(word_strategy(), 0..15),
        prefix in "[a-d]{1,2}"
    ) {
        let batch: Vec<RemoteEntry> = remote_words.into_iter().map(RemoteEntry::Text).collect();
        let merged = merger(50).merge(&prefix, &batch, &local_words, Language::Cpp);

        for pair in merged.windows(2) {
            prop_assert!(
                pair[0].priority > pair[1].priority
                    || (pair[0].priority == pair[1].priority && pair[0].text < pair[1].text)
            );
        }
    }

    /// Property: a remote entry always wins over a local word with the same text
    #[test]
    fn prop_remote_wins_ties_with_local(
        word in "[a-d][a-d0-9_]{1,5}"
    ) {
        let prefix = &word[..1];
        let merged = merger(50).merge(
            prefix,
            &[RemoteEntry::Text(word.clone())],
            &[word.clone()],
            Language::Python,
        );

        let hit = merged.iter().find(|s| s.text == word);
        prop_assert!(hit.is_some());
        let hit = hit.unwrap();
        prop_assert_eq!(hit.priority, REMOTE_PRIORITY);
        prop_assert!(merged.iter().all(|s| s.priority != LOCAL_PRIORITY || s.text != word));
    }
}
