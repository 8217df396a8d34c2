/// Static per-language snippet catalog
///
/// Entries carry their own priority; the merger never assigns snippet
/// priorities itself.
use crate::language::Language;
use crate::types::{SourceKind, Suggestion};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Snippet category, shown as the suggestion badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnippetCategory {
    Stl,
    Algo,
    #[serde(alias = "snippet")]
    Control,
    Include,
    Class,
    Keyword,
}

impl SnippetCategory {
    pub fn source_kind(&self) -> SourceKind {
        match self {
            SnippetCategory::Stl => SourceKind::SnippetStl,
            SnippetCategory::Algo => SourceKind::SnippetAlgo,
            SnippetCategory::Control => SourceKind::SnippetControl,
            SnippetCategory::Include => SourceKind::SnippetInclude,
            SnippetCategory::Class => SourceKind::SnippetClass,
            SnippetCategory::Keyword => SourceKind::Keyword,
        }
    }
}

/// One well-known completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetEntry {
    /// Token matched against the typed prefix
    pub token: String,
    pub description: String,
    /// Text spliced into the buffer, may span several lines
    pub insert_text: String,
    pub category: SnippetCategory,
    pub priority: i32,
}

impl SnippetEntry {
    pub fn new(
        token: &str,
        description: &str,
        insert_text: &str,
        category: SnippetCategory,
        priority: i32,
    ) -> Self {
        Self {
            token: token.to_string(),
            description: description.to_string(),
            insert_text: insert_text.to_string(),
            category,
            priority,
        }
    }

    /// Case-insensitive prefix match on the token
    pub fn matches(&self, prefix: &str) -> bool {
        self.token.to_lowercase().starts_with(&prefix.to_lowercase())
    }

    pub fn to_suggestion(&self) -> Suggestion {
        Suggestion {
            text: self.token.clone(),
            description: self.description.clone(),
            insert_text: self.insert_text.clone(),
            source_kind: self.category.source_kind(),
            priority: self.priority,
        }
    }
}

/// Read-only snippet tables, one per language
///
/// Built once at startup. Languages without a table use the C++ table.
#[derive(Debug, Clone)]
pub struct StaticSnippetCatalog {
    tables: HashMap<Language, Vec<SnippetEntry>>,
}

impl StaticSnippetCatalog {
    /// Catalog with the built-in tables
    pub fn builtin() -> Self {
        let mut tables = HashMap::new();
        tables.insert(Language::Cpp, cpp_snippets());
        tables.insert(Language::Java, java_snippets());
        tables.insert(Language::Python, python_snippets());
        Self { tables }
    }

    /// Catalog with no entries at all
    pub fn empty() -> Self {
        Self {
            tables: HashMap::new(),
        }
    }

    /// Replace the table of each language present in `overrides`
    pub fn with_overrides(mut self, overrides: HashMap<Language, Vec<SnippetEntry>>) -> Self {
        self.tables.extend(overrides);
        self
    }

    /// Table for `language`, falling back to the C++ table
    pub fn entries(&self, language: Language) -> &[SnippetEntry] {
        self.tables
            .get(&language)
            .or_else(|| self.tables.get(&Language::Cpp))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Entries of `language` whose token starts with `prefix`, in table order
    pub fn filter<'a>(
        &'a self,
        prefix: &'a str,
        language: Language,
    ) -> impl Iterator<Item = &'a SnippetEntry> + 'a {
        self.entries(language)
            .iter()
            .filter(move |entry| entry.matches(prefix))
    }
}

impl Default for StaticSnippetCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn cpp_snippets() -> Vec<SnippetEntry> {
    use SnippetCategory::*;
    vec![
        SnippetEntry::new("vector", "std::vector<T>", "std::vector<int> v;", Stl, 9),
        SnippetEntry::new("map", "std::map<K,V>", "std::map<int, int> m;", Stl, 8),
        SnippetEntry::new("set", "std::set<T>", "std::set<int> s;", Stl, 8),
        SnippetEntry::new("queue", "std::queue<T>", "std::queue<int> q;", Stl, 7),
        SnippetEntry::new("stack", "std::stack<T>", "std::stack<int> st;", Stl, 7),
        SnippetEntry::new(
            "priority_queue",
            "Max Heap",
            "std::priority_queue<int> pq;",
            Stl,
            7,
        ),
        SnippetEntry::new(
            "sort",
            "Sort container",
            "std::sort(v.begin(), v.end());",
            Algo,
            9,
        ),
        SnippetEntry::new(
            "for",
            "for loop",
            "for (int i = 0; i < n; i++) {\n\t\n}",
            Control,
            9,
        ),
        SnippetEntry::new(
            "#include",
            "#include <bits/stdc++.h>",
            "#include <bits/stdc++.h>",
            Include,
            10,
        ),
    ]
}

fn java_snippets() -> Vec<SnippetEntry> {
    use SnippetCategory::*;
    vec![
        SnippetEntry::new(
            "ArrayList",
            "ArrayList<T>",
            "ArrayList<Integer> list = new ArrayList<>();",
            Class,
            8,
        ),
        SnippetEntry::new(
            "HashMap",
            "HashMap<K,V>",
            "HashMap<Integer, Integer> map = new HashMap<>();",
            Class,
            8,
        ),
        SnippetEntry::new(
            "Scanner",
            "Scanner input",
            "Scanner sc = new Scanner(System.in);",
            Class,
            8,
        ),
    ]
}

fn python_snippets() -> Vec<SnippetEntry> {
    use SnippetCategory::*;
    vec![
        SnippetEntry::new("for", "for i in range(n)", "for i in range(n):\n\t", Control, 9),
        SnippetEntry::new("def", "def function()", "def function_name():\n\tpass", Control, 9),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tables_exist_for_all_languages() {
        let catalog = StaticSnippetCatalog::builtin();
        for language in Language::ALL {
            assert!(!catalog.entries(language).is_empty());
        }
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let catalog = StaticSnippetCatalog::builtin();
        let tokens: Vec<_> = catalog
            .filter("hash", Language::Java)
            .map(|e| e.token.as_str())
            .collect();
        assert_eq!(tokens, vec!["HashMap"]);
    }

    #[test]
    fn test_filter_keeps_table_order() {
        let catalog = StaticSnippetCatalog::builtin();
        let tokens: Vec<_> = catalog
            .filter("s", Language::Cpp)
            .map(|e| e.token.as_str())
            .collect();
        assert_eq!(tokens, vec!["set", "stack", "sort"]);
    }

    #[test]
    fn test_include_snippet_matches_hash_prefix() {
        let catalog = StaticSnippetCatalog::builtin();
        let entry = catalog.filter("#in", Language::Cpp).next().unwrap();
        assert_eq!(entry.priority, 10);
        assert_eq!(entry.to_suggestion().source_kind, SourceKind::SnippetInclude);
    }

    #[test]
    fn test_missing_table_falls_back_to_cpp() {
        let mut tables = HashMap::new();
        tables.insert(Language::Cpp, cpp_snippets());
        let catalog = StaticSnippetCatalog { tables };

        assert_eq!(
            catalog.entries(Language::Python).len(),
            cpp_snippets().len()
        );
    }

    #[test]
    fn test_override_replaces_table() {
        let mut overrides = HashMap::new();
        overrides.insert(
            Language::Python,
            vec![SnippetEntry::new(
                "print",
                "print()",
                "print()",
                SnippetCategory::Keyword,
                7,
            )],
        );
        let catalog = StaticSnippetCatalog::builtin().with_overrides(overrides);

        let tokens: Vec<_> = catalog
            .entries(Language::Python)
            .iter()
            .map(|e| e.token.as_str())
            .collect();
        assert_eq!(tokens, vec!["print"]);
        assert_eq!(catalog.entries(Language::Cpp).len(), 9);
    }

    #[test]
    fn test_category_accepts_snippet_alias() {
        let category: SnippetCategory = serde_json::from_str("\"snippet\"").unwrap();
        assert_eq!(category, SnippetCategory::Control);
    }

    #[test]
    fn test_suggestion_keeps_multiline_insert_text() {
        let catalog = StaticSnippetCatalog::builtin();
        let entry = catalog.filter("def", Language::Python).next().unwrap();
        let suggestion = entry.to_suggestion();

        assert_eq!(suggestion.text, "def");
        assert_eq!(suggestion.insert_text, "def function_name():\n\tpass");
        assert_eq!(suggestion.source_kind, SourceKind::SnippetControl);
    }
}
