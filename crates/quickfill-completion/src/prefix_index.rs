//! Frequency-weighted prefix index over identifiers seen in the buffer

use std::collections::HashMap;

/// Words shorter than this are never stored
pub const MIN_WORD_LEN: usize = 2;

#[derive(Debug, Default)]
struct TrieNode {
    children: HashMap<char, TrieNode>,
    is_terminal: bool,
    count: u32,
}

// Subtrees are torn down with an explicit stack so drop depth never grows
// with identifier length.
impl Drop for TrieNode {
    fn drop(&mut self) {
        let mut pending: Vec<TrieNode> = self.children.drain().map(|(_, child)| child).collect();
        while let Some(mut node) = pending.pop() {
            pending.extend(node.children.drain().map(|(_, child)| child));
        }
    }
}

/// Character trie mapping identifiers to how often they were inserted
///
/// The index is rebuilt wholesale on every re-tokenization pass; nothing is
/// ever removed from a live tree.
#[derive(Debug, Default)]
pub struct PrefixIndex {
    root: TrieNode,
}

impl PrefixIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence of `word`
    pub fn insert(&mut self, word: &str) {
        if word.chars().count() < MIN_WORD_LEN {
            return;
        }

        let mut node = &mut self.root;
        for ch in word.chars() {
            node = node.children.entry(ch).or_default();
        }

        node.is_terminal = true;
        node.count = node.count.saturating_add(1);
    }

    /// All stored words starting with `prefix`, most frequent first
    ///
    /// Equal counts are ordered lexicographically so results are stable
    /// across rebuilds. Callers truncate.
    pub fn query(&self, prefix: &str) -> Vec<String> {
        self.query_with_counts(prefix)
            .into_iter()
            .map(|(word, _)| word)
            .collect()
    }

    /// Same as [`PrefixIndex::query`] but keeps the occurrence counts
    pub fn query_with_counts(&self, prefix: &str) -> Vec<(String, u32)> {
        if prefix.is_empty() {
            return Vec::new();
        }

        let Some(start) = self.find_node(prefix) else {
            return Vec::new();
        };

        let mut results = Vec::new();
        let mut pending = vec![(start, prefix.to_string())];
        while let Some((node, word)) = pending.pop() {
            if node.is_terminal {
                results.push((word.clone(), node.count));
            }
            for (ch, child) in &node.children {
                let mut next = word.clone();
                next.push(*ch);
                pending.push((child, next));
            }
        }

        results.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        results
    }

    /// Occurrence count of an exact word, 0 when absent
    pub fn count(&self, word: &str) -> u32 {
        self.find_node(word)
            .filter(|node| node.is_terminal)
            .map(|node| node.count)
            .unwrap_or(0)
    }

    /// Drop every stored word
    pub fn clear(&mut self) {
        self.root = TrieNode::default();
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    fn find_node(&self, path: &str) -> Option<&TrieNode> {
        let mut node = &self.root;
        for ch in path.chars() {
            node = node.children.get(&ch)?;
        }
        Some(node)
    }
}
