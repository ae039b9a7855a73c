//! Session-scoped sets of known labels and active keyword filters.

use serde::Serialize;
use tracing::debug;

use crate::store::DocumentStore;

/// Every label the operator can filter by or assign.
///
/// Seeded from the labels present at load time and only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LabelRegistry {
    labels: Vec<String>,
}

impl LabelRegistry {
    pub fn initialize(store: &DocumentStore) -> Self {
        Self {
            labels: store.distinct_labels(),
        }
    }

    /// Register `candidate`. Empty and already known labels are ignored.
    pub fn add(&mut self, candidate: &str) -> bool {
        if candidate.is_empty() || self.contains(candidate) {
            debug!(candidate, "ignoring label");
            return false;
        }
        self.labels.push(candidate.to_string());
        true
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// The active keyword filters. Every keyword must occur in a document's
/// text for the document to stay visible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct KeywordRegistry {
    keywords: Vec<String>,
}

/// One checkbox of the keyword list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistItem {
    pub keyword: String,
    pub checked: bool,
}

impl KeywordRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `candidate` as a filter. Empty and duplicate keywords are ignored.
    pub fn submit(&mut self, candidate: &str) -> bool {
        if candidate.is_empty() || self.contains(candidate) {
            debug!(candidate, "ignoring keyword");
            return false;
        }
        self.keywords.push(candidate.to_string());
        true
    }

    /// Make the registry exactly the checked subset of its current entries.
    ///
    /// Unknown entries in `checked` are dropped; the existing order is kept.
    pub fn replace_from_selection(&mut self, checked: &[String]) {
        self.keywords.retain(|kw| checked.contains(kw));
    }

    pub fn checklist(&self) -> Vec<ChecklistItem> {
        self.keywords
            .iter()
            .map(|kw| ChecklistItem {
                keyword: kw.clone(),
                checked: true,
            })
            .collect()
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.keywords.iter().any(|k| k == keyword)
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{sample_store, store_from};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn labels_initialize_sorted_from_store() {
        let registry = LabelRegistry::initialize(&sample_store());
        assert_eq!(registry.labels(), ["cat", "dog", "no_label"]);
    }

    #[test]
    fn unlabeled_input_seeds_sentinel_only() {
        let store = store_from("x;y;text\n1;1;a\n2;2;b\n");
        let registry = LabelRegistry::initialize(&store);
        assert_eq!(registry.labels(), ["no_label"]);
    }

    #[test]
    fn add_label_appends_new() {
        let mut registry = LabelRegistry::initialize(&sample_store());
        assert!(registry.add("bird"));
        assert_eq!(registry.labels(), ["cat", "dog", "no_label", "bird"]);
    }

    #[test]
    fn add_label_ignores_empty_and_duplicates() {
        let mut registry = LabelRegistry::initialize(&sample_store());
        let before = registry.len();
        assert!(!registry.add(""));
        assert!(!registry.add("cat"));
        assert_eq!(registry.len(), before);
    }

    #[test]
    fn keyword_submit_dedupes() {
        let mut registry = KeywordRegistry::new();
        assert!(registry.submit("foo"));
        assert!(!registry.submit("foo"));
        assert!(!registry.submit(""));
        assert!(registry.submit("Foo"));
        assert_eq!(registry.keywords(), ["foo", "Foo"]);
    }

    #[test]
    fn replace_from_selection_keeps_checked_subset() {
        let mut registry = KeywordRegistry::new();
        registry.submit("a");
        registry.submit("b");
        registry.submit("c");

        registry.replace_from_selection(&strings(&["c", "a"]));
        assert_eq!(registry.keywords(), ["a", "c"]);

        registry.replace_from_selection(&[]);
        assert!(registry.is_empty());
    }

    #[test]
    fn replace_from_selection_ignores_unknown() {
        let mut registry = KeywordRegistry::new();
        registry.submit("a");
        registry.replace_from_selection(&strings(&["a", "zzz"]));
        assert_eq!(registry.keywords(), ["a"]);
    }

    #[test]
    fn checklist_mirrors_registry() {
        let mut registry = KeywordRegistry::new();
        registry.submit("foo");
        registry.submit("bar");

        let items = registry.checklist();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].keyword, "foo");
        assert!(items.iter().all(|i| i.checked));
    }
}
