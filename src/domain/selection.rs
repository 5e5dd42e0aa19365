//! Stable selection tracking across filtered/sorted views
//!
//! Selection identifiers are derived from the item itself, never from its
//! position in the current view, so a selection survives filtering, sorting
//! and re-rendering. Product rows and deep-link rows flow through the same
//! selection code as a tagged union.

use serde::{Deserialize, Serialize};

use crate::domain::product::{DeepLinkResult, GroupKey, ProductRecord};

/// An item the user can select, across the heterogeneous result shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SelectableItem {
    Product { key: GroupKey, record: ProductRecord },
    DeepLink { result: DeepLinkResult },
}

impl SelectableItem {
    pub fn from_record(record: ProductRecord) -> Self {
        let key = record.group_key();
        Self::Product { key, record }
    }

    /// Deterministic, view-independent selection identifier.
    ///
    /// Products use the group key (stringified product id), deep links use
    /// the original URL.
    pub fn selection_id(&self) -> String {
        match self {
            SelectableItem::Product { key, .. } => key.to_string(),
            SelectableItem::DeepLink { result } => result.original_url.clone(),
        }
    }

    /// The most specific URL this item resolves to, for link copying.
    pub fn best_url(&self) -> &str {
        match self {
            SelectableItem::Product { record, .. } => &record.url,
            SelectableItem::DeepLink { result } => result.best_url(),
        }
    }
}

/// Ordered, deduplicated set of selection identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSet {
    ids: Vec<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for id in ids {
            set.insert(id.into());
        }
        set
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Insert preserving first-insertion order; duplicates are ignored.
    pub fn insert(&mut self, id: String) {
        if !self.contains(&id) {
            self.ids.push(id);
        }
    }

    pub fn remove(&mut self, id: &str) {
        self.ids.retain(|existing| existing != id);
    }

    /// Toggle one item in or out of the selection.
    pub fn toggle(&mut self, id: &str) {
        if self.contains(id) {
            self.remove(id);
        } else {
            self.ids.push(id.to_string());
        }
    }

    /// Select-all over the currently visible set, as a pure toggle.
    ///
    /// If every visible id is already selected, the result is empty.
    /// Otherwise the result is exactly the visible ids — not a union with
    /// the previous selection, so out-of-view leftovers never linger.
    pub fn toggle_select_all(&self, all_ids: &[String]) -> SelectionSet {
        let all_selected =
            !all_ids.is_empty() && all_ids.iter().all(|id| self.contains(id));
        if all_selected {
            SelectionSet::new()
        } else {
            SelectionSet::from_ids(all_ids.iter().cloned())
        }
    }

    /// Resolve this selection against the current result view.
    ///
    /// Stale ids — items that fell out of every result batch — resolve to
    /// nothing and are skipped; they contribute nothing and never fault.
    pub fn resolve<'a>(&self, view: &'a [SelectableItem]) -> Vec<&'a SelectableItem> {
        self.ids
            .iter()
            .filter_map(|id| view.iter().find(|item| item.selection_id() == *id))
            .collect()
    }
}
