//! Per-panel cache of tab states.

use super::{TabKey, TabState};
use crate::event::ResourceId;
use std::collections::HashMap;

/// Owning map from [`TabKey`] to [`TabState`] with at most one active key
///
/// Every path that drops a tab disposes it first.
#[derive(Default)]
pub struct TabCache {
    tabs: HashMap<TabKey, TabState>,
    active: Option<TabKey>,
}

impl TabCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn contains(&self, key: TabKey) -> bool {
        self.tabs.contains_key(&key)
    }

    pub fn get(&self, key: TabKey) -> Option<&TabState> {
        self.tabs.get(&key)
    }

    pub(crate) fn get_mut(&mut self, key: TabKey) -> Option<&mut TabState> {
        self.tabs.get_mut(&key)
    }

    pub fn active_key(&self) -> Option<TabKey> {
        self.active
    }

    pub fn active(&self) -> Option<&TabState> {
        self.active.and_then(|key| self.tabs.get(&key))
    }

    pub(crate) fn active_mut(&mut self) -> Option<&mut TabState> {
        self.active.and_then(|key| self.tabs.get_mut(&key))
    }

    pub(crate) fn set_active(&mut self, key: Option<TabKey>) {
        self.active = key;
    }

    /// Keys in no particular order
    pub fn keys(&self) -> impl Iterator<Item = TabKey> + '_ {
        self.tabs.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TabState> {
        self.tabs.values()
    }

    /// Insert a tab; a tab already cached under the same key is disposed
    pub(crate) fn insert(&mut self, tab: TabState) {
        if let Some(mut old) = self.tabs.insert(tab.key(), tab) {
            old.dispose();
        }
    }

    /// Dispose and drop one tab. Returns whether it existed.
    pub(crate) fn remove(&mut self, key: TabKey) -> bool {
        let Some(mut tab) = self.tabs.remove(&key) else {
            return false;
        };
        tab.dispose();
        if self.active == Some(key) {
            self.active = None;
        }
        true
    }

    /// Tab owning the resource that posted an event
    pub(crate) fn find_by_resource_mut(&mut self, id: ResourceId) -> Option<&mut TabState> {
        self.tabs.values_mut().find(|tab| tab.resource_id() == id)
    }

    /// Dispose and drop every tab
    pub(crate) fn clear(&mut self) {
        for (_, mut tab) in self.tabs.drain() {
            tab.dispose();
        }
        self.active = None;
    }
}

impl Drop for TabCache {
    fn drop(&mut self) {
        self.clear();
    }
}
