//! The symbol pool: the multiset of symbol instances the player owns.
//!
//! The pool is the single owner of `SymbolInstance` values. Board cells and
//! reveal batches hold `InstanceId` references into it; a reference is valid
//! until the instance is removed, which happens only through the pool's own
//! removal methods.
//!
//! All removals match by stable key, never by display name. Localized names
//! never enter rules code.

use std::collections::BTreeSet;

use crate::catalog::Catalog;
use crate::effect::SymbolFilter;
use crate::ids::{InstanceId, SymbolKey};

/// One owned copy of a symbol. Identity is the instance id; two copies of
/// the same key are independently removable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInstance {
    pub id: InstanceId,
    pub key: SymbolKey,
}

/// Ordered multiset of owned symbol instances.
///
/// Insertion order is preserved for the UI's "newest first" highlighting;
/// no rule depends on it.
#[derive(Debug, Clone, Default)]
pub struct Pool {
    entries: Vec<SymbolInstance>,
}

impl Pool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one instance of `key`, returning its fresh id.
    pub fn add(&mut self, key: SymbolKey) -> InstanceId {
        let id = InstanceId::new();
        self.entries.push(SymbolInstance { id, key });
        id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymbolInstance> {
        self.entries.iter()
    }

    pub fn get(&self, id: InstanceId) -> Option<&SymbolInstance> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn contains_instance(&self, id: InstanceId) -> bool {
        self.get(id).is_some()
    }

    pub fn contains(&self, key: &SymbolKey) -> bool {
        self.entries.iter().any(|e| e.key == *key)
    }

    pub fn count_key(&self, key: &SymbolKey) -> usize {
        self.entries.iter().filter(|e| e.key == *key).count()
    }

    /// Count pool members matching the filter, optionally skipping one
    /// specific instance (the "exclude self" of counting effects).
    pub fn count_matching(
        &self,
        catalog: &Catalog,
        filter: &SymbolFilter,
        exclude: Option<InstanceId>,
    ) -> usize {
        self.entries
            .iter()
            .filter(|e| Some(e.id) != exclude)
            .filter(|e| catalog.get(&e.key).is_some_and(|def| filter.matches(def)))
            .count()
    }

    /// Distinct keys in the pool carrying `tag`. This is the TypeCount
    /// activation primitive: three copies of one key count once.
    pub fn distinct_keys_with_tag<'a>(
        &'a self,
        catalog: &Catalog,
        tag: &str,
    ) -> BTreeSet<&'a SymbolKey> {
        self.entries
            .iter()
            .filter(|e| catalog.get(&e.key).is_some_and(|def| def.has_tag(tag)))
            .map(|e| &e.key)
            .collect()
    }

    /// Remove a specific instance. Returns the removed entry, or `None` if
    /// it was already gone (e.g. consumed earlier in the same resolution).
    pub fn remove_instance(&mut self, id: InstanceId) -> Option<SymbolInstance> {
        let idx = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(idx))
    }

    /// Remove the oldest instance of `key`. Returns whether one existed.
    pub fn remove_first(&mut self, key: &SymbolKey) -> bool {
        match self.entries.iter().position(|e| e.key == *key) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Remove the oldest instance matching the filter, skipping `exclude`.
    pub fn remove_first_matching(
        &mut self,
        catalog: &Catalog,
        filter: &SymbolFilter,
        exclude: Option<InstanceId>,
    ) -> Option<SymbolInstance> {
        let idx = self.entries.iter().position(|e| {
            Some(e.id) != exclude && catalog.get(&e.key).is_some_and(|def| filter.matches(def))
        })?;
        Some(self.entries.remove(idx))
    }

    /// Remove every instance matching the filter, skipping `exclude`.
    /// Returns the number removed.
    pub fn remove_all_matching(
        &mut self,
        catalog: &Catalog,
        filter: &SymbolFilter,
        exclude: Option<InstanceId>,
    ) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| {
            Some(e.id) == exclude || !catalog.get(&e.key).is_some_and(|def| filter.matches(def))
        });
        before - self.entries.len()
    }

    /// Keys of all live entries, in insertion order.
    pub fn keys(&self) -> Vec<SymbolKey> {
        self.entries.iter().map(|e| e.key.clone()).collect()
    }
}
