use super::{Name, Node, NodeRef};
use std::cell::OnceCell;

/// Ordered key/value collection.
///
/// Entries keep their insertion order, duplicates and null values included,
/// since that is what gets written back out. Lookups go through a lazily
/// built index of the non-null entries sorted by key in code point order,
/// so a null-valued key behaves as if it were absent.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    entries: Vec<(Name, NodeRef)>,
    index: OnceCell<Vec<usize>>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: OnceCell::new(),
        }
    }

    pub fn from_entries(entries: Vec<(Name, NodeRef)>) -> Self {
        Self {
            entries,
            index: OnceCell::new(),
        }
    }

    /// Number of stored entries, null-valued ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replaces the value of the first entry named `key`, or appends a new entry.
    pub fn set(&mut self, key: impl Into<Name>, value: impl Into<NodeRef>) {
        let key = key.into();
        let value = value.into();
        self.index.take();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Appends an entry without looking for an existing key.
    pub fn push(&mut self, key: impl Into<Name>, value: impl Into<NodeRef>) {
        self.index.take();
        self.entries.push((key.into(), value.into()));
    }

    pub fn remove(&mut self, key: &str) -> Option<NodeRef> {
        let pos = self.entries.iter().position(|(k, _)| k.as_str() == key)?;
        self.index.take();
        Some(self.entries.remove(pos).1)
    }

    pub fn get(&self, key: &str) -> Option<&NodeRef> {
        let index = self.index();
        let pos = index.partition_point(|&i| self.entries[i].0.as_str() < key);
        let &slot = index.get(pos)?;
        let (name, value) = &self.entries[slot];
        (name.as_str() == key).then_some(value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn get_type(&self) -> Option<&str> {
        self.get("Type").and_then(|v| v.as_name()).map(Name::as_str)
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&Name, &NodeRef)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Name> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Mutable access to every value. Drops the lookup index since a value
    /// may be nulled out through it.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut NodeRef> {
        self.index.take();
        self.entries.iter_mut().map(|(_, v)| v)
    }

    /// Non-null entries in insertion order.
    pub fn live_entries(&self) -> impl Iterator<Item = (&Name, &NodeRef)> {
        self.entries().filter(|(_, v)| !v.is_null())
    }

    /// Positions of the non-null entries, sorted by key. Ties keep their
    /// insertion order, so lookup finds the first inserted of a duplicated key.
    pub fn index(&self) -> &[usize] {
        self.index.get_or_init(|| {
            let mut index: Vec<usize> = self
                .entries
                .iter()
                .enumerate()
                .filter(|(_, (_, v))| !v.is_null())
                .map(|(i, _)| i)
                .collect();
            index.sort_by(|&a, &b| self.entries[a].0.cmp(&self.entries[b].0));
            index
        })
    }
}

impl FromIterator<(Name, NodeRef)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (Name, NodeRef)>>(iter: I) -> Self {
        Self::from_entries(iter.into_iter().collect())
    }
}

impl FromIterator<(Name, Node)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (Name, Node)>>(iter: I) -> Self {
        Self::from_entries(iter.into_iter().map(|(k, v)| (k, v.into_ref())).collect())
    }
}
