//! Candidate sets
//!
//! An ordered, bounded mapping from field path to value. Entries keep the
//! order in which they were inserted (document traversal order) and a path
//! is never stored twice.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// One field path/value pair judged likely to need correlation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Dot/bracket path of the field, e.g. `data.items[2].id`
    pub path: String,
    /// String value found at that path
    pub value: String,
}

/// Ordered mapping of candidate paths to values with a size limit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSet {
    entries: Vec<Candidate>,
    limit: usize,
}

impl Default for CandidateSet {
    fn default() -> Self {
        Self::with_capacity_limit(10)
    }
}

impl CandidateSet {
    /// Create an empty set that holds at most `limit` entries
    pub fn with_capacity_limit(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit,
        }
    }

    /// Insert a candidate at the end of the set
    ///
    /// Returns false when the set is full or the path is already present.
    /// An existing value is left untouched; see `upsert` to replace it.
    pub fn insert(&mut self, path: impl Into<String>, value: impl Into<String>) -> bool {
        if self.is_full() {
            return false;
        }
        let path = path.into();
        if self.contains_path(&path) {
            return false;
        }
        self.entries.push(Candidate {
            path,
            value: value.into(),
        });
        true
    }

    /// Insert a candidate, or replace the value of an existing path
    ///
    /// A replaced entry keeps its original position and does not count
    /// against the limit a second time. Returns false only when a new path
    /// was refused because the set is full.
    pub fn upsert(&mut self, path: impl Into<String>, value: impl Into<String>) -> bool {
        let path = path.into();
        if let Some(existing) = self.entries.iter_mut().find(|c| c.path == path) {
            existing.value = value.into();
            return true;
        }
        self.insert(path, value)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Whether the limit has been reached
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.limit
    }

    /// Whether a path is present
    pub fn contains_path(&self, path: &str) -> bool {
        self.entries.iter().any(|c| c.path == path)
    }

    /// Value stored at a path
    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|c| c.path == path)
            .map(|c| c.value.as_str())
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.entries.iter()
    }

    /// Paths in insertion order
    pub fn paths(&self) -> Vec<&str> {
        self.entries.iter().map(|c| c.path.as_str()).collect()
    }

    /// First `limit` entries accepted by `keep`, in insertion order
    pub fn select<F>(&self, limit: usize, mut keep: F) -> CandidateSet
    where
        F: FnMut(&Candidate) -> bool,
    {
        let mut selected = CandidateSet::with_capacity_limit(limit);
        for candidate in self.entries.iter().filter(|c| keep(c)) {
            if !selected.insert(candidate.path.clone(), candidate.value.clone()) && selected.is_full() {
                break;
            }
        }
        selected
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Serialize for CandidateSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for candidate in &self.entries {
            map.serialize_entry(&candidate.path, &candidate.value)?;
        }
        map.end()
    }
}
