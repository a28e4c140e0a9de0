//! Skeletal B-tree index.
//!
//! The source this crate is modeled on ships a B-tree in name only: its
//! "index" is a non-functional linked list, not a real balanced tree. This
//! reimplementation keeps that honesty instead of inventing a persistent
//! B-tree the spec never asked for: [`BTreeIndex`] is a single in-memory
//! sorted `Vec<(Value, Rid)>` behind insert/search/delete. It is not
//! persisted, not rebalanced, and not wired into `insert_record` /
//! `delete_record` automatically — callers that want an index populate it
//! themselves. It exists to show the seam between the record manager and an
//! index, not to be a production index.


use common::Rid;
use record::Value;

/// An in-memory, single-key index from `Value` to [`Rid`].
///
/// Entries are kept sorted by key so `search` can binary-search; insertion
/// and deletion are O(n) shifts, which is fine for a teaching-grade
/// placeholder over a handful of keys.
#[derive(Debug, Default)]
pub struct BTreeIndex {
    entries: Vec<(Value, Rid)>,
}

impl BTreeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert `(key, rid)`, keeping entries sorted by key. Duplicate keys
    /// are permitted, matching the record manager allowing non-unique
    /// secondary key values.
    pub fn insert(&mut self, key: Value, rid: Rid) {
        let idx = self.partition_point(&key);
        self.entries.insert(idx, (key, rid));
    }

    /// All RIDs stored under `key`.
    pub fn search(&self, key: &Value) -> Vec<Rid> {
        let start = self.partition_point(key);
        self.entries[start..]
            .iter()
            .take_while(|(k, _)| k == key)
            .map(|(_, rid)| *rid)
            .collect()
    }

    /// Remove the first `(key, rid)` entry that matches exactly. Returns
    /// whether an entry was removed.
    pub fn delete(&mut self, key: &Value, rid: Rid) -> bool {
        if let Some(pos) = self.entries.iter().position(|(k, r)| k == key && *r == rid) {
            self.entries.remove(pos);
            true
        } else {
            false
        }
    }

    /// All entries in key order, for debugging and tests.
    pub fn scan_all(&self) -> &[(Value, Rid)] {
        &self.entries
    }

    fn partition_point(&self, key: &Value) -> usize {
        self.entries.partition_point(|(k, _)| value_lt(k, key))
    }
}

/// Ordering over [`Value`] used only to keep the index sorted. `Value`
/// itself derives no `Ord` since cross-type comparisons are meaningless;
/// this compares within a type and treats mismatched-type comparisons as
/// "not less than" so they sort stably to one end instead of panicking.
fn value_lt(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x < y,
        (Value::Float(x), Value::Float(y)) => x < y,
        (Value::Bool(x), Value::Bool(y)) => !x & y,
        (Value::Str(x), Value::Str(y)) => x < y,
        _ => false,
    }
}
