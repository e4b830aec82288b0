use crate::{constants::NUM_HASH_SLOTS, types::Move};

/// How the stored score relates to the true value of the position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    Exact,
    /// Fail-high: the true score is at least this value.
    Lower,
    /// Fail-low: the true score is at most this value.
    Upper,
}

/// An entry in the transposition table.
///
/// The full key is stored so a probe can tell a genuine hit from an index
/// collision. Even on a key match, `best_move` may be stale for the
/// probing position (a different position can share the key); callers must
/// re-validate it for legality before use.
#[derive(Clone, Copy, Debug)]
pub struct HashEntry {
    pub key: u64,
    /// Search depth at which this entry was stored.
    pub depth: u8,
    pub score: i32,
    pub best_move: Option<Move>,
    pub bound: Bound,
}

/// Fixed-capacity transposition table, indexed by key modulo capacity,
/// with an always-replace policy: entries age out by being overwritten.
pub struct HashTable {
    entries: Vec<Option<HashEntry>>,
}

impl HashTable {
    pub fn new() -> Self {
        Self::with_capacity(NUM_HASH_SLOTS)
    }

    pub fn with_capacity(slots: usize) -> Self {
        Self {
            entries: vec![None; slots.max(1)],
        }
    }

    fn index(&self, key: u64) -> usize {
        (key as usize) % self.entries.len()
    }

    /// Returns the stored entry only if its full key matches exactly.
    /// Depth and bound checks are the caller's responsibility.
    pub fn probe(&self, key: u64) -> Option<&HashEntry> {
        self.entries[self.index(key)]
            .as_ref()
            .filter(|entry| entry.key == key)
    }

    /// Unconditional overwrite at the computed slot. Returns true when a
    /// different position's entry was displaced.
    pub fn store(
        &mut self,
        key: u64,
        depth: u8,
        score: i32,
        best_move: Option<Move>,
        bound: Bound,
    ) -> bool {
        let index = self.index(key);
        let displaced = self.entries[index].is_some_and(|entry| entry.key != key);

        self.entries[index] = Some(HashEntry {
            key,
            depth,
            score,
            best_move,
            bound,
        });

        displaced
    }

    pub fn clear(&mut self) {
        self.entries.iter_mut().for_each(|slot| *slot = None);
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }
}

impl Default for HashTable {
    fn default() -> Self {
        Self::new()
    }
}
