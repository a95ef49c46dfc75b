//! Change-tracking caches over ledger state.
//!
//! One [`Snapshot`] is created per execution. Reads see the seeded baseline
//! plus the session's own writes; a host commits the tracked changes only
//! when the execution halted cleanly, so a faulted engine's effects are
//! discarded wholesale.

use crate::contract_state::ContractState;
use crate::state::{AccountState, AssetState, StorageItem, StorageKey, ValidatorState};
use crate::uint::{UInt160, UInt256};
use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

/// How an entry differs from the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackState {
    /// Present in the baseline, unmodified.
    Committed,
    /// Created by this session.
    Added,
    /// Present in the baseline, overwritten by this session.
    Changed,
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    item: V,
    state: TrackState,
}

/// A keyed cache layer with tracked additions, changes and deletions.
#[derive(Debug)]
pub struct DataCache<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    deleted: Vec<K>,
}

impl<K, V> Default for DataCache<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            deleted: Vec::new(),
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> DataCache<K, V> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            deleted: Vec::new(),
        }
    }

    /// Loads a baseline entry, marked as committed.
    pub fn seed(&mut self, key: K, item: V) {
        self.entries.insert(
            key,
            CacheEntry {
                item,
                state: TrackState::Committed,
            },
        );
    }

    /// Looks up an entry.
    #[must_use]
    pub fn try_get(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|entry| &entry.item)
    }

    /// Whether an entry exists.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Inserts or overwrites an entry, tracking the change.
    pub fn put(&mut self, key: K, item: V) {
        let state = match self.entries.get(&key).map(|entry| entry.state) {
            Some(TrackState::Committed) | Some(TrackState::Changed) => TrackState::Changed,
            Some(TrackState::Added) => TrackState::Added,
            None => TrackState::Added,
        };
        self.entries.insert(key, CacheEntry { item, state });
    }

    /// Removes an entry, tracking the deletion when it was committed.
    pub fn delete(&mut self, key: &K) {
        if let Some(entry) = self.entries.remove(key) {
            if entry.state != TrackState::Added {
                self.deleted.push(key.clone());
            }
        }
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no live entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Applies the session's additions, changes and deletions to a backing
    /// map. Call only after a clean halt.
    pub fn commit_into(&self, target: &mut HashMap<K, V>) {
        for key in &self.deleted {
            target.remove(key);
        }
        for (key, entry) in &self.entries {
            if entry.state != TrackState::Committed {
                target.insert(key.clone(), entry.item.clone());
            }
        }
    }
}

/// The five cache layers one execution runs against.
#[derive(Default)]
pub struct Snapshot {
    /// Accounts by script hash.
    pub accounts: DataCache<UInt160, AccountState>,
    /// Validators by encoded public key.
    pub validators: DataCache<Vec<u8>, ValidatorState>,
    /// Assets by identifier.
    pub assets: DataCache<UInt256, AssetState>,
    /// Contracts by script hash.
    pub contracts: DataCache<UInt160, ContractState>,
    /// Contract storage entries.
    pub storages: DataCache<StorageKey, StorageItem>,
}

impl Snapshot {
    /// Creates a snapshot with empty caches.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a contract under its own script hash.
    pub fn seed_contract(&mut self, contract: ContractState) -> UInt160 {
        let hash = contract.script_hash();
        self.contracts.seed(hash, contract);
        hash
    }
}

/// Contract lookups consumed by the engine: the dynamic-invoke gate reads
/// stored capabilities, the interpreter resolves call targets to scripts.
pub trait ContractTable {
    /// The contract deployed under `script_hash`.
    fn contract_state(&self, script_hash: &UInt160) -> Option<ContractState>;
}

/// [`ContractTable`] over a shared snapshot.
pub struct SnapshotTable {
    snapshot: Rc<RefCell<Snapshot>>,
}

impl SnapshotTable {
    /// Creates a table reading the given snapshot.
    #[must_use]
    pub fn new(snapshot: Rc<RefCell<Snapshot>>) -> Self {
        Self { snapshot }
    }
}

impl ContractTable for SnapshotTable {
    fn contract_state(&self, script_hash: &UInt160) -> Option<ContractState> {
        self.snapshot
            .borrow()
            .contracts
            .try_get(script_hash)
            .cloned()
    }
}
