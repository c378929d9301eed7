//! # Sharded Entry Store
//!
//! Dedup entries partitioned across independently locked shards. A key maps
//! to exactly one shard through a keyed SipHash-1-3, so writers on different
//! shards never block each other.
//!
//! ## Capacity
//!
//! Capacity is global. An insert first reserves a slot on the shared `len`
//! counter; when no slot is free the caller evicts and retries. `len` never
//! exceeds the capacity, even transiently.
//!
//! ## Insertion Order
//!
//! Every entry carries a global monotonic sequence number that is mirrored in
//! its shard's `order` index. The FIFO victim is the smallest front sequence
//! across all shards.

use parking_lot::RwLock;
use siphasher::sip::SipHasher13;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::domain::{DedupKey, Entry};

const SHARD_KEY_0: u64 = 0x7265_6c61_792d_6470;
const SHARD_KEY_1: u64 = 0x7032_702d_6465_6475;

/// One lock's worth of entries.
#[derive(Debug, Default)]
pub struct Shard {
    entries: HashMap<DedupKey, Entry>,
    order: BTreeMap<u64, DedupKey>,
}

impl Shard {
    pub fn get(&self, key: &DedupKey) -> Option<&Entry> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &DedupKey) -> Option<&mut Entry> {
        self.entries.get_mut(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&DedupKey, &Entry)> {
        self.entries.iter()
    }

    fn oldest_seq(&self) -> Option<u64> {
        self.order.keys().next().copied()
    }

    fn insert(&mut self, key: DedupKey, entry: Entry) {
        self.order.insert(entry.seq, key.clone());
        self.entries.insert(key, entry);
    }

    fn remove(&mut self, key: &DedupKey) -> Option<Entry> {
        let entry = self.entries.remove(key)?;
        self.order.remove(&entry.seq);
        Some(entry)
    }

    fn pop_oldest(&mut self) -> Option<Entry> {
        let (_, key) = self.order.pop_first()?;
        self.entries.remove(&key)
    }
}

/// Candidate picked during a scoring scan.
struct Victim {
    shard: usize,
    key: DedupKey,
    seq: u64,
    score: f64,
}

/// Global-capacity map of dedup entries split over N shards.
#[derive(Debug)]
pub struct ShardedEntryStore {
    shards: Box<[RwLock<Shard>]>,
    len: AtomicUsize,
    capacity: AtomicUsize,
    next_seq: AtomicU64,
}

impl ShardedEntryStore {
    /// Create a store with `shard_count` shards (at least one).
    pub fn new(shard_count: usize, capacity: usize) -> Self {
        let shards = (0..shard_count.max(1))
            .map(|_| RwLock::new(Shard::default()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            shards,
            len: AtomicUsize::new(0),
            capacity: AtomicUsize::new(capacity),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Deterministic shard index for a key.
    pub fn shard_index(&self, key: &DedupKey) -> usize {
        let mut hasher = SipHasher13::new_with_keys(SHARD_KEY_0, SHARD_KEY_1);
        Hash::hash(key, &mut hasher);
        (hasher.finish() % self.shards.len() as u64) as usize
    }

    pub fn shard_for(&self, key: &DedupKey) -> &RwLock<Shard> {
        &self.shards[self.shard_index(key)]
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::Acquire)
    }

    pub fn set_capacity(&self, capacity: usize) {
        self.capacity.store(capacity, Ordering::Release);
    }

    pub fn is_over_capacity(&self) -> bool {
        self.len() > self.capacity()
    }

    /// Insert into an already locked shard if a capacity slot is free.
    ///
    /// Hands the entry back when the store is full so the caller can evict
    /// (after releasing the shard lock) and retry.
    pub fn try_insert(&self, shard: &mut Shard, key: DedupKey, mut entry: Entry) -> Result<(), Entry> {
        if !self.try_reserve() {
            return Err(entry);
        }

        entry.seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        shard.insert(key, entry);
        Ok(())
    }

    fn try_reserve(&self) -> bool {
        let capacity = self.capacity();
        self.len
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |len| {
                (len < capacity).then_some(len + 1)
            })
            .is_ok()
    }

    /// Evict the globally oldest insertion.
    pub fn evict_oldest(&self) -> Option<Entry> {
        let (index, _) = self
            .shards
            .iter()
            .enumerate()
            .filter_map(|(i, shard)| shard.read().oldest_seq().map(|seq| (i, seq)))
            .min_by_key(|(_, seq)| *seq)?;

        let evicted = self.shards[index].write().pop_oldest()?;
        self.len.fetch_sub(1, Ordering::AcqRel);
        Some(evicted)
    }

    /// Evict the entry with the lowest score, ties going to the older insertion.
    pub fn evict_lowest<F>(&self, mut score: F) -> Option<Entry>
    where
        F: FnMut(&Entry) -> f64,
    {
        let mut victim: Option<Victim> = None;

        for (index, shard) in self.shards.iter().enumerate() {
            let shard = shard.read();
            for (key, entry) in shard.entries() {
                let s = score(entry);
                let better = match &victim {
                    None => true,
                    Some(v) => s < v.score || (s == v.score && entry.seq < v.seq),
                };
                if better {
                    victim = Some(Victim {
                        shard: index,
                        key: key.clone(),
                        seq: entry.seq,
                        score: s,
                    });
                }
            }
        }

        let victim = victim?;
        let mut shard = self.shards[victim.shard].write();
        // The entry may have been removed between the scan and the write lock.
        if shard.get(&victim.key).map(|e| e.seq) != Some(victim.seq) {
            return None;
        }
        let evicted = shard.remove(&victim.key)?;
        self.len.fetch_sub(1, Ordering::AcqRel);
        Some(evicted)
    }

    /// Keep only entries for which `keep` returns true. Returns how many were removed.
    pub fn retain<F>(&self, mut keep: F) -> usize
    where
        F: FnMut(&Entry) -> bool,
    {
        let mut removed = 0;

        for shard in self.shards.iter() {
            let mut shard = shard.write();
            let expired: Vec<DedupKey> = shard
                .entries()
                .filter(|&(_, entry)| !keep(entry))
                .map(|(key, _)| key.clone())
                .collect();

            for key in expired {
                if shard.remove(&key).is_some() {
                    removed += 1;
                }
            }
        }

        self.len.fetch_sub(removed, Ordering::AcqRel);
        removed
    }

    /// Copy of the entry stored under `key`.
    pub fn get(&self, key: &DedupKey) -> Option<Entry> {
        self.shard_for(key).read().get(key).cloned()
    }

    pub fn contains(&self, key: &DedupKey) -> bool {
        self.shard_for(key).read().get(key).is_some()
    }

    /// Sum of per-shard entry counts, for consistency checks.
    pub fn counted_len(&self) -> usize {
        self.shards.iter().map(|s| s.read().len()).sum()
    }

    /// Visit every entry under read locks, one shard at a time.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&Entry),
    {
        for shard in self.shards.iter() {
            for (_, entry) in shard.read().entries() {
                f(entry);
            }
        }
    }
}
