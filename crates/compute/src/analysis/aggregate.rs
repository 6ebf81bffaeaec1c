//! Group-and-count over record collections.
//!
//! Ordering contract:
//! - `group_count` yields buckets in first-appearance order of their key.
//! - `group_count_time_series` yields buckets ascending by parsed timestamp;
//!   buckets whose timestamps compare equal keep their first-appearance order.
//!
//! Records whose key function returns `None` are dropped, never collected into
//! a catch-all bucket.

use std::collections::HashMap;
use std::hash::Hash;

use foundation::time::Timestamp;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket<K = String> {
    pub key: K,
    pub count: u64,
}

impl<K> Bucket<K> {
    pub fn new(key: K, count: u64) -> Self {
        Self { key, count }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeBucket<K = String> {
    pub key: K,
    pub time: Timestamp,
    pub count: u64,
}

/// Counts records per distinct key. Keys with no records are absent.
pub fn group_count<I, K, F>(records: I, mut key: F) -> Vec<Bucket<K>>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Option<K>,
    K: Eq + Hash + Clone,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut out: Vec<Bucket<K>> = Vec::new();
    let mut dropped = 0usize;

    for record in records {
        let Some(k) = key(record) else {
            dropped += 1;
            continue;
        };
        match index.get(&k) {
            Some(&slot) => out[slot].count += 1,
            None => {
                index.insert(k.clone(), out.len());
                out.push(Bucket::new(k, 1));
            }
        }
    }

    if dropped > 0 {
        trace!(dropped, buckets = out.len(), "records without a key skipped");
    }
    out
}

/// Like [`group_count`], then orders buckets chronologically by the parsed
/// value of their key. Keys that do not parse as a timestamp are dropped.
pub fn group_count_time_series<I, K, F>(records: I, date_key: F) -> Vec<TimeBucket<K>>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Option<K>,
    K: Eq + Hash + Clone + AsRef<str>,
{
    let mut out: Vec<TimeBucket<K>> = group_count(records, date_key)
        .into_iter()
        .filter_map(|b| match Timestamp::parse(b.key.as_ref()) {
            Some(time) => Some(TimeBucket {
                key: b.key,
                time,
                count: b.count,
            }),
            None => {
                trace!(key = b.key.as_ref(), count = b.count, "unparseable date key skipped");
                None
            }
        })
        .collect();
    // Stable sort keeps equal timestamps in first-appearance order.
    out.sort_by_key(|b| b.time);
    out
}

/// Anything carrying an aggregated count.
pub trait Counted {
    fn count(&self) -> u64;
}

impl<K> Counted for Bucket<K> {
    fn count(&self) -> u64 {
        self.count
    }
}

impl<K> Counted for TimeBucket<K> {
    fn count(&self) -> u64 {
        self.count
    }
}

pub fn total_count<B: Counted>(buckets: &[B]) -> u64 {
    buckets.iter().map(Counted::count).sum()
}
