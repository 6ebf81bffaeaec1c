use crate::analysis::aggregate::{Counted, TimeBucket};
use foundation::time::Timestamp;

pub struct Statistics;

impl Statistics {
    /// Largest bucket count, `0` for an empty bucket set.
    pub fn max_count<B: Counted>(buckets: &[B]) -> u64 {
        buckets.iter().map(Counted::count).max().unwrap_or(0)
    }

    /// Earliest and latest timestamp regardless of bucket order.
    pub fn time_extent<K>(buckets: &[TimeBucket<K>]) -> Option<(Timestamp, Timestamp)> {
        let first = buckets.first()?.time;
        let mut min = first;
        let mut max = first;
        for b in buckets.iter().skip(1) {
            min = min.min(b.time);
            max = max.max(b.time);
        }
        Some((min, max))
    }
}
