//! Ordered bucket worklist
//!
//! Items are filed under an integer bucket computed by an externally supplied
//! [`Indexer`]; whole buckets are handed out in ascending index order. Parallel phases
//! collect new items in worker-local buffers and merge them here between phases.

use std::collections::BTreeMap;

/// Maps a work item to its bucket; smaller buckets are processed first
pub trait Indexer<T>: Sync {
    /// Bucket index of `item`
    fn index(&self, item: &T) -> u32;
}

/// Min-ordered collection of buckets
#[derive(Debug)]
pub struct BucketWorklist<T, I> {
    indexer: I,
    buckets: BTreeMap<u32, Vec<T>>,
    len: usize,
}

impl<T, I: Indexer<T>> BucketWorklist<T, I> {
    /// Empty worklist ordered by `indexer`
    pub fn new(indexer: I) -> Self {
        Self {
            indexer,
            buckets: BTreeMap::new(),
            len: 0,
        }
    }

    /// Insert one item into its bucket
    pub fn push(&mut self, item: T) {
        let idx = self.indexer.index(&item);
        self.buckets.entry(idx).or_default().push(item);
        self.len += 1;
    }

    /// Insert every item of `items`
    pub fn extend<It: IntoIterator<Item = T>>(&mut self, items: It) {
        for item in items {
            self.push(item);
        }
    }

    /// Remove and return the lowest non-empty bucket with its index
    pub fn pop_min_bucket(&mut self) -> Option<(u32, Vec<T>)> {
        let (idx, items) = self.buckets.pop_first()?;
        self.len -= items.len();
        Some((idx, items))
    }

    /// Total number of queued items
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no bucket holds work (quiescence once no phase is running)
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tens;

    impl Indexer<u32> for Tens {
        fn index(&self, item: &u32) -> u32 {
            item / 10
        }
    }

    #[test]
    fn test_buckets_in_ascending_order() {
        let mut wl = BucketWorklist::new(Tens);
        wl.extend([35, 3, 12, 7, 31]);
        assert_eq!(wl.len(), 5);

        assert_eq!(wl.pop_min_bucket(), Some((0, vec![3, 7])));
        assert_eq!(wl.pop_min_bucket(), Some((1, vec![12])));

        // arrivals below the current frontier come out first
        wl.push(5);
        assert_eq!(wl.pop_min_bucket(), Some((0, vec![5])));
        assert_eq!(wl.pop_min_bucket(), Some((3, vec![35, 31])));
        assert!(wl.is_empty());
        assert_eq!(wl.pop_min_bucket(), None);
    }

    #[test]
    fn test_refill_same_bucket() {
        let mut wl = BucketWorklist::new(Tens);
        wl.push(1);
        let (idx, _) = wl.pop_min_bucket().unwrap();
        wl.push(2);
        assert_eq!(wl.pop_min_bucket(), Some((idx, vec![2])));
    }
}
