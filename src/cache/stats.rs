//! Decorates any [`Cache`] with get/miss/put/retain/eviction counters
//! without altering eviction behavior.

use crate::block::Block;
use crate::cache::Cache;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub gets: u64,
    pub misses: u64,
    pub puts: u64,
    pub retains: u64,
    pub evictions: u64,
}

pub struct StatsRecorder<C: Cache> {
    inner: C,
    stats: Stats,
}

impl<C: Cache> StatsRecorder<C> {
    pub fn new(inner: C) -> Self {
        StatsRecorder {
            inner,
            stats: Stats::default(),
        }
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: Cache> Cache for StatsRecorder<C> {
    fn get(&mut self, base: u64) -> Option<Block> {
        self.stats.gets += 1;
        let result = self.inner.get(base);
        if result.is_none() {
            self.stats.misses += 1;
        }
        result
    }

    fn put(&mut self, block: Block) -> (Option<Block>, bool) {
        self.stats.puts += 1;
        let (evicted, retained) = self.inner.put(block);
        if retained {
            self.stats.retains += 1;
            // An eviction is counted only when the put both retained the
            // new block and returned a non-null evictee.
            if evicted.is_some() {
                self.stats.evictions += 1;
            }
        }
        (evicted, retained)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn cap(&self) -> usize {
        self.inner.cap()
    }

    fn resize(&mut self, n: usize) {
        self.inner.resize(n)
    }

    fn drop_entries(&mut self, n: usize) {
        self.inner.drop_entries(n)
    }

    fn wrap(&self, block: Block) -> Block {
        self.inner.wrap(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::lru::LruCache;
    use crate::gzheader::GzHeader;

    fn used_block(base: u64) -> Block {
        let mut b = Block::new(base, GzHeader::default(), b"x".to_vec(), 10);
        let mut sink = [0u8; 1];
        b.read(&mut sink);
        b
    }

    #[test]
    fn counts_match_scenario_s5_shape() {
        // Mirrors the S5 scenario's operation sequence over an LRU(5) cache,
        // minus the Reader plumbing: 7 gets, 4 misses, 7 puts, 7 retains,
        // 0 evictions when the cache never fills beyond capacity.
        let mut cache = StatsRecorder::new(LruCache::new(5));
        for i in 0..4u64 {
            assert!(cache.get(i).is_none());
            let (_, retained) = cache.put(used_block(i));
            assert!(retained);
        }
        for i in 0..3u64 {
            assert!(cache.get(i).is_some());
            let (_, retained) = cache.put(used_block(i));
            assert!(retained);
        }
        let stats = cache.stats();
        assert_eq!(stats.gets, 7);
        assert_eq!(stats.misses, 4);
        assert_eq!(stats.puts, 7);
        assert_eq!(stats.retains, 7);
        assert_eq!(stats.evictions, 0);
    }
}
