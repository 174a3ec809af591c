//! Random-eviction block cache: a plain map with no order tracking.
//! Eviction scans for an unused resident first; if none exists, an
//! arbitrary entry is evicted.

use std::collections::HashMap;

use rand::seq::IteratorRandom;
use rand::thread_rng;

use crate::block::Block;
use crate::cache::Cache;

pub struct RandomCache {
    cap: usize,
    entries: HashMap<u64, Block>,
}

impl RandomCache {
    pub fn new(cap: usize) -> Self {
        RandomCache {
            cap,
            entries: HashMap::new(),
        }
    }

    fn evict_one(&mut self) -> Option<Block> {
        let key = self
            .entries
            .iter()
            .find(|(_, b)| !b.used())
            .map(|(&k, _)| k)
            .or_else(|| {
                self.entries
                    .keys()
                    .copied()
                    .choose(&mut thread_rng())
            })?;
        self.entries.remove(&key)
    }
}

impl Cache for RandomCache {
    fn get(&mut self, base: u64) -> Option<Block> {
        self.entries.remove(&base)
    }

    fn put(&mut self, block: Block) -> (Option<Block>, bool) {
        let base = block.base();
        if self.entries.contains_key(&base) {
            return (None, false);
        }
        if self.entries.len() >= self.cap {
            if !block.used() {
                return (Some(block), false);
            }
            let evicted = self.evict_one();
            self.entries.insert(base, block);
            return (evicted, true);
        }
        self.entries.insert(base, block);
        (None, true)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn cap(&self) -> usize {
        self.cap
    }

    fn resize(&mut self, n: usize) {
        self.cap = n;
        while self.entries.len() > self.cap {
            self.evict_one();
        }
    }

    fn drop_entries(&mut self, n: usize) {
        for _ in 0..n {
            if self.evict_one().is_none() {
                break;
            }
        }
    }
}
