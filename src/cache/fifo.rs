//! FIFO block cache. Eviction order follows insertion order rather than
//! access recency: unlike LRU, a `get` that misses never promotes a
//! resident, since residents are not re-inserted on a hit (`get` always
//! transfers ownership out, per the shared cache contract).

use std::collections::{HashMap, VecDeque};

use crate::block::Block;
use crate::cache::Cache;

pub struct FifoCache {
    cap: usize,
    order: VecDeque<u64>, // front = oldest / eviction candidate
    entries: HashMap<u64, Block>,
}

impl FifoCache {
    pub fn new(cap: usize) -> Self {
        FifoCache {
            cap,
            order: VecDeque::new(),
            entries: HashMap::new(),
        }
    }

    fn remove_from_order(&mut self, base: u64) {
        if let Some(pos) = self.order.iter().position(|&k| k == base) {
            self.order.remove(pos);
        }
    }

    fn evict_one(&mut self) -> Option<Block> {
        let unused_key = self
            .order
            .iter()
            .find(|&&k| !self.entries.get(&k).map(|b| b.used()).unwrap_or(false))
            .copied();
        let key = unused_key.or_else(|| self.order.front().copied())?;
        self.remove_from_order(key);
        self.entries.remove(&key)
    }
}

impl Cache for FifoCache {
    fn get(&mut self, base: u64) -> Option<Block> {
        if let Some(block) = self.entries.remove(&base) {
            self.remove_from_order(base);
            Some(block)
        } else {
            None
        }
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
            self.order.push_back(base);
            self.entries.insert(base, block);
            return (evicted, true);
        }
        if block.used() {
            self.order.push_back(base);
        } else {
            self.order.push_front(base);
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
