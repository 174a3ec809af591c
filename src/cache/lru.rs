//! LRU block cache: doubly linked order list (represented as a `VecDeque`
//! of keys) plus a map keyed on `base`.

use std::collections::{HashMap, VecDeque};

use crate::block::Block;
use crate::cache::Cache;

pub struct LruCache {
    cap: usize,
    order: VecDeque<u64>, // front = LRU end, back = MRU end
    entries: HashMap<u64, Block>,
}

impl LruCache {
    pub fn new(cap: usize) -> Self {
        LruCache {
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

    /// Evicts one resident, preferring an unused one; returns it.
    fn evict_one(&mut self) -> Option<Block> {
        let unused_key = self
            .order
            .iter()
            .find(|&&k| !self.entries.get(&k).map(|b| b.used()).unwrap_or(false))
            .copied();
        let key = unused_key.or_else(|| self.order.front().copied())?;
        self.remove_from_order(key);
        let evicted = self.entries.remove(&key);
        if evicted.is_some() {
            log::debug!("lru cache evicted block at base {key}");
        }
        evicted
    }
}

impl Cache for LruCache {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gzheader::GzHeader;

    fn used_block(base: u64) -> Block {
        let mut b = Block::new(base, GzHeader::default(), b"x".to_vec(), 10);
        let mut sink = [0u8; 1];
        b.read(&mut sink);
        b
    }

    #[test]
    fn get_moves_entry_to_mru() {
        let mut cache = LruCache::new(2);
        cache.put(used_block(1));
        cache.put(used_block(2));
        // touch 1, making 2 the LRU
        assert!(cache.get(1).is_some());
        cache.put(used_block(1));
        let (evicted, retained) = cache.put(used_block(3));
        assert!(retained);
        assert_eq!(evicted.unwrap().base(), 2);
    }

    #[test]
    fn unused_resident_evicted_before_used() {
        let mut cache = LruCache::new(2);
        cache.put(used_block(1));
        cache.put(Block::new(2, GzHeader::default(), b"x".to_vec(), 10)); // unused, inserted at LRU front
        let (evicted, retained) = cache.put(used_block(3));
        assert!(retained);
        assert_eq!(evicted.unwrap().base(), 2);
    }
}
