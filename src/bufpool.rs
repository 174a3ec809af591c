//! A tiered, process-wide scratch buffer pool (§5).
//!
//! Buffers are bucketed by `ceil(log2(size))` so a request for any size up
//! to `1 << i` is served from the same free-list. Returning a buffer resets
//! its length to zero while preserving capacity, so the next borrower pays
//! no re-allocation cost for sizes within the same tier.

use std::sync::{Mutex, OnceLock};

const NUM_TIERS: usize = 32;

pub struct BufferPool {
    tiers: Vec<Mutex<Vec<Vec<u8>>>>,
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferPool {
    pub fn new() -> Self {
        let mut tiers = Vec::with_capacity(NUM_TIERS);
        for _ in 0..NUM_TIERS {
            tiers.push(Mutex::new(Vec::new()));
        }
        BufferPool { tiers }
    }

    fn tier_for(size: usize) -> usize {
        if size <= 1 {
            return 0;
        }
        (usize::BITS - (size - 1).leading_zeros()) as usize
    }

    /// Returns a buffer with capacity at least `size` and length zero.
    pub fn get(&self, size: usize) -> Vec<u8> {
        let tier = Self::tier_for(size).min(NUM_TIERS - 1);
        let mut free = self.tiers[tier].lock().unwrap();
        if let Some(mut buf) = free.pop() {
            buf.clear();
            buf
        } else {
            Vec::with_capacity(1usize << tier)
        }
    }

    /// Returns `buf` to the pool, truncated to zero length but retaining
    /// its capacity for the next borrower.
    pub fn put(&self, mut buf: Vec<u8>) {
        let tier = Self::tier_for(buf.capacity()).min(NUM_TIERS - 1);
        buf.clear();
        self.tiers[tier].lock().unwrap().push(buf);
    }
}

static GLOBAL: OnceLock<BufferPool> = OnceLock::new();

/// The process-wide pool shared by inflate's scratch buffer across every
/// read-ahead worker thread.
pub fn global() -> &'static BufferPool {
    GLOBAL.get_or_init(BufferPool::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_zero_length_buffer_with_capacity() {
        let pool = BufferPool::new();
        let buf = pool.get(100);
        assert_eq!(buf.len(), 0);
        assert!(buf.capacity() >= 100);
    }

    #[test]
    fn put_then_get_reuses_capacity() {
        let pool = BufferPool::new();
        let mut buf = pool.get(4096);
        buf.extend_from_slice(&[1, 2, 3]);
        let cap = buf.capacity();
        pool.put(buf);
        let reused = pool.get(4096);
        assert_eq!(reused.len(), 0);
        assert!(reused.capacity() >= cap.min(4096));
    }

    #[test]
    fn tier_boundaries_are_powers_of_two() {
        assert_eq!(BufferPool::tier_for(1), 0);
        assert_eq!(BufferPool::tier_for(2), 1);
        assert_eq!(BufferPool::tier_for(64), 6);
        assert_eq!(BufferPool::tier_for(65), 7);
    }
}
