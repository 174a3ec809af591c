//! Component C3: pluggable block caches.
//!
//! All three policies ([`lru`], [`fifo`], [`random`]) share the same
//! contract defined by the [`Cache`] trait, plus the `unused block preferred
//! for eviction` rule from the design. [`stats`] wraps any `Cache` to count
//! gets/misses/puts/retains/evictions without changing eviction behavior.

pub mod fifo;
pub mod lru;
pub mod random;
pub mod stats;

use crate::block::Block;

/// A keyed store of [`Block`]s, keyed by `Block::base`.
pub trait Cache: Send {
    /// Removes and returns the Block based at `base`, if present.
    fn get(&mut self, base: u64) -> Option<Block>;

    /// Inserts `block`.
    ///
    /// - If `block.base()` is already present: the incoming block is not
    ///   inserted; returns `(None, false)`.
    /// - Else if the cache is full:
    ///   - If `block` is unused, it is not retained: returns
    ///     `(Some(block), false)` and the caller may recycle it.
    ///   - Else one resident is evicted (unused residents preferred):
    ///     returns `(evicted, true)`.
    /// - Else the block is inserted directly: returns `(None, true)`.
    fn put(&mut self, block: Block) -> (Option<Block>, bool);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cap(&self) -> usize;

    /// Changes capacity to `n`, evicting by policy if the cache currently
    /// holds more than `n` entries.
    fn resize(&mut self, n: usize);

    /// Evicts up to `n` entries by policy (unused residents preferred),
    /// discarding them.
    fn drop_entries(&mut self, n: usize);

    /// Decorates a newly filled Block at allocation time. The default is
    /// the identity function; instrumented caches override it.
    fn wrap(&self, block: Block) -> Block {
        block
    }
}
