//! Compile-time configuration constants.
//!
//! A single place collecting the tuning knobs that would otherwise be
//! scattered magic numbers. Runtime overrides are ordinary constructor
//! parameters — there is no global mutable configuration state.

/// Recommended input bytes staged per member before sealing.
///
/// Chosen so that worst-case compressed output plus framing never exceeds
/// [`MAX_BLOCK_SIZE`]: `0x0FF00 = 65280`.
pub const BLOCK_SIZE: usize = 0x0FF00;

/// Hard ceiling on a single encoded gzip member, header through trailer.
pub const MAX_BLOCK_SIZE: usize = 0x10000;

/// Default gzip compression level used by [`crate::writer::Writer::new`].
pub const DEFAULT_LEVEL: u32 = 6;

/// Default block-cache capacity (number of resident Blocks) when a caller
/// constructs a cache without specifying one explicitly.
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Default number of read-ahead workers when `rd == 0` is passed to
/// `Reader::new`. Corresponds to the "zero = implementation default"
/// contract in the design notes.
pub fn default_read_ahead_workers() -> usize {
    num_cpus::get()
}

/// Default number of compression workers when a Writer is constructed with
/// `wr == 0`.
pub fn default_write_workers() -> usize {
    num_cpus::get()
}
