//! Virtual offsets and chunk algebra (component C1).
//!
//! A virtual offset pairs a 48-bit compressed file position with a 16-bit
//! position inside that member's decompressed payload. Packing the two into
//! a single `u64` is what BAM/tabix indexes persist, so ordering must match
//! the packed representation exactly.

use std::cmp::Ordering;

/// `(file offset of a member's first byte, byte offset within its payload)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VirtualOffset {
    pub file: u64,
    pub block: u16,
}

impl VirtualOffset {
    pub const ZERO: VirtualOffset = VirtualOffset { file: 0, block: 0 };

    pub fn new(file: u64, block: u16) -> Self {
        VirtualOffset { file, block }
    }

    /// `(F<<16)|B`. `file` is truncated to 48 bits, matching the on-disk
    /// representation; callers constructing offsets from trusted sources
    /// never exceed that range in practice.
    pub fn pack(self) -> u64 {
        ((self.file & 0x0000_FFFF_FFFF_FFFF) << 16) | self.block as u64
    }

    pub fn unpack(packed: u64) -> Self {
        VirtualOffset {
            file: packed >> 16,
            block: (packed & 0xFFFF) as u16,
        }
    }
}

impl PartialOrd for VirtualOffset {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VirtualOffset {
    fn cmp(&self, other: &Self) -> Ordering {
        self.pack().cmp(&other.pack())
    }
}

/// A half-open `[begin, end)` interval of virtual offsets.
///
/// `begin <= end` is an invariant the merge operations assume; they do not
/// validate malformed input (see module-level docs on `merge`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub begin: VirtualOffset,
    pub end: VirtualOffset,
}

impl Chunk {
    pub fn new(begin: VirtualOffset, end: VirtualOffset) -> Self {
        Chunk { begin, end }
    }
}

/// Strategies for collapsing a sorted-by-`begin` chunk list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// No change.
    Identity,
    /// Absorb each chunk into its successor when they touch or overlap.
    Adjacent,
    /// Collapse the entire list into one chunk spanning it all.
    Squash,
    /// Like `Adjacent`, but adjacency is judged purely on file-byte
    /// proximity: `left.end.file + n >= right.begin.file`.
    Near(u64),
}

/// Merge `chunks`, assumed already sorted by `begin`. Input order is
/// preserved for the chunks that survive; malformed input (`begin > end`
/// on some element) is undefined behavior per the inputs' contract, not
/// something this function checks.
pub fn merge(chunks: &[Chunk], strategy: MergeStrategy) -> Vec<Chunk> {
    if chunks.is_empty() {
        return Vec::new();
    }
    match strategy {
        MergeStrategy::Identity => chunks.to_vec(),
        MergeStrategy::Squash => {
            let begin = chunks[0].begin;
            let end = chunks.iter().map(|c| c.end).max().unwrap();
            vec![Chunk::new(begin, end)]
        }
        MergeStrategy::Adjacent => merge_adjacent(chunks, |l, r| l.end.pack() >= r.begin.pack()),
        MergeStrategy::Near(n) => {
            merge_adjacent(chunks, |l, r| l.end.file + n >= r.begin.file)
        }
    }
}

fn merge_adjacent(chunks: &[Chunk], touches: impl Fn(&Chunk, &Chunk) -> bool) -> Vec<Chunk> {
    let mut out: Vec<Chunk> = Vec::with_capacity(chunks.len());
    for &c in chunks {
        match out.last_mut() {
            Some(last) if touches(last, &c) => {
                let begin = if last.begin.pack() < c.begin.pack() {
                    last.begin
                } else {
                    c.begin
                };
                let end = if last.end.pack() > c.end.pack() {
                    last.end
                } else {
                    c.end
                };
                *last = Chunk::new(begin, end);
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_roundtrip() {
        let o = VirtualOffset::new(0x1234_5678_9ABC, 0xBEEF);
        assert_eq!(VirtualOffset::unpack(o.pack()), o);
    }

    #[test]
    fn ordering_is_by_packed_value() {
        let a = VirtualOffset::new(0, 10);
        let b = VirtualOffset::new(1, 0);
        assert!(a < b);
    }

    #[test]
    fn merge_adjacent_absorbs_touching_pairs() {
        let chunks = vec![
            Chunk::new(VirtualOffset::new(0, 0), VirtualOffset::new(0, 6)),
            Chunk::new(VirtualOffset::new(0, 6), VirtualOffset::new(0, 11)),
            Chunk::new(VirtualOffset::new(43, 0), VirtualOffset::new(43, 5)),
        ];
        let merged = merge(&chunks, MergeStrategy::Adjacent);
        assert_eq!(
            merged,
            vec![
                Chunk::new(VirtualOffset::new(0, 0), VirtualOffset::new(0, 11)),
                Chunk::new(VirtualOffset::new(43, 0), VirtualOffset::new(43, 5)),
            ]
        );
    }

    #[test]
    fn merge_squash_spans_everything() {
        let chunks = vec![
            Chunk::new(VirtualOffset::new(0, 0), VirtualOffset::new(0, 6)),
            Chunk::new(VirtualOffset::new(0, 6), VirtualOffset::new(0, 11)),
            Chunk::new(VirtualOffset::new(43, 0), VirtualOffset::new(43, 5)),
        ];
        let merged = merge(&chunks, MergeStrategy::Squash);
        assert_eq!(
            merged,
            vec![Chunk::new(VirtualOffset::new(0, 0), VirtualOffset::new(43, 5))]
        );
    }

    #[test]
    fn merge_near_uses_file_proximity_only() {
        let chunks = vec![
            Chunk::new(VirtualOffset::new(0, 0), VirtualOffset::new(0, 100)),
            Chunk::new(VirtualOffset::new(5, 0), VirtualOffset::new(10, 0)),
        ];
        let merged = merge(&chunks, MergeStrategy::Near(10));
        assert_eq!(merged.len(), 1);
        let merged_none = merge(&chunks, MergeStrategy::Near(1));
        assert_eq!(merged_none.len(), 2);
    }
}
