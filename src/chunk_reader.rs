//! A chunk-limited view over a [`Reader`]: given a sorted `Chunk` list, reads
//! deliver exactly the bytes addressed by those chunks and nothing past
//! each chunk's `End`, advancing to the next chunk's `Begin` automatically
//! at a chunk boundary.
//!
//! Truncation is authoritative here: a read never delivers bytes whose
//! virtual offset reaches or exceeds the active chunk's `End`, even if the
//! underlying member has more bytes available.

use std::io::{Read, Seek};

use crate::error::Result;
use crate::reader::Reader;
use crate::voffset::Chunk;

/// Iterates a sorted, non-overlapping list of [`Chunk`]s over a seekable
/// [`Reader`], never delivering bytes past the current chunk's `End`.
pub struct ChunkReader<R> {
    reader: Reader<R>,
    chunks: Vec<Chunk>,
    next: usize,
    active: Option<Chunk>,
}

impl<R: Read + Seek + Send + 'static> ChunkReader<R> {
    /// `chunks` must already be sorted by `Begin`; this mirrors the
    /// precondition the merge strategies in [`crate::voffset`] place on
    /// their own input.
    ///
    /// Forces the underlying reader into blocked mode: without it, a single
    /// large `read` could cross more than one member boundary and deliver
    /// bytes past the active chunk's `End` before the truncation check in
    /// [`ChunkReader::read`] ever sees them.
    pub fn new(mut reader: Reader<R>, chunks: Vec<Chunk>) -> Self {
        reader.set_blocked(true);
        ChunkReader {
            reader,
            chunks,
            next: 0,
            active: None,
        }
    }

    /// Reads up to `dst.len()` bytes, never crossing the active chunk's
    /// `End`. Returns `Ok(0)` once every chunk has been exhausted; further
    /// calls keep returning `Ok(0)` without reseeking anything.
    pub fn read(&mut self, dst: &mut [u8]) -> Result<usize> {
        if dst.is_empty() {
            return Ok(0);
        }
        loop {
            let active = match self.active {
                Some(c) => c,
                None => {
                    let Some(&c) = self.chunks.get(self.next) else {
                        return Ok(0);
                    };
                    self.next += 1;
                    self.reader.seek(c.begin)?;
                    self.active = Some(c);
                    c
                }
            };

            let pos = self.reader.last_chunk().end;
            if pos >= active.end {
                self.active = None;
                continue;
            }

            let want = if pos.file == active.end.file {
                (active.end.block - pos.block) as usize
            } else {
                dst.len()
            };
            let want = want.min(dst.len()).max(1);

            let n = self.reader.read(&mut dst[..want])?;
            if n == 0 {
                // Underlying stream ended before the chunk's declared End;
                // treat the chunk as exhausted rather than looping forever.
                self.active = None;
                continue;
            }
            return Ok(n);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voffset::VirtualOffset;
    use crate::writer::Writer;
    use std::io::Cursor;

    fn bgzf_bytes(chunks: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut w = Writer::new(&mut out, 0).unwrap();
            for c in chunks {
                w.write_all(c).unwrap();
                w.flush().unwrap();
            }
            w.close().unwrap();
        }
        out
    }

    fn second_member_base(raw: &[u8]) -> u64 {
        let mut probe = Reader::new(Cursor::new(raw.to_vec()), 1).unwrap();
        let mut first = [0u8; 8];
        probe.read(&mut first).unwrap();
        probe.last_chunk().end.file
    }

    #[test]
    fn stops_exactly_at_chunk_end_within_one_member() {
        let raw = bgzf_bytes(&[b"0123456789"]);
        let reader = Reader::new(Cursor::new(raw), 1).unwrap();
        let chunk = Chunk::new(VirtualOffset::new(0, 0), VirtualOffset::new(0, 4));
        let mut cr = ChunkReader::new(reader, vec![chunk]);

        let mut buf = [0u8; 64];
        let n = cr.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"0123");
        assert_eq!(cr.read(&mut buf).unwrap(), 0);
        // Reading again past the final chunk's End stays end-of-stream.
        assert_eq!(cr.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn two_disjoint_chunks_across_members_concatenate() {
        let raw = bgzf_bytes(&[b"header!!", b"record-one-data-here"]);
        let base2 = second_member_base(&raw);

        let reader = Reader::new(Cursor::new(raw), 1).unwrap();
        let chunks = vec![
            Chunk::new(VirtualOffset::new(0, 0), VirtualOffset::new(0, 8)),
            Chunk::new(VirtualOffset::new(base2, 0), VirtualOffset::new(base2, 10)),
        ];
        let mut cr = ChunkReader::new(reader, chunks);

        let mut out = Vec::new();
        let mut buf = [0u8; 64];
        loop {
            let n = cr.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, b"header!!record-one".to_vec());
    }
}
