//! Component C6: the framed, parallel-compressing BGZF writer.
//!
//! Mirrors the Reader's split between a cheap sequential stage (staging
//! input bytes, assigning each sealed member its slot in the output order)
//! and a CPU-bound stage dispatched to the worker pool (gzip-compressing
//! the staged payload). Output order is enforced the same way Reader
//! enforces input order: a `VecDeque` of single-slot channels, one per
//! in-flight member, drained strictly front-to-back.

use std::io::Write;

use crossbeam_channel::{bounded, Receiver};

use crate::config::{default_write_workers, BLOCK_SIZE, DEFAULT_LEVEL, MAX_BLOCK_SIZE};
use crate::error::{Error, Result};
use crate::gzheader::{bc_bsize_offset, build_bc_extra, write_header, GzHeader, EOF_MARKER};
use crate::threadpool::TPool;

struct PendingMember {
    rx: Receiver<Result<Vec<u8>>>,
}

/// Buffers up to one block's worth of input, compresses sealed members on
/// a worker pool, and emits them to `output` in the order they were sealed.
pub struct Writer<W> {
    output: W,
    level: u32,
    staging: Vec<u8>,
    pool: TPool,
    pending: std::collections::VecDeque<PendingMember>,
    closed: bool,
    latched: Option<Error>,
    wrote_since_flush: bool,

    pub comment: Option<String>,
    pub name: Option<String>,
    pub mtime: u32,
    pub os: u8,
    pub extra: Vec<u8>,
}

impl<W: Write> Writer<W> {
    /// Constructs a Writer at the default gzip level with `wr` compression
    /// workers (`0` means "use the host's default parallelism").
    pub fn new(output: W, wr: usize) -> Result<Self> {
        Self::new_level(output, DEFAULT_LEVEL, wr)
    }

    /// Constructs a Writer at an explicit gzip `level` (0-9).
    pub fn new_level(output: W, level: u32, wr: usize) -> Result<Self> {
        let wr = if wr == 0 { default_write_workers() } else { wr };
        let pool = TPool::new(wr.max(1), wr.max(1) * 2)
            .expect("worker count validated to be >= 1 above");
        Ok(Writer {
            output,
            level,
            staging: Vec::with_capacity(BLOCK_SIZE),
            pool,
            pending: std::collections::VecDeque::new(),
            closed: false,
            latched: None,
            wrote_since_flush: false,
            comment: None,
            name: None,
            mtime: 0,
            os: 0xff,
            extra: Vec::new(),
        })
    }

    /// Current staged byte count (bytes written since the last seal).
    pub fn next(&self) -> usize {
        self.staging.len()
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::Closed);
        }
        if let Some(e) = &self.latched {
            return Err(e.clone());
        }
        Ok(())
    }

    fn latch(&mut self, e: Error) -> Error {
        log::warn!("writer latched fatal error: {e}");
        self.latched = Some(e.clone());
        e
    }

    /// Copies `buf` into the staging buffer, sealing and dispatching a
    /// member each time it fills to [`crate::config::BLOCK_SIZE`].
    pub fn write_all(&mut self, mut buf: &[u8]) -> Result<()> {
        self.check_open()?;
        while !buf.is_empty() {
            let room = BLOCK_SIZE - self.staging.len();
            let n = room.min(buf.len());
            self.staging.extend_from_slice(&buf[..n]);
            buf = &buf[n..];
            self.wrote_since_flush = true;
            if self.staging.len() >= BLOCK_SIZE {
                self.seal_and_dispatch()?;
            }
        }
        Ok(())
    }

    /// Seals and enqueues whatever is currently staged. A no-op if nothing
    /// has been written since the last seal — a writer that never received
    /// a single byte produces no data members at all; `close`'s magic EOF
    /// member alone is already a well-formed (if trivial) BGZF stream.
    pub fn flush(&mut self) -> Result<()> {
        self.check_open()?;
        if self.wrote_since_flush {
            self.seal_and_dispatch()?;
        }
        self.drain_ready()?;
        self.output.flush().map_err(|e| self.latch(e.into()))
    }

    /// Blocks until every previously enqueued member has been written to
    /// `output`.
    pub fn wait(&mut self) -> Result<()> {
        self.check_open()?;
        self.drain_ready()
    }

    /// Flushes, waits for all pending members, emits the 28-byte magic EOF
    /// member, and latches `closed`. Idempotent.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.flush()?;
        self.wait()?;
        let result = self
            .output
            .write_all(&EOF_MARKER)
            .map_err(|e| self.latch(e.into()));
        self.closed = true;
        result
    }

    /// Seals the current staging buffer into a member and dispatches its
    /// compression to the worker pool, clearing the staging buffer.
    fn seal_and_dispatch(&mut self) -> Result<()> {
        let payload = std::mem::take(&mut self.staging);
        self.wrote_since_flush = false;
        let header = GzHeader {
            mtime: self.mtime,
            os: self.os,
            extra: self.extra.clone(),
            name: self.name.clone(),
            comment: self.comment.clone(),
        };
        let level = self.level;
        let (tx, rx) = bounded(1);
        self.pool.submit_job(Box::new(move || {
            let result = seal_member(&payload, &header, level);
            let _ = tx.send(result);
        }));
        self.pending.push_back(PendingMember { rx });
        Ok(())
    }

    /// Writes every currently pending member to `output`, strictly in the
    /// order it was sealed: the front of the queue is always awaited
    /// before the next is considered, regardless of which workers finish
    /// first.
    fn drain_ready(&mut self) -> Result<()> {
        while let Some(front) = self.pending.pop_front() {
            let bytes = front
                .rx
                .recv()
                .map_err(|_| Error::Corrupt("compression worker disconnected".into()))?
                .map_err(|e| self.latch(e))?;
            self.output
                .write_all(&bytes)
                .map_err(|e| self.latch(e.into()))?;
        }
        Ok(())
    }
}

/// Compresses `payload` into one framed gzip member carrying the `BC`
/// subfield, returning the encoded bytes ready for output.
fn seal_member(payload: &[u8], header: &GzHeader, level: u32) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(payload.len() / 2 + 64);
    write_header(&mut out, header)?;

    let header_len = out.len();
    let compressed = deflate(payload, level);
    out.extend_from_slice(&compressed);

    let mut crc = flate2::Crc::new();
    crc.update(payload);
    out.extend_from_slice(&crc.sum().to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());

    let size = out.len() - 1;
    if size >= MAX_BLOCK_SIZE {
        return Err(Error::BlockOverflow {
            size,
            max: MAX_BLOCK_SIZE,
        });
    }

    // Locate the BC subfield within the header we just wrote and patch in
    // the final size. `bc_bsize_offset` scans the same extra bytes
    // `write_header` encoded via `build_bc_extra`, so the offset it
    // reports is stable; re-derive it from the encoded extra slice rather
    // than re-building it to avoid drifting from what was actually written.
    let extra = build_bc_extra(&header.extra);
    let bc_off_in_extra = bc_bsize_offset(&extra).expect("BC subfield always present");
    // Extra field begins right after the 12-byte fixed header + XLEN field.
    let extra_start = 12;
    let bc_off = extra_start + bc_off_in_extra;
    debug_assert!(bc_off + 2 <= header_len);
    out[bc_off..bc_off + 2].copy_from_slice(&(size as u16).to_le_bytes());

    Ok(out)
}

fn deflate(payload: &[u8], level: u32) -> Vec<u8> {
    use flate2::write::DeflateEncoder;
    use flate2::Compression;
    let mut enc = DeflateEncoder::new(Vec::with_capacity(payload.len()), Compression::new(level));
    enc.write_all(payload).expect("writing to an in-memory Vec never fails");
    enc.finish().expect("finishing an in-memory DeflateEncoder never fails")
}
