//! Component C5: the sequential and seekable BGZF reader.
//!
//! Read-ahead physical reads always happen synchronously on whichever
//! thread drives the Reader (there is only ever one: the source is not
//! shared), which trivially satisfies the "one worker at a time" head-token
//! rule from the design notes without needing to share `R` across threads.
//! What does run in the worker pool is the CPU-bound half of the pipeline —
//! inflate plus CRC/ISIZE verification — dispatched as soon as the raw
//! bytes for a member are in hand, and drained back out in the same order
//! they were submitted via a `VecDeque` of single-slot channels.

use std::io::{Read, Seek, SeekFrom};

use crossbeam_channel::{bounded, Receiver};

use crate::cache::Cache;
use crate::block::Block;
use crate::config::default_read_ahead_workers;
use crate::decompress;
use crate::error::{Error, Result};
use crate::gzheader::EOF_MARKER;
use crate::threadpool::TPool;
use crate::voffset::{Chunk, VirtualOffset};

struct PendingBlock {
    rx: Receiver<Result<Block>>,
}

/// A handle returned by [`Reader::begin`]; pass it to [`Reader::end`] to get
/// the chunk covering every read performed in between.
pub struct TxHandle {
    begin: VirtualOffset,
}

pub struct Reader<R> {
    source: R,
    /// File offset the physical source is positioned at — i.e. where the
    /// next raw read (if any) will start, absent an intervening seek.
    phys_pos: u64,
    cache: Option<Box<dyn Cache>>,
    active: Block,
    rd: usize,
    pool: TPool,
    pending: std::collections::VecDeque<PendingBlock>,
    last_chunk: Chunk,
    blocked: bool,
    closed: bool,
    latched: Option<Error>,
    /// Set by `seek` once the source has proven seekable. Lets the generic
    /// (non-`Seek`-bound) advance path keep `source` aligned with `phys_pos`
    /// after a cache hit, which adopts a block without physically reading —
    /// without this, a run of consecutive cache hits following a seek would
    /// leave `source` parked at the seek target while `phys_pos` walks
    /// ahead, and the next genuine cache miss would read from the wrong
    /// place. Plain `fn` pointer, not a closure: nothing to capture.
    reseek: Option<fn(&mut R, u64) -> std::io::Result<()>>,
}

impl<R: Read + Send + 'static> Reader<R> {
    /// Constructs a Reader with `rd` read-ahead workers (`0` means "use the
    /// host's default parallelism"). The first member is parsed eagerly so
    /// its header is immediately visible.
    pub fn new(source: R, rd: usize) -> Result<Self> {
        let rd = if rd == 0 { default_read_ahead_workers() } else { rd };
        let pool = TPool::new(rd.max(1), rd.max(1) * 2)
            .expect("worker count validated to be >= 1 above");

        let mut reader = Reader {
            source,
            phys_pos: 0,
            cache: None,
            active: Block::empty(),
            rd,
            pool,
            pending: std::collections::VecDeque::new(),
            last_chunk: Chunk::new(VirtualOffset::ZERO, VirtualOffset::ZERO),
            blocked: false,
            closed: false,
            latched: None,
            reseek: None,
        };
        reader.advance_active()?;
        Ok(reader)
    }

    pub fn set_cache(&mut self, cache: Option<Box<dyn Cache>>) {
        // Swapping to None releases the outgoing cache's blocks to be
        // dropped (i.e. made eligible for eviction/collection).
        self.cache = cache;
    }

    pub fn blocked(&self) -> bool {
        self.blocked
    }

    pub fn set_blocked(&mut self, blocked: bool) {
        self.blocked = blocked;
    }

    pub fn last_chunk(&self) -> Chunk {
        self.last_chunk
    }

    /// Returns a handle whose matching [`Reader::end`] yields the chunk
    /// spanning every read performed between the two calls.
    pub fn begin(&self) -> TxHandle {
        TxHandle {
            begin: self.last_chunk.end,
        }
    }

    pub fn end(&self, tx: TxHandle) -> Chunk {
        Chunk::new(tx.begin, self.last_chunk.end)
    }

    pub fn close(&mut self) {
        self.closed = true;
        self.cache = None;
        self.pending.clear();
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
        log::warn!("reader latched fatal error: {e}");
        self.latched = Some(e.clone());
        e
    }

    /// Reads up to `dst.len()` bytes. Returns `Ok(0)` at true end of stream.
    /// In blocked mode, a single call never returns bytes from more than
    /// one member, even if `dst` has room for more.
    pub fn read(&mut self, dst: &mut [u8]) -> Result<usize> {
        self.check_open()?;
        if dst.is_empty() {
            return Ok(0);
        }
        let begin_vo = self.active.virtual_offset();
        let mut total = 0usize;

        loop {
            if !self.active.has_data() {
                match self.advance_active() {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => return Err(self.latch(e)),
                }
                if !self.active.has_data() {
                    // The member we just filled decoded to zero bytes
                    // (e.g. the magic EOF block). Nothing more to read.
                    break;
                }
            }
            self.active.begin_tx();
            let n = self.active.read(&mut dst[total..]);
            total += n;
            self.last_chunk = Chunk::new(begin_vo, self.active.virtual_offset());
            if total == dst.len() {
                break;
            }
            if !self.active.has_data() && self.blocked {
                break;
            }
        }
        Ok(total)
    }

    /// Reads a single byte, following the same member-boundary rules as
    /// [`Reader::read`]. Returns `Ok(None)` at true end of stream.
    pub fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut buf = [0u8; 1];
        let n = self.read(&mut buf)?;
        if n == 0 {
            Ok(None)
        } else {
            Ok(Some(buf[0]))
        }
    }

    /// Tops up the read-ahead queue up to `rd` outstanding members, doing
    /// the (sequential, cheap) raw-byte read inline and handing the
    /// (parallelizable, CPU-bound) inflate to the worker pool.
    fn top_up(&mut self) -> Result<()> {
        while self.pending.len() < self.rd.max(1) {
            match decompress::read_raw_member(&mut self.source)? {
                Some(raw) => {
                    let base = self.phys_pos;
                    self.phys_pos += raw.len() as u64;
                    let (tx, rx) = bounded(1);
                    self.pool.submit_job(Box::new(move || {
                        let result = decompress::read_block(&mut std::io::Cursor::new(raw), base);
                        let _ = tx.send(result);
                    }));
                    self.pending.push_back(PendingBlock { rx });
                }
                None => break,
            }
        }
        Ok(())
    }

    /// Advances to the member at `self.phys_pos`, retires the outgoing
    /// active Block into the cache, and installs the new one. Returns
    /// `Ok(false)` at true end of stream.
    ///
    /// Consults the cache for `self.phys_pos` first, per §4.5: "consult
    /// cache for `next_base`; on hit, adopt that Block and recompute
    /// `next_base`; on miss, have a worker decompress." The cache probe only
    /// applies when no read-ahead is already in flight (`pending` empty) —
    /// once `top_up` has physically read ahead, those bytes are already
    /// committed to the pipeline and must be drained in order regardless of
    /// what the cache holds for their base.
    fn advance_active(&mut self) -> Result<bool> {
        if self.pending.is_empty() {
            if let Some(cached) = self.cache.as_mut().and_then(|c| c.get(self.phys_pos)) {
                self.phys_pos = cached.next_base().unwrap_or(self.phys_pos);
                self.install_active(cached);
                // A cache hit never touches `source`, so if the source
                // proved seekable keep it pinned to `phys_pos` too — a
                // later miss in this same run reads straight off `source`
                // without repositioning first.
                if let Some(reseek) = self.reseek {
                    reseek(&mut self.source, self.phys_pos).map_err(|e| self.latch(e.into()))?;
                }
                return Ok(true);
            }
        }

        self.top_up()?;
        let Some(pending) = self.pending.pop_front() else {
            return Ok(false);
        };
        let new_block = pending
            .rx
            .recv()
            .map_err(|_| Error::Corrupt("decode worker disconnected".into()))??;

        self.install_active(new_block);
        Ok(true)
    }

    /// Retires the current active Block into the cache (if any) and installs
    /// `new_block` in its place.
    fn install_active(&mut self, new_block: Block) {
        let old_active = std::mem::replace(&mut self.active, Block::empty());
        if let Some(cache) = self.cache.as_mut() {
            if old_active.used() || old_active.has_data() {
                cache.put(old_active);
            }
            self.active = cache.wrap(new_block);
        } else {
            self.active = new_block;
        }
    }
}

impl<R: Read + Seek + Send + 'static> Reader<R> {
    /// Seeks to the member containing `o` and positions the cursor at
    /// `o.block` within it. Requires a seekable source.
    pub fn seek(&mut self, o: VirtualOffset) -> Result<()> {
        self.check_open()?;
        log::debug!("seek to virtual offset {}:{}", o.file, o.block);
        self.reseek
            .get_or_insert(|source: &mut R, pos: u64| source.seek(SeekFrom::Start(pos)).map(|_| ()));
        if self.active.base() == o.file && (o.block as usize) <= self.active.data().len() {
            self.active.seek(o.block as usize);
        } else {
            let mut block = self.cache.as_mut().and_then(|c| c.get(o.file));
            if block.is_none() {
                self.source
                    .seek(SeekFrom::Start(o.file))
                    .map_err(|e| self.latch(e.into()))?;
                let raw = decompress::read_raw_member(&mut self.source)
                    .map_err(|e| self.latch(e))?
                    .ok_or_else(|| {
                        self.latch(Error::Corrupt("seek target has no member".into()))
                    })?;
                let decoded = decompress::read_block(&mut std::io::Cursor::new(raw), o.file)
                    .map_err(|e| self.latch(e))?;
                block = Some(decoded);
            }
            let mut block = block.unwrap();
            block.seek(o.block as usize);
            // A seek invalidates outstanding read-ahead: discard it.
            self.pending.clear();
            self.phys_pos = block.next_base().unwrap_or(o.file);
            // Reposition the physical source to match `phys_pos` regardless
            // of which branch supplied `block`: on a cache hit no physical
            // read happened, so the source is still wherever read-ahead
            // last left it, and the next `top_up` must not read from there.
            self.reseek.unwrap()(&mut self.source, self.phys_pos)
                .map_err(|e| self.latch(e.into()))?;
            self.active = match self.cache.as_ref() {
                Some(cache) => cache.wrap(block),
                None => block,
            };
        }
        self.last_chunk = Chunk::new(o, o);
        Ok(())
    }

    /// Probes `source` for the literal 28-byte magic EOF member at the tail
    /// of the stream. Fails with [`Error::NoEnd`] if the source cannot be
    /// positioned there.
    pub fn has_eof(source: &mut R) -> Result<bool> {
        let len = source.seek(SeekFrom::End(0)).map_err(|_| Error::NoEnd)?;
        if len < EOF_MARKER.len() as u64 {
            return Ok(false);
        }
        source
            .seek(SeekFrom::End(-(EOF_MARKER.len() as i64)))
            .map_err(|_| Error::NoEnd)?;
        let mut buf = [0u8; EOF_MARKER.len()];
        source.read_exact(&mut buf).map_err(|_| Error::NoEnd)?;
        Ok(buf == EOF_MARKER)
    }
}

impl Reader<std::fs::File> {
    /// Convenience wrapper around [`Reader::has_eof`] for a filesystem
    /// path: rejects directories with [`Error::WrongFileType`] before
    /// attempting to open and probe the file.
    pub fn has_eof_path(path: &std::path::Path) -> Result<bool> {
        if path.is_dir() {
            return Err(Error::WrongFileType);
        }
        let mut file = std::fs::File::open(path)?;
        Self::has_eof(&mut file)
    }
}
