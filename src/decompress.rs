//! Component C4: gzip-member framing. Parses exactly one member from a byte
//! source and fills one [`Block`].
//!
//! Uses `flate2::Decompress` in raw mode rather than `GzDecoder` so the
//! member boundary can be pinned exactly: the read-ahead buffer is sized to
//! the declared `BC` block size, so the underlying source position always
//! ends precisely at the next member's first byte.

use std::io::Read;

use flate2::Decompress;
use flate2::Status;

use crate::block::Block;
use crate::bufpool;
use crate::config::MAX_BLOCK_SIZE;
use crate::error::{Error, Result};
use crate::gzheader::{
    extract_bc_bsize, read_exact_counted, read_header, CM_DEFLATE, FLG_FCOMMENT, FLG_FEXTRA,
    FLG_FNAME, GZIP_ID1, GZIP_ID2,
};

const TRAILER_LEN: usize = 8; // CRC32 (4) + ISIZE (4)

/// Reads a NUL-terminated string's raw bytes (including the terminator).
fn read_cstring_bytes<R: Read>(src: &mut R) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        read_exact_counted(src, &mut byte)?;
        bytes.push(byte[0]);
        if byte[0] == 0 {
            break;
        }
    }
    Ok(bytes)
}

/// Reads the raw encoded bytes of exactly one member from `src`, without
/// inflating it. Returns `Ok(None)` if `src` is cleanly at end-of-stream
/// (zero bytes available before any header byte is consumed); any other
/// short read is a framing error, not an end-of-stream signal.
///
/// This is the only step that touches the physical source, which is why
/// the Reader's worker pool performs it while holding the head token and
/// defers the (parallelizable) inflate work in [`read_block`] to after the
/// token is released.
pub fn read_raw_member<R: Read>(src: &mut R) -> Result<Option<Vec<u8>>> {
    let mut raw = Vec::with_capacity(8 * 1024);

    let mut first_byte = [0u8; 1];
    let n = src.read(&mut first_byte)?;
    if n == 0 {
        return Ok(None);
    }

    let mut fixed = [0u8; 10];
    fixed[0] = first_byte[0];
    read_exact_counted(src, &mut fixed[1..])?;
    raw.extend_from_slice(&fixed);
    if fixed[0] != GZIP_ID1 || fixed[1] != GZIP_ID2 {
        return Err(Error::Corrupt("bad gzip magic".into()));
    }
    if fixed[2] != CM_DEFLATE {
        return Err(Error::Corrupt("unsupported compression method".into()));
    }
    let flg = fixed[3];
    if flg & FLG_FEXTRA == 0 {
        return Err(Error::NoBlockSize);
    }

    let mut xlen_buf = [0u8; 2];
    read_exact_counted(src, &mut xlen_buf)?;
    raw.extend_from_slice(&xlen_buf);
    let xlen = u16::from_le_bytes(xlen_buf) as usize;

    let mut extra = vec![0u8; xlen];
    read_exact_counted(src, &mut extra)?;
    raw.extend_from_slice(&extra);
    let bsize = extract_bc_bsize(&extra).ok_or(Error::NoBlockSize)?;

    if flg & FLG_FNAME != 0 {
        raw.extend_from_slice(&read_cstring_bytes(src)?);
    }
    if flg & FLG_FCOMMENT != 0 {
        raw.extend_from_slice(&read_cstring_bytes(src)?);
    }

    let block_size = bsize as usize + 1;
    if block_size > MAX_BLOCK_SIZE {
        return Err(Error::Corrupt(format!(
            "declared block size {} exceeds maximum {}",
            block_size, MAX_BLOCK_SIZE
        )));
    }
    let delta = raw.len();
    if block_size < delta {
        return Err(Error::Corrupt("block size smaller than header".into()));
    }
    let remaining = block_size - delta;
    let mut body = vec![0u8; remaining];
    read_exact_counted(src, &mut body)?;
    raw.extend_from_slice(&body);

    Ok(Some(raw))
}

/// Parses and inflates the member starting at file offset `base` from `src`,
/// returning a filled [`Block`].
///
/// Single-use per call: there is no persistent decompressor state to reset
/// between members, since `flate2::Decompress` is constructed fresh each
/// time to guarantee exactly one member is consumed.
pub fn read_block<R: Read>(src: &mut R, base: u64) -> Result<Block> {
    let parsed = read_header(src)?;
    let block_size = parsed.bsize as usize + 1;
    if block_size > MAX_BLOCK_SIZE {
        return Err(Error::Corrupt(format!(
            "declared block size {} exceeds maximum {}",
            block_size, MAX_BLOCK_SIZE
        )));
    }
    let delta = parsed.bytes_consumed;
    if block_size < delta + TRAILER_LEN {
        return Err(Error::Corrupt("block size smaller than header + trailer".into()));
    }
    let remaining = block_size - delta;

    let mut buf = vec![0u8; remaining];
    src.read_exact(&mut buf).map_err(|e| {
        Error::Corrupt(format!("short read filling member body: {}", e))
    })?;

    let compressed_len = remaining - TRAILER_LEN;
    let compressed = &buf[..compressed_len];
    let trailer = &buf[compressed_len..];
    let expected_crc = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    let expected_isize = u32::from_le_bytes([trailer[4], trailer[5], trailer[6], trailer[7]]);

    let data = inflate_one_member(compressed)?;

    let mut crc = flate2::Crc::new();
    crc.update(&data);
    if crc.sum() != expected_crc {
        log::warn!("crc32 mismatch decoding member at base {base}");
        return Err(Error::Corrupt("crc32 mismatch".into()));
    }
    if data.len() as u64 != expected_isize as u64 {
        log::warn!("isize mismatch decoding member at base {base}");
        return Err(Error::Corrupt("isize mismatch".into()));
    }

    Ok(Block::new(base, parsed.header, data, block_size as u64))
}

fn inflate_one_member(compressed: &[u8]) -> Result<Vec<u8>> {
    let mut decompress = Decompress::new(false);
    let mut out = Vec::with_capacity(compressed.len() * 3 + 256);
    let pool = bufpool::global();
    let mut scratch = pool.get(64 * 1024);
    scratch.resize(64 * 1024, 0);
    let mut input_pos = 0usize;

    let result = (|| {
        loop {
            let before_in = decompress.total_in();
            let before_out = decompress.total_out();
            let status = decompress
                .decompress(&compressed[input_pos..], &mut scratch, flate2::FlushDecompress::None)
                .map_err(|e| Error::Corrupt(format!("inflate failure: {}", e)))?;
            let consumed = (decompress.total_in() - before_in) as usize;
            let produced = (decompress.total_out() - before_out) as usize;
            out.extend_from_slice(&scratch[..produced]);
            input_pos += consumed;

            match status {
                Status::StreamEnd => break,
                Status::Ok | Status::BufError => {
                    if consumed == 0 && produced == 0 {
                        return Err(Error::Corrupt("inflate stalled before stream end".into()));
                    }
                    if input_pos >= compressed.len() && produced == 0 {
                        return Err(Error::Corrupt("truncated deflate stream".into()));
                    }
                }
            }
        }
        Ok(())
    })();
    pool.put(scratch);
    result?;
    Ok(out)
}
