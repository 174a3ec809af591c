//! Gzip member framing: header encode/decode and the BGZF `BC` extra subfield.
//!
//! BGZF members are ordinary gzip members with one mandatory extra subfield:
//! `id1='B', id2='C', slen=2, data=BSIZE` where `BSIZE` is the total encoded
//! member length minus one. This module owns the byte-level layout; the
//! inflate/deflate work itself lives in [`crate::decompress`] and
//! [`crate::writer`].

use std::io::{self, Read, Write};

use crate::error::{Error, Result};

pub const GZIP_ID1: u8 = 0x1f;
pub const GZIP_ID2: u8 = 0x8b;
pub const CM_DEFLATE: u8 = 0x08;

pub(crate) const FLG_FEXTRA: u8 = 0x04;
pub(crate) const FLG_FNAME: u8 = 0x08;
pub(crate) const FLG_FCOMMENT: u8 = 0x10;

const BC_SUBFIELD_ID1: u8 = b'B';
const BC_SUBFIELD_ID2: u8 = b'C';

/// The literal 28-byte empty member that marks end-of-stream.
pub const EOF_MARKER: [u8; 28] = [
    0x1f, 0x8b, 0x08, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0xff, 0x06, 0x00, 0x42, 0x43, 0x02, 0x00,
    0x1b, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Per-member gzip metadata, both parsed (on read) and supplied (on write).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GzHeader {
    pub mtime: u32,
    pub os: u8,
    pub extra: Vec<u8>,
    pub name: Option<String>,
    pub comment: Option<String>,
}

/// Result of parsing the fixed + extensible parts of a gzip header, up to
/// but not including the compressed data.
pub struct ParsedHeader {
    pub header: GzHeader,
    /// Total bytes consumed from the source since the header started,
    /// i.e. through the end of the optional name/comment/crc fields.
    pub bytes_consumed: usize,
    /// `BSIZE` decoded from the mandatory `BC` subfield.
    pub bsize: u16,
}

/// Reads one gzip header from `r`, requiring a `BC` extra subfield.
///
/// Returns [`Error::NoBlockSize`] if the extra field is absent or does not
/// carry a `BC` id, and [`Error::Corrupt`] for any other framing violation
/// (bad magic, unsupported compression method, truncated read).
pub fn read_header<R: Read>(r: &mut R) -> Result<ParsedHeader> {
    let mut fixed = [0u8; 10];
    read_exact_counted(r, &mut fixed)?;
    if fixed[0] != GZIP_ID1 || fixed[1] != GZIP_ID2 {
        return Err(Error::Corrupt("bad gzip magic".into()));
    }
    if fixed[2] != CM_DEFLATE {
        return Err(Error::Corrupt("unsupported compression method".into()));
    }
    let flg = fixed[3];
    let mtime = u32::from_le_bytes([fixed[4], fixed[5], fixed[6], fixed[7]]);
    let os = fixed[9];
    let mut consumed = 10usize;

    if flg & FLG_FEXTRA == 0 {
        return Err(Error::NoBlockSize);
    }

    let mut xlen_buf = [0u8; 2];
    read_exact_counted(r, &mut xlen_buf)?;
    consumed += 2;
    let xlen = u16::from_le_bytes(xlen_buf) as usize;

    let mut extra = vec![0u8; xlen];
    read_exact_counted(r, &mut extra)?;
    consumed += xlen;

    let bsize = extract_bc_bsize(&extra).ok_or(Error::NoBlockSize)?;

    let name = if flg & FLG_FNAME != 0 {
        let (s, n) = read_cstring(r)?;
        consumed += n;
        Some(s)
    } else {
        None
    };

    let comment = if flg & FLG_FCOMMENT != 0 {
        let (s, n) = read_cstring(r)?;
        consumed += n;
        Some(s)
    } else {
        None
    };

    Ok(ParsedHeader {
        header: GzHeader {
            mtime,
            os,
            extra,
            name,
            comment,
        },
        bytes_consumed: consumed,
        bsize,
    })
}

/// Scans a gzip extra field for the mandatory `id1='B', id2='C', slen=2`
/// subfield and decodes its little-endian payload.
pub fn extract_bc_bsize(extra: &[u8]) -> Option<u16> {
    let mut i = 0;
    while i + 4 <= extra.len() {
        let id1 = extra[i];
        let id2 = extra[i + 1];
        let slen = u16::from_le_bytes([extra[i + 2], extra[i + 3]]) as usize;
        let data_start = i + 4;
        if data_start + slen > extra.len() {
            return None;
        }
        if id1 == BC_SUBFIELD_ID1 && id2 == BC_SUBFIELD_ID2 && slen == 2 {
            let data = &extra[data_start..data_start + 2];
            return Some(u16::from_le_bytes([data[0], data[1]]));
        }
        i = data_start + slen;
    }
    None
}

/// Byte offset of the two `BSIZE` payload bytes within an already-encoded
/// extra field, used post-hoc by the writer to patch in the final size.
pub fn bc_bsize_offset(extra: &[u8]) -> Option<usize> {
    let mut i = 0;
    while i + 4 <= extra.len() {
        let id1 = extra[i];
        let id2 = extra[i + 1];
        let slen = u16::from_le_bytes([extra[i + 2], extra[i + 3]]) as usize;
        let data_start = i + 4;
        if id1 == BC_SUBFIELD_ID1 && id2 == BC_SUBFIELD_ID2 && slen == 2 {
            return Some(data_start);
        }
        if data_start + slen > extra.len() {
            return None;
        }
        i = data_start + slen;
    }
    None
}

/// Builds the extra field for an outgoing member: the `BC` subfield
/// (placeholder `BSIZE=0`) followed by the caller's own extra bytes.
pub fn build_bc_extra(caller_extra: &[u8]) -> Vec<u8> {
    let mut extra = Vec::with_capacity(6 + caller_extra.len());
    extra.push(BC_SUBFIELD_ID1);
    extra.push(BC_SUBFIELD_ID2);
    extra.extend_from_slice(&2u16.to_le_bytes());
    extra.extend_from_slice(&0u16.to_le_bytes());
    extra.extend_from_slice(caller_extra);
    extra
}

/// Writes a complete gzip header (fixed fields + extra + optional name and
/// comment) for `header` to `w`, returning the number of bytes written.
pub fn write_header<W: Write>(w: &mut W, header: &GzHeader) -> io::Result<usize> {
    let extra = build_bc_extra(&header.extra);
    let mut flg = FLG_FEXTRA;
    if header.name.is_some() {
        flg |= FLG_FNAME;
    }
    if header.comment.is_some() {
        flg |= FLG_FCOMMENT;
    }

    let mut out = Vec::with_capacity(10 + 2 + extra.len());
    out.push(GZIP_ID1);
    out.push(GZIP_ID2);
    out.push(CM_DEFLATE);
    out.push(flg);
    out.extend_from_slice(&header.mtime.to_le_bytes());
    out.push(0); // XFL
    out.push(header.os);
    out.extend_from_slice(&(extra.len() as u16).to_le_bytes());
    out.extend_from_slice(&extra);
    if let Some(name) = &header.name {
        out.extend_from_slice(name.as_bytes());
        out.push(0);
    }
    if let Some(comment) = &header.comment {
        out.extend_from_slice(comment.as_bytes());
        out.push(0);
    }
    w.write_all(&out)?;
    Ok(out.len())
}

pub(crate) fn read_exact_counted<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<()> {
    r.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::Corrupt("truncated gzip header".into())
        } else {
            Error::from(e)
        }
    })
}

pub(crate) fn read_cstring<R: Read>(r: &mut R) -> Result<(String, usize)> {
    let mut bytes = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        read_exact_counted(r, &mut byte)?;
        if byte[0] == 0 {
            break;
        }
        bytes.push(byte[0]);
    }
    let len = bytes.len() + 1;
    Ok((String::from_utf8_lossy(&bytes).into_owned(), len))
}
