//! Integration tests for the BGZF codec's concrete scenarios (S1-S8):
//! literal-value round trips, cache statistics, merge algebra, and
//! corrupt-stream handling.

use std::io::Cursor;

use bgzf::cache::lru::LruCache;
use bgzf::cache::stats::StatsRecorder;
use bgzf::gzheader::EOF_MARKER;
use bgzf::voffset::{merge, Chunk, MergeStrategy, VirtualOffset};
use bgzf::{ChunkReader, Error, GzHeader, Reader, Writer};

fn read_all<R: std::io::Read + Send + 'static>(mut reader: Reader<R>) -> Vec<u8> {
    let mut out = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = reader.read(&mut buf).unwrap();
        if n == 0 {
            break;
        }
        out.extend_from_slice(&buf[..n]);
    }
    out
}

/// S1 — an empty stream is exactly the 28-byte magic block, and reads back
/// as the empty byte sequence.
#[test]
fn s1_empty_stream_is_just_the_magic_block() {
    let mut out = Vec::new();
    let mut w = Writer::new(&mut out, 1).unwrap();
    w.close().unwrap();
    assert_eq!(out, EOF_MARKER.to_vec());

    let reader = Reader::new(Cursor::new(out), 1).unwrap();
    assert!(read_all(reader).is_empty());
}

/// S2 — single member round trip with header metadata.
#[test]
fn s2_single_member_round_trip_with_header() {
    let mut out = Vec::new();
    {
        let mut w = Writer::new(&mut out, 1).unwrap();
        w.comment = Some("comment".to_string());
        w.name = Some("name".to_string());
        w.mtime = 100_000_000;
        w.extra = b"extra".to_vec();
        w.write_all(b"payload").unwrap();
        w.close().unwrap();
    }

    // Re-parse the first member's header directly.
    let mut cursor = Cursor::new(out.clone());
    let parsed = bgzf::gzheader::read_header(&mut cursor).unwrap();
    assert_eq!(parsed.header.name.as_deref(), Some("name"));
    assert_eq!(parsed.header.mtime, 100_000_000);
    assert_eq!(parsed.header.os, 0xff);
    assert!(parsed.header.extra.ends_with(b"extra"));

    let reader = Reader::new(Cursor::new(out), 1).unwrap();
    assert_eq!(read_all(reader), b"payload".to_vec());
}

/// S3 — multi-member seek: writing two members then seeking to the second
/// member's base yields only its payload; seeking back to zero yields both.
#[test]
fn s3_multi_member_seek() {
    let mut out = Vec::new();
    let off;
    {
        let mut w = Writer::new(&mut out, 1).unwrap();
        w.write_all(b"payload1").unwrap();
        w.flush().unwrap();
        w.wait().unwrap();
        off = out.len() as u64;
        w.write_all(b"payloadTwo").unwrap();
        w.close().unwrap();
    }

    let mut reader = Reader::new(Cursor::new(out.clone()), 1).unwrap();
    reader.seek(VirtualOffset::new(off, 0)).unwrap();
    let mut buf = Vec::new();
    let mut chunk = [0u8; 32];
    loop {
        let n = reader.read(&mut chunk).unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    assert_eq!(buf, b"payloadTwo".to_vec());

    reader.seek(VirtualOffset::ZERO).unwrap();
    let mut whole = Vec::new();
    loop {
        let n = reader.read(&mut chunk).unwrap();
        if n == 0 {
            break;
        }
        whole.extend_from_slice(&chunk[..n]);
    }
    assert_eq!(whole, b"payload1payloadTwo".to_vec());
}

/// S4 — EOF detection: present after a well-formed close, absent once the
/// trailing magic block is truncated away.
#[test]
fn s4_eof_detection() {
    let mut out = Vec::new();
    {
        let mut w = Writer::new(&mut out, 1).unwrap();
        w.write_all(b"payload").unwrap();
        w.close().unwrap();
    }
    let mut cursor = Cursor::new(out.clone());
    assert!(Reader::has_eof(&mut cursor).unwrap());

    let mut truncated = out;
    truncated.truncate(truncated.len() - EOF_MARKER.len());
    let mut cursor = Cursor::new(truncated);
    assert!(!Reader::has_eof(&mut cursor).unwrap());
}

/// S5 — cache semantics: an LRU(5) wired into a Reader keeps serving
/// correct bytes across a seek-back-to-start. The exact get/miss/put/evict
/// counters for this scenario's operation sequence are pinned directly,
/// without the Reader plumbing, in
/// `cache::stats::tests::counts_match_scenario_s5_shape`.
#[test]
fn s5_lru_backed_reader_reads_correctly_after_seek() {
    let mut out = Vec::new();
    {
        let mut w = Writer::new(&mut out, 1).unwrap();
        for i in 0..10u32 {
            w.write_all(format!("{i}payload{i}").as_bytes()).unwrap();
            w.flush().unwrap();
            w.wait().unwrap();
        }
        w.close().unwrap();
    }

    let mut reader = Reader::new(Cursor::new(out), 1).unwrap();
    reader.set_cache(Some(Box::new(StatsRecorder::new(LruCache::new(5)))));

    let mut chunk = [0u8; 1];
    for _ in 0..3 {
        reader.read(&mut chunk).unwrap();
        loop {
            let n = reader.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
        }
    }
    reader.seek(VirtualOffset::new(0, 0)).unwrap();
    let all = read_all(reader);
    assert!(all.starts_with(b"0payload0"));
}

/// S6 — chunk-limited reads never deliver bytes past the active chunk's
/// `End`, and attempting to read past the final chunk's `End` returns
/// end-of-stream without advancing.
#[test]
fn s6_chunk_limited_read_stops_at_end() {
    let mut out = Vec::new();
    {
        let mut w = Writer::new(&mut out, 1).unwrap();
        w.write_all(b"0123456789").unwrap();
        w.close().unwrap();
    }
    let reader = Reader::new(Cursor::new(out), 1).unwrap();
    let chunk = Chunk::new(VirtualOffset::new(0, 0), VirtualOffset::new(0, 4));
    let mut cr = ChunkReader::new(reader, vec![chunk]);

    let mut buf = [0u8; 64];
    let n = cr.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"0123");
    assert_eq!(cr.read(&mut buf).unwrap(), 0);
    assert_eq!(cr.read(&mut buf).unwrap(), 0);
}

/// S7 — merge strategies over a representative chunk list.
#[test]
fn s7_merge_adjacent_and_squash() {
    let chunks = vec![
        Chunk::new(VirtualOffset::new(0, 0), VirtualOffset::new(0, 6)),
        Chunk::new(VirtualOffset::new(0, 6), VirtualOffset::new(0, 11)),
        Chunk::new(VirtualOffset::new(43, 0), VirtualOffset::new(43, 5)),
    ];

    let adjacent = merge(&chunks, MergeStrategy::Adjacent);
    assert_eq!(adjacent.len(), 2);
    assert_eq!(adjacent[0].begin, VirtualOffset::new(0, 0));
    assert_eq!(adjacent[0].end, VirtualOffset::new(0, 11));
    assert_eq!(adjacent[1], chunks[2]);

    let squashed = merge(&chunks, MergeStrategy::Squash);
    assert_eq!(squashed.len(), 1);
    assert_eq!(squashed[0].begin, VirtualOffset::new(0, 0));
    assert_eq!(squashed[0].end, VirtualOffset::new(43, 5));
}

/// S8 — corrupt streams never panic; they surface as a typed error.
#[test]
fn s8_corrupt_streams_never_panic() {
    // Zero block size: BC subfield present but bsize=0 means block_size=1,
    // too small to even hold the 10-byte fixed header.
    let mut raw = Vec::new();
    raw.extend_from_slice(&[0x1f, 0x8b, 0x08, 0x04, 0, 0, 0, 0, 0, 0xff]);
    raw.extend_from_slice(&6u16.to_le_bytes()); // xlen
    raw.push(b'B');
    raw.push(b'C');
    raw.extend_from_slice(&2u16.to_le_bytes());
    raw.extend_from_slice(&0u16.to_le_bytes()); // bsize = 0 -> block_size = 1

    let result = Reader::new(Cursor::new(raw), 1);
    match result {
        Ok(mut r) => {
            let mut buf = [0u8; 16];
            let err = loop {
                match r.read(&mut buf) {
                    Ok(0) => break None,
                    Ok(_) => continue,
                    Err(e) => break Some(e),
                }
            };
            assert!(matches!(err, Some(Error::Corrupt(_)) | None));
        }
        Err(e) => assert!(matches!(e, Error::Corrupt(_) | Error::NoBlockSize)),
    }

    // Invalid block size: BC subfield present but no BC id actually found
    // (garbage extra field of the right length).
    let mut raw2 = Vec::new();
    raw2.extend_from_slice(&[0x1f, 0x8b, 0x08, 0x04, 0, 0, 0, 0, 0, 0xff]);
    raw2.extend_from_slice(&4u16.to_le_bytes());
    raw2.extend_from_slice(&[0, 0, 0, 0]);
    let result2 = Reader::new(Cursor::new(raw2), 1);
    assert!(result2.is_err());
}

#[test]
fn gzheader_default_is_default_os_and_empty_extra() {
    let h = GzHeader::default();
    assert_eq!(h.os, 0);
    assert!(h.extra.is_empty());
}
