//! Minimal file-opening helpers for the `bgzf` CLI binary.
//!
//! BGZF's CLI only ever moves whole files through `Reader`/`Writer`, so
//! there is no overwrite-prompt, sparse-file, or recursive-directory
//! machinery to speak of — just stdin/stdout sentinels and directory
//! rejection.

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

/// Sentinel: read from standard input.
pub const STDIN_MARK: &str = "-";

/// Sentinel: write to standard output.
pub const STDOUT_MARK: &str = "-";

/// Opens `path` for reading, or standard input if `path == "-"`. Rejects
/// directories outright rather than letting the first read fail obscurely.
///
/// Returned as `Box<dyn Read + Send>` because [`bgzf::Reader`] hands the
/// source across its read-ahead worker pool boundary.
pub fn open_input(path: &str) -> io::Result<Box<dyn io::Read + Send>> {
    if path == STDIN_MARK {
        return Ok(Box::new(io::stdin()));
    }
    if Path::new(path).is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{path}: is a directory"),
        ));
    }
    let f = File::open(path)?;
    Ok(Box::new(BufReader::new(f)))
}

/// Opens `path` for writing (truncating if it exists), or standard output
/// if `path == "-"`.
pub fn open_output(path: &str) -> io::Result<Box<dyn io::Write>> {
    if path == STDOUT_MARK {
        return Ok(Box::new(io::stdout()));
    }
    let f = File::create(path)?;
    Ok(Box::new(BufWriter::new(f)))
}
