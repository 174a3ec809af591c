//! Error taxonomy for the BGZF codec.
//!
//! Every fatal condition a [`crate::reader::Reader`] or [`crate::writer::Writer`]
//! can encounter is represented here. Once an operation returns one of these,
//! the owning Reader/Writer latches it: all subsequent calls return a clone of
//! the same error until `close`.

use std::io;
use std::sync::Arc;

use thiserror::Error;

/// The error type returned by every fallible operation in this crate.
///
/// Cloneable so a latched error can be handed back from every subsequent
/// call without re-wrapping the original I/O error each time.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A read or write was attempted after `close()`.
    #[error("use of closed reader/writer")]
    Closed,

    /// A sealed member would exceed `MaxBlockSize` (65536) encoded bytes.
    #[error("compressed block size exceeds maximum ({size} >= {max})")]
    BlockOverflow { size: usize, max: usize },

    /// `has_eof` was asked to probe something that is not a regular,
    /// seekable file (e.g. a directory).
    #[error("not a regular file")]
    WrongFileType,

    /// The source could not be positioned at its tail to probe for the
    /// magic EOF block, or the stream is too short to contain one.
    #[error("could not determine stream end")]
    NoEnd,

    /// A gzip member was read that carries no `BC` extra subfield.
    #[error("gzip member has no BGZF block size field")]
    NoBlockSize,

    /// `seek` was called on a source that does not implement `Seek`.
    #[error("underlying source does not support seeking")]
    NotASeeker,

    /// Malformed gzip framing, a short read, a bad checksum, or any other
    /// unrecoverable parse failure.
    #[error("corrupt bgzf stream: {0}")]
    Corrupt(String),

    /// Passthrough I/O error from the underlying source or sink.
    ///
    /// Wrapped in an `Arc` so the error remains `Clone`, which is required
    /// to latch it across repeated calls.
    #[error("i/o error: {0}")]
    Io(Arc<io::Error>),
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(Arc::new(e))
    }
}

impl From<Error> for io::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Io(inner) => match Arc::try_unwrap(inner) {
                Ok(e) => e,
                Err(arc) => io::Error::new(arc.kind(), arc.to_string()),
            },
            other => io::Error::new(io::ErrorKind::Other, other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
