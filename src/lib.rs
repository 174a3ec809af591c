//! BGZF — a block-gzip codec for random-access genomics file formats
//! (BAM, tabix-indexed files).
//!
//! A BGZF stream is a concatenation of independently decodable gzip
//! members, each carrying a `BC` extra subfield with its own encoded
//! length. A [`VirtualOffset`] — a compressed file offset paired with a
//! byte offset inside that member's decompressed payload — addresses any
//! byte in the stream with 6-byte precision, which is what external BAM
//! and tabix indexes persist.
//!
//! This crate implements the codec core: [`Reader`] and [`Writer`], the
//! pluggable [`cache`] policies, and the [`voffset`] algebra indexes are
//! built on. It does not parse BAM records, tabix/BAI indexes, or FASTA
//! index files — those are external collaborators that consume this
//! crate's [`Reader`]/[`Writer`]/[`Chunk`] types.

pub mod block;
pub mod bufpool;
pub mod cache;
pub mod chunk_reader;
pub mod config;
pub mod decompress;
pub mod error;
pub mod gzheader;
pub mod io;
pub mod reader;
pub mod threadpool;
pub mod voffset;
pub mod writer;

pub use block::Block;
pub use chunk_reader::ChunkReader;
pub use error::{Error, Result};
pub use gzheader::{GzHeader, EOF_MARKER};
pub use reader::Reader;
pub use voffset::{merge, Chunk, MergeStrategy, VirtualOffset};
pub use writer::Writer;
