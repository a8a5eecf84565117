//! # lzwin
//!
//! LZSS compression with a sliding window dictionary and a binary search
//! tree index, following the classic scheme described in Mark Nelson's
//! "The Data Compression Book".  The window and tree are fixed allocations
//! sized by the format constants, which makes the codec suitable for
//! tools that target small embedded configurations.
//!
//! The compressed stream is a plain sequence of bit-level records with no
//! header: literals are a `1` flag followed by the raw byte, matches are a
//! `0` flag followed by a window position and a biased length, and a match
//! record with position zero terminates the stream.

mod tools;
pub mod lzss;

/// Errors surfaced while compressing or expanding
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("i/o failed")]
    Io(#[from] std::io::Error),
    #[error("compressed stream ended before the terminator")]
    TruncatedStream
}
