//! chuff: a lossless byte-stream compressor built on Huffman prefix codes.
//!
//! Encoding makes two passes over a seekable input: one to count byte
//! frequencies and one to pack each byte's code into a big-endian bit
//! stream. The compressed file carries the code table in its header, so
//! decoding needs nothing but the file itself.
//!
//! ```
//! let data = b"abracadabra";
//! let packed = chuff::compress(data)?;
//! assert_eq!(chuff::decompress(&packed)?, data);
//! # Ok::<(), chuff::ChuffError>(())
//! ```

pub mod bitstream;
pub mod code;
pub mod frequency;
pub mod header;
pub mod streaming;
pub mod tree;

#[cfg(test)]
mod validation;

pub use streaming::{
    compress, compress_stream, decompress, decompress_stream, CodecOptions, DecodeSummary,
    EncodeSummary,
};

use std::io;

use thiserror::Error;

/// Error types for chuff operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChuffError {
    /// Reading the source or writing the sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Header declares more distinct symbols than the byte alphabet holds.
    #[error("invalid symbol count {0}")]
    InvalidSymbolCount(u16),
    /// Header record has a code length outside 1..=64.
    #[error("invalid code length {len} for symbol {symbol:#04x}")]
    InvalidCodeLength { symbol: u8, len: u8 },
    /// Header record stores a code value wider than its declared length.
    #[error("code for symbol {0:#04x} does not fit its length")]
    CodeOutOfRange(u8),
    /// The same symbol appears twice in the header.
    #[error("duplicate symbol {0:#04x} in header")]
    DuplicateSymbol(u8),
    /// A header code collides with (or is a prefix of) another code.
    #[error("code for symbol {0:#04x} is not prefix-free")]
    CodeConflict(u8),
    /// Trailing padding count is not in 0..=7.
    #[error("invalid padding count {0}")]
    InvalidPadding(u8),
    /// Input ended before the header and tail byte were complete.
    #[error("truncated input")]
    Truncated,
    /// Payload bits walk into a branch the code table never defined.
    #[error("payload contains an undefined code")]
    InvalidCode,
    /// The last non-padding bit leaves the walk in the middle of a code.
    #[error("payload ends in the middle of a code")]
    UnterminatedCode,
    /// A header without symbols is followed by payload bytes.
    #[error("payload present but header declares no symbols")]
    UnexpectedPayload,
    /// The built tree is deeper than a code word can represent.
    #[error("code length {depth} exceeds the 64-bit limit")]
    CodeTooLong { depth: usize },
    /// The packing pass saw a byte the frequency pass never counted.
    #[error("symbol {0:#04x} missing from code table; input changed during encode")]
    SymbolNotInTable(u8),
}

impl ChuffError {
    /// True for errors caused by malformed compressed input.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidSymbolCount(_)
                | Self::InvalidCodeLength { .. }
                | Self::CodeOutOfRange(_)
                | Self::DuplicateSymbol(_)
                | Self::CodeConflict(_)
                | Self::InvalidPadding(_)
                | Self::Truncated
                | Self::InvalidCode
                | Self::UnterminatedCode
                | Self::UnexpectedPayload
        )
    }
}

pub type ChuffResult<T> = Result<T, ChuffError>;
