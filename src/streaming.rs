/// Encode and decode sessions over `std::io` readers and writers.
///
/// Encoding needs a seekable input: the first pass counts frequencies, the
/// second re-reads from the same starting position and packs codes.
/// Decoding reads strictly forward and never seeks.
///
/// Each session owns its frequency table, tree, and code table; all of them
/// are dropped when the call returns.
use std::io::{self, Cursor, ErrorKind, Read, Seek, SeekFrom, Write};

use crate::bitstream::{self, BitWriter, WRITE_CHUNK_WORDS};
use crate::code::CodeTable;
use crate::frequency::{FrequencyTable, READ_CHUNK_SIZE};
use crate::header;
use crate::tree::HuffmanTree;
use crate::{ChuffError, ChuffResult};

/// Buffer sizing for a session. None of these values affect the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecOptions {
    /// Bytes requested from the input per read call.
    pub read_chunk_size: usize,
    /// 64-bit payload words buffered before each write.
    pub write_chunk_words: usize,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            read_chunk_size: READ_CHUNK_SIZE,
            write_chunk_words: WRITE_CHUNK_WORDS,
        }
    }
}

impl CodecOptions {
    /// Default options, shrunk so small in-memory inputs do not allocate
    /// full-size buffers.
    fn sized_for(len: usize) -> Self {
        let default = Self::default();
        Self {
            read_chunk_size: default.read_chunk_size.min(len.max(1)),
            write_chunk_words: default.write_chunk_words.min(len / 8 + 1),
        }
    }
}

/// Outcome of [`compress_stream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSummary {
    pub input_bytes: u64,
    /// Header, payload, and padding-count byte.
    pub output_bytes: u64,
    /// Distinct symbols in the input.
    pub symbols: u16,
    /// Longest code assigned, 0 for empty input.
    pub max_code_len: u8,
    pub padding_bits: u8,
}

/// Outcome of [`decompress_stream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeSummary {
    pub input_bytes: u64,
    pub output_bytes: u64,
    pub symbols: u16,
}

/// Compress everything from `input`'s current position to EOF into `output`.
///
/// `input` is read twice and left at EOF.
pub fn compress_stream<R: Read + Seek, W: Write>(
    mut input: R,
    mut output: W,
    options: &CodecOptions,
) -> ChuffResult<EncodeSummary> {
    let start = input.stream_position()?;

    let mut freq = FrequencyTable::new();
    let input_bytes = freq.count_reader(&mut input, options.read_chunk_size)?;
    input.seek(SeekFrom::Start(start))?;

    let table = match HuffmanTree::from_frequency_table(&freq) {
        Some(tree) => {
            log::debug!(
                "{} symbols, entropy {:.3} bits/byte, tree depth {}",
                freq.used,
                freq.entropy(),
                tree.depth()
            );
            CodeTable::from_tree(&tree)?
        }
        None => CodeTable::new(),
    };
    for code in table.iter() {
        log::trace!("code {:#04x} = {}", code.symbol, code);
    }

    let header_bytes = header::write_header(&mut output, &table)?;

    let mut writer = BitWriter::with_capacity(output, options.write_chunk_words);
    let mut chunk = vec![0u8; options.read_chunk_size.max(1)];
    let mut packed = 0u64;
    loop {
        let n = match input.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        for &b in &chunk[..n] {
            let code = table.get(b).ok_or(ChuffError::SymbolNotInTable(b))?;
            writer.write_code(code)?;
        }
        packed += n as u64;
    }
    if packed != input_bytes {
        return Err(io::Error::new(
            ErrorKind::InvalidData,
            format!("input changed during encode: counted {input_bytes} bytes, packed {packed}"),
        )
        .into());
    }

    let (_, pack) = writer.finish()?;
    let summary = EncodeSummary {
        input_bytes,
        output_bytes: header_bytes as u64 + pack.payload_bytes + 1,
        symbols: table.len() as u16,
        max_code_len: table.max_len(),
        padding_bits: pack.padding_bits,
    };
    log::debug!(
        "encoded {} -> {} bytes ({} header, {} payload bits)",
        summary.input_bytes,
        summary.output_bytes,
        header_bytes,
        pack.payload_bits
    );
    Ok(summary)
}

/// Decompress a complete compressed stream from `input` into `output`.
pub fn decompress_stream<R: Read, W: Write>(
    mut input: R,
    output: W,
    options: &CodecOptions,
) -> ChuffResult<DecodeSummary> {
    let (table, header_bytes) = header::read_header(&mut input)?;
    let tree = HuffmanTree::from_code_table(&table)?;
    log::debug!(
        "header: {} symbols in {} bytes, code lengths {}..={}",
        table.len(),
        header_bytes,
        table.min_len(),
        table.max_len()
    );

    let unpack = bitstream::decode_payload(&tree, input, output, options.read_chunk_size)?;
    let summary = DecodeSummary {
        input_bytes: header_bytes as u64 + unpack.bytes_read,
        output_bytes: unpack.symbols,
        symbols: table.len() as u16,
    };
    log::debug!(
        "decoded {} -> {} bytes",
        summary.input_bytes,
        summary.output_bytes
    );
    Ok(summary)
}

/// Compress a byte slice in memory.
pub fn compress(input: &[u8]) -> ChuffResult<Vec<u8>> {
    let mut out = Vec::with_capacity(input.len() / 2 + 16);
    compress_stream(
        Cursor::new(input),
        &mut out,
        &CodecOptions::sized_for(input.len()),
    )?;
    Ok(out)
}

/// Decompress a byte slice in memory.
pub fn decompress(input: &[u8]) -> ChuffResult<Vec<u8>> {
    let mut out = Vec::with_capacity(input.len() * 2);
    decompress_stream(
        Cursor::new(input),
        &mut out,
        &CodecOptions::sized_for(input.len()),
    )?;
    Ok(out)
}
