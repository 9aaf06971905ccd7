/// Payload bit packing and unpacking.
///
/// The payload is one continuous bit stream, most significant bit first.
/// The writer accumulates codes into 64-bit words and emits each finished
/// word big-endian, so byte order is the same on every host. The final,
/// partial word is cut to the bytes that hold real bits, and one trailing
/// byte records how many low-order bits of the last payload byte are
/// padding (0..=7).
///
/// The reader walks a Huffman tree bit by bit and never interprets the
/// padding bits.
use std::io::{self, ErrorKind, Read, Write};

use crate::code::Code;
use crate::tree::HuffmanTree;
use crate::{ChuffError, ChuffResult};

/// Default number of 64-bit words buffered before a write.
pub const WRITE_CHUNK_WORDS: usize = 100_000;

/// What [`BitWriter::finish`] wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackSummary {
    /// Payload bytes, excluding the trailing padding-count byte.
    pub payload_bytes: u64,
    /// Number of genuine code bits in the payload.
    pub payload_bits: u64,
    /// Padding bits in the last payload byte.
    pub padding_bits: u8,
}

/// Packs codes MSB-first into big-endian 64-bit words.
#[derive(Debug)]
pub struct BitWriter<W: Write> {
    inner: W,
    /// Completed words waiting to be written.
    words: Vec<u64>,
    capacity: usize,
    /// Byte staging area for a batch of words.
    bytes: Vec<u8>,
    /// Word under construction; bits fill from the top down.
    acc: u64,
    /// Bits already used in `acc` (0..=63).
    used: u32,
    payload_bytes: u64,
    payload_bits: u64,
}

impl<W: Write> BitWriter<W> {
    pub fn new(inner: W) -> Self {
        Self::with_capacity(inner, WRITE_CHUNK_WORDS)
    }

    /// Create a writer that flushes every `capacity_words` words
    /// (minimum 1).
    pub fn with_capacity(inner: W, capacity_words: usize) -> Self {
        let capacity = capacity_words.max(1);
        Self {
            inner,
            words: Vec::with_capacity(capacity),
            capacity,
            bytes: Vec::with_capacity(capacity * 8),
            acc: 0,
            used: 0,
            payload_bytes: 0,
            payload_bits: 0,
        }
    }

    #[inline]
    pub fn write_code(&mut self, code: &Code) -> io::Result<()> {
        self.write_bits(code.bits, code.len as u32)
    }

    /// Append the low `len` bits of `bits` (1..=64), most significant first.
    #[inline]
    pub fn write_bits(&mut self, bits: u64, len: u32) -> io::Result<()> {
        debug_assert!((1..=64).contains(&len));
        debug_assert!(len == 64 || bits >> len == 0);

        let free = 64 - self.used;
        self.payload_bits += len as u64;
        if len < free {
            self.acc |= bits << (free - len);
            self.used += len;
            return Ok(());
        }

        // Fill the current word; the low `spill` bits carry into the next.
        let spill = len - free;
        self.acc |= bits >> spill;
        self.push_word()?;
        if spill > 0 {
            self.acc = (bits & ((1u64 << spill) - 1)) << (64 - spill);
            self.used = spill;
        }
        Ok(())
    }

    fn push_word(&mut self) -> io::Result<()> {
        self.words.push(self.acc);
        self.acc = 0;
        self.used = 0;
        if self.words.len() == self.capacity {
            self.flush_words()?;
        }
        Ok(())
    }

    fn flush_words(&mut self) -> io::Result<()> {
        if self.words.is_empty() {
            return Ok(());
        }
        self.bytes.clear();
        for w in &self.words {
            self.bytes.extend_from_slice(&w.to_be_bytes());
        }
        self.inner.write_all(&self.bytes)?;
        log::trace!("flushed {} payload words", self.words.len());
        self.payload_bytes += self.bytes.len() as u64;
        self.words.clear();
        Ok(())
    }

    /// Write out all buffered words, the genuine bytes of the partial word,
    /// and the padding-count byte. Returns the inner writer.
    ///
    /// A stream ending exactly on a word boundary writes no partial bytes
    /// and a padding count of 0.
    pub fn finish(mut self) -> io::Result<(W, PackSummary)> {
        self.flush_words()?;

        let tail_bytes = (self.used as usize).div_ceil(8);
        let padding = (tail_bytes * 8) as u32 - self.used;

        let mut tail = [0u8; 9];
        tail[..tail_bytes].copy_from_slice(&self.acc.to_be_bytes()[..tail_bytes]);
        tail[tail_bytes] = padding as u8;
        self.inner.write_all(&tail[..=tail_bytes])?;
        self.inner.flush()?;
        self.payload_bytes += tail_bytes as u64;

        let summary = PackSummary {
            payload_bytes: self.payload_bytes,
            payload_bits: self.payload_bits,
            padding_bits: padding as u8,
        };
        Ok((self.inner, summary))
    }
}

/// Walk state for decoding a payload against a Huffman tree.
#[derive(Debug)]
pub struct BitReader<'t> {
    tree: &'t HuffmanTree,
    node: usize,
    /// The tree is a single leaf: every 0 bit is that symbol.
    lone_leaf: bool,
}

impl<'t> BitReader<'t> {
    pub fn new(tree: &'t HuffmanTree) -> Self {
        Self {
            tree,
            node: tree.root(),
            lone_leaf: tree.node(tree.root()).leaf,
        }
    }

    /// Consume the top `count` bits of `byte` (0..=8), MSB first, pushing
    /// a symbol to `out` each time a leaf is reached.
    #[inline]
    pub fn read_bits(&mut self, byte: u8, count: u32, out: &mut Vec<u8>) -> ChuffResult<()> {
        let root = self.tree.root();
        for shift in (8 - count..8).rev() {
            let bit = (byte >> shift) & 1 == 1;
            let next = if self.lone_leaf {
                (!bit).then_some(root)
            } else {
                self.tree.child(self.node, bit)
            };
            self.node = next.ok_or(ChuffError::InvalidCode)?;

            let node = self.tree.node(self.node);
            if node.leaf {
                out.push(node.symbol);
                self.node = root;
            }
        }
        Ok(())
    }

    /// True when no code is partially consumed.
    pub fn at_boundary(&self) -> bool {
        self.node == self.tree.root()
    }
}

/// What [`decode_payload`] consumed and produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnpackSummary {
    /// Bytes read, payload plus the padding-count byte.
    pub bytes_read: u64,
    /// Decoded symbols written.
    pub symbols: u64,
}

/// Decode everything `input` has left: payload bytes followed by the
/// padding-count byte.
///
/// The last two bytes are held back while reading so the final payload
/// byte can be cut at its padding without seeking. Decoded bytes are
/// written to `output` once per `chunk_size` bytes of input.
pub fn decode_payload<R: Read, W: Write>(
    tree: &HuffmanTree,
    mut input: R,
    mut output: W,
    chunk_size: usize,
) -> ChuffResult<UnpackSummary> {
    let chunk_size = chunk_size.max(1);
    let mut reader = BitReader::new(tree);
    let mut buf = vec![0u8; chunk_size + 2];
    let mut out = Vec::with_capacity(chunk_size * 2);
    let mut held = 0usize;
    let mut bytes_read = 0u64;
    let mut symbols = 0u64;
    let empty_table = tree.leaf_count() == 0;

    loop {
        let n = match input.read(&mut buf[held..]) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        bytes_read += n as u64;
        let avail = held + n;
        if avail <= 2 {
            held = avail;
            continue;
        }

        if empty_table {
            return Err(ChuffError::UnexpectedPayload);
        }
        let ready = avail - 2;
        for &byte in &buf[..ready] {
            reader.read_bits(byte, 8, &mut out)?;
        }
        buf.copy_within(ready..avail, 0);
        held = 2;

        symbols += out.len() as u64;
        output.write_all(&out)?;
        out.clear();
    }

    match held {
        0 => return Err(ChuffError::Truncated),
        1 => {
            if buf[0] != 0 {
                return Err(ChuffError::InvalidPadding(buf[0]));
            }
        }
        _ => {
            let (last, padding) = (buf[0], buf[1]);
            if padding > 7 {
                return Err(ChuffError::InvalidPadding(padding));
            }
            if empty_table {
                return Err(ChuffError::UnexpectedPayload);
            }
            reader.read_bits(last, 8 - padding as u32, &mut out)?;
        }
    }

    if !reader.at_boundary() {
        return Err(ChuffError::UnterminatedCode);
    }

    symbols += out.len() as u64;
    output.write_all(&out)?;
    output.flush()?;

    Ok(UnpackSummary {
        bytes_read,
        symbols,
    })
}
