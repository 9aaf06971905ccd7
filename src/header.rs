/// Compressed-file header: the code table, serialized without frequencies.
///
/// ```text
/// [2 bytes]  N = number of distinct symbols, little-endian (0..=256)
/// N times:
///   [1 byte]  symbol
///   [1 byte]  code length L (1..=64)
///   [ceil(L/8) bytes] code value, right-justified, little-endian
/// ```
///
/// N = 0 only occurs for empty input.
use std::io::{self, ErrorKind, Read, Write};

use crate::code::{Code, CodeTable, MAX_CODE_LEN};
use crate::{ChuffError, ChuffResult};

/// Size of the leading symbol-count field.
pub const COUNT_SIZE: usize = 2;

/// Largest symbol count a header may declare.
pub const MAX_SYMBOLS: u16 = 256;

/// Bytes needed to hold a code of `len` bits.
#[inline]
pub fn code_bytes(len: u8) -> usize {
    (len as usize).div_ceil(8)
}

/// Serialized size of `table`'s header.
pub fn header_len(table: &CodeTable) -> usize {
    COUNT_SIZE + table.iter().map(|c| 2 + code_bytes(c.len)).sum::<usize>()
}

/// Write the header for `table`. Returns the number of bytes written.
pub fn write_header<W: Write>(writer: &mut W, table: &CodeTable) -> io::Result<usize> {
    let mut buf = Vec::with_capacity(header_len(table));
    buf.extend_from_slice(&(table.len() as u16).to_le_bytes());
    for code in table.iter() {
        buf.push(code.symbol);
        buf.push(code.len);
        buf.extend_from_slice(&code.bits.to_le_bytes()[..code_bytes(code.len)]);
    }
    writer.write_all(&buf)?;
    Ok(buf.len())
}

/// Read a header written by [`write_header`].
///
/// Returns the code table and the number of header bytes consumed. Every
/// field is validated before it is trusted; prefix collisions between
/// codes surface later, when the tree is rebuilt.
pub fn read_header<R: Read>(reader: &mut R) -> ChuffResult<(CodeTable, usize)> {
    let mut count = [0u8; COUNT_SIZE];
    read_exact(reader, &mut count)?;
    let n = u16::from_le_bytes(count);
    if n > MAX_SYMBOLS {
        return Err(ChuffError::InvalidSymbolCount(n));
    }

    let mut consumed = COUNT_SIZE;
    let mut codes = Vec::with_capacity(n as usize);
    for _ in 0..n {
        let mut record = [0u8; 2];
        read_exact(reader, &mut record)?;
        let [symbol, len] = record;
        if len == 0 || len > MAX_CODE_LEN {
            return Err(ChuffError::InvalidCodeLength { symbol, len });
        }

        let mut value = [0u8; 8];
        let width = code_bytes(len);
        read_exact(reader, &mut value[..width])?;
        consumed += 2 + width;

        codes.push(Code::new(symbol, len, u64::from_le_bytes(value)));
    }

    let table = CodeTable::from_codes(codes)?;
    Ok((table, consumed))
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> ChuffResult<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => ChuffError::Truncated,
        _ => ChuffError::Io(e),
    })
}
