//! Frequency analysis for byte streams.
//!
//! Counts the occurrence of each byte value (0-255) in an input buffer
//! or reader and computes Shannon entropy.

use std::io::{self, ErrorKind, Read};

/// Default read chunk used when scanning a reader.
pub const READ_CHUNK_SIZE: usize = 100_000;

/// A frequency table that tracks byte occurrence counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    /// Count of each byte value (index = byte value, value = count).
    pub byte: [u64; 256],
    /// Sum of all counts.
    pub total: u64,
    /// Number of distinct byte values with nonzero count.
    pub used: u16,
}

impl FrequencyTable {
    /// Create a new, zeroed frequency table.
    pub fn new() -> Self {
        Self {
            byte: [0u64; 256],
            total: 0,
            used: 0,
        }
    }

    /// Build a table from explicit per-byte counts.
    pub fn from_counts(counts: [u64; 256]) -> Self {
        let mut table = Self {
            byte: counts,
            total: 0,
            used: 0,
        };
        table.refresh();
        table
    }

    /// Count byte frequencies in the input buffer, adding to any
    /// counts already present.
    pub fn count(&mut self, input: &[u8]) {
        for &b in input {
            self.byte[b as usize] += 1;
        }
        self.refresh();
    }

    /// Scan `reader` to EOF in `chunk_size` pieces and count every byte.
    ///
    /// Returns the number of bytes consumed.
    pub fn count_reader<R: Read>(&mut self, reader: &mut R, chunk_size: usize) -> io::Result<u64> {
        let mut chunk = vec![0u8; chunk_size.max(1)];
        let mut consumed = 0u64;
        loop {
            let n = match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            for &b in &chunk[..n] {
                self.byte[b as usize] += 1;
            }
            consumed += n as u64;
        }
        self.refresh();
        Ok(consumed)
    }

    fn refresh(&mut self) {
        let mut total = 0u64;
        let mut used = 0u16;
        for &c in &self.byte {
            total += c;
            used += (c > 0) as u16;
        }
        self.total = total;
        self.used = used;
    }

    /// Compute the Shannon entropy of the distribution (in bits per symbol).
    ///
    /// Returns 0.0 if the table is empty.
    pub fn entropy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let total = self.total as f64;
        self.byte
            .iter()
            .filter(|&&c| c > 0)
            .map(|&c| {
                let prob = c as f64 / total;
                -prob * prob.log2()
            })
            .sum()
    }

    /// Get the count for a specific byte value.
    pub fn get(&self, byte: u8) -> u64 {
        self.byte[byte as usize]
    }

    /// Iterate `(symbol, count)` over symbols with a nonzero count, in
    /// ascending symbol order.
    pub fn symbols(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.byte
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c > 0)
            .map(|(b, &c)| (b as u8, c))
    }
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function: compute a frequency table from input.
pub fn get_frequency(input: &[u8]) -> FrequencyTable {
    let mut table = FrequencyTable::new();
    table.count(input);
    table
}
