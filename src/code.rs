/// Prefix codes and the per-symbol code table.
///
/// A [`Code`] holds its bit string right-justified in a `u64`: the first
/// bit of the root-to-leaf path is bit `len - 1`, the last is bit 0.
use std::fmt;

use crate::tree::HuffmanTree;
use crate::{ChuffError, ChuffResult};

/// Longest code a `u64` code word can hold.
pub const MAX_CODE_LEN: u8 = 64;

/// The code assigned to one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Code {
    pub symbol: u8,
    /// Number of bits, 1..=64.
    pub len: u8,
    /// Path bits, right-justified. Left = 0, right = 1.
    pub bits: u64,
}

impl Code {
    pub fn new(symbol: u8, len: u8, bits: u64) -> Self {
        Self { symbol, len, bits }
    }

    /// True if `self`'s bit string is a prefix of (or equal to) `other`'s.
    pub fn is_prefix_of(&self, other: &Code) -> bool {
        if self.len > other.len {
            return false;
        }
        other.bits >> (other.len - self.len) == self.bits
    }

    fn fits(&self) -> bool {
        self.len >= MAX_CODE_LEN || self.bits >> self.len == 0
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$b}", self.bits, width = self.len as usize)
    }
}

/// Symbol → code lookup, indexed directly by byte value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTable {
    codes: [Option<Code>; 256],
    len: u16,
}

impl CodeTable {
    /// An empty table (the table of empty input).
    pub fn new() -> Self {
        Self {
            codes: [None; 256],
            len: 0,
        }
    }

    /// Assign every leaf of `tree` the bit string of its path from the root.
    ///
    /// A tree that is a single leaf gets the one-bit code `0`. Fails with
    /// [`ChuffError::CodeTooLong`] if any leaf sits deeper than
    /// [`MAX_CODE_LEN`].
    pub fn from_tree(tree: &HuffmanTree) -> ChuffResult<Self> {
        let mut table = Self::new();
        let root = tree.node(tree.root());
        if root.leaf {
            table.insert(Code::new(root.symbol, 1, 0));
        } else {
            table.assign(tree, tree.root(), 0, 0)?;
        }
        Ok(table)
    }

    /// Recursively assign codes below `idx`. Recursion depth is bounded by
    /// [`MAX_CODE_LEN`].
    fn assign(&mut self, tree: &HuffmanTree, idx: usize, prefix: u64, depth: u8) -> ChuffResult<()> {
        let node = tree.node(idx);
        if node.leaf {
            self.insert(Code::new(node.symbol, depth, prefix));
            return Ok(());
        }
        if depth >= MAX_CODE_LEN {
            return Err(ChuffError::CodeTooLong {
                depth: depth as usize + 1,
            });
        }
        if let Some(left) = node.left {
            self.assign(tree, left, prefix << 1, depth + 1)?;
        }
        if let Some(right) = node.right {
            self.assign(tree, right, (prefix << 1) | 1, depth + 1)?;
        }
        Ok(())
    }

    /// Build a table from explicit codes, checking each one's shape.
    ///
    /// Prefix-freeness across codes is not checked here; the tree
    /// reconstructor catches collisions as it inserts paths.
    pub fn from_codes<I: IntoIterator<Item = Code>>(codes: I) -> ChuffResult<Self> {
        let mut table = Self::new();
        for code in codes {
            if code.len == 0 || code.len > MAX_CODE_LEN {
                return Err(ChuffError::InvalidCodeLength {
                    symbol: code.symbol,
                    len: code.len,
                });
            }
            if !code.fits() {
                return Err(ChuffError::CodeOutOfRange(code.symbol));
            }
            if table.get(code.symbol).is_some() {
                return Err(ChuffError::DuplicateSymbol(code.symbol));
            }
            table.insert(code);
        }
        Ok(table)
    }

    fn insert(&mut self, code: Code) {
        if self.codes[code.symbol as usize].replace(code).is_none() {
            self.len += 1;
        }
    }

    /// The code for `symbol`, if it occurs in the input.
    #[inline]
    pub fn get(&self, symbol: u8) -> Option<&Code> {
        self.codes[symbol as usize].as_ref()
    }

    /// Codes in ascending symbol order.
    pub fn iter(&self) -> impl Iterator<Item = &Code> + '_ {
        self.codes.iter().flatten()
    }

    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Length of the longest code, 0 for an empty table.
    pub fn max_len(&self) -> u8 {
        self.iter().map(|c| c.len).max().unwrap_or(0)
    }

    /// Length of the shortest code, 0 for an empty table.
    pub fn min_len(&self) -> u8 {
        self.iter().map(|c| c.len).min().unwrap_or(0)
    }
}

impl Default for CodeTable {
    fn default() -> Self {
        Self::new()
    }
}
