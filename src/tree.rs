/// Huffman tree construction and reconstruction.
///
/// Nodes live in a flat arena and refer to their children by index, so the
/// whole tree is released in one drop when the session that owns it ends.
///
/// Two ways to obtain a tree:
/// - [`HuffmanTree::from_frequency_table`] merges the two lightest roots of a
///   forest until one remains (encode side).
/// - [`HuffmanTree::from_code_table`] grows the tree path by path from the
///   codes stored in a compressed header (decode side). No weights are
///   known there, so every node carries weight 0.
use crate::code::{Code, CodeTable, MAX_CODE_LEN};
use crate::frequency::FrequencyTable;
use crate::{ChuffError, ChuffResult};

/// A node in the Huffman tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanNode {
    /// Aggregate frequency of the subtree. Only meaningful while building.
    pub weight: u64,
    /// Byte value (only meaningful for leaf nodes).
    pub symbol: u8,
    /// Whether this node is a leaf.
    pub leaf: bool,
    /// Child reached by a 0 bit.
    pub left: Option<usize>,
    /// Child reached by a 1 bit.
    pub right: Option<usize>,
}

impl HuffmanNode {
    fn leaf(symbol: u8, weight: u64) -> Self {
        Self {
            weight,
            symbol,
            leaf: true,
            left: None,
            right: None,
        }
    }

    fn internal(weight: u64, left: Option<usize>, right: Option<usize>) -> Self {
        Self {
            weight,
            symbol: 0,
            leaf: false,
            left,
            right,
        }
    }
}

/// A Huffman prefix-code tree over the byte alphabet.
#[derive(Debug, Clone)]
pub struct HuffmanTree {
    nodes: Vec<HuffmanNode>,
    root: usize,
    leaf_count: u16,
}

impl HuffmanTree {
    /// Build a Huffman tree from input data.
    ///
    /// Returns `None` for empty input.
    pub fn from_data(input: &[u8]) -> Option<Self> {
        if input.is_empty() {
            return None;
        }
        Self::from_frequency_table(&crate::frequency::get_frequency(input))
    }

    /// Build a Huffman tree from a frequency table.
    ///
    /// One leaf is created per nonzero symbol, in ascending symbol order.
    /// The two lightest forest roots are then merged until one remains; the
    /// lightest becomes the left child. Ties keep the root found first in
    /// scan order, which makes the output reproducible bit for bit.
    ///
    /// With a single distinct symbol the result is a lone leaf.
    /// Returns `None` if the table is empty.
    pub fn from_frequency_table(freq: &FrequencyTable) -> Option<Self> {
        let mut nodes: Vec<HuffmanNode> = Vec::with_capacity(2 * freq.used as usize);
        for (symbol, count) in freq.symbols() {
            nodes.push(HuffmanNode::leaf(symbol, count));
        }

        let mut forest: Vec<usize> = (0..nodes.len()).collect();

        while let Some((lowest, second)) = min_two(&nodes, &forest) {
            // Compact both picks to the tail of the forest, lightest last.
            let last = forest.len() - 1;
            forest.swap(lowest, last);
            let second = if second == last { lowest } else { second };
            forest.swap(second, last - 1);

            let left = forest.pop()?;
            let right = forest.pop()?;
            let weight = nodes[left].weight + nodes[right].weight;

            forest.push(nodes.len());
            nodes.push(HuffmanNode::internal(weight, Some(left), Some(right)));
        }

        let root = forest.pop()?;
        log::trace!(
            "built tree: {} leaves, {} nodes",
            freq.used,
            nodes.len()
        );

        Some(HuffmanTree {
            nodes,
            root,
            leaf_count: freq.used,
        })
    }

    /// Rebuild a tree from a code table, creating internal nodes lazily
    /// as each code's path is walked from the root.
    ///
    /// The root is always an internal node here, so a single one-bit code
    /// yields a root with one child.
    pub fn from_code_table(table: &CodeTable) -> ChuffResult<Self> {
        let mut tree = HuffmanTree {
            nodes: Vec::with_capacity(2 * table.len()),
            root: 0,
            leaf_count: 0,
        };
        tree.nodes.push(HuffmanNode::internal(0, None, None));

        for code in table.iter() {
            tree.insert_code(code)?;
        }
        Ok(tree)
    }

    /// Walk `code`'s path from the root, creating missing nodes, and mark
    /// the final node as the leaf for `code.symbol`.
    fn insert_code(&mut self, code: &Code) -> ChuffResult<()> {
        if code.len == 0 || code.len > MAX_CODE_LEN {
            return Err(ChuffError::InvalidCodeLength {
                symbol: code.symbol,
                len: code.len,
            });
        }

        let mut idx = self.root;
        for shift in (0..code.len).rev() {
            if self.nodes[idx].leaf {
                // An existing code is a prefix of this one.
                return Err(ChuffError::CodeConflict(code.symbol));
            }
            let last = shift == 0;
            let go_right = (code.bits >> shift) & 1 == 1;
            let next = if go_right {
                self.nodes[idx].right
            } else {
                self.nodes[idx].left
            };

            idx = match next {
                // This code ends on a node that already exists.
                Some(_) if last => return Err(ChuffError::CodeConflict(code.symbol)),
                Some(child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(if last {
                        HuffmanNode::leaf(code.symbol, 0)
                    } else {
                        HuffmanNode::internal(0, None, None)
                    });
                    if go_right {
                        self.nodes[idx].right = Some(child);
                    } else {
                        self.nodes[idx].left = Some(child);
                    }
                    child
                }
            };
        }

        self.leaf_count += 1;
        Ok(())
    }

    /// Index of the root node.
    pub fn root(&self) -> usize {
        self.root
    }

    /// Borrow a node by index.
    pub fn node(&self, idx: usize) -> &HuffmanNode {
        &self.nodes[idx]
    }

    /// Follow one bit from `idx`: `true` goes right, `false` goes left.
    #[inline]
    pub fn child(&self, idx: usize, bit: bool) -> Option<usize> {
        let node = &self.nodes[idx];
        if bit {
            node.right
        } else {
            node.left
        }
    }

    /// Number of distinct symbols (leaves) in the tree.
    pub fn leaf_count(&self) -> u16 {
        self.leaf_count
    }

    /// Total number of nodes, leaves included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Depth of the deepest leaf. A lone-leaf tree has depth 0.
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self.root, 0usize)];
        while let Some((idx, depth)) = stack.pop() {
            let node = &self.nodes[idx];
            if node.leaf {
                max = max.max(depth);
            }
            stack.extend(node.left.map(|c| (c, depth + 1)));
            stack.extend(node.right.map(|c| (c, depth + 1)));
        }
        max
    }

    /// Sum over leaves of weight × depth: the number of payload bits this
    /// tree spends on the input it was built from.
    ///
    /// A lone-leaf tree counts as depth 1, matching the one-bit code it is
    /// assigned.
    pub fn weighted_path_length(&self) -> u64 {
        if self.nodes[self.root].leaf {
            return self.nodes[self.root].weight;
        }
        let mut total = 0u64;
        let mut stack = vec![(self.root, 0u64)];
        while let Some((idx, depth)) = stack.pop() {
            let node = &self.nodes[idx];
            if node.leaf {
                total += node.weight * depth;
            }
            stack.extend(node.left.map(|c| (c, depth + 1)));
            stack.extend(node.right.map(|c| (c, depth + 1)));
        }
        total
    }
}

/// Scan the forest once for its two lightest roots.
///
/// A root replaces the current minimum only when strictly lighter. The
/// displaced minimum drops to second place only when it was itself strictly
/// lighter than the current second, so among equal weights the earlier pick
/// stays. Returns forest positions `(lightest, second)`, or `None` once fewer
/// than two roots remain.
fn min_two(nodes: &[HuffmanNode], forest: &[usize]) -> Option<(usize, usize)> {
    if forest.len() < 2 {
        return None;
    }
    let weight = |pos: usize| nodes[forest[pos]].weight;

    let mut lowest: Option<usize> = None;
    let mut second: Option<usize> = None;
    for (pos, &idx) in forest.iter().enumerate() {
        let w = nodes[idx].weight;
        if lowest.map_or(true, |l| w < weight(l)) {
            if let Some(l) = lowest {
                if second.map_or(true, |s| weight(l) < weight(s)) {
                    second = Some(l);
                }
            }
            lowest = Some(pos);
        } else if second.map_or(true, |s| w < weight(s)) {
            second = Some(pos);
        }
    }
    Some((lowest?, second?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::get_frequency;
    use std::cmp::Reverse;
    use std::collections::BinaryHeap;

    /// Cost of an optimal prefix code: the sum of all merged weights.
    fn optimal_cost(freq: &FrequencyTable) -> u64 {
        let mut heap: BinaryHeap<Reverse<u64>> = freq.symbols().map(|(_, c)| Reverse(c)).collect();
        if heap.len() == 1 {
            return heap.pop().unwrap().0;
        }
        let mut cost = 0;
        while heap.len() > 1 {
            let Reverse(a) = heap.pop().unwrap();
            let Reverse(b) = heap.pop().unwrap();
            cost += a + b;
            heap.push(Reverse(a + b));
        }
        cost
    }

    fn leaf_symbol(tree: &HuffmanTree, path: &[bool]) -> Option<u8> {
        let mut idx = tree.root();
        for &bit in path {
            idx = tree.child(idx, bit)?;
        }
        let node = tree.node(idx);
        node.leaf.then_some(node.symbol)
    }

    #[test]
    fn test_build_from_empty() {
        assert!(HuffmanTree::from_data(&[]).is_none());
        assert!(HuffmanTree::from_frequency_table(&FrequencyTable::new()).is_none());
    }

    #[test]
    fn test_build_single_symbol() {
        let tree = HuffmanTree::from_data(&[b'a'; 10]).unwrap();
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.node_count(), 1);
        assert!(tree.node(tree.root()).leaf);
        assert_eq!(tree.node(tree.root()).symbol, b'a');
        assert_eq!(tree.depth(), 0);
    }

    #[test]
    fn test_two_symbols_lighter_goes_left() {
        let tree = HuffmanTree::from_data(&[0, 0, 0, 1]).unwrap();
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.node_count(), 3);
        assert_eq!(leaf_symbol(&tree, &[false]), Some(1));
        assert_eq!(leaf_symbol(&tree, &[true]), Some(0));
        assert_eq!(tree.node(tree.root()).weight, 4);
    }

    #[test]
    fn test_equal_weights_prefer_first_in_scan() {
        let tree = HuffmanTree::from_data(b"abc").unwrap();
        // a and b merge first; c then pairs with that subtree
        assert_eq!(leaf_symbol(&tree, &[false]), Some(b'c'));
        assert_eq!(leaf_symbol(&tree, &[true, false]), Some(b'a'));
        assert_eq!(leaf_symbol(&tree, &[true, true]), Some(b'b'));
    }

    #[test]
    fn test_displaced_minimum_keeps_earlier_second() {
        // weights a=2, b=2, c=1: c becomes lightest, b stays second
        let tree = HuffmanTree::from_data(b"aabbc").unwrap();
        assert_eq!(leaf_symbol(&tree, &[false]), Some(b'a'));
        assert_eq!(leaf_symbol(&tree, &[true, false]), Some(b'c'));
        assert_eq!(leaf_symbol(&tree, &[true, true]), Some(b'b'));
    }

    #[test]
    fn test_leaf_and_internal_counts() {
        let input: Vec<u8> = (0..=255).collect();
        let tree = HuffmanTree::from_data(&input).unwrap();
        assert_eq!(tree.leaf_count(), 256);
        assert_eq!(tree.node_count(), 511);
        assert_eq!(tree.depth(), 8);
    }

    #[test]
    fn test_weighted_path_length_is_optimal() {
        let inputs: [&[u8]; 4] = [
            b"aaaabbbccd",
            b"the quick brown fox jumps over the lazy dog",
            b"abracadabra",
            &[0, 0, 0, 1],
        ];
        for input in inputs {
            let freq = get_frequency(input);
            let tree = HuffmanTree::from_frequency_table(&freq).unwrap();
            assert_eq!(tree.weighted_path_length(), optimal_cost(&freq));
        }
    }

    #[test]
    fn test_fibonacci_weights_grow_deep() {
        let mut counts = [0u64; 256];
        let (mut a, mut b) = (1u64, 1u64);
        for c in counts.iter_mut().take(20) {
            *c = a;
            (a, b) = (b, a + b);
        }
        let tree = HuffmanTree::from_frequency_table(&FrequencyTable::from_counts(counts)).unwrap();
        assert_eq!(tree.depth(), 19);
    }

    #[test]
    fn test_reconstruct_matches_built_tree() {
        let input = b"mississippi river";
        let built = HuffmanTree::from_data(input).unwrap();
        let table = CodeTable::from_tree(&built).unwrap();
        let rebuilt = HuffmanTree::from_code_table(&table).unwrap();
        assert_eq!(rebuilt.leaf_count(), built.leaf_count());
        assert_eq!(rebuilt.node_count(), built.node_count());
        assert_eq!(CodeTable::from_tree(&rebuilt).unwrap(), table);
    }

    #[test]
    fn test_reconstruct_single_symbol() {
        let built = HuffmanTree::from_data(&[9u8; 4]).unwrap();
        let table = CodeTable::from_tree(&built).unwrap();
        let rebuilt = HuffmanTree::from_code_table(&table).unwrap();
        assert_eq!(leaf_symbol(&rebuilt, &[false]), Some(9));
        assert_eq!(rebuilt.child(rebuilt.root(), true), None);
    }

    #[test]
    fn test_reconstruct_rejects_prefix_conflicts() {
        let prefix = [Code::new(1, 1, 0b0), Code::new(2, 2, 0b01)];
        let table = CodeTable::from_codes(prefix).unwrap();
        assert!(matches!(
            HuffmanTree::from_code_table(&table),
            Err(ChuffError::CodeConflict(2))
        ));

        let extends = [Code::new(1, 2, 0b01), Code::new(2, 1, 0b0)];
        let table = CodeTable::from_codes(extends).unwrap();
        assert!(matches!(
            HuffmanTree::from_code_table(&table),
            Err(ChuffError::CodeConflict(_))
        ));

        let equal = [Code::new(1, 3, 0b101), Code::new(2, 3, 0b101)];
        let table = CodeTable::from_codes(equal).unwrap();
        assert!(matches!(
            HuffmanTree::from_code_table(&table),
            Err(ChuffError::CodeConflict(2))
        ));
    }
}
