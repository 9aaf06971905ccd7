/// Cross-module validation of the codec.
///
/// These tests verify:
/// 1. **Round-trip correctness** for empty, tiny, uniform, skewed and random inputs
/// 2. **Padding correctness** for every length across several buffer flushes
/// 3. **Algorithmic properties** - prefix-freeness, optimal weighted path length
/// 4. **Header fidelity** - rebuilt trees reproduce every code exactly
/// 5. **Edge cases** - single-symbol input, all 256 byte values, malformed files
#[cfg(test)]
mod tests {
    use std::cmp::Reverse;
    use std::collections::BinaryHeap;
    use std::io::Cursor;

    use proptest::prelude::*;

    use crate::code::CodeTable;
    use crate::frequency::{get_frequency, FrequencyTable};
    use crate::header;
    use crate::tree::HuffmanTree;
    use crate::{compress, compress_stream, decompress, decompress_stream, CodecOptions};

    // ---------------------------------------------------------------
    // Helper: generate diverse test vectors
    // ---------------------------------------------------------------

    /// Every byte value once.
    fn data_uniform() -> Vec<u8> {
        (0..=255u8).collect()
    }

    /// Skewed distribution: 90% one byte, 10% another.
    fn data_skewed(n: usize) -> Vec<u8> {
        (0..n).map(|i| if i % 10 == 0 { 1 } else { 0 }).collect()
    }

    /// Repetitive text with structure.
    fn data_repeating_text() -> Vec<u8> {
        b"the quick brown fox jumps over the lazy dog. ".repeat(100)
    }

    /// Deterministic pseudo-random bytes (xorshift).
    fn data_noise(n: usize, seed: u64) -> Vec<u8> {
        let mut x = seed | 1;
        (0..n)
            .map(|_| {
                x ^= x << 13;
                x ^= x >> 7;
                x ^= x << 17;
                (x >> 24) as u8
            })
            .collect()
    }

    fn round_trip_with(input: &[u8], options: &CodecOptions) -> Vec<u8> {
        let mut packed = Vec::new();
        compress_stream(Cursor::new(input), &mut packed, options).unwrap();
        let mut out = Vec::new();
        decompress_stream(Cursor::new(&packed), &mut out, options).unwrap();
        out
    }

    fn optimal_cost(freq: &FrequencyTable) -> u64 {
        let mut heap: BinaryHeap<Reverse<u64>> = freq.symbols().map(|(_, c)| Reverse(c)).collect();
        let mut cost = 0;
        while heap.len() > 1 {
            let Reverse(a) = heap.pop().unwrap();
            let Reverse(b) = heap.pop().unwrap();
            cost += a + b;
            heap.push(Reverse(a + b));
        }
        cost
    }

    // ---------------------------------------------------------------
    // Round trips
    // ---------------------------------------------------------------

    #[test]
    fn test_round_trip_vectors() {
        let vectors = [
            Vec::new(),
            vec![0u8],
            vec![0xFF],
            data_uniform(),
            data_skewed(10_000),
            data_repeating_text(),
            data_noise(70_000, 0x9E37_79B9),
        ];
        for input in vectors {
            let packed = compress(&input).unwrap();
            assert_eq!(decompress(&packed).unwrap(), input, "len {}", input.len());
        }
    }

    #[test]
    fn test_single_symbol_ten_thousand() {
        let input = vec![0x41u8; 10_000];
        let packed = compress(&input).unwrap();
        // 2 + 3 header bytes, 10_000 one-bit codes = 1250 bytes, tail byte
        assert_eq!(packed.len(), 5 + 1250 + 1);
        assert_eq!(decompress(&packed).unwrap(), input);
    }

    #[test]
    fn test_padding_every_length() {
        // Tiny buffers force many word flushes and read refills.
        let options = CodecOptions {
            read_chunk_size: 7,
            write_chunk_words: 2,
        };
        let source = data_noise(4096, 42);
        let skewed = data_skewed(4096);
        // 3 × (2 words × 8 bytes) + 1 at minimum, well beyond with 8-bit codes
        for len in 1..=200 {
            assert_eq!(round_trip_with(&source[..len], &options), &source[..len], "noise len {len}");
            assert_eq!(round_trip_with(&skewed[..len], &options), &skewed[..len], "skewed len {len}");
        }
    }

    #[test]
    fn test_word_aligned_payload() {
        // 64 symbols with one-bit codes fill exactly one word.
        for len in [64usize, 128, 640] {
            let input = data_skewed(len);
            let packed = compress(&input).unwrap();
            assert_eq!(*packed.last().unwrap(), 0);
            assert_eq!(packed.len(), 2 + 2 * 3 + len / 8 + 1);
            assert_eq!(decompress(&packed).unwrap(), input);
        }
    }

    #[test]
    fn test_output_independent_of_buffer_sizes() {
        let input = data_repeating_text();
        let reference = compress(&input).unwrap();
        for (read, words) in [(1, 1), (3, 5), (4096, 1), (1 << 20, 1 << 10)] {
            let options = CodecOptions {
                read_chunk_size: read,
                write_chunk_words: words,
            };
            let mut packed = Vec::new();
            compress_stream(Cursor::new(&input), &mut packed, &options).unwrap();
            assert_eq!(packed, reference, "read {read}, words {words}");
        }
    }

    #[test]
    fn test_skewed_data_shrinks() {
        let input = data_skewed(100_000);
        let packed = compress(&input).unwrap();
        assert!(packed.len() < input.len() / 7, "packed {} bytes", packed.len());
    }

    // ---------------------------------------------------------------
    // Properties
    // ---------------------------------------------------------------

    #[test]
    fn test_all_bytes_header_layout() {
        let input = data_uniform();
        let table = CodeTable::from_tree(&HuffmanTree::from_data(&input).unwrap()).unwrap();
        assert_eq!(table.len(), 256);
        assert!(table.iter().all(|c| c.len == 8));
        // 256 records of symbol + length + one code byte
        assert_eq!(header::header_len(&table), 2 + 256 * 3);
    }

    #[test]
    fn test_malformed_files_are_format_errors() {
        let packed = compress(&data_repeating_text()).unwrap();
        let (table, header_len) = header::read_header(&mut Cursor::new(&packed)).unwrap();
        assert!(!table.is_empty());

        // symbol count beyond the alphabet
        let mut bad = packed.clone();
        bad[..2].copy_from_slice(&300u16.to_le_bytes());
        assert!(decompress(&bad).unwrap_err().is_format_error());

        // code length zero on the first record
        let mut bad = packed.clone();
        bad[3] = 0;
        assert!(decompress(&bad).unwrap_err().is_format_error());

        // padding count out of range
        let mut bad = packed.clone();
        *bad.last_mut().unwrap() = 9;
        assert!(decompress(&bad).unwrap_err().is_format_error());

        // header only, tail missing
        assert!(decompress(&packed[..header_len]).unwrap_err().is_format_error());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_round_trip(input in proptest::collection::vec(any::<u8>(), 0..2048)) {
            let packed = compress(&input).unwrap();
            prop_assert_eq!(decompress(&packed).unwrap(), input);
        }

        #[test]
        fn prop_round_trip_small_alphabet(input in proptest::collection::vec(0u8..4, 1..4096)) {
            let options = CodecOptions { read_chunk_size: 13, write_chunk_words: 1 };
            prop_assert_eq!(round_trip_with(&input, &options), input);
        }

        #[test]
        fn prop_optimal_and_prefix_free(counts in proptest::collection::vec(1u64..10_000, 2..256)) {
            let mut table = [0u64; 256];
            table[..counts.len()].copy_from_slice(&counts);
            let freq = FrequencyTable::from_counts(table);
            let tree = HuffmanTree::from_frequency_table(&freq).unwrap();
            prop_assert_eq!(tree.weighted_path_length(), optimal_cost(&freq));
            prop_assert_eq!(tree.node_count(), 2 * counts.len() - 1);

            let codes = CodeTable::from_tree(&tree).unwrap();
            prop_assert_eq!(codes.len(), counts.len());
            let list: Vec<_> = codes.iter().collect();
            for (i, a) in list.iter().enumerate() {
                for b in &list[i + 1..] {
                    prop_assert!(!a.is_prefix_of(b) && !b.is_prefix_of(a));
                }
            }
        }

        #[test]
        fn prop_header_round_trip(input in proptest::collection::vec(any::<u8>(), 1..1024)) {
            let freq = get_frequency(&input);
            let table = CodeTable::from_tree(&HuffmanTree::from_frequency_table(&freq).unwrap()).unwrap();
            let mut bytes = Vec::new();
            header::write_header(&mut bytes, &table).unwrap();
            let (decoded, consumed) = header::read_header(&mut Cursor::new(&bytes)).unwrap();
            prop_assert_eq!(consumed, bytes.len());
            let rebuilt = HuffmanTree::from_code_table(&decoded).unwrap();
            prop_assert_eq!(CodeTable::from_tree(&rebuilt).unwrap(), table);
        }

        #[test]
        fn prop_decoder_never_panics(garbage in proptest::collection::vec(any::<u8>(), 0..512)) {
            let _ = decompress(&garbage);
        }
    }
}
