//! Fixed-size batching of transferred carts.

use std::num::NonZeroUsize;

/// Splits records into consecutive batches of at most `size` records.
///
/// Order is preserved within and across batches, the last batch holds the
/// remainder and no empty batch is ever produced.
pub fn batches<T>(records: &[T], size: NonZeroUsize) -> impl ExactSizeIterator<Item = &[T]> {
    records.chunks(size.get())
}

/// Number of batches [`batches`] yields for `len` records.
pub fn batch_count(len: usize, size: NonZeroUsize) -> usize {
    len.div_ceil(size.get())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(value: usize) -> NonZeroUsize {
        NonZeroUsize::new(value).unwrap()
    }

    #[test]
    fn test_batch_sizes() {
        let cases = [
            (0, vec![]),
            (1, vec![1]),
            (99, vec![99]),
            (100, vec![100]),
            (101, vec![100, 1]),
            (250, vec![100, 100, 50]),
            (300, vec![100, 100, 100]),
        ];

        for (len, expected) in cases {
            let records = (0..len).collect::<Vec<_>>();
            let sizes = batches(&records, size(100))
                .map(|batch| batch.len())
                .collect::<Vec<_>>();

            assert_eq!(sizes, expected, "{len} records");
            assert_eq!(batch_count(len, size(100)), expected.len());
        }
    }

    #[test]
    fn test_batches_preserve_order() {
        let records = (0..257).collect::<Vec<_>>();
        let joined = batches(&records, size(100))
            .flatten()
            .copied()
            .collect::<Vec<_>>();

        assert_eq!(joined, records);
    }
}
