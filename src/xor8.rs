//! Implements Xor8 filters as described in [Xor Filters: Faster and Smaller Than Bloom and Cuckoo Filters].
//!
//! [Xor Filters: Faster and Smaller Than Bloom and Cuckoo Filters]: https://arxiv.org/abs/1912.08258

use crate::XorFilter;

/// Xor filter using 8-bit fingerprints.
///
/// An `Xor8` filter uses <10 bits per entry of the set it is constructed
/// from, and has a false positive rate of ~0.39%. As with other
/// probabilistic filters, a higher number of entries decreases the bits per
/// entry but increases the false positive rate.
///
/// An `Xor8` is constructed from a set of distinct 64-bit unsigned integers
/// and is immutable.
///
/// ```
/// # extern crate alloc;
/// use xorfilter::{Filter, Xor8};
/// # use alloc::vec::Vec;
/// # use rand::Rng;
///
/// # let mut rng = rand::thread_rng();
/// const SAMPLE_SIZE: usize = 1_000_000;
/// let keys: Vec<u64> = (0..SAMPLE_SIZE).map(|_| rng.gen()).collect();
/// let filter = Xor8::try_from(&keys).unwrap();
///
/// // no false negatives
/// for key in keys {
///     assert!(filter.contains(&key));
/// }
///
/// // bits per entry
/// let bpe = (filter.len() as f64) * 8.0 / (SAMPLE_SIZE as f64);
/// assert!(bpe < 10., "Bits per entry is {}", bpe);
///
/// // false positive rate
/// let false_positives: usize = (0..SAMPLE_SIZE)
///     .map(|_| rng.gen())
///     .filter(|n| filter.contains(n))
///     .count();
/// let fp_rate: f64 = (false_positives * 100) as f64 / SAMPLE_SIZE as f64;
/// assert!(fp_rate < 0.5, "False positive rate is {}", fp_rate);
/// ```
///
/// Serializing and deserializing `Xor8` filters can be enabled with the
/// [`serde`] feature (or [`bincode`] for bincode).
///
/// [`serde`]: http://serde.rs
pub type Xor8 = XorFilter<u8>;

#[cfg(test)]
mod test {
    use crate::{Filter, Xor8};

    use alloc::vec::Vec;
    use rand::seq::SliceRandom;
    use rand::Rng;

    const SAMPLE_SIZE: usize = 100_000;

    #[test]
    fn test_initialization() {
        let mut rng = rand::thread_rng();
        let keys: Vec<u64> = (0..SAMPLE_SIZE).map(|_| rng.gen()).collect();

        let filter = Xor8::try_from(&keys).unwrap();

        for key in keys {
            assert!(filter.contains(&key));
        }
    }

    #[test]
    fn test_shuffled_sequential_keys() {
        let mut rng = rand::thread_rng();
        let mut keys: Vec<u64> = (0..SAMPLE_SIZE as u64).collect();
        keys.shuffle(&mut rng);

        let filter = Xor8::try_from(&keys).unwrap();

        for key in keys {
            assert!(filter.contains(&key));
        }
    }

    #[test]
    fn test_small_set_membership() {
        let keys: Vec<u64> = (1..=10).collect();
        let filter = Xor8::try_from(&keys).unwrap();

        for key in keys {
            assert!(filter.contains(&key));
        }

        // The build is deterministic, so the false-positive count over a
        // fixed probe range is a fixed number (expected ~39 of 9990).
        let false_positives = (11..=10_000).filter(|n| filter.contains(n)).count();
        assert!(
            false_positives <= 50,
            "False positive count is {}",
            false_positives
        );
    }

    #[test]
    fn test_bits_per_entry() {
        let mut rng = rand::thread_rng();
        let keys: Vec<u64> = (0..SAMPLE_SIZE).map(|_| rng.gen()).collect();

        let filter = Xor8::try_from(&keys).unwrap();
        let bpe = (filter.len() as f64) * 8.0 / (SAMPLE_SIZE as f64);

        assert!(bpe < 10., "Bits per entry is {}", bpe);
    }

    #[test]
    fn test_false_positives() {
        let mut rng = rand::thread_rng();
        let keys: Vec<u64> = (0..SAMPLE_SIZE).map(|_| rng.gen()).collect();

        let filter = Xor8::try_from(&keys).unwrap();

        const NEGATIVES: usize = 1_000_000;
        let false_positives: usize = (0..NEGATIVES)
            .map(|_| rng.gen())
            .filter(|n| filter.contains(n))
            .count();
        let fp_rate: f64 = (false_positives * 100) as f64 / NEGATIVES as f64;
        assert!(fp_rate < 0.6, "False positive rate is {}", fp_rate);
    }
}
