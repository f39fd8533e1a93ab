//! Implements Xor16 filters as described in [Xor Filters: Faster and Smaller Than Bloom and Cuckoo Filters].
//!
//! [Xor Filters: Faster and Smaller Than Bloom and Cuckoo Filters]: https://arxiv.org/abs/1912.08258

use crate::XorFilter;

/// Xor filter using 16-bit fingerprints.
///
/// An `Xor16` filter uses <20 bits per entry of the set it is constructed
/// from, and has a false positive rate of ~0.0015%. As with other
/// probabilistic filters, a higher number of entries decreases the bits per
/// entry but increases the false positive rate.
///
/// An `Xor16` is constructed from a set of distinct 64-bit unsigned integers
/// and is immutable.
///
/// ```
/// # extern crate alloc;
/// use xorfilter::{Filter, Xor16};
/// # use alloc::vec::Vec;
/// # use rand::Rng;
///
/// # let mut rng = rand::thread_rng();
/// const SAMPLE_SIZE: usize = 1_000_000;
/// let keys: Vec<u64> = (0..SAMPLE_SIZE).map(|_| rng.gen()).collect();
/// let filter = Xor16::try_from(&keys).unwrap();
///
/// // no false negatives
/// for key in keys {
///     assert!(filter.contains(&key));
/// }
///
/// // bits per entry
/// let bpe = (filter.len() as f64) * 16.0 / (SAMPLE_SIZE as f64);
/// assert!(bpe < 20., "Bits per entry is {}", bpe);
/// ```
///
/// Serializing and deserializing `Xor16` filters can be enabled with the
/// [`serde`] feature (or [`bincode`] for bincode).
///
/// [`serde`]: http://serde.rs
pub type Xor16 = XorFilter<u16>;
