//! The generic three-block xor filter: layout, sizing, construction, query.

use crate::fingerprint::Fingerprint;
use crate::hash;
use crate::Filter;
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use core::mem;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "bincode")]
use bincode::{Decode, Encode};

/// Number of reseeded construction attempts before giving up.
///
/// At the 1.23 load factor a single attempt succeeds with probability bounded
/// below by a constant, so legitimate distinct-key inputs essentially never
/// come near this budget; it exists to bound construction time on pathological
/// inputs such as key sets containing duplicates.
const MAX_ATTEMPTS: usize = 100;

/// Errors surfaced by filter construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A persistent or transient construction buffer could not be acquired.
    /// No partial state escapes; the caller may retry.
    AllocationFailed,
    /// Peeling did not converge within the retry budget. The filter's
    /// fingerprints are unspecified and the filter must not be queried;
    /// the caller may deduplicate the keys or allocate a larger filter.
    BuildFailed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocationFailed => f.write_str("failed to allocate filter memory"),
            Self::BuildFailed => f.write_str("failed to construct xor filter"),
        }
    }
}

impl core::error::Error for Error {}

/// A slot of the transient construction array. `mask` holds the xor of the
/// hashes of all keys currently incident on the slot and `count` their
/// number, so a slot with `count == 1` names its last remaining key exactly.
#[derive(Default, Copy, Clone)]
struct XorSet {
    mask: u64,
    count: u32,
}

/// A peeled key: its hash and the slot it was peeled at.
#[derive(Default, Copy, Clone)]
struct KeyIndex {
    hash: u64,
    index: usize,
}

/// An xor filter over 64-bit keys, generic in its fingerprint width `F`.
///
/// The filter stores three equal-length fingerprint blocks in one contiguous
/// array; a key is (probably) a member when the xor of its one slot per block
/// equals its fingerprint. Use the [`Xor8`](crate::Xor8) and
/// [`Xor16`](crate::Xor16) aliases rather than naming this type directly.
///
/// The fields are public so callers can serialize a filter in an envelope of
/// their choosing and rebuild it later; `seed`, `block_length`, and the
/// fingerprint array fully determine query behavior.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "bincode", derive(Encode, Decode))]
#[derive(Debug, Clone)]
pub struct XorFilter<F: 'static> {
    /// The seed for the filter
    pub seed: u64,
    /// The length of each of the three fingerprint blocks
    pub block_length: usize,
    /// The fingerprints for the filter, `3 * block_length` of them
    pub fingerprints: Box<[F]>,
}

/// Fallibly acquires a zero-initialized buffer of `len` elements.
fn zeroed_buffer<T: Default + Clone>(len: usize) -> Result<Vec<T>, Error> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| Error::AllocationFailed)?;
    buffer.resize(len, T::default());
    Ok(buffer)
}

/// Fallibly acquires an empty buffer with room for `len` elements.
fn empty_buffer<T>(len: usize) -> Result<Vec<T>, Error> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| Error::AllocationFailed)?;
    Ok(buffer)
}

impl<F: Fingerprint> XorFilter<F> {
    /// Sizes and acquires the fingerprint array for a set of up to `size`
    /// keys, zero-initialized and not yet populated.
    ///
    /// The array holds `floor(1.23 * size) + 32` fingerprints, rounded down
    /// to a multiple of three: 1.23 is the load factor above which random
    /// 3-uniform hypergraphs peel with high probability, and the additive 32
    /// absorbs small-set variance.
    ///
    /// # Errors
    ///
    /// [`Error::AllocationFailed`] if the buffer cannot be acquired.
    pub fn allocate(size: usize) -> Result<Self, Error> {
        let capacity = (1.23 * size as f64) as usize + 32;
        let capacity = capacity / 3 * 3; // round to a multiple of 3
        Ok(Self {
            seed: 0,
            block_length: capacity / 3,
            fingerprints: zeroed_buffer(capacity)?.into_boxed_slice(),
        })
    }

    /// Builds the filter over `keys`, replacing `seed` and all fingerprints.
    ///
    /// Must be called on a filter from [`allocate`](Self::allocate) with
    /// `size >= keys.len()`. Keys must be distinct; duplicates cannot be
    /// represented and make construction fail once the retry budget runs out.
    /// Repopulating an existing allocation is allowed and produces the same
    /// bits a fresh build over the same keys would.
    ///
    /// An empty key set is accepted and leaves the fingerprint array all
    /// zero, so the degenerate filter answers `contains` with `true` exactly
    /// when a key's truncated fingerprint is zero.
    ///
    /// # Errors
    ///
    /// [`Error::AllocationFailed`] if a transient construction buffer cannot
    /// be acquired, [`Error::BuildFailed`] if peeling does not converge
    /// within the retry budget (or if the filter was [`free`](Self::free)d).
    /// The fingerprint array is untouched on the former and unspecified on
    /// the latter.
    pub fn populate(&mut self, keys: &[u64]) -> Result<(), Error> {
        self.populate_iter(keys.iter().copied())
    }

    /// Builds the filter from a key iterator. Can be used directly if you
    /// don't have a contiguous array of u64 keys.
    ///
    /// Note: the iterator will be iterated over multiple times while building
    /// the filter. If using a hash function to map the key, it may be cheaper
    /// just to create a scratch array of hashed keys that you pass in.
    ///
    /// # Errors
    ///
    /// As for [`populate`](Self::populate).
    pub fn populate_iter<T>(&mut self, keys: T) -> Result<(), Error>
    where
        T: ExactSizeIterator<Item = u64> + Clone,
    {
        let num_keys = keys.len();
        let array_length = self.fingerprints.len();
        if array_length == 0 {
            // Freed filter: no backing array to build into. An allocated
            // filter always has at least 30 slots, even for zero keys.
            return Err(Error::BuildFailed);
        }

        let mut sets: Vec<XorSet> = zeroed_buffer(array_length)?;
        let mut queue: Vec<usize> = empty_buffer(array_length)?;
        let mut stack: Vec<KeyIndex> = empty_buffer(num_keys)?;

        let mut rng_counter = 1;
        let mut seed = hash::splitmix64(&mut rng_counter);
        let mut attempts = 0;
        loop {
            attempts += 1;
            if attempts > MAX_ATTEMPTS {
                return Err(Error::BuildFailed);
            }

            // Register every key with its three slots.
            for key in keys.clone() {
                let key_hash = hash::mix(key, seed);
                for slot in hash::slots(key_hash, self.block_length) {
                    sets[slot].mask ^= key_hash;
                    sets[slot].count += 1;
                }
            }

            // Seed the worklist with every slot holding a single key.
            queue.clear();
            for (slot, set) in sets.iter().enumerate() {
                if set.count == 1 {
                    queue.push(slot);
                }
            }

            // Peel: a slot of count one pins down its key (the mask contains
            // it wholly), so record the pair and detach the key from all
            // three of its slots, possibly exposing new count-one slots.
            stack.clear();
            while let Some(slot) = queue.pop() {
                if sets[slot].count != 1 {
                    // Stale entry; the slot was drained after being enqueued.
                    continue;
                }
                let key_hash = sets[slot].mask;
                stack.push(KeyIndex {
                    hash: key_hash,
                    index: slot,
                });
                for other in hash::slots(key_hash, self.block_length) {
                    sets[other].mask ^= key_hash;
                    sets[other].count -= 1;
                    if sets[other].count == 1 {
                        queue.push(other);
                    }
                }
            }

            if stack.len() == num_keys {
                break;
            }

            // Peeling stalled; reset and retry with the next seed.
            for set in sets.iter_mut() {
                *set = XorSet::default();
            }
            seed = hash::splitmix64(&mut rng_counter);
        }
        self.seed = seed;

        self.assign(&stack);

        #[cfg(debug_assertions)]
        for key in keys {
            debug_assert!(self.contains(&key), "key {key} lost during construction");
        }

        Ok(())
    }

    /// Back-assigns fingerprints in reverse peel order (see Algorithm 4 in
    /// the paper).
    ///
    /// Iterating the stack backwards, each key's peeled slot is the last of
    /// its three still unset, so writing it closes the key's equation
    /// `fingerprint == F[h0] ^ F[h1] ^ F[h2]` without disturbing any key
    /// peeled earlier in this iteration.
    fn assign(&mut self, stack: &[KeyIndex]) {
        // Slots no key was peeled at keep a fixed value, making repeated
        // builds over the same keys bit-identical.
        #[cfg(not(feature = "uniform-random"))]
        self.fingerprints.fill(F::default());

        // Inevitably some fingerprint entries will not be used. If all of
        // these unused entries are 0, the false-positive rate for an element
        // x with fingerprint(x) = 0 is significantly higher than if the
        // unused entries are uniformly random.
        #[cfg(feature = "uniform-random")]
        {
            use rand::Rng;
            let mut rng = rand::thread_rng();
            for fingerprint in self.fingerprints.iter_mut() {
                *fingerprint = F::from_hash(rng.gen());
            }
        }

        for ki in stack.iter().rev() {
            let [h0, h1, h2] = hash::slots(ki.hash, self.block_length);
            // Zero the peeled slot so its own term drops out of the xor.
            self.fingerprints[ki.index] = F::default();
            self.fingerprints[ki.index] = F::from_hash(hash::fingerprint(ki.hash))
                ^ self.fingerprints[h0]
                ^ self.fingerprints[h1]
                ^ self.fingerprints[h2];
        }
    }

    /// Constructs the filter from a key iterator in one step, sizing it for
    /// `keys.len()` keys and populating it.
    ///
    /// # Errors
    ///
    /// As for [`allocate`](Self::allocate) and [`populate`](Self::populate).
    pub fn try_from_iterator<T>(keys: T) -> Result<Self, Error>
    where
        T: ExactSizeIterator<Item = u64> + Clone,
    {
        let mut filter = Self::allocate(keys.len())?;
        filter.populate_iter(keys)?;
        Ok(filter)
    }

    /// Reports the memory footprint of the filter: the fingerprint array
    /// plus the filter header itself.
    pub fn size_in_bytes(&self) -> usize {
        self.fingerprints.len() * mem::size_of::<F>() + mem::size_of::<Self>()
    }

    /// Releases the fingerprint buffer early, leaving the filter in a
    /// well-defined empty state (`len() == 0`, `block_length == 0`).
    ///
    /// Dropping the filter releases the buffer just as well; `free` exists
    /// so a long-lived binding can give the memory back before going out of
    /// scope. A freed filter must not be queried; repopulating it returns
    /// [`Error::BuildFailed`].
    pub fn free(&mut self) {
        self.fingerprints = Box::default();
        self.block_length = 0;
    }
}

impl<F: Fingerprint> Filter<u64> for XorFilter<F> {
    /// Returns `true` if the filter contains the specified key.
    ///
    /// Pure and branch-free: one mix, three array reads, one comparison. No
    /// filter state is touched, so concurrent callers need no
    /// synchronization.
    fn contains(&self, key: &u64) -> bool {
        let key_hash = hash::mix(*key, self.seed);
        let [h0, h1, h2] = hash::slots(key_hash, self.block_length);
        let fingerprint = F::from_hash(hash::fingerprint(key_hash));

        fingerprint == self.fingerprints[h0] ^ self.fingerprints[h1] ^ self.fingerprints[h2]
    }

    fn len(&self) -> usize {
        self.fingerprints.len()
    }
}

impl<F: Fingerprint> TryFrom<&[u64]> for XorFilter<F> {
    type Error = Error;

    fn try_from(keys: &[u64]) -> Result<Self, Error> {
        Self::try_from_iterator(keys.iter().copied())
    }
}

impl<F: Fingerprint> TryFrom<&Vec<u64>> for XorFilter<F> {
    type Error = Error;

    fn try_from(v: &Vec<u64>) -> Result<Self, Error> {
        Self::try_from_iterator(v.iter().copied())
    }
}

impl<F: Fingerprint> TryFrom<Vec<u64>> for XorFilter<F> {
    type Error = Error;

    fn try_from(v: Vec<u64>) -> Result<Self, Error> {
        Self::try_from_iterator(v.iter().copied())
    }
}
