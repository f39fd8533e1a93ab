//! This library implements xor filters -- immutable data structures answering
//! approximate membership queries over static sets of 64-bit keys. A built
//! filter reports `contains` with no false negatives and a small, bounded
//! false-positive probability (~0.39% for 8-bit fingerprints, ~0.0015% for
//! 16-bit ones), using about 9.84 or 19.68 bits per key respectively. Xor
//! filters are smaller than Bloom and Cuckoo filters at comparable error
//! rates and their query path is branch-free: one hash, three array reads,
//! one comparison.
//!
//! Filters operate only on sets of distinct 64-bit unsigned integers; mapping
//! richer key types down to `u64` is the caller's business, as is any
//! serialization envelope (the filter exposes its `seed`, `block_length`, and
//! `fingerprints` for that purpose, and can derive [`serde`]/[`bincode`]
//! impls behind feature flags). Once built, a filter never changes: there is
//! no insertion or deletion, and queries from any number of threads need no
//! synchronization.
//!
//! Construction follows a two-phase lifecycle: size the backing array with
//! [`XorFilter::allocate`], then build into it with
//! [`XorFilter::populate`]. `TryFrom` impls on [`Xor8`] and [`Xor16`] do both
//! steps in one call. Construction can fail -- allocator refusal, or a key
//! set (e.g. one with duplicates) that never yields a peelable hypergraph
//! within the retry budget -- and surfaces [`Error`] instead of panicking.
//!
//! Filters are implemented as described in the paper [Xor Filters: Faster and
//! Smaller Than Bloom and Cuckoo Filters] and in Daniel Lemire's [c]
//! implementation, both useful references on the theory behind the
//! construction. This library is `no_std`.
//!
//! [Xor Filters: Faster and Smaller Than Bloom and Cuckoo Filters]: https://arxiv.org/abs/1912.08258
//! [c]: https://github.com/FastFilter/xor_singleheader
//! [`serde`]: http://serde.rs
//! [`bincode`]: https://github.com/bincode-org/bincode

#![no_std]
// Configuration attributes
#![warn(missing_docs)]
#![forbid(clippy::all, clippy::cargo, clippy::nursery)]
#![allow(clippy::len_without_is_empty)]

extern crate alloc;

mod fingerprint;
mod hash;
mod xor;

mod xor16;
mod xor8;

pub use fingerprint::Fingerprint;
pub use xor::{Error, XorFilter};
pub use xor16::Xor16;
pub use xor8::Xor8;

/// Methods common to xor filters.
pub trait Filter<Type> {
    /// Returns `true` if the filter probably contains the specified key.
    ///
    /// There can never be a false negative, but there is a small possibility
    /// of false positives. Refer to individual filters' documentation for
    /// false positive rates.
    fn contains(&self, key: &Type) -> bool;

    /// Returns the number of fingerprints in the filter.
    fn len(&self) -> usize;
}
