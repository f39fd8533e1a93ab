//! Storage widths for filter fingerprints.

use core::fmt::Debug;
use core::ops::{BitXor, BitXorAssign};

/// An unsigned integer type a filter stores its fingerprints in.
///
/// The 8- and 16-bit variants of the filter differ only in this type; the
/// construction and query paths are shared, with the 64-bit fingerprint hash
/// truncated at the store site. Implemented for [`u8`] and [`u16`].
pub trait Fingerprint:
    Copy + Default + PartialEq + Debug + BitXor<Output = Self> + BitXorAssign
{
    /// Truncates a 64-bit fingerprint hash to the stored width.
    fn from_hash(hash: u64) -> Self;
}

impl Fingerprint for u8 {
    #[inline]
    fn from_hash(hash: u64) -> Self {
        hash as Self
    }
}

impl Fingerprint for u16 {
    #[inline]
    fn from_hash(hash: u64) -> Self {
        hash as Self
    }
}
