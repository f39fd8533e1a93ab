//! The seeded hash kernel shared by construction and queries.
//!
//! One 64-bit mix per key drives everything: the three slot indices fall out
//! of `reduce`-ing three rotations of the hash, and the stored fingerprint is
//! a fold of its halves. All arithmetic is wrapping and unsigned so results
//! are bit-identical across hosts.

/// [`MurmurHash3`]'s finalization mix, causing bits to [avalanche].
///
/// [`MurmurHash3`]: https://github.com/spaolacci/murmur3
/// [avalanche]: https://en.wikipedia.org/wiki/Avalanche_effect
///
/// Copyright 2013, Sébastien Paolacci.
/// All rights reserved.
///
/// Redistribution and use in source and binary forms, with or without
/// modification, are permitted provided that the following conditions are met:
///     * Redistributions of source code must retain the above copyright
///       notice, this list of conditions and the following disclaimer.
///     * Redistributions in binary form must reproduce the above copyright
///       notice, this list of conditions and the following disclaimer in the
///       documentation and/or other materials provided with the distribution.
///     * Neither the name of the library nor the
///       names of its contributors may be used to endorse or promote products
///       derived from this software without specific prior written permission.
///
/// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS" AND
/// ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE IMPLIED
/// WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
/// DISCLAIMED. IN NO EVENT SHALL <COPYRIGHT HOLDER> BE LIABLE FOR ANY
/// DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES
/// (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR SERVICES;
/// LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND
/// ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT
/// (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE OF THIS
/// SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.
pub(crate) const fn murmur64(mut h: u64) -> u64 {
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^= h >> 33;
    h
}

/// Applies a finalization mix to a randomly-seeded key, resulting in an
/// avalanched hash. This helps avoid high false-positive ratios (see Section
/// 4 in the paper).
#[inline]
pub(crate) const fn mix(key: u64, seed: u64) -> u64 {
    murmur64(key.wrapping_add(seed))
}

/// Pseudo-RNG using Sebastiano Vigna's [`SplitMix64`] algorithm. Used only to
/// derive and refresh filter seeds.
///
/// [`SplitMix64`]: http://xoroshiro.di.unimi.it/splitmix64.c
///
/// Written in 2015 by Sebastiano Vigna (vigna@acm.org)
///
/// To the extent possible under law, the author has dedicated all copyright and related and
/// neighboring rights to this software to the public domain worldwide. This software is
/// distributed without any warranty.
///
/// See <http://creativecommons.org/publicdomain/zero/1.0/>.
pub(crate) fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// [A fast alternative to the modulo reduction]: maps a 32-bit hash
/// approximately uniformly onto `[0, n)`.
///
/// [A fast alternative to the modulo reduction]: http://lemire.me/blog/2016/06/27/a-fast-alternative-to-the-modulo-reduction/
#[inline]
pub(crate) const fn reduce(hash: u32, n: usize) -> usize {
    ((hash as u64 * n as u64) >> 32) as usize
}

/// Folds a 64-bit hash into the value stored in the filter, before truncation
/// to the fingerprint width.
#[inline]
pub(crate) const fn fingerprint(hash: u64) -> u64 {
    hash ^ (hash >> 32)
}

/// Derives the three slot indices of a hash, one per fingerprint block.
///
/// The low 32 bits of the hash and of its rotations by 21 and 42 each index
/// one block of length `block_length`; the block offsets are already applied,
/// so the results address the flat fingerprint array directly and never
/// collide with each other.
#[inline]
pub(crate) const fn slots(hash: u64, block_length: usize) -> [usize; 3] {
    [
        reduce(hash as u32, block_length),
        reduce(hash.rotate_left(21) as u32, block_length) + block_length,
        reduce(hash.rotate_left(42) as u32, block_length) + 2 * block_length,
    ]
}

#[cfg(test)]
mod test {
    use super::{fingerprint, mix, murmur64, reduce, slots, splitmix64};

    #[test]
    fn murmur64_vectors() {
        // Pinned so reimplementations can match bit-exactly.
        assert_eq!(murmur64(0), 0);
        assert_eq!(murmur64(1), 12994781566227106604);
        assert_eq!(murmur64(1 << 63), 10338021812380738707);
        assert_eq!(murmur64(u64::MAX), 7256831767414464289);
    }

    #[test]
    fn mix_folds_key_and_seed() {
        assert_eq!(mix(0, 0), 0);
        // The seed enters through addition, so (key, seed) pairs with equal
        // sums hash identically.
        assert_eq!(mix(1, 2), mix(2, 1));
        assert_eq!(mix(3, 0), murmur64(3));
    }

    #[test]
    fn splitmix64_vectors() {
        let mut state = 0;
        assert_eq!(splitmix64(&mut state), 16294208416658607535);
        assert_eq!(splitmix64(&mut state), 7960286522194355700);
        assert_eq!(splitmix64(&mut state), 487617019471545679);
    }

    #[test]
    fn reduce_stays_in_range() {
        assert_eq!(reduce(0, 1000), 0);
        assert_eq!(reduce(u32::MAX, 1000), 999);
        let mut state = 42;
        for _ in 0..10_000 {
            let x = splitmix64(&mut state) as u32;
            assert!(reduce(x, 117) < 117);
        }
    }

    #[test]
    fn slots_land_in_their_blocks() {
        const BLOCK_LENGTH: usize = 1021;
        let mut state = 7;
        for _ in 0..10_000 {
            let hash = splitmix64(&mut state);
            let [h0, h1, h2] = slots(hash, BLOCK_LENGTH);
            assert!(h0 < BLOCK_LENGTH);
            assert!((BLOCK_LENGTH..2 * BLOCK_LENGTH).contains(&h1));
            assert!((2 * BLOCK_LENGTH..3 * BLOCK_LENGTH).contains(&h2));
        }
    }

    #[test]
    fn fingerprint_folds_halves() {
        assert_eq!(fingerprint(0), 0);
        assert_eq!(fingerprint(0x0000_0001_0000_0001), 0);
        assert_eq!(fingerprint(0xffff_ffff_0000_0000), 0xffff_ffff_ffff_ffff);
    }
}
