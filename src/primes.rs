//! Prime bucket counts.
//!
//! Bucket directories are always sized to one of the primes below. Entries
//! grow roughly geometrically, so `next_prime(2 * bucket_count)` always
//! moves at least one entry up the list until the ceiling is reached.
//!
//! The list tops out at `4_294_967_291`. Requests beyond that are clamped
//! to the last entry by [`next_prime`]; [`try_next_prime`] reports them
//! instead. Every entry fits in a 32-bit `usize`.

use crate::error::{Result, TableError};

pub const NUM_PRIMES: usize = 31;

pub static PRIME_LIST: [usize; NUM_PRIMES] = [
    7, 19, 37, 53, 97, 193, 389, 769, 1543, 3079, 6151, 12289, 24593, 49157, 98317, 196613,
    393241, 786433, 1572869, 3145739, 6291469, 12582917, 25165843, 50331653, 100663319,
    201326611, 402653189, 805306457, 1610612741, 3221225437, 4294967291,
];

/// Largest bucket count a table can reach.
pub const MAX_BUCKET_COUNT: usize = PRIME_LIST[NUM_PRIMES - 1];

/// Smallest tabulated prime `>= n`, clamped to [`MAX_BUCKET_COUNT`].
#[inline]
pub fn next_prime(n: usize) -> usize {
    let pos = PRIME_LIST.partition_point(|&p| p < n);
    PRIME_LIST.get(pos).copied().unwrap_or(MAX_BUCKET_COUNT)
}

/// Like [`next_prime`] but fails instead of clamping.
pub fn try_next_prime(n: usize) -> Result<usize> {
    if n > MAX_BUCKET_COUNT {
        return Err(TableError::CapacityExceeded {
            requested: n,
            max: MAX_BUCKET_COUNT,
        });
    }
    Ok(next_prime(n))
}
