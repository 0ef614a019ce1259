//! Error type for checked table operations.
//!
//! Duplicate keys and missing keys are not errors: they are reported
//! through return values. Only configuration mistakes and requests past
//! the bucket-count ceiling end up here.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum TableError {
    /// A checked operation asked for more buckets than the prime table holds.
    #[error("requested {requested} buckets, but the largest supported bucket count is {max}")]
    CapacityExceeded {
        /// Bucket count (or element capacity) that was asked for
        requested: usize,
        /// Largest tabulated prime
        max: usize,
    },

    /// Max load factor must be finite and strictly positive.
    #[error("invalid max load factor: {0}")]
    InvalidLoadFactor(f32),
}

pub type Result<T> = std::result::Result<T, TableError>;
