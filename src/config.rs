//! Table construction settings.

use crate::error::{Result, TableError};

/// What to do when a configured capacity needs more buckets than
/// [`MAX_BUCKET_COUNT`](crate::primes::MAX_BUCKET_COUNT).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Use the largest tabulated prime and log a warning.
    #[default]
    Clamp,
    /// Fail construction with [`TableError::CapacityExceeded`].
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableConfig {
    /// Requested bucket count; rounded up to a tabulated prime.
    pub initial_capacity: usize,
    /// Growth threshold: the table rehashes once `len > bucket_count * max_load_factor`.
    pub max_load_factor: f32,
    pub overflow: OverflowPolicy,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 0,
            max_load_factor: 1.0,
            overflow: OverflowPolicy::Clamp,
        }
    }
}

impl TableConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_capacity(mut self, n: usize) -> Self {
        self.initial_capacity = n;
        self
    }

    pub fn with_max_load_factor(mut self, f: f32) -> Self {
        self.max_load_factor = f;
        self
    }

    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_load_factor(self.max_load_factor)
    }
}

pub(crate) fn validate_load_factor(f: f32) -> Result<()> {
    if f.is_finite() && f > 0.0 {
        Ok(())
    } else {
        Err(TableError::InvalidLoadFactor(f))
    }
}
