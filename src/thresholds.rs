//! Threshold Tables
//!
//! Ordered interval tables mapping a non-negative count (loyalty points, item quantity) onto a
//! value. Each band covers `[lower, next_lower)`, the first band always starts at zero and the last
//! band is open-ended, so every count falls into exactly one band.

use smallvec::SmallVec;
use thiserror::Error;

/// Errors raised when a threshold table is malformed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ThresholdError {
    /// The table has no bands.
    #[error("threshold table has no bands")]
    Empty,

    /// The first band must start at zero so that every count is covered.
    #[error("first threshold band starts at {0}, expected 0")]
    MissingZeroBand(u64),

    /// Band lower bounds must be strictly increasing.
    #[error("threshold {lower} does not exceed the previous threshold {previous}")]
    NotIncreasing {
        /// Lower bound of the preceding band.
        previous: u64,

        /// Offending lower bound.
        lower: u64,
    },
}

/// A single band of a [`ThresholdTable`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdBand<T> {
    lower: u64,
    value: T,
}

impl<T> ThresholdBand<T> {
    /// Inclusive lower bound of the band.
    #[must_use]
    pub fn lower(&self) -> u64 {
        self.lower
    }

    /// Value attached to the band.
    #[must_use]
    pub fn value(&self) -> &T {
        &self.value
    }
}

/// A band together with the exclusive upper bound implied by the band after it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandRange<'a, T> {
    /// The band itself.
    pub band: &'a ThresholdBand<T>,

    /// Exclusive upper bound, or `None` for the open-ended last band.
    pub upper: Option<u64>,
}

/// An ordered interval table.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdTable<T> {
    first: ThresholdBand<T>,
    rest: SmallVec<[ThresholdBand<T>; 4]>,
}

impl<T> ThresholdTable<T> {
    /// Create a table with a single band covering every count.
    pub fn starting_with(value: T) -> Self {
        Self {
            first: ThresholdBand { lower: 0, value },
            rest: SmallVec::new(),
        }
    }

    /// Build a table from `(lower, value)` pairs in ascending order.
    ///
    /// # Errors
    ///
    /// - [`ThresholdError::Empty`]: no bands were given.
    /// - [`ThresholdError::MissingZeroBand`]: the first band does not start at zero.
    /// - [`ThresholdError::NotIncreasing`]: lower bounds are not strictly increasing.
    pub fn new(bands: impl IntoIterator<Item = (u64, T)>) -> Result<Self, ThresholdError> {
        let mut bands = bands.into_iter();

        let (lower, value) = bands.next().ok_or(ThresholdError::Empty)?;

        if lower != 0 {
            return Err(ThresholdError::MissingZeroBand(lower));
        }

        bands.try_fold(Self::starting_with(value), |table, (lower, value)| {
            table.with_band(lower, value)
        })
    }

    /// Append a band starting at `lower`.
    ///
    /// # Errors
    ///
    /// Returns [`ThresholdError::NotIncreasing`] if `lower` does not exceed the last band's lower
    /// bound.
    pub fn with_band(mut self, lower: u64, value: T) -> Result<Self, ThresholdError> {
        let previous = self.last().lower;

        if lower <= previous {
            return Err(ThresholdError::NotIncreasing { previous, lower });
        }

        self.rest.push(ThresholdBand { lower, value });

        Ok(self)
    }

    /// Append a band for a statically known table. Bounds must already be increasing.
    pub(crate) fn extended(mut self, lower: u64, value: T) -> Self {
        debug_assert!(
            lower > self.last().lower,
            "threshold {lower} must exceed {}",
            self.last().lower
        );

        self.rest.push(ThresholdBand { lower, value });
        self
    }

    /// Find the band containing `count`.
    pub fn lookup(&self, count: u64) -> &ThresholdBand<T> {
        self.rest
            .iter()
            .rev()
            .find(|band| band.lower <= count)
            .unwrap_or(&self.first)
    }

    /// Find the first band starting strictly above `count`.
    pub fn next_above(&self, count: u64) -> Option<&ThresholdBand<T>> {
        self.rest.iter().find(|band| band.lower > count)
    }

    /// Iterate over the bands in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &ThresholdBand<T>> {
        std::iter::once(&self.first).chain(self.rest.iter())
    }

    /// Iterate over the bands along with their exclusive upper bounds.
    pub fn ranges(&self) -> impl Iterator<Item = BandRange<'_, T>> {
        let uppers = self
            .rest
            .iter()
            .map(|band| Some(band.lower))
            .chain(std::iter::once(None));

        self.iter()
            .zip(uppers)
            .map(|(band, upper)| BandRange { band, upper })
    }

    /// Number of bands in the table.
    pub fn len(&self) -> usize {
        self.rest.len() + 1
    }

    /// Tables always hold at least one band.
    pub fn is_empty(&self) -> bool {
        false
    }

    fn last(&self) -> &ThresholdBand<T> {
        self.rest.last().unwrap_or(&self.first)
    }
}
