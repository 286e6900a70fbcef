//! Review ratings and their aggregate.

use serde::{Deserialize, Serialize};

/// Error for a rating outside the 1-5 star range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("rating must be between {min} and {max} (got {got})", min = Rating::MIN, max = Rating::MAX)]
pub struct RatingError {
    pub got: i64,
}

/// A star rating from 1 to 5 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Validate a rating.
    ///
    /// # Errors
    ///
    /// Returns `RatingError` unless `1 <= value <= 5`.
    pub fn new(value: i64) -> Result<Self, RatingError> {
        u8::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
            .ok_or(RatingError { got: value })
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = RatingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for i64 {
    fn from(rating: Rating) -> Self {
        Self::from(rating.0)
    }
}

/// Arithmetic mean of the given ratings, or 0 when there are none.
#[must_use]
pub fn average_rating<I>(ratings: I) -> f64
where
    I: IntoIterator<Item = Rating>,
{
    let (sum, count) = ratings
        .into_iter()
        .fold((0_u32, 0_u32), |(sum, count), r| {
            (sum + u32::from(r.value()), count + 1)
        });
    if count == 0 {
        0.0
    } else {
        f64::from(sum) / f64::from(count)
    }
}
