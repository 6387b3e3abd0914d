use crate::{Error, UserKey};

/// A closed interval `[low, high]` over user keys.
///
/// Ranges are ordered by the `(low, high)` tuple, so two ranges sharing a
/// `low` bound but differing in `high` are distinct tree keys, while two
/// ranges with identical bounds compare equal.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct KeyRange {
    low: UserKey,
    high: UserKey,
}

impl KeyRange {
    /// Creates a new key range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRange`] if `low > high`.
    pub fn new<L: Into<UserKey>, H: Into<UserKey>>(low: L, high: H) -> crate::Result<Self> {
        let low = low.into();
        let high = high.into();

        if low > high {
            return Err(Error::InvalidRange { low, high });
        }

        Ok(Self { low, high })
    }

    /// Lower bound (inclusive).
    #[must_use]
    pub fn low(&self) -> &UserKey {
        &self.low
    }

    /// Upper bound (inclusive).
    #[must_use]
    pub fn high(&self) -> &UserKey {
        &self.high
    }

    /// Returns `true` if `low <= key <= high`.
    #[must_use]
    pub fn contains_key<K: AsRef<[u8]>>(&self, key: K) -> bool {
        let key = key.as_ref();
        key >= &*self.low && key <= &*self.high
    }
}
