// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::UserKey;

/// Represents errors that can occur in the key range index
#[derive(Debug)]
pub enum Error {
    /// Range bounds are inverted (`low > high`)
    InvalidRange {
        /// Lower bound of the rejected range
        low: UserKey,

        /// Upper bound of the rejected range
        high: UserKey,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyRangeIndexError: {self:?}")
    }
}

impl std::error::Error for Error {}

/// Index result
pub type Result<T> = std::result::Result<T, Error>;
