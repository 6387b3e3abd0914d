// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! An in-memory index that maps data file key ranges to file IDs.
//!
//! Storage engines keep, for every data file, the minimum and maximum record
//! key the file covers. When looking up a record key, the set of candidate
//! files can be pruned to those whose key range actually contains the key,
//! before paying for a more expensive per-file membership probe (e.g. a bloom
//! filter check).
//!
//! This crate exports a [`KeyRangeLookupTree`]: a red-black tree keyed by
//! `(low, high)` range bounds, augmented with a per-subtree maximum high
//! bound so that a stabbing query ("which ranges contain this key?") only
//! descends into subtrees that can possibly match. Inserting the exact same
//! range twice merges the file IDs into one node, so the balancing algorithm
//! never has to deal with duplicate keys.
//!
//! Keys are opaque byte strings compared lexicographically. Callers must
//! normalize keys so that lexicographic order matches their domain order
//! (e.g. fixed-width zero-padded decimal strings).
//!
//! The structure is single-threaded: `insert` takes `&mut self`, `query`
//! takes `&self`. A fully built tree can be shared for concurrent reads.

#![deny(clippy::all, missing_docs, clippy::cargo)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::indexing_slicing)]
#![warn(clippy::pedantic, clippy::nursery)]
#![warn(clippy::expect_used)]
#![allow(clippy::missing_const_for_fn)]
#![warn(clippy::multiple_crate_versions)]
#![allow(clippy::option_if_let_else)]

mod error;
mod key_range;
mod slice;
mod tree;

/// User defined key (byte array)
pub type UserKey = Slice;

/// Opaque data file identifier (e.g. a file name)
pub type FileId = Slice;

/// Hash set type used for query results
pub type HashSet<K> = std::collections::HashSet<K, rustc_hash::FxBuildHasher>;

pub use {
    error::{Error, Result},
    key_range::KeyRange,
    slice::Slice,
    tree::KeyRangeLookupTree,
};

#[doc(hidden)]
pub use tree::verify;
