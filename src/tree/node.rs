// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{FileId, KeyRange, UserKey};

/// Index into the tree's node arena.
pub(crate) type NodeId = u32;

/// Sentinel for absent children, absent parents and the empty root.
pub(crate) const NIL: NodeId = u32::MAX;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Color {
    Red,
    Black,
}

/// One range plus the file IDs associated with exactly that range.
///
/// The range is immutable once the node exists; the ID set only grows.
/// Parent links are non-owning back-references used during rebalancing,
/// ownership of all nodes stays with the arena.
pub(crate) struct Node {
    pub range: KeyRange,

    /// Insertion-ordered set of file IDs; appends deduplicate.
    pub file_ids: Vec<FileId>,

    /// Max `range.high` over this node and both subtrees.
    pub subtree_max_high: UserKey,

    pub color: Color,
    pub parent: NodeId,
    pub left: NodeId,
    pub right: NodeId,
}

impl Node {
    pub fn new(range: KeyRange, file_id: FileId) -> Self {
        let subtree_max_high = range.high().clone();

        Self {
            range,
            file_ids: vec![file_id],
            subtree_max_high,
            color: Color::Red,
            parent: NIL,
            left: NIL,
            right: NIL,
        }
    }

    /// Appends a file ID unless it is already associated with this range.
    ///
    /// Per-range ID sets are small (a handful of data files sharing one
    /// exact range), so a linear scan beats hashing here.
    pub fn add_file_id(&mut self, file_id: FileId) {
        if !self.file_ids.contains(&file_id) {
            self.file_ids.push(file_id);
        }
    }
}
