// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Red-black interval tree mapping data file key ranges to file IDs.
//!
//! Keyed by `(low, high)`, augmented with `subtree_max_high` for pruning
//! during stabbing queries. Exact duplicate ranges merge into one node so
//! the balancing algorithm never sees duplicate keys.

mod node;

#[doc(hidden)]
pub mod verify;

use crate::{FileId, HashSet, KeyRange, UserKey};
use node::{Color, Node, NodeId, NIL};
use std::cmp::Ordering;

/// A red-black tree of key ranges supporting interval-stabbing queries.
///
/// [`KeyRangeLookupTree::insert`] associates a file ID with a closed
/// `[low, high]` key range; [`KeyRangeLookupTree::query`] returns every file
/// ID whose range contains a given key. Inserting an already-present range
/// merges the file ID into the existing node instead of creating a duplicate
/// tree key.
///
/// There is no remove operation; the index is built once and queried many
/// times. Nodes live in an arena and are linked by indices, with parent
/// back-references used only while rebalancing.
pub struct KeyRangeLookupTree {
    root: NodeId,
    nodes: Vec<Node>,
}

impl KeyRangeLookupTree {
    /// Creates a new empty lookup tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: NIL,
            nodes: Vec::new(),
        }
    }

    /// Returns the number of distinct ranges in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree contains no ranges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Associates `file_id` with the closed key range `[low, high]`. O(log n).
    ///
    /// If the exact same `(low, high)` pair was inserted before, `file_id`
    /// joins the existing node's ID set (idempotently) and the tree shape is
    /// untouched. Point ranges (`low == high`) are valid.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidRange`] if `low > high`; the tree is
    /// left unchanged.
    pub fn insert<L, H, F>(&mut self, low: L, high: H, file_id: F) -> crate::Result<()>
    where
        L: Into<UserKey>,
        H: Into<UserKey>,
        F: Into<FileId>,
    {
        let range = KeyRange::new(low.into(), high.into())?;
        let file_id = file_id.into();

        if self.root == NIL {
            let id = self.alloc(Node::new(range, file_id));
            self.node_mut(id).color = Color::Black;
            self.root = id;
            return Ok(());
        }

        // Standard BST descent on the (low, high) tuple
        let mut current = self.root;

        let (parent, is_left_child) = loop {
            let node = self.node(current);

            match range.cmp(&node.range) {
                Ordering::Equal => {
                    // Exact same range: merge instead of creating a duplicate
                    // key. No structural change, and high is unchanged, so
                    // the augmentation is unaffected.
                    log::trace!("merging file ID into existing node for {range:?}");
                    self.node_mut(current).add_file_id(file_id);
                    return Ok(());
                }
                Ordering::Less => {
                    if node.left == NIL {
                        break (current, true);
                    }
                    current = node.left;
                }
                Ordering::Greater => {
                    if node.right == NIL {
                        break (current, false);
                    }
                    current = node.right;
                }
            }
        };

        log::trace!("attaching new node for {range:?}");

        let id = self.alloc(Node::new(range, file_id));
        self.node_mut(id).parent = parent;

        if is_left_child {
            self.node_mut(parent).left = id;
        } else {
            self.node_mut(parent).right = id;
        }

        self.refresh_max_high_upwards(parent);
        self.fix_insert(id);

        Ok(())
    }

    /// Returns every file ID whose range contains `key`, or an empty set.
    ///
    /// Ranges may overlap, so every subtree that can possibly contain `key`
    /// is visited; `subtree_max_high` prunes the rest. O(log n + m) where m
    /// is the number of explored nodes. Never mutates the tree.
    #[must_use]
    pub fn query<K: AsRef<[u8]>>(&self, key: K) -> HashSet<FileId> {
        let key = key.as_ref();

        let mut matches = HashSet::default();

        // Explicit stack instead of recursion, so traversal depth is bounded
        // by tree height
        let mut stack = Vec::new();

        if self.root != NIL {
            stack.push(self.root);
        }

        while let Some(id) = stack.pop() {
            let node = self.node(id);

            if node.range.contains_key(key) {
                matches.extend(node.file_ids.iter().cloned());
            }

            // The left subtree can only match if some range down there
            // reaches up to the key
            if node.left != NIL && &*self.node(node.left).subtree_max_high >= key {
                stack.push(node.left);
            }

            // Everything to the right has a low bound >= ours, so once our
            // own low bound is past the key, nothing to the right can match
            if node.right != NIL && &**node.range.low() <= key {
                stack.push(node.right);
            }
        }

        matches
    }

    /// Height of the tree in nodes (an empty tree has height 0).
    #[doc(hidden)]
    #[must_use]
    pub fn height(&self) -> usize {
        fn height_of(tree: &KeyRangeLookupTree, id: NodeId) -> usize {
            if id == NIL {
                return 0;
            }

            let node = tree.node(id);
            1 + height_of(tree, node.left).max(height_of(tree, node.right))
        }

        height_of(self, self.root)
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "data file counts never approach the u32 sentinel"
        )]
        let id = self.nodes.len() as NodeId;
        debug_assert!(id != NIL, "node arena full");

        self.nodes.push(node);
        id
    }

    #[expect(
        clippy::indexing_slicing,
        reason = "node IDs are only handed out by the arena"
    )]
    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id as usize]
    }

    #[expect(
        clippy::indexing_slicing,
        reason = "node IDs are only handed out by the arena"
    )]
    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id as usize]
    }

    /// Color of a node, treating nil as black.
    fn color(&self, id: NodeId) -> Color {
        if id == NIL {
            Color::Black
        } else {
            self.node(id).color
        }
    }

    /// Recomputes `subtree_max_high` for one node from its own high bound
    /// and its children's augmentation values.
    fn refresh_max_high(&mut self, id: NodeId) {
        let (left, right, mut max) = {
            let node = self.node(id);
            (node.left, node.right, node.range.high().clone())
        };

        if left != NIL && self.node(left).subtree_max_high > max {
            max = self.node(left).subtree_max_high.clone();
        }

        if right != NIL && self.node(right).subtree_max_high > max {
            max = self.node(right).subtree_max_high.clone();
        }

        self.node_mut(id).subtree_max_high = max;
    }

    /// Recomputes the augmentation along the path from `id` up to the root,
    /// after a new node was attached below `id`.
    fn refresh_max_high_upwards(&mut self, mut id: NodeId) {
        while id != NIL {
            self.refresh_max_high(id);
            id = self.node(id).parent;
        }
    }

    /// Restores the red-black invariants after attaching a red leaf.
    ///
    /// Standard uncle-red recolor / uncle-black rotate cases, walking toward
    /// the root. Rotations repair the augmentation of the nodes they move,
    /// so nothing else needs recomputing here.
    fn fix_insert(&mut self, mut id: NodeId) {
        while id != self.root && self.color(self.node(id).parent) == Color::Red {
            let parent = self.node(id).parent;

            // The parent is red, so it cannot be the root: a grandparent exists
            let grandparent = self.node(parent).parent;

            if parent == self.node(grandparent).left {
                let uncle = self.node(grandparent).right;

                if self.color(uncle) == Color::Red {
                    self.node_mut(parent).color = Color::Black;
                    self.node_mut(uncle).color = Color::Black;
                    self.node_mut(grandparent).color = Color::Red;
                    id = grandparent;
                } else {
                    if id == self.node(parent).right {
                        self.rotate_left(parent);
                        id = parent;
                    }

                    let parent = self.node(id).parent;
                    let grandparent = self.node(parent).parent;
                    self.node_mut(parent).color = Color::Black;
                    self.node_mut(grandparent).color = Color::Red;
                    self.rotate_right(grandparent);
                }
            } else {
                // Mirror image
                let uncle = self.node(grandparent).left;

                if self.color(uncle) == Color::Red {
                    self.node_mut(parent).color = Color::Black;
                    self.node_mut(uncle).color = Color::Black;
                    self.node_mut(grandparent).color = Color::Red;
                    id = grandparent;
                } else {
                    if id == self.node(parent).left {
                        self.rotate_right(parent);
                        id = parent;
                    }

                    let parent = self.node(id).parent;
                    let grandparent = self.node(parent).parent;
                    self.node_mut(parent).color = Color::Black;
                    self.node_mut(grandparent).color = Color::Red;
                    self.rotate_left(grandparent);
                }
            }
        }

        let root = self.root;
        self.node_mut(root).color = Color::Black;
    }

    /// Left-rotates around `x`, then repairs the augmentation of the two
    /// nodes whose subtree membership changed.
    fn rotate_left(&mut self, x: NodeId) {
        let y = self.node(x).right;
        debug_assert!(y != NIL, "left rotation requires a right child");

        let y_left = self.node(y).left;
        let x_parent = self.node(x).parent;

        self.node_mut(x).right = y_left;
        if y_left != NIL {
            self.node_mut(y_left).parent = x;
        }

        self.node_mut(y).parent = x_parent;

        if x == self.root {
            self.root = y;
        } else if x == self.node(x_parent).left {
            self.node_mut(x_parent).left = y;
        } else {
            self.node_mut(x_parent).right = y;
        }

        self.node_mut(y).left = x;
        self.node_mut(x).parent = y;

        // x is now below y
        self.refresh_max_high(x);
        self.refresh_max_high(y);
    }

    /// Right-rotates around `y`; mirror of [`Self::rotate_left`].
    fn rotate_right(&mut self, y: NodeId) {
        let x = self.node(y).left;
        debug_assert!(x != NIL, "right rotation requires a left child");

        let x_right = self.node(x).right;
        let y_parent = self.node(y).parent;

        self.node_mut(y).left = x_right;
        if x_right != NIL {
            self.node_mut(x_right).parent = y;
        }

        self.node_mut(x).parent = y_parent;

        if y == self.root {
            self.root = x;
        } else if y == self.node(y_parent).right {
            self.node_mut(y_parent).right = x;
        } else {
            self.node_mut(y_parent).left = x;
        }

        self.node_mut(x).right = y;
        self.node_mut(y).parent = x;

        self.refresh_max_high(y);
        self.refresh_max_high(x);
    }
}

impl Default for KeyRangeLookupTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn tree_empty_query() {
        let tree = KeyRangeLookupTree::new();

        assert!(tree.is_empty());
        assert_eq!(0, tree.len());
        assert!(tree.query("00500").is_empty());
    }

    #[test]
    fn tree_point_range() {
        let mut tree = KeyRangeLookupTree::new();
        tree.insert("00042", "00042", "f").unwrap();

        assert_eq!(1, tree.query("00042").len());
        assert!(tree.query("00041").is_empty());
        assert!(tree.query("00043").is_empty());
    }

    #[test]
    fn tree_merge_is_idempotent() {
        let mut tree = KeyRangeLookupTree::new();
        tree.insert("00100", "00200", "f1").unwrap();
        tree.insert("00100", "00200", "f1").unwrap();
        tree.insert("00100", "00200", "f2").unwrap();

        assert_eq!(1, tree.len());
        assert_eq!(2, tree.query("00150").len());
    }

    #[test]
    fn tree_invalid_range_rejected() {
        let mut tree = KeyRangeLookupTree::new();

        assert!(matches!(
            tree.insert("00200", "00100", "f"),
            Err(crate::Error::InvalidRange { .. })
        ));
        assert!(tree.is_empty());
    }

    #[test]
    fn tree_sorted_inserts_stay_balanced() {
        let mut tree = KeyRangeLookupTree::new();

        // Ascending inserts force the worst case for an unbalanced BST
        for i in 0..1024_u32 {
            let low = format!("{i:05}");
            let high = format!("{:05}", i + 1);
            tree.insert(low, high, format!("file-{i}")).unwrap();
        }

        assert_eq!(1024, tree.len());

        // Red-black height is at most 2 * log2(n + 1)
        assert!(tree.height() <= 20, "height too large: {}", tree.height());

        assert!(verify::is_red_black(&tree));
        assert!(verify::is_max_high_consistent(&tree));
        assert!(verify::is_search_tree(&tree));
    }

    #[test]
    fn tree_descending_inserts_stay_balanced() {
        let mut tree = KeyRangeLookupTree::new();

        for i in (0..1024_u32).rev() {
            let low = format!("{i:05}");
            let high = format!("{:05}", i + 1);
            tree.insert(low, high, format!("file-{i}")).unwrap();
        }

        assert_eq!(1024, tree.len());
        assert!(tree.height() <= 20, "height too large: {}", tree.height());

        assert!(verify::is_red_black(&tree));
        assert!(verify::is_max_high_consistent(&tree));
        assert!(verify::is_search_tree(&tree));
    }

    #[test]
    fn tree_overlapping_ranges_all_found() {
        let mut tree = KeyRangeLookupTree::new();
        tree.insert("00100", "00500", "wide").unwrap();
        tree.insert("00200", "00300", "inner").unwrap();
        tree.insert("00250", "00600", "shifted").unwrap();

        let matches = tree.query("00260");
        assert_eq!(3, matches.len());

        let matches = tree.query("00550");
        assert_eq!(1, matches.len());
        assert!(matches.contains(&crate::FileId::from("shifted")));
    }
}
