// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Test-time oracle that audits the tree's structural invariants.
//!
//! Read-only: walks node colors, links and keys, never mutates. Meant for
//! tests, not part of the public API.

use super::node::{Color, NodeId, NIL};
use super::KeyRangeLookupTree;
use crate::{KeyRange, UserKey};

/// Returns `true` if the tree satisfies the red-black invariants: the root
/// is black, no red node has a red child, and every root-to-nil path passes
/// through the same number of black nodes.
#[must_use]
pub fn is_red_black(tree: &KeyRangeLookupTree) -> bool {
    if tree.root == NIL {
        return true;
    }

    if tree.node(tree.root).color != Color::Black {
        return false;
    }

    no_red_red(tree, tree.root) && black_height(tree, tree.root).is_some()
}

/// Returns `true` if every node's `subtree_max_high` matches an independent
/// full-subtree scan.
#[must_use]
pub fn is_max_high_consistent(tree: &KeyRangeLookupTree) -> bool {
    tree.root == NIL || audit_max_high(tree, tree.root).is_some()
}

/// Returns `true` if an in-order walk yields strictly increasing
/// `(low, high)` keys. Covers both the BST order invariant and range
/// uniqueness (a duplicate key would not compare strictly greater).
#[must_use]
pub fn is_search_tree(tree: &KeyRangeLookupTree) -> bool {
    let mut previous: Option<&KeyRange> = None;
    in_order_is_sorted(tree, tree.root, &mut previous)
}

fn no_red_red(tree: &KeyRangeLookupTree, id: NodeId) -> bool {
    if id == NIL {
        return true;
    }

    let node = tree.node(id);

    if node.color == Color::Red {
        if node.left != NIL && tree.node(node.left).color == Color::Red {
            return false;
        }
        if node.right != NIL && tree.node(node.right).color == Color::Red {
            return false;
        }
    }

    no_red_red(tree, node.left) && no_red_red(tree, node.right)
}

/// Black node count towards any nil descendant, or `None` if subpaths disagree.
fn black_height(tree: &KeyRangeLookupTree, id: NodeId) -> Option<u32> {
    if id == NIL {
        return Some(1);
    }

    let node = tree.node(id);

    let left = black_height(tree, node.left)?;
    let right = black_height(tree, node.right)?;

    if left != right {
        return None;
    }

    Some(left + u32::from(node.color == Color::Black))
}

/// Recomputed subtree max by full scan, or `None` on the first node whose
/// stored augmentation disagrees.
fn audit_max_high(tree: &KeyRangeLookupTree, id: NodeId) -> Option<UserKey> {
    let node = tree.node(id);

    let mut max = node.range.high().clone();

    if node.left != NIL {
        let left = audit_max_high(tree, node.left)?;
        if left > max {
            max = left;
        }
    }

    if node.right != NIL {
        let right = audit_max_high(tree, node.right)?;
        if right > max {
            max = right;
        }
    }

    if max == node.subtree_max_high {
        Some(max)
    } else {
        None
    }
}

fn in_order_is_sorted<'a>(
    tree: &'a KeyRangeLookupTree,
    id: NodeId,
    previous: &mut Option<&'a KeyRange>,
) -> bool {
    if id == NIL {
        return true;
    }

    let node = tree.node(id);

    if !in_order_is_sorted(tree, node.left, previous) {
        return false;
    }

    if let Some(prev) = previous {
        if **prev >= node.range {
            return false;
        }
    }
    *previous = Some(&node.range);

    in_order_is_sorted(tree, node.right, previous)
}

#[cfg(test)]
#[expect(clippy::unwrap_used)]
mod tests {
    use super::*;
    use test_log::test;

    fn sample_tree() -> KeyRangeLookupTree {
        let mut tree = KeyRangeLookupTree::new();
        tree.insert("00100", "00200", "f1").unwrap();
        tree.insert("00050", "00300", "f2").unwrap();
        tree.insert("00150", "00160", "f3").unwrap();
        tree.insert("00250", "00400", "f4").unwrap();
        tree.insert("00010", "00020", "f5").unwrap();
        tree
    }

    #[test]
    fn verify_accepts_valid_tree() {
        let tree = sample_tree();

        assert!(is_red_black(&tree));
        assert!(is_max_high_consistent(&tree));
        assert!(is_search_tree(&tree));
    }

    #[test]
    fn verify_accepts_empty_tree() {
        let tree = KeyRangeLookupTree::new();

        assert!(is_red_black(&tree));
        assert!(is_max_high_consistent(&tree));
        assert!(is_search_tree(&tree));
    }

    #[test]
    fn verify_detects_red_root() {
        let mut tree = sample_tree();

        let root = tree.root;
        tree.node_mut(root).color = Color::Red;

        assert!(!is_red_black(&tree));
    }

    #[test]
    fn verify_detects_red_red_edge() {
        let mut tree = sample_tree();

        // Paint everything red except the root: some parent-child pair
        // below the root must now violate the red-red rule
        let root = tree.root;
        for id in 0..tree.len() as NodeId {
            if id != root {
                tree.node_mut(id).color = Color::Red;
            }
        }

        assert!(!is_red_black(&tree));
    }

    #[test]
    fn verify_detects_stale_augmentation() {
        let mut tree = sample_tree();

        let root = tree.root;
        tree.node_mut(root).subtree_max_high = UserKey::from("00000");

        assert!(!is_max_high_consistent(&tree));
    }
}
