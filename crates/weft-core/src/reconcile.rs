//! Child list reconciliation.
//!
//! Converts the run of children `current` into `target` with as few host mutations
//! as possible: common prefixes and suffixes are skipped, simple reversals are fixed
//! one node at a time, and the general case keeps the longest increasing run of
//! reused nodes in place and moves or inserts everything around it.

use crate::collections::{fast_map_with_capacity, FastMap};
use crate::lis::longest_increasing_subsequence;
use crate::node::{HostTree, NodeId, TreeError};

/// Make the children of `parent` that currently read `current` read `target`.
///
/// `current` must be exactly the contiguous run of children being managed, in tree
/// order, immediately followed by `marker` when one is given (`None` means the run
/// extends to the end of `parent`). Passing anything else is a caller bug that this
/// function does not detect. Nodes in `target` that are not in `current` are
/// inserted; nodes in `current` missing from `target` are removed.
pub fn reconcile_children<H: HostTree + ?Sized>(
    tree: &mut H,
    parent: NodeId,
    current: &[NodeId],
    target: &[NodeId],
    marker: Option<NodeId>,
) -> Result<(), TreeError> {
    let mut n_start = 0;
    let mut n_end = current.len();
    let mut u_start = 0;
    let mut u_end = target.len();
    // Insertion anchor just past the unresolved range.
    let mut anchor = match current.last() {
        Some(&last) => tree.next_sibling(last),
        None => marker,
    };

    // One move per pass: a move can expose a new common prefix or suffix, and the
    // trims must claim those before anything else moves.
    loop {
        while n_start < n_end && u_start < u_end && current[n_start] == target[u_start] {
            n_start += 1;
            u_start += 1;
        }

        while n_start < n_end && u_start < u_end && current[n_end - 1] == target[u_end - 1] {
            anchor = Some(current[n_end - 1]);
            n_end -= 1;
            u_end -= 1;
        }

        if n_start >= n_end || u_start >= u_end {
            break;
        }

        // The last current node opens the target: move it to the front. After the
        // prefix trim it can't already be first.
        if target[u_start] == current[n_end - 1] {
            tree.insert_before(parent, current[n_end - 1], Some(current[n_start]))?;
            u_start += 1;
            n_end -= 1;
            continue;
        }

        // The first current node closes the target: move it to the back.
        if target[u_end - 1] == current[n_start] {
            tree.insert_before(parent, current[n_start], anchor)?;
            anchor = Some(current[n_start]);
            u_end -= 1;
            n_start += 1;
            continue;
        }

        break;
    }

    if u_start >= u_end {
        log::trace!("reconcile {parent}: removing {} nodes", n_end - n_start);
        for &node in current[n_start..n_end].iter().rev() {
            tree.remove_child(parent, node)?;
        }
        return Ok(());
    }

    if n_start >= n_end {
        log::trace!("reconcile {parent}: inserting {} nodes", u_end - u_start);
        for &node in &target[u_start..u_end] {
            tree.insert_before(parent, node, anchor)?;
        }
        return Ok(());
    }

    let mut target_index: FastMap<NodeId, usize> = fast_map_with_capacity(u_end - u_start);
    for (i, &node) in target.iter().enumerate().take(u_end).skip(u_start) {
        target_index.insert(node, i);
    }

    let mut positions: Vec<Option<usize>> = vec![None; u_end - u_start];
    let mut reused = u_start + (target.len() - u_end);
    let mut to_remove = Vec::new();
    for (i, node) in current.iter().enumerate().take(n_end).skip(n_start) {
        match target_index.get(node) {
            Some(&j) => {
                positions[j - u_start] = Some(i);
                reused += 1;
            }
            None => to_remove.push(*node),
        }
    }

    if reused == 0 {
        let first = current[n_start];
        let last = current[n_end - 1];
        if tree.first_child(parent) == Some(first) && tree.last_child(parent) == Some(last) {
            log::trace!("reconcile {parent}: full replace via clear");
            tree.clear_children(parent)?;
            for &node in &target[u_start..u_end] {
                tree.append_child(parent, node)?;
            }
            return Ok(());
        }
        log::trace!("reconcile {parent}: full replace of a bounded range");
        for &node in &current[n_start..n_end] {
            tree.remove_child(parent, node)?;
        }
        for &node in &target[u_start..u_end] {
            tree.insert_before(parent, node, anchor)?;
        }
        return Ok(());
    }

    let stable = longest_increasing_subsequence(&positions);
    log::trace!(
        "reconcile {parent}: {} removed, {} of {} kept in place",
        to_remove.len(),
        stable.len(),
        u_end - u_start
    );

    for &node in &to_remove {
        tree.remove_child(parent, node)?;
    }

    let mut stable = stable.iter().rev().peekable();
    for i in (u_start..u_end).rev() {
        let node = target[i];
        if stable.peek() == Some(&&(i - u_start)) {
            stable.next();
        } else {
            tree.insert_before(parent, node, anchor)?;
        }
        anchor = Some(node);
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/reconcile_tests.rs"]
mod tests;
