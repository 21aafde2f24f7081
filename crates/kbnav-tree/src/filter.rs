//! Path resolution and name filtering over the materialized forest.
//!
//! Everything here is pure: filtering never triggers a load, so an
//! unexpanded root contributes nothing below itself.

use std::collections::BTreeSet;
use std::sync::Arc;

use kbnav_core::types::NodeKey;

use crate::node::{Forest, Node};

/// Names from the root down to the node. Empty if the key is absent.
pub fn path_of(forest: &Forest, key: &NodeKey) -> Vec<String> {
    forest.find_path(key)
}

/// The node's path joined with `separator`, e.g. `Handbook / People`.
pub fn breadcrumb(forest: &Forest, key: &NodeKey, separator: &str) -> String {
    path_of(forest, key).join(separator)
}

/// Case-insensitive substring filter.
///
/// A node is kept if its name matches or if any descendant is kept, so the
/// ancestors of every match stay visible. A blank query keeps everything.
pub fn filter(forest: &Forest, query: &str) -> Forest {
    let Some(needle) = normalize(query) else {
        return forest.clone();
    };
    Forest::new(
        forest
            .roots()
            .iter()
            .filter_map(|root| filter_node(root, &needle))
            .collect(),
    )
}

/// Keys of every ancestor of a matching node, for auto-expanding a
/// filtered view. Blank queries match nothing.
pub fn matching_ancestor_keys(forest: &Forest, query: &str) -> Vec<NodeKey> {
    let Some(needle) = normalize(query) else {
        return Vec::new();
    };
    let mut keys = BTreeSet::new();
    let mut path = Vec::new();
    for root in forest.roots() {
        collect_ancestors(root, &needle, &mut path, &mut keys);
    }
    keys.into_iter().collect()
}

fn normalize(query: &str) -> Option<String> {
    let query = query.trim();
    (!query.is_empty()).then(|| query.to_lowercase())
}

fn matches(node: &Node, needle: &str) -> bool {
    node.name().to_lowercase().contains(needle)
}

fn filter_node(node: &Arc<Node>, needle: &str) -> Option<Arc<Node>> {
    let children = node.children().map(|children| {
        children
            .iter()
            .filter_map(|child| filter_node(child, needle))
            .collect::<Vec<_>>()
    });
    let any_kept = children.as_ref().is_some_and(|kept| !kept.is_empty());
    if !matches(node, needle) && !any_kept {
        return None;
    }

    match (node.children(), children) {
        (Some(before), Some(kept))
            if before.len() != kept.len()
                || before.iter().zip(&kept).any(|(a, b)| !Arc::ptr_eq(a, b)) =>
        {
            // Leaf state follows the kept children.
            Some(Arc::new(node.with_children(kept)))
        }
        _ => Some(Arc::clone(node)),
    }
}

fn collect_ancestors(
    node: &Arc<Node>,
    needle: &str,
    path: &mut Vec<NodeKey>,
    keys: &mut BTreeSet<NodeKey>,
) {
    if matches(node, needle) {
        keys.extend(path.iter().cloned());
    }
    if let Some(children) = node.children() {
        path.push(node.key().clone());
        for child in children {
            collect_ancestors(child, needle, path, keys);
        }
        path.pop();
    }
}
