//! The forest of knowledge bases and its structural queries.
//!
//! A [`Forest`] is a cheap-to-clone list of root nodes. Every change goes
//! through [`Forest::update_node`], which rebuilds only the branch from the
//! touched node up to its root and shares every other subtree by `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use kbnav_core::types::{KnowledgeBaseId, NodeKey, NodeKind};
use kbnav_entity::KnowledgeBase;

use super::model::{Node, NodeEntity};

/// An ordered sequence of root nodes.
#[derive(Debug, Clone, Default)]
pub struct Forest {
    roots: Vec<Arc<Node>>,
}

impl Forest {
    /// Creates a forest from already built root nodes.
    pub fn new(roots: Vec<Arc<Node>>) -> Self {
        Self { roots }
    }

    /// Creates a forest of unloaded roots, one per knowledge base, in
    /// listing order.
    pub fn from_knowledge_bases(knowledge_bases: Vec<KnowledgeBase>) -> Self {
        Self {
            roots: knowledge_bases
                .into_iter()
                .map(|kb| Arc::new(Node::root(kb)))
                .collect(),
        }
    }

    /// Root nodes in display order.
    pub fn roots(&self) -> &[Arc<Node>] {
        &self.roots
    }

    /// Whether the forest has no roots.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// The root node for a knowledge base.
    pub fn root(&self, root_id: &KnowledgeBaseId) -> Option<&Arc<Node>> {
        self.roots
            .iter()
            .find(|node| node.key().root_id() == root_id)
    }

    /// Depth-first lookup across the materialized subtrees.
    pub fn find_by_key(&self, key: &NodeKey) -> Option<&Arc<Node>> {
        self.chain(key).and_then(|chain| chain.last().copied())
    }

    /// Whether the key is present in the materialized forest.
    pub fn contains(&self, key: &NodeKey) -> bool {
        self.find_by_key(key).is_some()
    }

    /// Nodes from the owning root down to the node itself, inclusive.
    pub fn chain(&self, key: &NodeKey) -> Option<Vec<&Arc<Node>>> {
        let root = self.root(key.root_id())?;
        let mut chain = Vec::new();
        if collect_chain(root, key, &mut chain) {
            Some(chain)
        } else {
            None
        }
    }

    /// Strict ancestors of the node, root first.
    pub fn ancestors(&self, key: &NodeKey) -> Vec<&Arc<Node>> {
        let mut chain = self.chain(key).unwrap_or_default();
        chain.pop();
        chain
    }

    /// The direct parent of the node.
    pub fn parent_of(&self, key: &NodeKey) -> Option<&Arc<Node>> {
        self.ancestors(key).last().copied()
    }

    /// Names from the root to the node, root first. Empty if the key is
    /// absent.
    pub fn find_path(&self, key: &NodeKey) -> Vec<String> {
        self.chain(key)
            .map(|chain| chain.iter().map(|node| node.name().to_string()).collect())
            .unwrap_or_default()
    }

    /// Number of folders strictly between the owning root and the node.
    ///
    /// A folder directly under its root has depth 0. Roots and absent keys
    /// have no depth.
    pub fn depth_of(&self, key: &NodeKey) -> Option<usize> {
        if key.kind() == NodeKind::Root {
            return None;
        }
        self.chain(key).map(|chain| chain.len().saturating_sub(2))
    }

    /// Every key of the materialized forest, depth-first.
    pub fn keys(&self) -> Vec<NodeKey> {
        let mut keys = Vec::new();
        for root in &self.roots {
            collect_keys(root, &mut keys);
        }
        keys
    }

    /// The node's key and the keys of all its materialized descendants.
    pub fn subtree_keys(&self, key: &NodeKey) -> Vec<NodeKey> {
        let mut keys = Vec::new();
        if let Some(node) = self.find_by_key(key) {
            collect_keys(node, &mut keys);
        }
        keys
    }

    /// Replaces the node under `key` with `f(node)`, path-copying its
    /// ancestors. Returns `None` if the key is absent.
    ///
    /// If `f` hands back the same `Arc`, the forest is returned unchanged.
    pub fn update_node<F>(&self, key: &NodeKey, f: F) -> Option<Forest>
    where
        F: FnOnce(&Arc<Node>) -> Arc<Node>,
    {
        let index = self
            .roots
            .iter()
            .position(|node| node.key().root_id() == key.root_id())?;
        let mut f = Some(f);
        let next = update_in(&self.roots[index], key, &mut f)?;
        if Arc::ptr_eq(&next, &self.roots[index]) {
            return Some(self.clone());
        }
        let mut roots = self.roots.clone();
        roots[index] = next;
        Some(Forest { roots })
    }

    /// Replaces one node's children, leaving all sibling subtrees intact.
    ///
    /// Incoming children that are structurally equal to the ones already
    /// cached under the same key keep the cached `Arc`, so a refresh that
    /// changes one branch does not change the identity of the others.
    pub fn patch_children(&self, parent_key: &NodeKey, children: Vec<Arc<Node>>) -> Option<Forest> {
        self.update_node(parent_key, |parent| {
            let children = match parent.children() {
                Some(old) => reconcile_list(old, children),
                None => children,
            };
            let candidate = parent.with_children(children);
            if candidate.same_as(parent) {
                Arc::clone(parent)
            } else {
                Arc::new(candidate)
            }
        })
    }

    /// Marks a node as a collapsed leaf after a failed load.
    pub fn mark_load_failed(&self, key: &NodeKey) -> Option<Forest> {
        self.update_node(key, |node| Arc::new(node.as_failed_leaf()))
    }

    /// Records a probe result on an unloaded root.
    pub fn set_root_has_folders(&self, root_id: &KnowledgeBaseId, has_folders: bool) -> Option<Forest> {
        let key = NodeKey::root(root_id.clone());
        self.update_node(&key, |node| {
            if node.has_folders_hint() == Some(has_folders) && !node.load_failed() {
                Arc::clone(node)
            } else {
                Arc::new(node.with_has_folders(has_folders))
            }
        })
    }

    /// Forgets a root's materialized children so the next expansion loads
    /// them again. A failed root goes back to "unknown" expandability.
    pub fn unload_root(&self, root_id: &KnowledgeBaseId) -> Option<Forest> {
        let key = NodeKey::root(root_id.clone());
        self.update_node(&key, |node| match node.entity() {
            NodeEntity::Root(kb) => {
                let mut kb = kb.clone();
                if node.load_failed() {
                    kb.has_folders = None;
                }
                Arc::new(Node::root(kb))
            }
            _ => Arc::clone(node),
        })
    }

    /// Removes a node and its subtree. Returns `None` if the key is absent.
    pub fn remove(&self, key: &NodeKey) -> Option<Forest> {
        if key.is_root() {
            let before = self.roots.len();
            let roots: Vec<_> = self
                .roots
                .iter()
                .filter(|node| node.key() != key)
                .cloned()
                .collect();
            return (roots.len() != before).then_some(Forest { roots });
        }

        let parent_key = self.parent_of(key)?.key().clone();
        self.update_node(&parent_key, |parent| {
            let children: Vec<_> = parent
                .children()
                .unwrap_or_default()
                .iter()
                .filter(|child| child.key() != key)
                .cloned()
                .collect();
            Arc::new(parent.with_children(children))
        })
    }
}

fn collect_chain<'a>(node: &'a Arc<Node>, key: &NodeKey, chain: &mut Vec<&'a Arc<Node>>) -> bool {
    chain.push(node);
    if node.key() == key {
        return true;
    }
    for child in node.children().unwrap_or_default() {
        if collect_chain(child, key, chain) {
            return true;
        }
    }
    chain.pop();
    false
}

fn collect_keys(node: &Arc<Node>, keys: &mut Vec<NodeKey>) {
    keys.push(node.key().clone());
    for child in node.children().unwrap_or_default() {
        collect_keys(child, keys);
    }
}

fn update_in<F>(node: &Arc<Node>, key: &NodeKey, f: &mut Option<F>) -> Option<Arc<Node>>
where
    F: FnOnce(&Arc<Node>) -> Arc<Node>,
{
    if node.key() == key {
        let f = f.take()?;
        return Some(f(node));
    }
    let children = node.children()?;
    for (index, child) in children.iter().enumerate() {
        if let Some(next) = update_in(child, key, f) {
            if Arc::ptr_eq(&next, child) {
                return Some(Arc::clone(node));
            }
            let mut copy = children.to_vec();
            copy[index] = next;
            return Some(Arc::new(node.with_child_list(Some(copy))));
        }
    }
    None
}

fn reconcile_list(old: &[Arc<Node>], new: Vec<Arc<Node>>) -> Vec<Arc<Node>> {
    let cached: HashMap<&NodeKey, &Arc<Node>> = old.iter().map(|node| (node.key(), node)).collect();
    new.into_iter()
        .map(|node| match cached.get(node.key()) {
            Some(previous) => reconcile(previous, node),
            None => node,
        })
        .collect()
}

fn reconcile(old: &Arc<Node>, new: Arc<Node>) -> Arc<Node> {
    if Arc::ptr_eq(old, &new) {
        return new;
    }
    let children = match (old.children(), new.children()) {
        (Some(previous), Some(incoming)) => Some(reconcile_list(previous, incoming.to_vec())),
        (_, incoming) => incoming.map(<[_]>::to_vec),
    };
    let candidate = new.with_child_list(children);
    if candidate.same_as(old) {
        Arc::clone(old)
    } else {
        Arc::new(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::model::FolderEntity;

    fn folder(root: &str, id: &str, name: &str, children: Vec<Arc<Node>>) -> Arc<Node> {
        Arc::new(Node::folder(
            FolderEntity {
                id: id.into(),
                owner_root_id: root.into(),
                parent_folder_id: None,
                name: name.to_string(),
                file_count: 0,
            },
            children,
        ))
    }

    fn folder_key(root: &str, id: &str) -> NodeKey {
        NodeKey::folder(root.into(), id.into())
    }

    fn root_key(root: &str) -> NodeKey {
        NodeKey::root(root.into())
    }

    /// R1 -> { A -> { A1 }, B }, R2 -> { X }
    fn sample() -> Forest {
        let forest = Forest::from_knowledge_bases(vec![
            KnowledgeBase::new("r1", "Handbook").with_folders(true),
            KnowledgeBase::new("r2", "Policies").with_folders(true),
        ]);
        let a1 = folder("r1", "a1", "Onboarding", Vec::new());
        let a = folder("r1", "a", "People", vec![a1]);
        let b = folder("r1", "b", "Finance", Vec::new());
        let forest = forest.patch_children(&root_key("r1"), vec![a, b]).unwrap();
        let x = folder("r2", "x", "Security", Vec::new());
        forest.patch_children(&root_key("r2"), vec![x]).unwrap()
    }

    #[test]
    fn test_find_path_and_depth() {
        let forest = sample();
        assert_eq!(
            forest.find_path(&folder_key("r1", "a1")),
            vec!["Handbook", "People", "Onboarding"]
        );
        assert_eq!(forest.depth_of(&folder_key("r1", "a")), Some(0));
        assert_eq!(forest.depth_of(&folder_key("r1", "a1")), Some(1));
        assert_eq!(forest.depth_of(&root_key("r1")), None);
        assert!(forest.find_path(&folder_key("r1", "missing")).is_empty());
    }

    #[test]
    fn test_same_folder_id_under_other_root_is_distinct() {
        let forest = sample();
        assert!(forest.find_by_key(&folder_key("r2", "a")).is_none());
        assert!(forest.find_by_key(&folder_key("r1", "a")).is_some());
    }

    #[test]
    fn test_update_shares_untouched_subtrees() {
        let forest = sample();
        let before_r2 = Arc::clone(&forest.roots()[1]);
        let before_b = Arc::clone(forest.find_by_key(&folder_key("r1", "b")).unwrap());

        let next = forest
            .patch_children(
                &folder_key("r1", "a1"),
                vec![folder("r1", "c", "Benefits", Vec::new())],
            )
            .unwrap();

        assert!(Arc::ptr_eq(&next.roots()[1], &before_r2));
        assert!(Arc::ptr_eq(
            next.find_by_key(&folder_key("r1", "b")).unwrap(),
            &before_b
        ));
        assert!(!Arc::ptr_eq(&next.roots()[0], &forest.roots()[0]));
        assert_eq!(next.depth_of(&folder_key("r1", "c")), Some(2));
        // The original snapshot is untouched.
        assert!(forest.find_by_key(&folder_key("r1", "c")).is_none());
    }

    #[test]
    fn test_patch_reuses_structurally_equal_children() {
        let forest = sample();
        let before_a = Arc::clone(forest.find_by_key(&folder_key("r1", "a")).unwrap());

        // Fresh records for the same structure, minus B.
        let a1 = folder("r1", "a1", "Onboarding", Vec::new());
        let a = folder("r1", "a", "People", vec![a1]);
        let next = forest.patch_children(&root_key("r1"), vec![a]).unwrap();

        assert!(Arc::ptr_eq(
            next.find_by_key(&folder_key("r1", "a")).unwrap(),
            &before_a
        ));
        assert!(!next.contains(&folder_key("r1", "b")));
    }

    #[test]
    fn test_identical_patch_returns_same_root() {
        let forest = sample();
        let a1 = folder("r1", "a1", "Onboarding", Vec::new());
        let a = folder("r1", "a", "People", vec![a1]);
        let b = folder("r1", "b", "Finance", Vec::new());
        let next = forest.patch_children(&root_key("r1"), vec![a, b]).unwrap();
        assert!(Arc::ptr_eq(&next.roots()[0], &forest.roots()[0]));
    }

    #[test]
    fn test_remove_folder_and_subtree_keys() {
        let forest = sample();
        assert_eq!(
            forest.subtree_keys(&folder_key("r1", "a")),
            vec![folder_key("r1", "a"), folder_key("r1", "a1")]
        );
        let next = forest.remove(&folder_key("r1", "a")).unwrap();
        assert!(!next.contains(&folder_key("r1", "a")));
        assert!(!next.contains(&folder_key("r1", "a1")));
        assert!(next.contains(&folder_key("r1", "b")));
        assert!(forest.remove(&folder_key("r1", "zzz")).is_none());
    }

    #[test]
    fn test_removing_last_child_makes_parent_leaf() {
        let forest = sample();
        let next = forest.remove(&folder_key("r1", "a1")).unwrap();
        assert!(next.find_by_key(&folder_key("r1", "a")).unwrap().is_leaf());
    }

    #[test]
    fn test_mark_load_failed_and_unload() {
        let forest = sample();
        let failed = forest.mark_load_failed(&root_key("r1")).unwrap();
        let root = failed.root(&"r1".into()).unwrap();
        assert!(root.is_leaf());
        assert!(root.load_failed());
        assert!(!failed.contains(&folder_key("r1", "a")));

        let unloaded = forest.unload_root(&"r1".into()).unwrap();
        let root = unloaded.root(&"r1".into()).unwrap();
        assert!(!root.is_loaded());
        assert!(!root.is_leaf());
    }

    #[test]
    fn test_set_root_has_folders() {
        let forest = Forest::from_knowledge_bases(vec![KnowledgeBase::new("r1", "Empty")]);
        let next = forest.set_root_has_folders(&"r1".into(), false).unwrap();
        assert!(next.roots()[0].is_leaf());
        let again = next.set_root_has_folders(&"r1".into(), false).unwrap();
        assert!(Arc::ptr_eq(&again.roots()[0], &next.roots()[0]));
    }
}
