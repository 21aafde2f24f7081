//! Name filtering over the store's visible forest.

use kbnav_tree::{Forest, Node, filter, matching_ancestor_keys};

use crate::helpers::{TestApp, folder, root};

fn visible_keys(forest: &Forest) -> Vec<String> {
    forest.keys().iter().map(ToString::to_string).collect()
}

/// Every kept node either matches or has a kept child.
fn assert_ancestry_closed(node: &Node, needle: &str) {
    let children = node.children().unwrap_or_default();
    let matches = node.name().to_lowercase().contains(needle);
    assert!(
        matches || !children.is_empty(),
        "{} kept without a matching descendant",
        node.key()
    );
    for child in children {
        assert_ancestry_closed(child, needle);
    }
}

#[tokio::test]
async fn test_filter_keeps_ancestors_of_matches() {
    let app = TestApp::new().await;
    app.store.expand(&root("R1")).await.unwrap();

    app.store.set_search_query("board").await;
    let visible = app.store.visible_forest().await;

    let keys = visible_keys(&visible);
    assert!(keys.contains(&root("R1").to_string()));
    assert!(keys.contains(&folder("R1", "A").to_string()));
    assert!(keys.contains(&folder("R1", "A1").to_string()));
    assert!(!keys.contains(&folder("R1", "B").to_string()));
    assert!(!keys.contains(&root("R2").to_string()));
}

#[tokio::test]
async fn test_filter_closure_holds_for_several_queries() {
    let app = TestApp::new().await;
    app.store.expand(&root("R1")).await.unwrap();
    app.store.expand(&root("R2")).await.unwrap();
    let forest = app.store.current_forest().await;

    for query in ["e", "FIN", "sec", "Handbook", "on", "zzz"] {
        let filtered = filter(&forest, query);
        let needle = query.to_lowercase();
        for node in filtered.roots() {
            assert_ancestry_closed(node, &needle);
        }
        for key in filtered.keys() {
            assert!(forest.contains(&key), "{query}: {key} was invented");
        }
    }
}

#[tokio::test]
async fn test_filter_never_loads() {
    let app = TestApp::new().await;

    app.store.set_search_query("Security").await;
    let visible = app.store.visible_forest().await;

    assert!(visible.is_empty());
    assert_eq!(app.gateway.calls().total(), 0);
    assert!(!app.store.cache().is_materialized(&"R2".into()));
}

#[tokio::test]
async fn test_blank_query_shows_everything() {
    let app = TestApp::new().await;
    app.store.expand(&root("R1")).await.unwrap();

    app.store.set_search_query("board").await;
    app.store.set_search_query("   ").await;

    let visible = app.store.visible_forest().await;
    assert_eq!(visible.keys(), app.store.current_forest().await.keys());
}

#[tokio::test]
async fn test_matching_ancestors_expand_to_reveal_matches() {
    let app = TestApp::new().await;
    app.store.expand(&root("R1")).await.unwrap();
    let forest = app.store.current_forest().await;

    let keys = matching_ancestor_keys(&forest, "onboarding");
    assert_eq!(keys.len(), 2);
    assert!(keys.contains(&root("R1")));
    assert!(keys.contains(&folder("R1", "A")));

    for key in &keys {
        app.store.expand(key).await.unwrap();
    }
    assert_eq!(app.gateway.calls().folder_tree, 1);
    assert!(app.store.is_expanded(&folder("R1", "A")).await);
}
