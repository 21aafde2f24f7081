//! Loading, caching, and view state through the store.

use std::sync::Arc;

use kbnav_core::error::ErrorKind;
use kbnav_core::events::TreeEventKind;
use kbnav_entity::KnowledgeBase;
use kbnav_gateway::Endpoint;
use kbnav_gateway::memory::MemoryEntityGateway;

use crate::helpers::{TestApp, folder, root};

#[tokio::test]
async fn test_expand_root_fetches_folder_tree_once() {
    let app = TestApp::new().await;

    app.store.expand(&root("R1")).await.unwrap();

    assert_eq!(app.gateway.calls().folder_tree, 1);
    assert_eq!(app.gateway.calls().total(), 1);

    let forest = app.store.current_forest().await;
    let r1 = forest.root(&"R1".into()).unwrap();
    let names: Vec<_> = r1.children().unwrap().iter().map(|n| n.name()).collect();
    assert_eq!(names, vec!["People", "Finance"]);
    assert!(!forest.find_by_key(&folder("R1", "A")).unwrap().is_leaf());
    assert!(forest.find_by_key(&folder("R1", "B")).unwrap().is_leaf());
    assert_eq!(forest.depth_of(&folder("R1", "A1")), Some(1));
}

#[tokio::test]
async fn test_ensure_loaded_twice_is_idempotent() {
    let app = TestApp::new().await;
    let cache = app.store.cache();

    cache.ensure_loaded(&"R1".into()).await.unwrap();
    let first = app.store.current_forest().await;
    cache.ensure_loaded(&"R1".into()).await.unwrap();
    let second = app.store.current_forest().await;

    assert_eq!(app.gateway.calls().folder_tree, 1);
    assert!(Arc::ptr_eq(&first.roots()[0], &second.roots()[0]));
}

#[tokio::test]
async fn test_expanding_folders_does_not_fetch() {
    let app = TestApp::new().await;
    app.store.expand(&root("R1")).await.unwrap();
    app.store.expand(&folder("R1", "A")).await.unwrap();
    app.store.expand(&folder("R1", "A1")).await.unwrap();

    assert_eq!(app.gateway.calls().total(), 1);
    assert_eq!(app.store.currently_expanded_keys().await.len(), 3);
}

#[tokio::test]
async fn test_unexpanded_root_has_expand_affordance() {
    let app = TestApp::new().await;
    let forest = app.store.current_forest().await;
    for node in forest.roots() {
        assert!(!node.is_leaf(), "{} should be expandable", node.key());
        assert!(!node.is_loaded());
    }
}

#[tokio::test]
async fn test_root_without_folders_is_a_leaf_and_never_fetched() {
    let gateway = MemoryEntityGateway::builder()
        .knowledge_base(KnowledgeBase::new("E", "Empty").with_folders(false))
        .build();
    let app = TestApp::with_gateway(gateway).await;

    assert!(app.store.current_forest().await.roots()[0].is_leaf());
    app.store.expand(&root("E")).await.unwrap();
    assert_eq!(app.gateway.calls().folder_tree, 0);
}

#[tokio::test]
async fn test_root_becomes_leaf_after_empty_load() {
    let gateway = MemoryEntityGateway::builder()
        .knowledge_base(KnowledgeBase::new("E", "Empty").with_folders(true))
        .build();
    let app = TestApp::with_gateway(gateway).await;

    assert!(!app.store.current_forest().await.roots()[0].is_leaf());
    app.store.expand(&root("E")).await.unwrap();
    let forest = app.store.current_forest().await;
    assert!(forest.roots()[0].is_leaf());
    assert_eq!(forest.roots()[0].children().map(<[_]>::len), Some(0));
}

#[tokio::test]
async fn test_fetch_failure_is_local_to_one_root() {
    let app = TestApp::new().await;
    app.store.expand(&root("R2")).await.unwrap();
    let r2_before = Arc::clone(&app.store.current_forest().await.roots()[1]);

    app.gateway.fail_next(Endpoint::FolderTree, "backend unavailable");
    let err = app.store.expand(&root("R1")).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::FetchFailure);
    assert_eq!(err.message, "backend unavailable");
    let forest = app.store.current_forest().await;
    assert!(forest.roots()[0].is_leaf());
    assert!(forest.roots()[0].load_failed());
    assert!(Arc::ptr_eq(&forest.roots()[1], &r2_before));
    assert!(!app.store.is_expanded(&root("R1")).await);
}

#[tokio::test]
async fn test_probe_failure_marks_only_that_root() {
    let gateway = MemoryEntityGateway::builder()
        .knowledge_base(KnowledgeBase::new("P", "Probed"))
        .knowledge_base(KnowledgeBase::new("K", "Known").with_folders(true))
        .build();
    gateway.fail_next(Endpoint::HasChildren, "probe timeout");
    let app = TestApp::with_gateway(gateway).await;

    let forest = app.store.current_forest().await;
    assert!(forest.roots()[0].load_failed());
    assert!(!forest.roots()[1].load_failed());
    assert!(!forest.roots()[1].is_leaf());
}

#[tokio::test]
async fn test_probe_is_memoized() {
    let app = TestApp::new().await;

    assert!(app.store.probe(&root("R2")).await.unwrap());
    assert_eq!(app.gateway.calls().has_children, 0);

    app.store.cache().invalidate_root(&"R2".into());
    assert!(app.store.probe(&root("R2")).await.unwrap());
    assert!(app.store.probe(&root("R2")).await.unwrap());
    assert_eq!(app.gateway.calls().has_children, 1);
}

#[tokio::test]
async fn test_reload_resets_expansion_and_identity() {
    let app = TestApp::new().await;
    app.store.expand(&root("R1")).await.unwrap();
    let before = app.store.current_forest().await;

    app.gateway.remove_knowledge_base(&"R2".into()).await;
    app.store.load_forest().await.unwrap();

    let after = app.store.current_forest().await;
    assert_eq!(after.roots().len(), 1);
    assert!(!Arc::ptr_eq(&before.roots()[0], &after.roots()[0]));
    assert!(!after.roots()[0].is_loaded());
    assert!(app.store.currently_expanded_keys().await.is_empty());
    assert!(!app.store.cache().is_materialized(&"R1".into()));
}

#[tokio::test]
async fn test_select_lists_documents_without_caching() {
    let app = TestApp::new().await;
    app.store.expand(&root("R1")).await.unwrap();

    let listing = app.store.select(&folder("R1", "A")).await.unwrap().unwrap();
    assert_eq!(listing.total, 1);
    app.store.collapse(&root("R1")).await;
    app.store.select(&folder("R1", "A")).await.unwrap();

    assert_eq!(app.gateway.calls().list_documents, 2);
    assert_eq!(app.gateway.calls().folder_tree, 1);
}

#[tokio::test]
async fn test_select_page_requires_selection() {
    let app = TestApp::new().await;
    let err = app.store.select_page(2).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_subscribers_see_load_events() {
    let app = TestApp::new().await;
    let mut rx = app.store.subscribe();

    app.store.expand(&root("R1")).await.unwrap();

    let mut kinds = Vec::new();
    while let Ok(event) = rx.try_recv() {
        kinds.push(event.kind);
    }
    assert!(matches!(kinds[0], TreeEventKind::Expanded { .. }));
    assert!(kinds.iter().any(|kind| matches!(
        kind,
        TreeEventKind::RootLoaded { folder_count: 2, .. }
    )));
}
