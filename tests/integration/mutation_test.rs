//! Folder mutations, depth enforcement, and scoped refresh.

use std::sync::Arc;

use kbnav_core::error::ErrorKind;
use kbnav_core::events::{MutationPhase, TreeEventKind};
use kbnav_gateway::Endpoint;

use crate::helpers::{TestApp, folder, root};

async fn loaded_app() -> TestApp {
    let app = TestApp::new().await;
    app.store.expand(&root("R1")).await.unwrap();
    app.store.expand(&root("R2")).await.unwrap();
    app.gateway.reset_calls();
    app
}

#[tokio::test]
async fn test_depth_limit_chain() {
    let app = loaded_app().await;

    let c = app.store.create_folder(&folder("R1", "A1"), "C").await.unwrap();
    let forest = app.store.current_forest().await;
    assert_eq!(forest.depth_of(&c), Some(2));

    let d = app.store.create_folder(&c, "D").await.unwrap();
    let forest = app.store.current_forest().await;
    assert_eq!(forest.depth_of(&d), Some(3));
    assert_eq!(app.gateway.calls().create_folder, 2);

    app.gateway.reset_calls();
    let err = app.store.create_folder(&d, "E").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::DepthLimitExceeded);
    assert_eq!(app.gateway.calls().total(), 0);

    let forest = app.store.current_forest().await;
    for key in forest.keys() {
        if let Some(depth) = forest.depth_of(&key) {
            assert!(depth <= 3, "{key} is at depth {depth}");
        }
    }
}

#[tokio::test]
async fn test_created_folder_is_visible_without_extra_expansion() {
    let app = loaded_app().await;

    let key = app.store.create_folder(&folder("R1", "B"), "Invoices").await.unwrap();

    assert!(app.store.is_expanded(&folder("R1", "B")).await);
    let forest = app.store.current_forest().await;
    assert_eq!(forest.find_by_key(&key).unwrap().name(), "Invoices");
    assert!(!forest.find_by_key(&folder("R1", "B")).unwrap().is_leaf());
    assert_eq!(app.gateway.calls().folder_tree, 1);
}

#[tokio::test]
async fn test_delete_expanded_folder_keeps_sibling_identity() {
    let app = loaded_app().await;
    app.store.expand(&folder("R1", "B")).await.unwrap();
    let before = app.store.current_forest().await;
    let a_before = Arc::clone(before.find_by_key(&folder("R1", "A")).unwrap());

    app.store.delete_folder(&folder("R1", "B")).await.unwrap();

    let after = app.store.current_forest().await;
    assert!(after.find_by_key(&folder("R1", "B")).is_none());
    assert!(!app.store.currently_expanded_keys().await.contains(&folder("R1", "B")));
    assert!(Arc::ptr_eq(
        after.find_by_key(&folder("R1", "A")).unwrap(),
        &a_before
    ));
}

#[tokio::test]
async fn test_mutation_under_one_root_leaves_other_roots_untouched() {
    let app = loaded_app().await;
    let before = app.store.current_forest().await;
    let r2_before = Arc::clone(&before.roots()[1]);
    let x_before = Arc::clone(before.find_by_key(&folder("R2", "X")).unwrap());

    app.store.create_folder(&folder("R1", "A"), "Benefits").await.unwrap();
    app.store.rename_folder(&folder("R1", "B"), "Accounting").await.unwrap();
    app.store.delete_folder(&folder("R1", "A1")).await.unwrap();

    let after = app.store.current_forest().await;
    assert!(Arc::ptr_eq(&after.roots()[1], &r2_before));
    assert!(Arc::ptr_eq(after.find_by_key(&folder("R2", "X")).unwrap(), &x_before));
    assert!(app.store.cache().is_materialized(&"R2".into()));
}

#[tokio::test]
async fn test_delete_removes_descendants_from_expansion() {
    let app = loaded_app().await;
    app.store.expand(&folder("R1", "A")).await.unwrap();
    app.store.expand(&folder("R1", "A1")).await.unwrap();

    app.store.delete_folder(&folder("R1", "A")).await.unwrap();

    let expanded = app.store.currently_expanded_keys().await;
    assert!(!expanded.contains(&folder("R1", "A")));
    assert!(!expanded.contains(&folder("R1", "A1")));
    assert!(expanded.contains(&root("R1")));
    let forest = app.store.current_forest().await;
    assert!(forest.find_by_key(&folder("R1", "A1")).is_none());
}

#[tokio::test]
async fn test_rejected_create_leaves_cache_untouched() {
    let app = loaded_app().await;
    let before = app.store.current_forest().await;

    let err = app
        .store
        .create_folder(&folder("R1", "A"), "Onboarding")
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::MutationRejected);
    assert_eq!(err.message, "A folder named 'Onboarding' already exists here");
    let after = app.store.current_forest().await;
    assert!(Arc::ptr_eq(&after.roots()[0], &before.roots()[0]));
    assert_eq!(app.gateway.calls().folder_tree, 0);
    assert_eq!(
        app.store.mutations().phase(&"R1".into()),
        MutationPhase::Failed
    );
}

#[tokio::test]
async fn test_rejected_delete_surfaces_server_message() {
    let app = loaded_app().await;
    app.gateway.fail_next(Endpoint::DeleteFolder, "Folder is locked by a scan task");

    let err = app.store.delete_folder(&folder("R1", "B")).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::MutationRejected);
    assert_eq!(err.message, "Folder is locked by a scan task");
    assert!(app.store.current_forest().await.contains(&folder("R1", "B")));
}

#[tokio::test]
async fn test_refresh_drops_folders_deleted_elsewhere() {
    let app = loaded_app().await;
    app.store.expand(&folder("R1", "B")).await.unwrap();
    app.store.select(&folder("R1", "B")).await.unwrap();

    // Another client removes B; our rename of A refreshes R1.
    let other = app.gateway.clone();
    kbnav_gateway::EntityGateway::delete_folder(&other, &"B".into())
        .await
        .unwrap();
    app.store.rename_folder(&folder("R1", "A"), "Staff").await.unwrap();

    assert!(!app.store.currently_expanded_keys().await.contains(&folder("R1", "B")));
    assert_eq!(app.store.selected().await, None);
    assert!(!app.store.current_forest().await.contains(&folder("R1", "B")));
}

#[tokio::test]
async fn test_phases_are_published_in_order() {
    let app = loaded_app().await;
    let mut rx = app.store.subscribe();

    app.store.rename_folder(&folder("R1", "B"), "Accounting").await.unwrap();

    let mut phases = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let TreeEventKind::MutationPhaseChanged { phase, .. } = event.kind {
            phases.push(phase);
        }
    }
    assert_eq!(
        phases,
        vec![
            MutationPhase::Validating,
            MutationPhase::Submitting,
            MutationPhase::Refreshing,
            MutationPhase::Idle,
        ]
    );
}

#[tokio::test]
async fn test_mutations_on_different_roots_run_concurrently() {
    let app = loaded_app().await;
    let gate = app.gateway.gate_next(Endpoint::CreateFolder);
    let store = &app.store;
    let r1 = root("R1");

    let held = store.create_folder(&r1, "Legal");
    let other = async {
        tokio::task::yield_now().await;
        store.rename_folder(&folder("R2", "X"), "Infosec").await.unwrap();
        assert!(store.mutations().is_busy(&"R1".into()));
        gate.notify_one();
    };
    let (held, ()) = tokio::join!(held, other);
    held.unwrap();

    let forest = store.current_forest().await;
    assert_eq!(forest.find_by_key(&folder("R2", "X")).unwrap().name(), "Infosec");
}

#[tokio::test]
async fn test_create_during_first_expansion_shows_new_folder() {
    let app = TestApp::new().await;
    let hold = app.gateway.hold_reply_next(Endpoint::FolderTree);
    let store = &app.store;
    let r1 = root("R1");
    let r1_id = r1.root_id().clone();

    let expand = store.expand(&r1);
    let create = store.create_folder(&r1, "Legal");
    let release = async {
        while store.mutations().phase(&r1_id) != MutationPhase::Refreshing {
            tokio::task::yield_now().await;
        }
        hold.notify_one();
    };
    let (expanded, created, ()) = tokio::join!(expand, create, release);
    expanded.unwrap();
    let key = created.unwrap();

    let forest = store.current_forest().await;
    assert_eq!(forest.find_by_key(&key).unwrap().name(), "Legal");
    assert_eq!(app.gateway.calls().folder_tree, 2);
    assert!(store.is_expanded(&r1).await);
}
