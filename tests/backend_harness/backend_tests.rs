//! Macro-generated test suite for `Backend` contract validation.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod backend_harness;
//!
//! use backend_harness::*;
//! use kindstore::storage::InMemoryBackend;
//!
//! backend_tests!(InMemoryBackend::new());
//! ```
//!
//! # Generated Tests
//!
//! ## CRUD
//! - `test_create_and_get` — create then read back document and revision
//! - `test_get_nonexistent` — unknown key returns None
//! - `test_create_duplicate_key` — second create fails with `KeyExists`
//! - `test_update_with_current_revision` — replaces the document, bumps revision
//! - `test_update_with_stale_revision` — fails with `RevisionMismatch`
//! - `test_update_nonexistent` — fails with `KeyNotFound`
//! - `test_delete_existing` — returns last state, key is gone
//! - `test_delete_with_stale_revision` — fails, key survives
//!
//! ## Listing
//! - `test_list_prefix_scoped_and_sorted`
//! - `test_list_revision_tracks_writes`
//!
//! ## Change feed
//! - `test_watch_sees_writes_in_order`
//! - `test_watch_only_sees_later_writes`
//!
//! ## Concurrency
//! - `test_concurrent_creates` — parallel creates get distinct revisions

/// Generate a full `Backend` conformance test suite.
///
/// `$factory` must evaluate to a fresh backend implementing `Backend + Clone + 'static`.
/// It is re-evaluated for each test to ensure isolation.
#[macro_export]
macro_rules! backend_tests {
    ($factory:expr) => {
        mod backend_contract_tests {
            use super::*;
            use kindstore::core::error::StorageError;
            use kindstore::storage::{Backend, ChangeKind};

            // ==================================================================
            // CRUD
            // ==================================================================

            #[tokio::test]
            async fn test_create_and_get() {
                let backend = $factory;
                let rev = backend
                    .create(&key("default", "svc-a"), document("default", "svc-a", "example.com"))
                    .await
                    .unwrap();
                assert!(rev > 0);

                let stored = backend.get(&key("default", "svc-a")).await.unwrap();
                let stored = stored.expect("document should exist after create");
                assert_eq!(stored.revision, rev);
                assert_eq!(stored.key, key("default", "svc-a"));
                assert_eq!(stored.value["spec"]["host"], "example.com");
            }

            #[tokio::test]
            async fn test_get_nonexistent() {
                let backend = $factory;
                assert!(backend.get(&key("default", "missing")).await.unwrap().is_none());
            }

            #[tokio::test]
            async fn test_create_duplicate_key() {
                let backend = $factory;
                let k = key("default", "svc-a");
                backend.create(&k, document("default", "svc-a", "a.com")).await.unwrap();

                let err = backend
                    .create(&k, document("default", "svc-a", "b.com"))
                    .await
                    .unwrap_err();
                assert!(matches!(err, StorageError::KeyExists { .. }));

                let stored = backend.get(&k).await.unwrap().unwrap();
                assert_eq!(stored.value["spec"]["host"], "a.com");
            }

            #[tokio::test]
            async fn test_update_with_current_revision() {
                let backend = $factory;
                let k = key("default", "svc-a");
                let rev = backend.create(&k, document("default", "svc-a", "a.com")).await.unwrap();

                let new_rev = backend
                    .update(&k, document("default", "svc-a", "b.com"), rev)
                    .await
                    .unwrap();
                assert!(new_rev > rev);

                let stored = backend.get(&k).await.unwrap().unwrap();
                assert_eq!(stored.revision, new_rev);
                assert_eq!(stored.value["spec"]["host"], "b.com");
            }

            #[tokio::test]
            async fn test_update_with_stale_revision() {
                let backend = $factory;
                let k = key("default", "svc-a");
                let rev = backend.create(&k, document("default", "svc-a", "a.com")).await.unwrap();
                backend
                    .update(&k, document("default", "svc-a", "b.com"), rev)
                    .await
                    .unwrap();

                let err = backend
                    .update(&k, document("default", "svc-a", "c.com"), rev)
                    .await
                    .unwrap_err();
                assert!(matches!(err, StorageError::RevisionMismatch { .. }));
                assert_eq!(
                    backend.get(&k).await.unwrap().unwrap().value["spec"]["host"],
                    "b.com"
                );
            }

            #[tokio::test]
            async fn test_update_nonexistent() {
                let backend = $factory;
                let err = backend
                    .update(&key("default", "ghost"), document("default", "ghost", "a.com"), 1)
                    .await
                    .unwrap_err();
                assert!(matches!(err, StorageError::KeyNotFound { .. }));
            }

            #[tokio::test]
            async fn test_delete_existing() {
                let backend = $factory;
                let k = key("default", "svc-a");
                let rev = backend.create(&k, document("default", "svc-a", "a.com")).await.unwrap();

                let removed = backend.delete(&k, Some(rev)).await.unwrap();
                assert_eq!(removed.value["spec"]["host"], "a.com");
                assert!(backend.get(&k).await.unwrap().is_none());

                let err = backend.delete(&k, None).await.unwrap_err();
                assert!(matches!(err, StorageError::KeyNotFound { .. }));
            }

            #[tokio::test]
            async fn test_delete_with_stale_revision() {
                let backend = $factory;
                let k = key("default", "svc-a");
                let rev = backend.create(&k, document("default", "svc-a", "a.com")).await.unwrap();
                backend
                    .update(&k, document("default", "svc-a", "b.com"), rev)
                    .await
                    .unwrap();

                let err = backend.delete(&k, Some(rev)).await.unwrap_err();
                assert!(matches!(err, StorageError::RevisionMismatch { .. }));
                assert!(backend.get(&k).await.unwrap().is_some());
            }

            // ==================================================================
            // Listing
            // ==================================================================

            #[tokio::test]
            async fn test_list_prefix_scoped_and_sorted() {
                let backend = $factory;
                for (ns, name) in [("prod", "b"), ("default", "c"), ("default", "a"), ("prod", "a")] {
                    backend.create(&key(ns, name), document(ns, name, "x.com")).await.unwrap();
                }
                backend
                    .create("/harness/other/default/a", document("default", "a", "x.com"))
                    .await
                    .unwrap();

                let all = backend.list(PREFIX).await.unwrap();
                let keys: Vec<&str> = all.items.iter().map(|o| o.key.as_str()).collect();
                assert_eq!(
                    keys,
                    vec![
                        key("default", "a"),
                        key("default", "c"),
                        key("prod", "a"),
                        key("prod", "b"),
                    ]
                );

                let prod = backend.list(&format!("{}prod/", PREFIX)).await.unwrap();
                assert_eq!(prod.items.len(), 2);

                let empty = backend.list("/nothing/here/").await.unwrap();
                assert!(empty.items.is_empty());
            }

            #[tokio::test]
            async fn test_list_revision_tracks_writes() {
                let backend = $factory;
                let before = backend.current_revision().await.unwrap();
                let rev = backend
                    .create(&key("default", "a"), document("default", "a", "x.com"))
                    .await
                    .unwrap();

                let page = backend.list(PREFIX).await.unwrap();
                assert!(rev > before);
                assert_eq!(page.revision, rev);
                assert_eq!(backend.current_revision().await.unwrap(), rev);
            }

            // ==================================================================
            // Change feed
            // ==================================================================

            #[tokio::test]
            async fn test_watch_sees_writes_in_order() {
                let backend = $factory;
                let mut rx = backend.watch();
                let k = key("default", "a");

                let r1 = backend.create(&k, document("default", "a", "a.com")).await.unwrap();
                let r2 = backend
                    .update(&k, document("default", "a", "b.com"), r1)
                    .await
                    .unwrap();
                backend.delete(&k, None).await.unwrap();

                let created = rx.recv().await.unwrap();
                assert_eq!(created.kind, ChangeKind::Created);
                assert_eq!(created.revision, r1);
                assert!(created.prev_value.is_none());
                assert!(created.prev_revision.is_none());

                let updated = rx.recv().await.unwrap();
                assert_eq!(updated.kind, ChangeKind::Updated);
                assert_eq!(updated.revision, r2);
                assert_eq!(
                    updated.prev_value.as_ref().unwrap()["spec"]["host"],
                    "a.com"
                );
                assert_eq!(updated.prev_revision, Some(r1));

                let deleted = rx.recv().await.unwrap();
                assert_eq!(deleted.kind, ChangeKind::Deleted);
                assert!(deleted.revision > r2);
                assert_eq!(deleted.value["spec"]["host"], "b.com");
            }

            #[tokio::test]
            async fn test_watch_only_sees_later_writes() {
                let backend = $factory;
                backend
                    .create(&key("default", "early"), document("default", "early", "a.com"))
                    .await
                    .unwrap();

                let mut rx = backend.watch();
                backend
                    .create(&key("default", "late"), document("default", "late", "a.com"))
                    .await
                    .unwrap();

                let event = rx.recv().await.unwrap();
                assert_eq!(event.key, key("default", "late"));
            }

            // ==================================================================
            // Concurrency
            // ==================================================================

            #[tokio::test]
            async fn test_concurrent_creates() {
                let backend = $factory;
                let mut handles = Vec::new();
                for i in 0..10 {
                    let backend = backend.clone();
                    handles.push(tokio::spawn(async move {
                        let name = format!("svc-{}", i);
                        backend
                            .create(&key("default", &name), document("default", &name, "a.com"))
                            .await
                    }));
                }

                let mut revisions = Vec::new();
                for handle in handles {
                    revisions.push(handle.await.unwrap().unwrap());
                }
                revisions.sort_unstable();
                revisions.dedup();
                assert_eq!(revisions.len(), 10);
                assert_eq!(backend.list(PREFIX).await.unwrap().items.len(), 10);
            }
        }
    };
}
