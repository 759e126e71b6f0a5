// Copyright 2025 Dynscope Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Integration tests for isolation across concurrent execution contexts:
//! threads and tasks never observe each other's bindings, nothing is
//! inherited implicitly on spawn, and snapshots are the explicit
//! propagation path.

use std::sync::Arc;
use std::sync::Barrier;
use std::sync::atomic::{AtomicUsize, Ordering};

use dynscope::{Bindings, ContextKey, Snapshot};
use once_cell::sync::Lazy;
use pretty_assertions::assert_eq;

static SHARED_KEY: Lazy<ContextKey<String>> = Lazy::new(|| ContextKey::with_label("shared"));
static TASK_KEY: Lazy<ContextKey<usize>> = Lazy::new(|| ContextKey::with_label("task"));

#[test]
fn concurrent_threads_with_same_key_stay_isolated() {
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = ["left", "right"]
        .into_iter()
        .map(|own| {
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                Bindings::new()
                    .bind(&SHARED_KEY, own.to_string())
                    .run(|| {
                        // Force both threads inside their scopes at once.
                        barrier.wait();
                        let seen = SHARED_KEY.get_cloned().unwrap();
                        barrier.wait();
                        seen
                    })
                    .unwrap()
            })
        })
        .collect();

    let mut seen: Vec<String> = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .collect();
    seen.sort();

    assert_eq!(seen, vec!["left".to_string(), "right".to_string()]);
}

#[test]
fn spawned_thread_inherits_nothing() {
    let key: ContextKey<String> = ContextKey::new();

    Bindings::new()
        .bind(&key, "parent".to_string())
        .run(|| {
            let key = key.clone();
            let bound_in_child = std::thread::spawn(move || key.is_bound())
                .join()
                .unwrap();
            assert!(!bound_in_child);
        })
        .unwrap();
}

#[test]
fn snapshot_reinstates_bindings_in_another_thread() {
    let key: ContextKey<String> = ContextKey::new();

    Bindings::new()
        .bind(&key, "parent".to_string())
        .run(|| {
            let snapshot = Snapshot::capture();
            let key = key.clone();
            let seen = std::thread::spawn(move || {
                assert!(!key.is_bound());
                snapshot.run(|| key.get_cloned().unwrap())
            })
            .join()
            .unwrap();
            assert_eq!(seen, "parent");
        })
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_tasks_with_same_key_stay_isolated() {
    let mismatches = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for own in 0..64usize {
        let mismatches = Arc::clone(&mismatches);
        let fut = Bindings::new()
            .bind(&TASK_KEY, own)
            .run_future(async move {
                for _ in 0..8 {
                    // Interleave with the other tasks; each resumption may
                    // land on a different worker thread.
                    tokio::task::yield_now().await;
                    if TASK_KEY.get_cloned().unwrap() != own {
                        mismatches.fetch_add(1, Ordering::Relaxed);
                    }
                }
                TASK_KEY.get_cloned().unwrap()
            })
            .unwrap();
        handles.push(tokio::spawn(fut));
    }

    for (own, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.await.unwrap(), own);
    }
    assert_eq!(mismatches.load(Ordering::Relaxed), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn spawned_task_inherits_nothing_without_a_snapshot() {
    let fut = Bindings::new()
        .bind(&TASK_KEY, 7usize)
        .run_future(async {
            let plain = tokio::spawn(async { TASK_KEY.is_bound() });
            let wrapped = tokio::spawn(
                Snapshot::capture().wrap(async { TASK_KEY.get_cloned().unwrap() }),
            );
            (plain.await.unwrap(), wrapped.await.unwrap())
        })
        .unwrap();

    let (plain_bound, wrapped_value) = fut.await;
    assert!(!plain_bound);
    assert_eq!(wrapped_value, 7);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn bindings_survive_await_points() {
    let key: ContextKey<String> = ContextKey::new();

    let fut = Bindings::new()
        .bind(&key, "persistent".to_string())
        .run_future({
            let key = key.clone();
            async move {
                let before = key.get_cloned().unwrap();
                tokio::task::yield_now().await;
                tokio::task::yield_now().await;
                let after = key.get_cloned().unwrap();
                (before, after)
            }
        })
        .unwrap();

    let (before, after) = tokio::spawn(fut).await.unwrap();
    assert_eq!(before, "persistent");
    assert_eq!(after, "persistent");
    assert!(!key.is_bound());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn nested_scoped_futures_shadow_and_restore() {
    let key: ContextKey<String> = ContextKey::new();

    let outer = Bindings::new()
        .bind(&key, "outer".to_string())
        .run_future({
            let key = key.clone();
            async move {
                let inner = Bindings::new()
                    .bind(&key, "inner".to_string())
                    .run_future({
                        let key = key.clone();
                        async move { key.get_cloned().unwrap() }
                    })
                    .unwrap()
                    .await;
                (inner, key.get_cloned().unwrap())
            }
        })
        .unwrap();

    let (inner, outer_after) = outer.await;
    assert_eq!(inner, "inner");
    assert_eq!(outer_after, "outer");
}

#[test]
fn dropping_a_scoped_future_leaks_nothing() {
    let key: ContextKey<String> = ContextKey::new();

    let fut = Bindings::new()
        .bind(&key, "short-lived".to_string())
        .run_future(async { 0u8 })
        .unwrap();

    drop(fut);
    assert!(!key.is_bound());
}
