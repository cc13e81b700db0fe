//! Stage workers: source, map, filter, and reduce.

use super::{handoff, Sequence};
use crate::cancellation::PipelineScope;
use std::future::Future;

/// Emits every element of `seed` in order, then closes the sequence.
pub fn source<T>(scope: &PipelineScope, seed: Vec<T>) -> Sequence<T>
where
    T: Send + 'static,
{
    let (tx, rx) = handoff();
    let token = scope.token();
    scope.spawn_worker("source", async move {
        for item in seed {
            tokio::select! {
                () = token.cancelled() => return,
                sent = tx.send(item) => {
                    if sent.is_err() {
                        return;
                    }
                }
            }
        }
    });
    rx
}

/// Transforms every input item 1:1.
pub fn map<I, O, F>(scope: &PipelineScope, mut input: Sequence<I>, mut transform: F) -> Sequence<O>
where
    I: Send + 'static,
    O: Send + 'static,
    F: FnMut(I) -> O + Send + 'static,
{
    let (tx, rx) = handoff();
    let token = scope.token();
    scope.spawn_worker("map", async move {
        loop {
            let item = tokio::select! {
                () = token.cancelled() => return,
                received = input.recv() => match received {
                    Some(item) => item,
                    None => return,
                },
            };
            let output = transform(item);
            tokio::select! {
                () = token.cancelled() => return,
                sent = tx.send(output) => {
                    if sent.is_err() {
                        return;
                    }
                }
            }
        }
    });
    rx
}

/// Transforms every input item 1:1 with an awaited body.
///
/// Cancellation interrupts an in-flight transformation, so long waits inside
/// the body (network calls, poll timers) do not pin the worker after a
/// shutdown.
pub fn map_async<I, O, F, Fut>(
    scope: &PipelineScope,
    mut input: Sequence<I>,
    mut transform: F,
) -> Sequence<O>
where
    I: Send + 'static,
    O: Send + 'static,
    F: FnMut(I) -> Fut + Send + 'static,
    Fut: Future<Output = O> + Send,
{
    let (tx, rx) = handoff();
    let token = scope.token();
    scope.spawn_worker("map_async", async move {
        loop {
            let item = tokio::select! {
                () = token.cancelled() => return,
                received = input.recv() => match received {
                    Some(item) => item,
                    None => return,
                },
            };
            let output = tokio::select! {
                () = token.cancelled() => return,
                output = transform(item) => output,
            };
            tokio::select! {
                () = token.cancelled() => return,
                sent = tx.send(output) => {
                    if sent.is_err() {
                        return;
                    }
                }
            }
        }
    });
    rx
}

/// Forwards only the items matching `predicate`.
pub fn filter<T, P>(scope: &PipelineScope, mut input: Sequence<T>, mut predicate: P) -> Sequence<T>
where
    T: Send + 'static,
    P: FnMut(&T) -> bool + Send + 'static,
{
    let (tx, rx) = handoff();
    let token = scope.token();
    scope.spawn_worker("filter", async move {
        loop {
            let item = tokio::select! {
                () = token.cancelled() => return,
                received = input.recv() => match received {
                    Some(item) => item,
                    None => return,
                },
            };
            if !predicate(&item) {
                continue;
            }
            tokio::select! {
                () = token.cancelled() => return,
                sent = tx.send(item) => {
                    if sent.is_err() {
                        return;
                    }
                }
            }
        }
    });
    rx
}

/// Folds all input items into one accumulator, emitted once at exhaustion.
pub fn reduce<T, A, F>(
    scope: &PipelineScope,
    mut input: Sequence<T>,
    init: A,
    mut fold: F,
) -> Sequence<A>
where
    T: Send + 'static,
    A: Send + 'static,
    F: FnMut(A, T) -> A + Send + 'static,
{
    let (tx, rx) = handoff();
    let token = scope.token();
    scope.spawn_worker("reduce", async move {
        let mut acc = init;
        loop {
            let item = tokio::select! {
                () = token.cancelled() => return,
                received = input.recv() => match received {
                    Some(item) => item,
                    None => break,
                },
            };
            acc = fold(acc, item);
        }
        tokio::select! {
            () = token.cancelled() => {}
            _ = tx.send(acc) => {}
        }
    });
    rx
}

/// Drains a sequence into a `Vec`, in arrival order.
pub async fn collect<T>(mut input: Sequence<T>) -> Vec<T> {
    let mut items = Vec::new();
    while let Some(item) = input.recv().await {
        items.push(item);
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_source_preserves_order() {
        let scope = PipelineScope::new();
        let out = collect(source(&scope, vec![3, 1, 4, 1, 5])).await;
        assert_eq!(out, vec![3, 1, 4, 1, 5]);
        scope.join().await;
    }

    #[tokio::test]
    async fn test_map_preserves_count() {
        let scope = PipelineScope::new();
        let squared = map(&scope, source(&scope, (1..=10).collect()), |n: i64| n * n);
        let out = collect(squared).await;
        assert_eq!(out.len(), 10);
        assert_eq!(out[0], 1);
        assert_eq!(out[9], 100);
        scope.join().await;
    }

    #[tokio::test]
    async fn test_map_changes_type() {
        let scope = PipelineScope::new();
        let labels = map(&scope, source(&scope, vec![1, 2]), |n: i32| format!("#{n}"));
        assert_eq!(collect(labels).await, vec!["#1", "#2"]);
        scope.join().await;
    }

    #[tokio::test]
    async fn test_filter_keeps_matching_only() {
        let scope = PipelineScope::new();
        let odds = filter(&scope, source(&scope, (1..=10).collect()), |n: &i64| {
            n % 2 != 0
        });
        let out = collect(odds).await;
        assert_eq!(out, vec![1, 3, 5, 7, 9]);
        scope.join().await;
    }

    #[tokio::test]
    async fn test_reduce_emits_once() {
        let scope = PipelineScope::new();
        let total = reduce(&scope, source(&scope, (1..=4).collect()), 0i64, |acc, n| {
            acc + n
        });
        assert_eq!(collect(total).await, vec![10]);
        scope.join().await;
    }

    #[tokio::test]
    async fn test_squared_odd_sum_is_165() {
        let scope = PipelineScope::new();
        let numbers = source(&scope, (1..=10).collect());
        let squared = map(&scope, numbers, |n: i64| n * n);
        let odd = filter(&scope, squared, |n: &i64| n % 2 != 0);
        let total = reduce(&scope, odd, 0i64, |acc, n| acc + n);
        assert_eq!(collect(total).await, vec![165]);
        scope.join().await;
    }

    #[tokio::test]
    async fn test_map_async_awaits_body() {
        let scope = PipelineScope::new();
        let doubled = map_async(&scope, source(&scope, vec![1, 2, 3]), |n: i64| async move {
            tokio::time::sleep(Duration::from_millis(1)).await;
            n * 2
        });
        assert_eq!(collect(doubled).await, vec![2, 4, 6]);
        scope.join().await;
    }

    #[tokio::test]
    async fn test_handoff_backpressure_bounds_progress() {
        let scope = PipelineScope::new();
        let processed = Arc::new(AtomicUsize::new(0));
        let counter = processed.clone();

        let out = map(&scope, source(&scope, (0..100).collect()), move |n: i64| {
            counter.fetch_add(1, Ordering::SeqCst);
            n
        });

        // Nothing is consumed, so the chain can only run ahead by the items
        // held in the two handoffs plus the one in the map worker's hand.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(processed.load(Ordering::SeqCst) <= 3);

        let drained = collect(out).await;
        assert_eq!(drained.len(), 100);
        assert_eq!(processed.load(Ordering::SeqCst), 100);
        scope.join().await;
    }

    #[tokio::test]
    async fn test_cancel_unblocks_worker_stuck_on_handoff() {
        let scope = PipelineScope::new();
        // Keep the receiver alive but never consume it, so the source worker
        // parks on a full handoff.
        let rx = source(&scope, (0..100).collect::<Vec<i64>>());

        tokio::time::sleep(Duration::from_millis(10)).await;
        tokio::time::timeout(Duration::from_secs(1), scope.shutdown("test over"))
            .await
            .expect("cancel should unblock the parked source");
        drop(rx);
    }

    #[tokio::test]
    async fn test_dropped_consumer_unwinds_workers() {
        let scope = PipelineScope::new();
        let out = map(&scope, source(&scope, (0..100).collect()), |n: i64| n + 1);
        drop(out);

        tokio::time::timeout(Duration::from_secs(1), scope.join())
            .await
            .expect("workers should exit once their downstream is gone");
    }
}
