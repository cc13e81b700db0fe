//! Variadic composition of homogeneous stages.
//!
//! Heterogeneous pipelines are built by nesting the stage functions directly;
//! composition over a `Vec` requires every stage to keep the item type, which
//! is how the applied signing flow is wired.

use super::stage::{filter, map, map_async, reduce};
use super::Sequence;
use crate::cancellation::PipelineScope;
use std::future::Future;

/// A boxed stage that keeps the item type, for variadic composition.
pub type StageFn<T> = Box<dyn FnOnce(&PipelineScope, Sequence<T>) -> Sequence<T> + Send>;

/// Materializes `seed` through `make_source` and applies `stages` left to
/// right.
///
/// An empty stage list returns the source sequence unchanged.
pub fn compose<T, S>(
    scope: &PipelineScope,
    seed: Vec<T>,
    make_source: S,
    stages: Vec<StageFn<T>>,
) -> Sequence<T>
where
    T: Send + 'static,
    S: FnOnce(&PipelineScope, Vec<T>) -> Sequence<T>,
{
    compose_from(scope, make_source(scope, seed), stages)
}

/// Applies `stages` left to right on an already-started sequence.
///
/// This is the mid-pipeline entry point; it builds the same topology as
/// [`compose`] given the same stages.
pub fn compose_from<T>(
    scope: &PipelineScope,
    input: Sequence<T>,
    stages: Vec<StageFn<T>>,
) -> Sequence<T> {
    let mut sequence = input;
    for stage in stages {
        sequence = stage(scope, sequence);
    }
    sequence
}

/// Boxes a 1:1 transform as a composable stage.
pub fn map_stage<T, F>(transform: F) -> StageFn<T>
where
    T: Send + 'static,
    F: FnMut(T) -> T + Send + 'static,
{
    Box::new(move |scope, input| map(scope, input, transform))
}

/// Boxes a 1:1 awaited transform as a composable stage.
pub fn map_async_stage<T, F, Fut>(transform: F) -> StageFn<T>
where
    T: Send + 'static,
    F: FnMut(T) -> Fut + Send + 'static,
    Fut: Future<Output = T> + Send,
{
    Box::new(move |scope, input| map_async(scope, input, transform))
}

/// Boxes a predicate as a composable stage.
pub fn filter_stage<T, P>(predicate: P) -> StageFn<T>
where
    T: Send + 'static,
    P: FnMut(&T) -> bool + Send + 'static,
{
    Box::new(move |scope, input| filter(scope, input, predicate))
}

/// Boxes a fold as a composable stage emitting once at exhaustion.
pub fn reduce_stage<T, F>(init: T, fold: F) -> StageFn<T>
where
    T: Send + 'static,
    F: FnMut(T, T) -> T + Send + 'static,
{
    Box::new(move |scope, input| reduce(scope, input, init, fold))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{collect, source};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_compose_zero_stages_returns_seed_unchanged() {
        let scope = PipelineScope::new();
        let out = collect(compose(&scope, vec![1, 2, 3, 4], source, Vec::new())).await;
        assert_eq!(out, vec![1, 2, 3, 4]);
        scope.join().await;
    }

    #[tokio::test]
    async fn test_compose_squared_odd_sum() {
        let scope = PipelineScope::new();
        let out = collect(compose(
            &scope,
            (1..=10).collect(),
            source,
            vec![
                map_stage(|n: i64| n * n),
                filter_stage(|n: &i64| n % 2 != 0),
                reduce_stage(0, |acc, n| acc + n),
            ],
        ))
        .await;
        assert_eq!(out, vec![165]);
        scope.join().await;
    }

    #[tokio::test]
    async fn test_compose_from_matches_compose() {
        let scope = PipelineScope::new();
        let started = source(&scope, (1..=5).collect());
        let out = collect(compose_from(
            &scope,
            started,
            vec![map_stage(|n: i64| n * 10)],
        ))
        .await;
        assert_eq!(out, vec![10, 20, 30, 40, 50]);
        scope.join().await;
    }

    #[tokio::test]
    async fn test_compose_with_async_stage() {
        let scope = PipelineScope::new();
        let out = collect(compose(
            &scope,
            vec![1, 2, 3],
            source,
            vec![map_async_stage(|n: i64| async move { n + 100 })],
        ))
        .await;
        assert_eq!(out, vec![101, 102, 103]);
        scope.join().await;
    }
}
