//! Bounded concurrency for per-target API work.
//!
//! Runs one future per item with at most `max_concurrent` in flight, starting
//! items in input order. Cancellation stops new items from starting; items
//! already in flight run to completion so no remote mutation is abandoned
//! half-way.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::stream::{FuturesUnordered, StreamExt};
use log::debug;

/// Cooperative cancellation flag shared between the signal handler and
/// running batches.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        if !self.0.swap(true, Ordering::SeqCst) {
            debug!("Cancellation requested");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Results of a bounded run.
#[derive(Debug)]
pub struct BoundedRun<R> {
    /// One result per started item, in input order
    pub completed: Vec<R>,
    /// Items never started because of cancellation
    pub not_started: usize,
}

/// Run `work` for each item with at most `max_concurrent` in flight.
///
/// Items start in input order, so the started items always form a prefix of
/// `items` and `completed` lines up with that prefix.
///
/// # Example
///
/// ```ignore
/// let run = run_bounded(org_ids, 8, &cancel, |org_id| async move {
///     client.get_sast_setting(&org_id).await
/// })
/// .await;
/// ```
pub async fn run_bounded<I, R, F, Fut>(
    items: Vec<I>,
    max_concurrent: usize,
    cancel: &CancelToken,
    work: F,
) -> BoundedRun<R>
where
    F: Fn(I) -> Fut,
    Fut: Future<Output = R>,
{
    let total = items.len();
    let max_concurrent = max_concurrent.max(1);
    debug!(
        "Running {} units with max {} concurrent",
        total, max_concurrent
    );

    let mut slots: Vec<Option<R>> = Vec::with_capacity(total);
    slots.resize_with(total, || None);

    let launch = |index: usize, item: I| {
        let fut = work(item);
        async move { (index, fut.await) }
    };

    let mut futures = FuturesUnordered::new();
    let mut pending = items.into_iter().enumerate();
    let mut started = 0;

    // Seed initial batch up to max_concurrent
    while futures.len() < max_concurrent && !cancel.is_cancelled() {
        let Some((index, item)) = pending.next() else {
            break;
        };
        futures.push(launch(index, item));
        started += 1;
    }

    // Refill one slot per completion to keep the bound
    while let Some((index, result)) = futures.next().await {
        slots[index] = Some(result);

        if cancel.is_cancelled() {
            continue;
        }
        if let Some((next_index, item)) = pending.next() {
            futures.push(launch(next_index, item));
            started += 1;
        }
    }

    let not_started = total - started;
    if not_started > 0 {
        debug!("{} units not started after cancellation", not_started);
    }

    BoundedRun {
        completed: slots.into_iter().take(started).flatten().collect(),
        not_started,
    }
}
