//! Bounded-concurrency, rate-limited execution of async work.
//!
//! Library variable resolution is expensive on the host side, so it runs in
//! waves: at most `concurrency` futures in flight, each wave joined before
//! the next starts, with a fixed pause in between.

use std::future::Future;
use std::time::Duration;

use futures::future::join_all;

/// Wave executor. `concurrency` is clamped to at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPool {
    concurrency: usize,
    pause: Duration,
}

impl BatchPool {
    pub fn new(concurrency: usize, pause: Duration) -> Self {
        Self {
            concurrency: concurrency.max(1),
            pause,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn pause(&self) -> Duration {
        self.pause
    }

    /// Run `task` over every item. Results come back in input order.
    pub async fn run<I, F, Fut>(&self, items: I, mut task: F) -> Vec<Fut::Output>
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> Fut,
        Fut: Future,
    {
        let mut pending = items.into_iter().peekable();
        let mut results = Vec::new();
        let mut waves = 0usize;

        while pending.peek().is_some() {
            if waves > 0 && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }
            let wave: Vec<Fut> = pending.by_ref().take(self.concurrency).map(&mut task).collect();
            results.extend(join_all(wave).await);
            waves += 1;
        }

        tracing::trace!(waves, items = results.len(), "batch pool drained");
        results
    }
}

impl Default for BatchPool {
    fn default() -> Self {
        Self::new(5, Duration::from_millis(50))
    }
}
