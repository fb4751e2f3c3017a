//! Invocation controller: runs ranking immediately or after a quiet period.
//!
//! Small working sets are ranked synchronously on every keystroke. Above the
//! configured threshold, ranking is scheduled on the tokio runtime after a
//! debounce delay. Each scope has at most one pending pass: scheduling a new
//! one (or ranking synchronously) cancels the previous one.
//!
//! Scheduled passes may finish on another worker thread. Delivery goes
//! through a generation gate, so a pass superseded after it finished ranking
//! still never reaches the event stream.

use crate::registry::Catalog;
use crate::search::rank;
use crate::types::ScoredChoice;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default working-set size above which ranking is debounced.
pub const DEFAULT_DEBOUNCE_THRESHOLD: usize = 5000;

/// Default quiet period before a debounced ranking pass runs.
pub const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_millis(100);

/// How a ranking request was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    /// Ranked and delivered before returning.
    Immediate,
    /// Scheduled to run after the debounce delay.
    Scheduled,
}

/// Generation counter shared by a debouncer and the passes it scheduled.
#[derive(Debug, Clone, Default)]
struct Gate(Arc<Mutex<u64>>);

impl Gate {
    fn lock(&self) -> MutexGuard<'_, u64> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Invalidates every pass issued so far and returns the new generation.
    fn advance(&self) -> u64 {
        let mut generation = self.lock();
        *generation += 1;
        *generation
    }

    /// Runs `deliver` only while `generation` is still current. The check and
    /// the delivery share one critical section, so an `advance` from another
    /// thread lands strictly before or strictly after it.
    fn deliver_if_current(&self, generation: u64, deliver: impl FnOnce()) -> bool {
        let current = self.lock();
        if *current != generation {
            return false;
        }
        deliver();
        drop(current);
        true
    }
}

/// Per-scope debouncer with a single pending slot.
#[derive(Debug)]
pub struct Debouncer {
    threshold: usize,
    delay: Duration,
    pending: Option<CancellationToken>,
    gate: Gate,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_THRESHOLD, DEFAULT_DEBOUNCE_DELAY)
    }
}

impl Debouncer {
    pub fn new(threshold: usize, delay: Duration) -> Self {
        Self {
            threshold,
            delay,
            pending: None,
            gate: Gate::default(),
        }
    }

    /// Whether a scheduled pass has neither run nor been cancelled yet.
    pub fn has_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|token| !token.is_cancelled())
    }

    /// Cancels the pending pass, if any. A pass that already finished ranking
    /// but has not delivered yet is dropped as well.
    pub fn cancel(&mut self) {
        self.supersede();
    }

    fn supersede(&mut self) -> u64 {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
        self.gate.advance()
    }

    /// Ranks `catalog` for `query` and hands the result to `deliver`.
    ///
    /// Without a tokio runtime the debounced path degrades to ranking in place.
    pub fn invoke<F>(&mut self, catalog: Arc<Catalog>, query: String, deliver: F) -> Invocation
    where
        F: FnOnce(Vec<ScoredChoice>) + Send + 'static,
    {
        let generation = self.supersede();

        if catalog.len() <= self.threshold {
            deliver(rank(&catalog, &query));
            return Invocation::Immediate;
        }

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(
                "No tokio runtime for debounced ranking of {} choices, ranking in place",
                catalog.len()
            );
            deliver(rank(&catalog, &query));
            return Invocation::Immediate;
        };

        let token = CancellationToken::new();
        self.pending = Some(token.clone());
        let gate = self.gate.clone();
        let delay = self.delay;

        tracing::trace!("Scheduling ranking of '{}' in {:?}", query, delay);
        handle.spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => {
                    tracing::trace!("Debounced ranking of '{}' superseded", query);
                }
                () = tokio::time::sleep(delay) => {
                    let ranked = rank(&catalog, &query);
                    if gate.deliver_if_current(generation, || deliver(ranked)) {
                        token.cancel();
                    } else {
                        tracing::trace!("Dropping stale ranking of '{}'", query);
                    }
                }
            }
        });

        Invocation::Scheduled
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
