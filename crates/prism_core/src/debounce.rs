//! Debounce primitives shared by the catalog browser and conversation search.
//!
//! [`Debouncer`] owns at most one pending task: scheduling new work cancels
//! whatever was waiting. [`Debounced`] builds on it to expose a delayed
//! reflection of a value on a `watch` channel.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::trace;

// ---------------------------------------------------------------------------
// Debouncer
// ---------------------------------------------------------------------------

/// Runs the most recently scheduled future once `delay` has passed without a
/// newer schedule. Must be used from within a tokio runtime.
///
/// Dropping the debouncer cancels the pending task.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Cancels any pending work and runs `fut` after the configured delay.
    pub fn schedule<F>(&mut self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.schedule_after(self.delay, fut);
    }

    /// Cancels any pending work and runs `fut` after `delay`.
    ///
    /// The deadline is fixed at call time, not when the task is first polled.
    pub fn schedule_after<F>(&mut self, delay: Duration, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let deadline = Instant::now() + delay;
        self.pending = Some(tokio::spawn(async move {
            sleep_until(deadline).await;
            fut.await;
        }));
    }

    /// Cancels the pending task. Returns `true` if one was still live.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) => {
                let live = !handle.is_finished();
                handle.abort();
                if live {
                    trace!("debounce: cancelled pending task");
                }
                live
            }
            None => false,
        }
    }

    /// `true` while a scheduled task has not yet finished.
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ---------------------------------------------------------------------------
// Debounced<T>
// ---------------------------------------------------------------------------

/// A value whose published copy only follows the input once the input has
/// been stable for `delay`.
///
/// Rapid calls to [`set`](Self::set) coalesce into a single emission carrying
/// the last value. Subscribers observe emissions through a
/// [`watch::Receiver`].
#[derive(Debug)]
pub struct Debounced<T> {
    input: T,
    tx: Arc<watch::Sender<T>>,
    debouncer: Debouncer,
}

impl<T> Debounced<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(initial: T, delay: Duration) -> Self {
        let (tx, _rx) = watch::channel(initial.clone());
        Self {
            input: initial,
            tx: Arc::new(tx),
            debouncer: Debouncer::new(delay),
        }
    }

    /// Records a new input and restarts the stability timer.
    pub fn set(&mut self, value: T) {
        self.input = value.clone();
        let tx = Arc::clone(&self.tx);
        self.debouncer.schedule(async move {
            tx.send_replace(value);
        });
    }

    /// Replaces both the input and the published value without waiting.
    pub fn set_now(&mut self, value: T) {
        self.debouncer.cancel();
        self.input = value.clone();
        self.tx.send_replace(value);
    }

    /// Publishes the pending input immediately.
    pub fn flush(&mut self) {
        if self.debouncer.cancel() {
            self.tx.send_replace(self.input.clone());
        }
    }

    /// The latest raw input (may not be published yet).
    pub fn input(&self) -> &T {
        &self.input
    }

    /// The currently published value.
    pub fn current(&self) -> T {
        self.tx.borrow().clone()
    }

    /// `true` while an emission is waiting on the timer.
    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn delay(&self) -> Duration {
        self.debouncer.delay()
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}
