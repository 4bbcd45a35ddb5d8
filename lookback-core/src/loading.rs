//! Reference-counted "busy" signal for in-flight requests.

use parking_lot::Mutex;
use tokio::sync::watch;

/// Counts requests that have started but not settled, and publishes `count > 0`.
///
/// Subscribers get a [`watch::Receiver`], so a late subscriber sees the current
/// state immediately.
#[derive(Debug)]
pub struct LoadingTracker {
    count: Mutex<usize>,
    busy: watch::Sender<bool>,
}

impl Default for LoadingTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadingTracker {
    pub fn new() -> Self {
        let (busy, _) = watch::channel(false);
        Self { count: Mutex::new(0), busy }
    }

    pub fn begin(&self) {
        let mut count = self.count.lock();
        *count += 1;
        if *count == 1 {
            tracing::debug!("loading started");
            self.busy.send_replace(true);
        }
    }

    pub fn end(&self) {
        let mut count = self.count.lock();
        let current = *count;
        match current {
            0 => tracing::debug!("loading end without matching begin, ignoring"),
            1 => {
                *count = 0;
                tracing::debug!("loading finished");
                self.busy.send_replace(false);
            }
            _ => *count -= 1,
        }
    }

    /// Forces the tracker back to idle, whatever is still in flight.
    pub fn reset(&self) {
        let mut count = self.count.lock();
        if *count > 0 {
            tracing::warn!(in_flight = *count, "loading state reset");
        }
        *count = 0;
        self.busy.send_replace(false);
    }

    /// Starts tracking one request; the returned guard ends it when dropped.
    pub fn track(&self) -> LoadingGuard<'_> {
        self.begin();
        LoadingGuard { tracker: self }
    }

    pub fn in_flight(&self) -> usize {
        *self.count.lock()
    }

    pub fn is_busy(&self) -> bool {
        *self.busy.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.busy.subscribe()
    }
}

/// Calls [`LoadingTracker::end`] exactly once, on drop.
#[must_use = "dropping the guard immediately ends the tracked request"]
#[derive(Debug)]
pub struct LoadingGuard<'a> {
    tracker: &'a LoadingTracker,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.tracker.end();
    }
}
