//! Waiting between retry attempts.

use parking_lot::Mutex;
use std::time::Duration;

/// Waits out a backoff interval.
///
/// The adapter never sleeps directly; it asks its `Pause`. The default
/// blocks the calling thread. Run the adapter through
/// [`AdapterWorker`](crate::AdapterWorker) to keep an async runtime free
/// while it waits.
pub trait Pause: Send + Sync {
    /// Waits for `duration`.
    fn pause(&self, duration: Duration);
}

/// Blocks the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadPause;

impl Pause for ThreadPause {
    fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Records requested pauses without waiting. For tests.
#[derive(Debug, Default)]
pub struct RecordingPause {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordingPause {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every pause requested so far, in order.
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().clone()
    }
}

impl Pause for RecordingPause {
    fn pause(&self, duration: Duration) {
        self.pauses.lock().push(duration);
    }
}

impl<P: Pause + ?Sized> Pause for std::sync::Arc<P> {
    fn pause(&self, duration: Duration) {
        (**self).pause(duration)
    }
}
