//! Progress reporting for bulk conversions.

use std::fmt;
use std::time::{Duration, Instant};

/// A point-in-time progress reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Items handled so far, including the current one.
    pub current: usize,
    /// Items in the whole traversal.
    pub total: usize,
}

impl Progress {
    /// Completion as a fraction in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.current as f64 / self.total as f64
    }
}

impl fmt::Display for Progress {
    /// Renders `current/total pct`, with the percentage trimmed to at most two
    /// decimals (`1/3 33.33%`, `1/2 50%`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pct = format!("{:.2}", self.fraction() * 100.0);
        let pct = pct.trim_end_matches('0').trim_end_matches('.');
        write!(f, "{}/{} {}%", self.current, self.total, pct)
    }
}

/// Decides when a traversal is due for another progress line.
///
/// The first item always reports; after that a report is due once
/// `interval` has passed since the previous one.
#[derive(Debug)]
pub struct ProgressTracker {
    total: usize,
    current: usize,
    interval: Duration,
    last_report: Option<Instant>,
}

impl ProgressTracker {
    /// Creates a tracker for `total` items.
    pub fn new(total: usize, interval: Duration) -> Self {
        Self {
            total,
            current: 0,
            interval,
            last_report: None,
        }
    }

    /// Counts one item and returns a reading if a report is due.
    pub fn advance(&mut self) -> Option<Progress> {
        self.advance_at(Instant::now())
    }

    /// Like [`advance`](Self::advance) with an explicit clock reading.
    pub fn advance_at(&mut self, now: Instant) -> Option<Progress> {
        self.current += 1;
        let due = match self.last_report {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        };
        if !due {
            return None;
        }
        self.last_report = Some(now);
        Some(Progress {
            current: self.current,
            total: self.total,
        })
    }

    /// Items counted so far.
    pub fn current(&self) -> usize {
        self.current
    }
}
