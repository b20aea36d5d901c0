/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Keepalive bookkeeping.
//!
//! Tracks traffic in both directions against the negotiated heartbeat
//! interval. Outbound silence for one interval calls for a Sequence
//! heartbeat; inbound silence for two intervals means the peer is gone.

use std::time::{Duration, Instant};

/// Tracks send/receive liveness for one session.
#[derive(Debug)]
pub struct KeepaliveTracker {
    /// Negotiated heartbeat interval.
    interval: Duration,
    /// Time of the last outbound frame.
    last_sent: Instant,
    /// Time of the last inbound frame.
    last_received: Instant,
}

impl KeepaliveTracker {
    /// Creates a tracker with the given interval.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            interval,
            last_sent: now,
            last_received: now,
        }
    }

    /// Records an outbound frame.
    #[inline]
    pub fn on_frame_sent(&mut self) {
        self.last_sent = Instant::now();
    }

    /// Records an inbound frame.
    #[inline]
    pub fn on_frame_received(&mut self) {
        self.last_received = Instant::now();
    }

    /// Returns true if outbound silence requires a heartbeat.
    #[must_use]
    pub fn needs_heartbeat(&self) -> bool {
        self.last_sent.elapsed() >= self.interval
    }

    /// Returns true if inbound silence has passed one interval.
    #[must_use]
    pub fn probe_due(&self) -> bool {
        self.last_received.elapsed() >= self.interval
    }

    /// Returns true if inbound silence has passed two intervals.
    #[must_use]
    pub fn is_lapsed(&self) -> bool {
        self.last_received.elapsed() >= self.interval * 2
    }

    /// Returns the heartbeat interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Resets both directions to now.
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.last_sent = now;
        self.last_received = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_fresh_tracker_is_quiet() {
        let tracker = KeepaliveTracker::new(Duration::from_secs(30));
        assert!(!tracker.needs_heartbeat());
        assert!(!tracker.probe_due());
        assert!(!tracker.is_lapsed());
    }

    #[test]
    fn test_outbound_silence_needs_heartbeat() {
        let mut tracker = KeepaliveTracker::new(Duration::from_millis(10));
        sleep(Duration::from_millis(15));
        assert!(tracker.needs_heartbeat());

        tracker.on_frame_sent();
        assert!(!tracker.needs_heartbeat());
    }

    #[test]
    fn test_inbound_silence_lapses_at_two_intervals() {
        let mut tracker = KeepaliveTracker::new(Duration::from_millis(10));

        sleep(Duration::from_millis(15));
        assert!(tracker.probe_due());
        assert!(!tracker.is_lapsed());

        sleep(Duration::from_millis(10));
        assert!(tracker.is_lapsed());

        tracker.on_frame_received();
        assert!(!tracker.probe_due());
        assert!(!tracker.is_lapsed());
    }

    #[test]
    fn test_reset() {
        let mut tracker = KeepaliveTracker::new(Duration::from_millis(10));
        sleep(Duration::from_millis(25));
        assert!(tracker.is_lapsed());

        tracker.reset();
        assert!(!tracker.needs_heartbeat());
        assert!(!tracker.is_lapsed());
    }
}
