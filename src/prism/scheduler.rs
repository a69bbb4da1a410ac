//! Throttled, single-flight scheduling of translation rounds
//!
//! A trigger asks for a round no earlier than one interval after the
//! previous round started. Triggers while a round is due are merged, and no
//! round becomes due while another is in flight.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
pub struct Scheduler {
    interval: Duration,
    last_start: Option<Instant>,
    due: Option<Instant>,
    in_flight: bool,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_start: None,
            due: None,
            in_flight: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Ask for a round
    pub fn trigger(&mut self, now: Instant) {
        if self.due.is_some() {
            return;
        }
        let earliest = self.last_start.map_or(now, |last| last + self.interval);
        self.due = Some(now.max(earliest));
    }

    /// When the next round should start, if one is wanted and none is running
    pub fn next_due(&self) -> Option<Instant> {
        if self.in_flight { None } else { self.due }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Mark a round as started
    pub fn start(&mut self, now: Instant) {
        self.last_start = Some(now);
        self.due = None;
        self.in_flight = true;
    }

    pub fn finish(&mut self) {
        self.in_flight = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(50);

    #[tokio::test(start_paused = true)]
    async fn test_first_trigger_is_due_now() {
        let mut scheduler = Scheduler::new(INTERVAL);
        let now = Instant::now();
        assert_eq!(scheduler.next_due(), None);
        scheduler.trigger(now);
        assert_eq!(scheduler.next_due(), Some(now));
    }

    #[tokio::test(start_paused = true)]
    async fn test_triggers_after_a_round_are_throttled() {
        let mut scheduler = Scheduler::new(INTERVAL);
        let start = Instant::now();
        scheduler.trigger(start);
        scheduler.start(start);
        scheduler.finish();

        let later = start + Duration::from_millis(10);
        scheduler.trigger(later);
        assert_eq!(scheduler.next_due(), Some(start + INTERVAL));

        // A burst keeps the first due time
        scheduler.trigger(later + Duration::from_millis(5));
        assert_eq!(scheduler.next_due(), Some(start + INTERVAL));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_flight() {
        let mut scheduler = Scheduler::new(INTERVAL);
        let start = Instant::now();
        scheduler.start(start);
        scheduler.trigger(start + Duration::from_millis(100));
        assert!(scheduler.is_in_flight());
        assert_eq!(scheduler.next_due(), None);
        scheduler.finish();
        assert_eq!(scheduler.next_due(), Some(start + Duration::from_millis(100)));
    }
}
