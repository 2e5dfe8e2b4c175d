//! Virtual clock for unit tests. Time only moves when slept on or advanced.

use crate::pacer::{Clock, Duration, Instant};

pub struct MockClock {
    now_us: u64,
    /// Every sleep requested, in order.
    sleeps: Vec<Duration>,
}

impl MockClock {
    pub fn new() -> Self {
        Self {
            now_us: 0,
            sleeps: Vec::new(),
        }
    }

    /// Let time pass without it being recorded as a sleep.
    pub fn advance(&mut self, duration: Duration) {
        self.now_us += duration.ticks();
    }

    pub fn sleeps(&self) -> &[Duration] {
        &self.sleeps
    }

    pub fn clear_sleeps(&mut self) {
        self.sleeps.clear();
    }
}

impl Clock for MockClock {
    fn now(&mut self) -> Instant {
        Instant::from_ticks(self.now_us)
    }

    fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration);
        self.now_us += duration.ticks();
    }
}
