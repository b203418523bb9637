//! # Journey clock
//!
//! Per-user simulated time. Starts at the user's arrival and only moves
//! forward, by whole seconds drawn from the shared stream.

use chrono::{DateTime, TimeDelta, Utc};

#[derive(Debug, Clone, Copy)]
pub struct JourneyClock {
    now: DateTime<Utc>,
}

impl JourneyClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: start }
    }

    #[inline]
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    #[inline]
    pub fn advance_secs(&mut self, secs: u64) {
        self.now += TimeDelta::seconds(secs as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_clock_initial_value() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(JourneyClock::new(start).now(), start);
    }

    #[test]
    fn test_clock_advance() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let mut clock = JourneyClock::new(start);
        clock.advance_secs(500);
        clock.advance_secs(250);
        assert_eq!(clock.now() - start, TimeDelta::seconds(750));
    }
}
