use std::time::SystemTime;

/// Milliseconds since the Unix epoch, or 0 if the system clock is before it.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

/// Wall-clock stamps that never go backwards for a single sender.
///
/// If the system clock steps back, the last issued stamp is repeated until
/// the wall clock catches up again.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: u64,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stamp(&mut self) -> u64 {
        self.observe(now_millis())
    }

    fn observe(&mut self, wall: u64) -> u64 {
        self.last = self.last.max(wall);
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamps_never_decrease() {
        let mut clock = MonotonicClock::new();
        assert_eq!(clock.observe(1_000), 1_000);
        assert_eq!(clock.observe(900), 1_000);
        assert_eq!(clock.observe(1_200), 1_200);
    }

    #[test]
    fn now_millis_is_after_2020() {
        assert!(now_millis() > 1_577_836_800_000);
    }
}
