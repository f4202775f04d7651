//! Time sources.
//!
//! Operations that stamp records take a [`Clock`] instead of reading the
//! system time directly, so tests can pin timestamps.

use std::cell::Cell;

use jiff::{SignedDuration, Timestamp};

/// Something that can tell the current time.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

/// A clock that advances by a fixed step every time it is read.
#[derive(Debug)]
pub struct SteppingClock {
    next: Cell<Timestamp>,
    step: SignedDuration,
}

impl SteppingClock {
    pub fn new(start: Timestamp, step: SignedDuration) -> Self {
        Self {
            next: Cell::new(start),
            step,
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> Timestamp {
        let current = self.next.get();
        // Saturates at the end of jiff's supported range.
        self.next
            .set(current.checked_add(self.step).unwrap_or(current));
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_never_moves() {
        let at = Timestamp::new(1_700_000_000, 0).unwrap();
        let clock = FixedClock(at);
        assert_eq!(clock.now(), at);
        assert_eq!(clock.now(), at);
    }

    #[test]
    fn stepping_clock_advances_per_read() {
        let start = Timestamp::new(1_700_000_000, 0).unwrap();
        let clock = SteppingClock::new(start, SignedDuration::from_secs(1));

        assert_eq!(clock.now(), start);
        assert_eq!(clock.now().as_second(), 1_700_000_001);
        assert_eq!(clock.now().as_second(), 1_700_000_002);
    }
}
