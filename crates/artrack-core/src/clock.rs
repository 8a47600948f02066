use std::cell::Cell;
use std::time::Instant;

/// Source of monotonic time in seconds.
///
/// Recording and eviction never read a global clock; whoever drives the
/// frame loop hands one of these in.
pub trait Clock {
    fn now(&self) -> f64;
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline]
    fn now(&self) -> f64 {
        (**self).now()
    }
}

/// Wall clock measured from the moment the value was created.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Clock that only moves when told to.
///
/// Used by tests and by log replay, where the frame timestamps come from the
/// recorded data rather than from the machine.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    /// Jump to an absolute time. Going backwards is ignored.
    pub fn set(&self, t: f64) {
        if t >= self.now.get() {
            self.now.set(t);
        }
    }

    pub fn advance(&self, dt: f64) {
        if dt > 0.0 {
            self.now.set(self.now.get() + dt);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_never_runs_backwards() {
        let clock = ManualClock::new(10.0);
        clock.set(12.5);
        clock.set(11.0);
        clock.advance(-3.0);
        assert_eq!(clock.now(), 12.5);
        clock.advance(0.5);
        assert_eq!(clock.now(), 13.0);
    }

    #[test]
    fn borrowed_clock_reads_through() {
        let clock = ManualClock::new(1.0);
        let borrowed: &ManualClock = &clock;
        clock.advance(1.0);
        assert_eq!(Clock::now(&borrowed), 2.0);
    }

    #[test]
    fn monotonic_clock_is_non_decreasing() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(a >= 0.0);
        assert!(b >= a);
    }
}
