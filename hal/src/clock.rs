//! Time Source Hardware Abstraction Layer.
//!
//! This module defines the trait for a free-running microsecond
//! counter. The transport layer uses it to bound its polling loops; it
//! never needs absolute time, only elapsed time.

/// Free-running microsecond clock.
pub trait Clock {
    /// Read the current counter value in microseconds.
    ///
    /// The counter increments continuously and may wrap; callers must
    /// measure intervals with `wrapping_sub`.
    fn now_us(&self) -> u64;

    /// Busy-wait delay for the specified number of microseconds.
    ///
    /// This blocks the CPU and should only be used for short delays.
    fn delay_us(&self, us: u64) {
        let start = self.now_us();

        while self.now_us().wrapping_sub(start) < us {
            core::hint::spin_loop();
        }
    }

    /// Busy-wait delay for the specified number of milliseconds.
    fn delay_ms(&self, ms: u64) {
        self.delay_us(ms.saturating_mul(1000));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    struct StepClock(Cell<u64>);

    impl Clock for StepClock {
        fn now_us(&self) -> u64 {
            let t = self.0.get();
            self.0.set(t.wrapping_add(10));
            t
        }
    }

    #[test]
    fn delay_waits_out_the_interval() {
        let clock = StepClock(Cell::new(0));
        clock.delay_us(100);
        assert!(clock.0.get() >= 100);
    }

    #[test]
    fn interval_measurement_survives_wraparound() {
        let clock = StepClock(Cell::new(u64::MAX - 30));
        clock.delay_us(100);
        // Wrapped past zero without hanging.
        assert!(clock.0.get() < 1000);
    }
}
