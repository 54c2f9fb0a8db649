/// Counts simulated time up to a fixed duration.
#[derive(Debug, Clone)]
pub struct Timer {
    counter: f64,
    duration: f64, // in seconds
}

impl Timer {
    pub fn new(duration: f64) -> Self {
        Timer {
            counter: 0.0,
            duration,
        }
    }

    pub fn reset(&mut self) {
        self.counter = 0.0;
    }

    /// Advance by `dt` seconds. Returns true and restarts once the duration is
    /// reached.
    pub fn tick(&mut self, dt: f64) -> bool {
        self.counter += dt;
        if self.counter >= self.duration {
            self.reset();
            return true;
        }
        false
    }
}

/// Formats a number of seconds as `m:ss`.
pub fn format_clock(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_fires_and_restarts() {
        let mut timer = Timer::new(1.0);
        assert!(!timer.tick(0.5));
        assert!(!timer.tick(0.25));
        assert!(timer.tick(0.25));
        // Starts over from zero after firing
        assert!(!timer.tick(0.5));
        assert!(timer.tick(0.5));

        assert!(!timer.tick(0.75));
        timer.reset();
        assert!(!timer.tick(0.75));
        assert!(timer.tick(0.25));
    }

    #[test]
    fn clock_format() {
        assert_eq!(format_clock(600.0), "10:00");
        assert_eq!(format_clock(61.9), "1:01");
        assert_eq!(format_clock(9.0), "0:09");
        assert_eq!(format_clock(-3.0), "0:00");
    }
}
