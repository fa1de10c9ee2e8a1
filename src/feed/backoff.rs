//! Reconnect backoff policy

use std::time::Duration;

/// Multiplicative backoff between `floor` and `ceiling`
///
/// The first failure waits `floor`; each consecutive failure multiplies the
/// delay by `multiplier`, capped at `ceiling`. [`Backoff::reset`] returns to
/// `floor` and is called once a connection is fully subscribed.
#[derive(Debug, Clone)]
pub struct Backoff {
    floor: Duration,
    multiplier: f64,
    ceiling: Duration,
    current: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(2), 1.5, Duration::from_secs(60))
    }
}

impl Backoff {
    pub fn new(floor: Duration, multiplier: f64, ceiling: Duration) -> Self {
        let ceiling = ceiling.max(floor);
        Self {
            floor,
            multiplier: multiplier.max(1.0),
            ceiling,
            current: floor,
        }
    }

    /// Delay the next failure will wait
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Take the delay for this failure and grow it for the next one
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = Duration::try_from_secs_f64(self.current.as_secs_f64() * self.multiplier)
            .map_or(self.ceiling, |next| next.min(self.ceiling));
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.floor;
    }
}
