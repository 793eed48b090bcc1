use std::time::Duration;

use rand::Rng;

/// Exponential reconnect backoff with jitter.
///
/// Each step doubles the base delay up to `max`, then draws the actual
/// delay uniformly from the upper half of that window so simultaneous
/// reconnecting clients do not stampede the broker in lockstep.
#[derive(Debug)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    attempt: u32,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            attempt: 0,
        }
    }

    /// The delay to sleep before the next attempt. Advances the schedule.
    pub fn next_delay(&mut self) -> Duration {
        let exp = self
            .initial
            .saturating_mul(2u32.saturating_pow(self.attempt))
            .min(self.max);
        self.attempt = self.attempt.saturating_add(1);

        let millis = exp.as_millis() as u64;
        if millis < 2 {
            return exp;
        }
        let jittered = rand::thread_rng().gen_range(millis / 2..=millis);
        Duration::from_millis(jittered)
    }

    /// Forget accumulated failures after a successful connection.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}
