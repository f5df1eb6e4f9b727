use std::time::Duration;

use crate::config::PollSettings;

/// What one scheduled poll observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    Changed,
    Unchanged,
    /// Fetch error or timeout. Scheduled like `Unchanged`.
    Failed,
}

/// Adaptive polling interval: back to the base interval whenever something
/// changed, otherwise stretched by `backoff_factor` up to
/// `base_interval * max_multiplier`.
#[derive(Clone, Debug)]
pub struct Backoff {
    base_interval: Duration,
    factor: f64,
    max_multiplier: f64,
    multiplier: f64,
}

impl Backoff {
    pub fn new(settings: &PollSettings) -> Self {
        Backoff {
            base_interval: settings.base_interval,
            factor: settings.backoff_factor,
            max_multiplier: settings.max_multiplier,
            multiplier: 1.0,
        }
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn current_interval(&self) -> Duration {
        self.base_interval.mul_f64(self.multiplier)
    }

    /// Updates the multiplier for `outcome` and returns the delay until the
    /// next scheduled poll.
    pub fn next_interval(&mut self, outcome: PollOutcome) -> Duration {
        match outcome {
            PollOutcome::Changed => self.multiplier = 1.0,
            PollOutcome::Unchanged | PollOutcome::Failed => {
                self.multiplier = (self.multiplier * self.factor).min(self.max_multiplier)
            }
        }
        self.current_interval()
    }
}
