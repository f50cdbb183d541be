//! Retry pacing for a delta source that keeps failing
//!
//! Each failed poll waits twice as long as the previous one, up to a ceiling.
//! After `max_retries` waits in a row the caller is told the source looks down;
//! a successful poll starts the sequence over.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PollBackoff {
    first_wait: Duration,
    ceiling: Duration,
    max_retries: u32,
    failures: u32,
}

/// Returned once `max_retries` consecutive waits have been spent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetriesExhausted {
    pub failures: u32,
}

impl std::fmt::Display for RetriesExhausted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Delta source failed {} polls in a row", self.failures)
    }
}

impl std::error::Error for RetriesExhausted {}

impl PollBackoff {
    pub fn new(first_wait: Duration, ceiling: Duration, max_retries: u32) -> Self {
        Self {
            first_wait,
            ceiling,
            max_retries,
            failures: 0,
        }
    }

    /// How long the next failed poll waits, or `None` once retries are spent
    pub fn next_delay(&self) -> Option<Duration> {
        if self.failures >= self.max_retries {
            return None;
        }

        let factor = 2_u32.saturating_pow(self.failures);
        Some(self.first_wait.saturating_mul(factor).min(self.ceiling))
    }

    /// Wait out one failed poll
    pub async fn wait(&mut self) -> Result<(), RetriesExhausted> {
        let delay = self.next_delay().ok_or(RetriesExhausted {
            failures: self.failures,
        })?;

        log::warn!(
            "⏳ Backing off {:?} before next poll (failure {}/{})",
            delay,
            self.failures + 1,
            self.max_retries
        );

        tokio::time::sleep(delay).await;
        self.failures += 1;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.failures = 0;
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }
}

impl Default for PollBackoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(30), 10)
    }
}
