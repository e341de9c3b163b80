//! Reconnection policy
//!
//! Exponential backoff with a cap, used both for the initial registration
//! (the coordinator may not be up yet when the agent starts, common in
//! container environments) and for re-registering after a dropped
//! connection.

use std::future::Future;
use std::time::Duration;

use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    /// Attempts before giving up; None retries forever
    pub max_attempts: Option<u32>,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Applied to each computed delay before sleeping, so deployments can
    /// spread reconnect storms; identity by default
    pub jitter: fn(Duration) -> Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Some(10),
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            jitter: |delay| delay,
        }
    }
}

impl ReconnectPolicy {
    /// A policy that never gives up, for mid-session reconnects.
    pub fn persistent() -> Self {
        Self {
            max_attempts: None,
            ..Self::default()
        }
    }

    /// Runs `operation` until it succeeds or the attempt budget runs out.
    pub async fn run<T, E, F, Fut>(&self, what: &str, mut operation: F) -> anyhow::Result<T>
    where
        E: std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt: u32 = 0;
        let mut delay = self.initial_delay;

        loop {
            attempt += 1;

            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        info!("{} succeeded after {} attempt(s)", what, attempt);
                    }
                    return Ok(value);
                }
                Err(e) => {
                    if let Some(max) = self.max_attempts {
                        if attempt >= max {
                            error!("{} failed after {} attempts", what, max);
                            return Err(anyhow::anyhow!("{} failed: {}", what, e));
                        }
                    }

                    let jittered = (self.jitter)(delay);
                    warn!("{} failed (attempt {}): {}", what, attempt, e);
                    warn!("Retrying in {} ms...", jittered.as_millis());

                    tokio::time::sleep(jittered).await;

                    // Exponential backoff with cap
                    delay = (delay * 2).min(self.max_delay);
                }
            }
        }
    }
}
