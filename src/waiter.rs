use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::config::WaitConfig;
use crate::driver::{DriverResult, Element, Page};
use crate::errors::DriverError;
use crate::types::LocatorQuery;

/// Result of a bounded wait
#[derive(Debug)]
pub enum WaitOutcome<T> {
    /// The probe produced a value
    Found(T),
    /// The probe never produced a value within the timeout
    TimedOut { elapsed: Duration },
    /// The probe hit a non-transient driver error and polling stopped
    Failed(DriverError),
}

impl<T> WaitOutcome<T> {
    pub fn found(self) -> Option<T> {
        match self {
            WaitOutcome::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, WaitOutcome::Found(_))
    }
}

/// Polls a probe until it yields, the timeout elapses, or it fails for good
#[derive(Debug, Clone, Copy)]
pub struct Waiter {
    timeout: Duration,
    poll_interval: Duration,
}

impl Default for Waiter {
    fn default() -> Self {
        Self::new(WaitConfig::default())
    }
}

impl Waiter {
    pub fn new(config: WaitConfig) -> Self {
        Waiter {
            timeout: config.timeout,
            poll_interval: config.poll_interval,
        }
    }

    /// Same polling granularity, different timeout
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Waiter { timeout, ..self }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `probe` until it returns `Ok(Some(_))`.
    ///
    /// `Ok(None)` and transient driver errors (missing or stale element)
    /// keep the loop going. Any other error ends the wait with
    /// [`WaitOutcome::Failed`]. The probe always runs at least once.
    pub async fn wait_for<T, F, Fut>(&self, mut probe: F) -> WaitOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = DriverResult<Option<T>>>,
    {
        let start = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            match probe().await {
                Ok(Some(value)) => {
                    debug!("Probe matched after {} attempt(s)", attempts);
                    return WaitOutcome::Found(value);
                }
                Ok(None) => {}
                Err(e) if e.is_transient() => {
                    debug!("Transient error on attempt {}: {}", attempts, e);
                }
                Err(e) => {
                    debug!("Probe failed on attempt {}: {}", attempts, e);
                    return WaitOutcome::Failed(e);
                }
            }

            let elapsed = start.elapsed();
            if elapsed >= self.timeout {
                debug!("Gave up after {} attempt(s) in {:?}", attempts, elapsed);
                return WaitOutcome::TimedOut { elapsed };
            }
            sleep(self.poll_interval.min(self.timeout - elapsed)).await;
        }
    }
}

/// First displayed element matching `query`, if any.
///
/// Hidden elements are skipped, and so are elements that go stale
/// between lookup and the visibility check.
pub async fn visible_match<P: Page>(
    page: &P,
    query: &LocatorQuery,
) -> DriverResult<Option<P::Element>> {
    for element in page.find_all(query).await? {
        match element.is_displayed().await {
            Ok(true) => return Ok(Some(element)),
            Ok(false) => {}
            Err(e) if e.is_transient() => {}
            Err(e) => return Err(e),
        }
    }
    Ok(None)
}

#[cfg(test)]
#[path = "waiter_test.rs"]
mod waiter_test;
