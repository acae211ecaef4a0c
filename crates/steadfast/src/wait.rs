//! Wait Mechanisms
//!
//! Polls a predicate against the session until it holds or the deadline passes.
//! Every interaction builds on this loop.
//!
//! A timeout is a normal outcome (`Ok(false)`), not an error. Errors raised by
//! the predicate while polling (an element momentarily detached, not yet
//! rendered) are treated as "not yet satisfied". Only an error from the final
//! attempt escapes, re-tagged as [`FailureTag::Timeout`] with the last detail.

use crate::locator::Locator;
use crate::session::{ElementRef, FailureTag, Session, SessionError};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (10 seconds)
pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 10;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

// =============================================================================
// WAIT SPEC
// =============================================================================

/// Timeout and polling interval for a single wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitSpec {
    /// Timeout in seconds; 0 means try once
    pub timeout_secs: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitSpec {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_WAIT_TIMEOUT_SECS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitSpec {
    /// Wait up to `timeout_secs` with the default poll interval
    #[must_use]
    pub const fn new(timeout_secs: u64) -> Self {
        Self {
            timeout_secs,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }

    /// Try exactly once
    #[must_use]
    pub const fn once() -> Self {
        Self::new(0)
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get poll interval as Duration (at least 1ms)
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

// =============================================================================
// CONDITIONS
// =============================================================================

/// Built-in element conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    /// At least one element matches the locator
    Present,
    /// The first matching element is displayed
    Visible,
}

impl Condition {
    /// Evaluate the condition once
    pub fn check<S: Session + ?Sized>(
        &self,
        session: &S,
        locator: &Locator,
    ) -> Result<bool, SessionError> {
        match self {
            Self::Present => element_present(session, locator),
            Self::Visible => element_visible(session, locator),
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Present => f.write_str("present"),
            Self::Visible => f.write_str("visible"),
        }
    }
}

/// Predicate: the locator resolves to an element.
///
/// A failed lookup is returned as an error so that a timed-out wait carries
/// the driver's last `no such element` detail.
pub fn element_present<S: Session + ?Sized>(
    session: &S,
    locator: &Locator,
) -> Result<bool, SessionError> {
    session.find_element(locator).map(|_| true)
}

/// Predicate: the locator resolves to a displayed element
pub fn element_visible<S: Session + ?Sized>(
    session: &S,
    locator: &Locator,
) -> Result<bool, SessionError> {
    let element = session.find_element(locator)?;
    session.is_displayed(&element)
}

// =============================================================================
// WAIT LOOP
// =============================================================================

/// Poll `predicate` until it returns `true` or the spec's timeout elapses.
///
/// Returns `Ok(true)` on success and `Ok(false)` on timeout. If the final
/// attempt errored, returns that error re-tagged as `Timeout`.
pub fn wait<S, P>(
    session: &S,
    locator: &Locator,
    mut predicate: P,
    spec: WaitSpec,
) -> Result<bool, SessionError>
where
    S: Session + ?Sized,
    P: FnMut(&S, &Locator) -> Result<bool, SessionError>,
{
    let start = Instant::now();
    let timeout = spec.timeout();
    let poll_interval = spec.poll_interval();
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        let last_error = match predicate(session, locator) {
            Ok(true) => {
                tracing::debug!(%locator, attempts, elapsed_ms = start.elapsed().as_millis() as u64, "wait satisfied");
                return Ok(true);
            }
            Ok(false) => None,
            Err(error) => {
                tracing::debug!(%locator, attempts, %error, "wait predicate errored, retrying");
                Some(error)
            }
        };

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            tracing::debug!(%locator, attempts, timeout_secs = spec.timeout_secs, "wait timed out");
            return match last_error {
                Some(error) => Err(SessionError::new(
                    FailureTag::Timeout,
                    format!(
                        "Wait timed out after {} seconds for {locator}: {}",
                        spec.timeout_secs, error.message
                    ),
                )),
                None => Ok(false),
            };
        }

        std::thread::sleep(poll_interval.min(timeout - elapsed));
    }
}

/// Resolve a locator, waiting for it to appear.
///
/// Unlike [`wait`], a lookup that never succeeds returns the session's own last
/// error (usually `no such element`), so callers classify the real cause.
pub fn find_with_wait<S: Session + ?Sized>(
    session: &S,
    locator: &Locator,
    spec: WaitSpec,
) -> Result<ElementRef, SessionError> {
    let mut found = None;
    let mut last_error = None;
    let satisfied = wait(
        session,
        locator,
        |s, l| match s.find_element(l) {
            Ok(element) => {
                found = Some(element);
                Ok(true)
            }
            Err(error) => {
                last_error = Some(error.clone());
                Err(error)
            }
        },
        spec,
    );
    match (satisfied, found) {
        (Ok(true), Some(element)) => Ok(element),
        _ => Err(last_error.unwrap_or_else(|| SessionError::no_such_element(locator))),
    }
}

// =============================================================================
// TESTS
// =============================================================================
